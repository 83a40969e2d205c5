mod cleanup;
mod config;
mod routes;
mod secrets;
mod telegram;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use dozor_db::Database;
use dozor_engine::{CommandRouter, Engine};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes::AppState;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dozor=debug,dozor_engine=debug,dozor_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;
    config.game.validate()?;

    let db = Arc::new(Database::open(&config.db_path, config.busy_timeout)?);
    let engine = Engine::new(db, config.game.clone());

    let token = secrets::resolve_bot_token(&config).await?;
    let telegram = TelegramClient::new(&config.telegram_api, &token)?;

    // A stale menu is cosmetic; keep serving
    if let Err(e) = telegram
        .set_my_commands(&telegram::command_menu(engine.config()))
        .await
    {
        warn!("Failed to set command menu: {}", e);
    }

    tokio::spawn(cleanup::run_purge_loop(engine.clone(), config.purge_interval_secs));

    if config.webhook_secret.is_none() {
        warn!("DOZOR_WEBHOOK_SECRET is unset; ingestion accepts any caller");
    }

    let state = AppState {
        router: CommandRouter::new(engine),
        telegram,
        webhook_secret: config.webhook_secret.clone(),
    };

    let app = Router::new()
        .route("/updates", post(routes::ingest_batch))
        .route("/webhook", post(routes::webhook))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Dozor listening on {}", addr);
    info!(
        "Teams: {} | answer groups: {} | follow-up window: {}s",
        config.game.teams.join(", "),
        config.game.answer_groups.len(),
        config.game.pending_window_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
