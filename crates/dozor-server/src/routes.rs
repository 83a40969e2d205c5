use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use dozor_engine::CommandRouter;
use dozor_types::api::{HealthResponse, IngestResponse};
use dozor_types::events::InboundMessage;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::telegram::{TelegramClient, Update};

/// Header Telegram sends with every webhook call once a secret is registered.
const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: CommandRouter,
    pub telegram: TelegramClient,
    /// `None` accepts any caller
    pub webhook_secret: Option<String>,
}

// ── Auth helper ─────────────────────────────────────────────────────────

/// Sender ids in the body are trusted, so the caller must prove it is the transport.
fn check_secret(headers: &HeaderMap, expected: Option<&str>) -> Result<(), StatusCode> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if presented != expected {
        warn!("Rejected ingestion request with a wrong secret token");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────────

/// POST /updates: a queued batch of Telegram updates, handled in order.
pub async fn ingest_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(updates): Json<Vec<Value>>,
) -> Result<Json<IngestResponse>, StatusCode> {
    check_secret(&headers, state.webhook_secret.as_deref())?;
    ingest(&state, updates).await.map(Json)
}

/// POST /webhook: a single update as Telegram pushes it.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Value>,
) -> Result<Json<IngestResponse>, StatusCode> {
    check_secret(&headers, state.webhook_secret.as_deref())?;
    ingest(&state, vec![update]).await.map(Json)
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn ingest(state: &AppState, updates: Vec<Value>) -> Result<IngestResponse, StatusCode> {
    let (messages, skipped) = decode_updates(updates);
    let mut summary = IngestResponse {
        processed: messages.len(),
        skipped,
        ..IngestResponse::default()
    };

    // The engine talks to SQLite synchronously; keep it off the async runtime
    let router = state.router.clone();
    let replies = tokio::task::spawn_blocking(move || router.handle_batch(&messages))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    for reply in &replies {
        match state.telegram.send_message(reply).await {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                warn!(chat_id = reply.chat_id, "Failed to deliver reply: {}", e);
                summary.failed += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        delivered = summary.delivered,
        failed = summary.failed,
        "Batch handled"
    );
    Ok(summary)
}

/// Decodes each update on its own so one malformed record does not sink the batch.
/// Returns the usable messages and how many updates were skipped.
fn decode_updates(updates: Vec<Value>) -> (Vec<InboundMessage>, usize) {
    let mut messages = Vec::with_capacity(updates.len());
    let mut skipped = 0;

    for raw in updates {
        let update = match serde_json::from_value::<Update>(raw) {
            Ok(update) => update,
            Err(e) => {
                warn!("Skipping undecodable update: {}", e);
                skipped += 1;
                continue;
            }
        };

        let update_id = update.update_id;
        match update.into_inbound() {
            Some(message) => messages.push(message),
            None => {
                debug!(update_id, "Skipping update without a player message");
                skipped += 1;
            }
        }
    }
    (messages, skipped)
}
