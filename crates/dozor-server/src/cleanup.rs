use std::time::Duration;

use dozor_engine::Engine;
use tracing::{info, warn};

/// Background task that deletes follow-ups nobody can answer any more.
///
/// Reads already ignore expired rows; this only keeps the table small.
pub async fn run_purge_loop(engine: Engine, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let engine = engine.clone();
        let now = chrono::Utc::now().timestamp();
        match tokio::task::spawn_blocking(move || engine.purge_expired(now)).await {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Purge: removed {} expired follow-ups", count);
                }
            }
            Ok(Err(e)) => warn!("Purge error: {}", e),
            Err(e) => warn!("Purge task failed: {}", e),
        }
    }
}
