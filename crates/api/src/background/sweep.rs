//! Periodic staleness sweep of offline players.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::service::SharedService;

pub async fn run(service: SharedService, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Ledger sweep job started");

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Ledger sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                let removed = service.lock().await.sweep(Utc::now());
                if removed == 0 {
                    tracing::debug!("Ledger sweep: nothing to remove");
                }
            }
        }
    }
}
