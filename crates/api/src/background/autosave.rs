//! Periodic ledger save, plus one final save on shutdown.

use std::time::Duration;

use chrono::Utc;
use kitforge_ledger::SaveOutcome;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::service::SharedService;

pub async fn run(service: SharedService, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Ledger autosave started");

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => save(&service).await,
        }
    }

    tracing::info!("Ledger autosave stopping, final save");
    save(&service).await;
}

/// Failures are logged and retried by the next trigger.
pub async fn save(service: &SharedService) {
    match service.lock().await.save(Utc::now()) {
        Ok(SaveOutcome::Written { players }) => {
            tracing::info!(players, "Ledger saved");
        }
        Ok(SaveOutcome::Clean) => {
            tracing::debug!("Ledger clean, nothing to save");
        }
        Err(e) => {
            tracing::error!(error = %e, "Ledger save failed, will retry");
        }
    }
}
