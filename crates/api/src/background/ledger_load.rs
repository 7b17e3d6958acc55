//! Startup ledger load.
//!
//! The document is read on the blocking pool, then applied one batch per
//! lock acquisition with a yield in between, so claims and admin calls
//! interleave with a long load instead of waiting behind it.

use chrono::Utc;
use kitforge_ledger::{LedgerLoader, LedgerStore, LoadStep, LoaderOptions};
use tokio_util::sync::CancellationToken;

use crate::service::SharedService;

pub async fn run(
    service: SharedService,
    store: LedgerStore,
    options: LoaderOptions,
    cancel: CancellationToken,
) {
    tracing::info!(path = %store.path().display(), batch_size = options.batch_size, "Loading ledger");

    let open_cancel = cancel.clone();
    let opened = tokio::task::spawn_blocking(move || {
        LedgerLoader::open(&store, options, Utc::now(), open_cancel)
    })
    .await;

    let mut loader = match opened {
        Ok(loader) => loader,
        Err(e) => {
            tracing::error!(error = %e, "Ledger read task failed; claims stay unavailable");
            return;
        }
    };

    loop {
        let step = service.lock().await.apply_load_step(&mut loader);
        match step {
            LoadStep::Yield { loaded, remaining } => {
                tracing::debug!(loaded, remaining, "Ledger batch applied");
                tokio::task::yield_now().await;
            }
            LoadStep::Complete(report) => {
                tracing::info!(
                    loaded = report.loaded,
                    source = ?report.source,
                    "Ledger ready"
                );
                break;
            }
            LoadStep::Aborted { loaded } => {
                tracing::info!(loaded, "Ledger load cancelled");
                break;
            }
        }
    }
}
