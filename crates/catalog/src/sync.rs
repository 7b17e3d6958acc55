//! Catalog synchronizer state.
//!
//! [`CatalogSynchronizer`] owns the current [`KitCatalog`] snapshot, the
//! readiness flag and the retry counter. It performs no I/O: the caller
//! runs [`CatalogApi::fetch`](crate::CatalogApi::fetch) off the mutation
//! path and hands the result to [`CatalogSynchronizer::apply`], which
//! either swaps in a new snapshot or tells the caller when to retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::CatalogFetchError;
use crate::parse::ParsedCatalog;
use crate::retry::{RetryDecision, RetryPolicy, RetryState};
use crate::snapshot::KitCatalog;

/// Result of applying one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new snapshot replaced the old one.
    Updated { kits: usize, skipped: usize },
    /// The fetch failed; try again after `delay`.
    RetryScheduled { attempt: u32, delay: Duration },
    /// The fetch failed and no further retry will be scheduled until a
    /// manual sync.
    Exhausted { attempts: u32 },
}

/// Point-in-time view of synchronizer health.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub ready: bool,
    /// True while the served snapshot is older than the latest failed fetch.
    pub stale: bool,
    pub kit_count: usize,
    pub last_success: Option<DateTime<Utc>>,
    pub last_skipped: usize,
    pub retry_attempt: u32,
    pub exhausted: bool,
    pub last_error: Option<String>,
}

pub struct CatalogSynchronizer {
    catalog: Arc<KitCatalog>,
    policy: RetryPolicy,
    retry: RetryState,
    /// Keep serving the last good snapshot while retries are pending.
    serve_stale: bool,
    ready: bool,
    exhausted: bool,
    last_success: Option<DateTime<Utc>>,
    last_skipped: usize,
    last_error: Option<String>,
}

impl CatalogSynchronizer {
    pub fn new(policy: RetryPolicy, serve_stale: bool) -> Self {
        Self {
            catalog: Arc::new(KitCatalog::empty()),
            policy,
            retry: RetryState::default(),
            serve_stale,
            ready: false,
            exhausted: false,
            last_success: None,
            last_skipped: 0,
            last_error: None,
        }
    }

    /// Shared handle to the current snapshot.
    pub fn catalog(&self) -> Arc<KitCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Whether claims may read the catalog.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Prepare for an operator-requested sync: the retry budget is
    /// restored so a failure schedules retries again.
    pub fn begin_manual_sync(&mut self) {
        self.retry.reset();
        self.exhausted = false;
    }

    /// Apply the result of one fetch.
    pub fn apply(
        &mut self,
        result: Result<ParsedCatalog, CatalogFetchError>,
        now: DateTime<Utc>,
    ) -> SyncOutcome {
        match result {
            Ok(parsed) => {
                let kits = parsed.kits.len();
                let skipped = parsed.skipped;
                self.catalog = Arc::new(KitCatalog::from_definitions(parsed.kits));
                self.ready = true;
                self.exhausted = false;
                self.retry.reset();
                self.last_success = Some(now);
                self.last_skipped = skipped;
                self.last_error = None;
                tracing::info!(kits, skipped, "Kit catalog updated");
                SyncOutcome::Updated { kits, skipped }
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                if !(self.serve_stale && self.last_success.is_some()) {
                    self.ready = false;
                }

                match self.retry.on_failure(&self.policy) {
                    RetryDecision::Retry { attempt, delay } => {
                        tracing::warn!(
                            error = %e,
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            delay_secs = delay.as_secs(),
                            serving_stale = self.ready,
                            "Catalog fetch failed, retry scheduled",
                        );
                        SyncOutcome::RetryScheduled { attempt, delay }
                    }
                    RetryDecision::Exhausted { attempts } => {
                        self.exhausted = true;
                        tracing::error!(
                            error = %e,
                            attempts,
                            "Catalog fetch failed, retries exhausted; manual sync required",
                        );
                        SyncOutcome::Exhausted { attempts }
                    }
                }
            }
        }
    }

    pub fn status(&self) -> CatalogStatus {
        CatalogStatus {
            ready: self.ready,
            stale: self.ready && self.last_error.is_some(),
            kit_count: self.catalog.len(),
            last_success: self.last_success,
            last_skipped: self.last_skipped,
            retry_attempt: self.retry.attempt(),
            exhausted: self.exhausted,
            last_error: self.last_error.clone(),
        }
    }
}
