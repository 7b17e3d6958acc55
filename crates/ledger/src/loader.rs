//! Cooperative, batched ledger loading.
//!
//! Large documents are applied a bounded number of entries at a time so
//! the caller can release its lock and yield between batches. Each step
//! checks the cancellation token first; a cancelled load leaves the
//! ledger unmarked so claims keep refusing with "loading".

use std::collections::VecDeque;

use kitforge_core::types::{PlayerId, Timestamp, UnixSeconds};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::ledger::UsageLedger;
use crate::record::PlayerUsageRecord;
use crate::store::{DocumentSource, LedgerStore, LoadedDocument};

const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_STALE_AFTER_SECS: i64 = 10 * 24 * 3_600;

#[derive(Debug, Clone, Copy)]
pub struct LoaderOptions {
    /// Entries applied per step; `0` is treated as `1`.
    pub batch_size: usize,
    /// Records whose last activity is older than this are dropped at
    /// load. Records with no activity are kept.
    pub stale_after_secs: i64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

/// Summary of a finished load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    #[serde(skip)]
    pub source: DocumentSource,
    pub loaded: usize,
    pub skipped_null: usize,
    pub skipped_invalid: usize,
    pub skipped_stale: usize,
    /// Entries ignored because the player already had an in-memory record.
    pub skipped_existing: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStep {
    /// A batch was applied; call `step` again after yielding.
    Yield { loaded: usize, remaining: usize },
    /// Every entry has been processed and the ledger is marked loaded.
    Complete(LoadReport),
    /// The token was cancelled before the load finished.
    Aborted { loaded: usize },
}

pub struct LedgerLoader {
    pending: VecDeque<(String, Value)>,
    options: LoaderOptions,
    cutoff: UnixSeconds,
    cancel: CancellationToken,
    report: LoadReport,
    finished: bool,
}

impl LedgerLoader {
    /// Read the document behind `store` and prepare to apply it.
    ///
    /// Blocking: performs file I/O.
    pub fn open(
        store: &LedgerStore,
        options: LoaderOptions,
        now: Timestamp,
        cancel: CancellationToken,
    ) -> Self {
        let document = store.read_document(now);
        Self::from_document(document, options, now.timestamp(), cancel)
    }

    pub fn from_document(
        document: LoadedDocument,
        options: LoaderOptions,
        now: UnixSeconds,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pending: document.entries.into(),
            options: LoaderOptions {
                batch_size: options.batch_size.max(1),
                ..options
            },
            cutoff: now.saturating_sub(options.stale_after_secs),
            cancel,
            report: LoadReport {
                source: document.source,
                loaded: 0,
                skipped_null: 0,
                skipped_invalid: 0,
                skipped_stale: 0,
                skipped_existing: 0,
                batches: 0,
            },
            finished: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Apply the next batch to `ledger`.
    pub fn step(&mut self, ledger: &mut UsageLedger) -> LoadStep {
        if self.finished {
            return LoadStep::Complete(self.report.clone());
        }
        if self.cancel.is_cancelled() {
            tracing::info!(loaded = self.report.loaded, "Ledger load aborted");
            return LoadStep::Aborted {
                loaded: self.report.loaded,
            };
        }

        let take = self.options.batch_size.min(self.pending.len());
        for (key, value) in self.pending.drain(..take) {
            apply_entry(&mut self.report, self.cutoff, ledger, &key, value);
        }
        if take > 0 {
            self.report.batches += 1;
        }

        if !self.pending.is_empty() {
            return LoadStep::Yield {
                loaded: self.report.loaded,
                remaining: self.pending.len(),
            };
        }

        self.finished = true;
        ledger.mark_loaded();
        // Pruned or migrated entries must reach disk on the next save.
        if self.report.skipped_stale > 0 || self.report.source == DocumentSource::Legacy {
            ledger.mark_dirty();
        }
        tracing::info!(
            loaded = self.report.loaded,
            skipped_null = self.report.skipped_null,
            skipped_invalid = self.report.skipped_invalid,
            skipped_stale = self.report.skipped_stale,
            skipped_existing = self.report.skipped_existing,
            batches = self.report.batches,
            "Ledger load complete",
        );
        LoadStep::Complete(self.report.clone())
    }
}

fn apply_entry(
    report: &mut LoadReport,
    cutoff: UnixSeconds,
    ledger: &mut UsageLedger,
    key: &str,
    value: Value,
) {
    let Ok(player) = key.parse::<PlayerId>() else {
        tracing::warn!(key, "Skipping ledger entry with invalid player id");
        report.skipped_invalid += 1;
        return;
    };
    if value.is_null() {
        report.skipped_null += 1;
        return;
    }
    let record: PlayerUsageRecord = match serde_json::from_value(value) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(player, error = %e, "Skipping malformed ledger entry");
            report.skipped_invalid += 1;
            return;
        }
    };
    if record.last_activity > 0 && record.last_activity < cutoff {
        report.skipped_stale += 1;
        return;
    }
    if ledger.insert_loaded(player, record) {
        report.loaded += 1;
    } else {
        tracing::debug!(player, "Keeping in-memory record over stored entry");
        report.skipped_existing += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
