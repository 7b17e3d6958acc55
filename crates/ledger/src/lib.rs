//! Per-player kit usage ledger.
//!
//! - [`UsageLedger`]: in-memory records with dirty tracking, admin
//!   overrides, staleness sweep and wipe.
//! - [`LedgerStore`]: the JSON document on disk, including legacy-shape
//!   migration, corrupt-file backup and atomic rewrites.
//! - [`LedgerLoader`]: a cooperative, batch-at-a-time loader that can be
//!   cancelled between batches.

pub mod ledger;
pub mod loader;
pub mod record;
pub mod store;

pub use ledger::{SaveOutcome, UsageLedger};
pub use loader::{LedgerLoader, LoadReport, LoadStep, LoaderOptions};
pub use record::{KitUsage, PlayerUsageRecord};
pub use store::{
    load_wipe_state, save_wipe_state, DocumentSource, LedgerStore, LedgerStoreError,
    LoadedDocument, LEDGER_FILE, WIPE_STATE_FILE,
};
