//! Remote kit catalog: HTTP client, payload validation, immutable
//! snapshots and the retry/backoff state machine that gates catalog
//! readiness.
//!
//! The network call lives in [`api::CatalogApi`]; everything else is
//! plain state so the owning service can apply fetch results on its own
//! mutation path.

pub mod api;
pub mod parse;
pub mod retry;
pub mod snapshot;
pub mod sync;

pub use api::{CatalogApi, CatalogFetchError, CatalogSource};
pub use parse::{parse_catalog_body, ParsedCatalog};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use snapshot::KitCatalog;
pub use sync::{CatalogStatus, CatalogSynchronizer, SyncOutcome};
