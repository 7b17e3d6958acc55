use std::sync::Arc;

use crate::background::catalog_sync::SyncTrigger;
use crate::config::ServerConfig;
use crate::service::SharedService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc` or a channel.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Catalog, ledger and claim state.
    pub service: SharedService,
    /// Wakes the catalog sync driver for an operator-requested fetch.
    pub sync_trigger: SyncTrigger,
}
