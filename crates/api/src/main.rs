use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kitforge_api::background::{self, catalog_sync::SyncTrigger};
use kitforge_api::config::ServerConfig;
use kitforge_api::router::build_app_router;
use kitforge_api::service::KitService;
use kitforge_api::state::AppState;
use kitforge_catalog::CatalogApi;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kitforge_api=debug,kitforge_claims=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_dir = %config.service.data_dir.display(),
        "Loaded server configuration"
    );

    // --- Catalog client ---
    let catalog_api = Arc::new(
        CatalogApi::new(
            config.catalog.url.clone(),
            config.catalog.token.clone(),
            config.catalog.category_id.clone(),
            config.catalog.timeout(),
        )
        .expect("Failed to build catalog HTTP client"),
    );

    // --- Kit service ---
    let service = KitService::new(&config.service).shared();
    let store = service.lock().await.store().clone();

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let (sync_trigger, sync_rx) = SyncTrigger::channel();

    let sync_handle = tokio::spawn(background::catalog_sync::run(
        Arc::clone(&catalog_api),
        Arc::clone(&service),
        sync_rx,
        cancel.clone(),
    ));
    let load_handle = tokio::spawn(background::ledger_load::run(
        Arc::clone(&service),
        store,
        config.service.loader_options(),
        cancel.clone(),
    ));
    let autosave_handle = tokio::spawn(background::autosave::run(
        Arc::clone(&service),
        config.service.autosave_interval(),
        cancel.clone(),
    ));
    let sweep_handle = tokio::spawn(background::sweep::run(
        Arc::clone(&service),
        config.service.sweep_interval(),
        cancel.clone(),
    ));
    tracing::info!("Background tasks started (catalog sync, ledger load, autosave, sweep)");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        service: Arc::clone(&service),
        sync_trigger,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(grace, sync_handle).await;
    let _ = tokio::time::timeout(grace, load_handle).await;
    let _ = tokio::time::timeout(grace, sweep_handle).await;
    // Autosave performs the final save before exiting.
    if tokio::time::timeout(grace, autosave_handle).await.is_err() {
        tracing::warn!("Final ledger save did not finish in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
