//! Catalog sync driver.
//!
//! Fetches once at startup, then only when a retry is scheduled or an
//! operator asks for a sync. A manual request supersedes any pending
//! retry timer and restores the retry budget. At most one timer exists at
//! a time because the delay lives in a single local.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kitforge_catalog::{CatalogSource, SyncOutcome};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::service::SharedService;

/// Sending half of the manual sync channel.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    tx: mpsc::Sender<()>,
}

impl SyncTrigger {
    /// Create a trigger and the receiver the driver listens on. Requests
    /// made while one is already pending are coalesced.
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// Request a sync. Returns `false` when the driver is gone.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }
}

async fn wait_for(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

/// Run the sync driver until `cancel` is triggered.
pub async fn run<S: CatalogSource>(
    api: Arc<S>,
    service: SharedService,
    mut trigger: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    tracing::info!(endpoint = %api.endpoint(), "Catalog sync driver started");

    let mut next_fetch = Some(Duration::ZERO);
    let mut trigger_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            request = trigger.recv(), if trigger_open => match request {
                Some(()) => {
                    tracing::info!("Manual catalog sync requested");
                    service.lock().await.begin_manual_sync();
                }
                None => {
                    trigger_open = false;
                    continue;
                }
            },
            () = wait_for(next_fetch) => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.fetch() => result,
        };

        let outcome = service.lock().await.apply_catalog_fetch(result, Utc::now());
        next_fetch = match outcome {
            SyncOutcome::RetryScheduled { delay, .. } => Some(delay),
            SyncOutcome::Updated { .. } | SyncOutcome::Exhausted { .. } => None,
        };
    }

    tracing::info!("Catalog sync driver stopping");
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::extract::State;
    use axum::routing::get;
    use axum::Router;
    use kitforge_catalog::{CatalogApi, CatalogFetchError, ParsedCatalog};
    use tokio::task::JoinHandle;
    use tokio::time::Instant;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::service::KitService;

    /// Source whose every fetch fails, remembering when it was asked.
    struct FailingSource {
        started: Instant,
        calls: Mutex<Vec<u64>>,
    }

    impl FailingSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: Instant::now(),
                calls: Mutex::new(Vec::new()),
            })
        }

        /// Whole seconds since creation at which each fetch happened.
        fn call_times(&self) -> Vec<u64> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CatalogSource for FailingSource {
        fn endpoint(&self) -> &str {
            "test://catalog"
        }

        async fn fetch(&self) -> Result<ParsedCatalog, CatalogFetchError> {
            let at = self.started.elapsed().as_secs();
            self.calls.lock().unwrap().push(at);
            Err(CatalogFetchError::EmptyBody)
        }
    }

    struct Driver {
        service: SharedService,
        trigger: SyncTrigger,
        cancel: CancellationToken,
        handle: JoinHandle<()>,
        _dir: tempfile::TempDir,
    }

    fn spawn_driver<S: CatalogSource + 'static>(
        source: Arc<S>,
        retry_base_secs: u64,
        retry_max_attempts: u32,
    ) -> Driver {
        let dir = tempfile::tempdir().unwrap();
        let service = KitService::new(&ServiceConfig {
            data_dir: dir.path().to_path_buf(),
            retry_base_secs,
            retry_max_attempts,
            ..Default::default()
        })
        .shared();
        let (trigger, rx) = SyncTrigger::channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(source, Arc::clone(&service), rx, cancel.clone()));
        Driver {
            service,
            trigger,
            cancel,
            handle,
            _dir: dir,
        }
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    // -- trigger --------------------------------------------------------------

    #[tokio::test]
    async fn requests_coalesce_while_pending() {
        let (trigger, mut rx) = SyncTrigger::channel();
        assert!(trigger.request());
        assert!(trigger.request());
        assert_eq!(rx.recv().await, Some(()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn request_fails_once_driver_is_gone() {
        let (trigger, rx) = SyncTrigger::channel();
        drop(rx);
        assert!(!trigger.request());
    }

    // -- retry timing ---------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn exhausted_driver_waits_for_manual_sync() {
        let source = FailingSource::new();
        let driver = spawn_driver(Arc::clone(&source), 5, 2);

        advance(3_600).await;
        assert_eq!(source.call_times(), vec![0, 5, 15]);
        assert!(driver.service.lock().await.catalog_status().exhausted);

        // Nothing is scheduled once retries are exhausted.
        advance(3_600).await;
        assert_eq!(source.call_times().len(), 3);

        assert!(driver.trigger.request());
        advance(3_600).await;
        assert_eq!(source.call_times(), vec![0, 5, 15, 7_200, 7_205, 7_215]);

        driver.cancel.cancel();
        driver.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn manual_sync_replaces_pending_retry_timer() {
        let source = FailingSource::new();
        let driver = spawn_driver(Arc::clone(&source), 60, 5);

        advance(10).await;
        assert_eq!(source.call_times(), vec![0]);

        assert!(driver.trigger.request());
        // The startup retry would have fired at 60s.
        advance(55).await;
        assert_eq!(source.call_times(), vec![0, 10]);
        assert_eq!(driver.service.lock().await.catalog_status().retry_attempt, 1);

        advance(10).await;
        assert_eq!(source.call_times(), vec![0, 10, 70]);

        driver.cancel.cancel();
        driver.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_retry_sleep() {
        let source = FailingSource::new();
        let driver = spawn_driver(Arc::clone(&source), 600, 5);

        advance(1).await;
        assert_eq!(source.call_times(), vec![0]);

        driver.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), driver.handle)
            .await
            .expect("driver should stop without waiting out the retry delay")
            .unwrap();

        advance(3_600).await;
        assert_eq!(source.call_times(), vec![0]);
    }

    // -- over HTTP ------------------------------------------------------------

    async fn count_and_serve(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
        hits.fetch_add(1, Ordering::SeqCst);
        r#"[{"Name":"Starter"},{"Name":"Medic","Cooldown":60}]"#
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn fetches_once_at_startup_and_again_on_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/api/kits", get(count_and_serve))
            .with_state(Arc::clone(&hits));
        let addr = serve(router).await;
        let api = Arc::new(
            CatalogApi::new(
                format!("http://{addr}/api/kits"),
                "token".into(),
                "7".into(),
                Duration::from_secs(5),
            )
            .unwrap(),
        );
        let driver = spawn_driver(api, 5, 5);

        wait_until(|| hits.load(Ordering::SeqCst) == 1).await;
        wait_until(|| {
            driver
                .service
                .try_lock()
                .is_ok_and(|service| service.catalog_status().ready)
        })
        .await;
        assert_eq!(driver.service.lock().await.catalog_status().kit_count, 2);

        // No polling after a successful fetch.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(driver.trigger.request());
        wait_until(|| hits.load(Ordering::SeqCst) == 2).await;

        driver.cancel.cancel();
        driver.handle.await.unwrap();
    }
}
