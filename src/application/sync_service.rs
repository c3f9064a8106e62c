//! Synchronization service for remote quotes.
//!
//! Runs the `Idle -> Fetching -> Reconciling -> Idle` cycle: fetch a batch of
//! remote records, map the leading ones into quotes, append the ones not yet
//! present locally and persist the result.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::domain::{map_remote, Result, SyncConfig, SyncPhase, SyncReport, SyncState};
use crate::infrastructure::RemoteSource;

use super::quote_store::QuoteStore;

/// Result of asking for a sync cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The cycle ran to the end.
    Completed(SyncReport),
    /// Another cycle was still pending, so this one never started.
    Skipped,
    /// The cycle failed and was dropped; the collection is unchanged.
    Abandoned,
}

/// Service for merging remote quotes into the local store.
pub struct SyncService<R> {
    config: SyncConfig,
    store: Arc<Mutex<QuoteStore>>,
    remote: R,
    in_flight: AtomicBool,
    state: Mutex<SyncState>,
}

/// Clears the in-flight flag however the cycle ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R: RemoteSource> SyncService<R> {
    /// Create a new sync service over a shared store.
    #[must_use]
    pub fn new(config: SyncConfig, store: Arc<Mutex<QuoteStore>>, remote: R) -> Self {
        Self {
            config,
            store,
            remote,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Shared handle to the store this service writes into.
    #[must_use]
    pub fn store(&self) -> Arc<Mutex<QuoteStore>> {
        Arc::clone(&self.store)
    }

    /// Snapshot of the current sync state.
    pub async fn state(&self) -> SyncState {
        self.state.lock().await.clone()
    }

    /// Run one sync cycle unless another is already pending.
    ///
    /// # Errors
    /// Returns error if the fetch fails, or the stored collection cannot be
    /// read or saved. The local collection is unchanged in each case.
    pub async fn sync_once(&self) -> Result<CycleOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Sync already in flight, skipping trigger");
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = InFlight(&self.in_flight);

        match self.run_cycle().await {
            Ok(report) => {
                let mut state = self.state.lock().await;
                *state = state.clone().completed(&report);
                Ok(CycleOutcome::Completed(report))
            }
            Err(e) => {
                let mut state = self.state.lock().await;
                *state = state.clone().with_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Best-effort cycle, used by both the timer and manual triggers.
    ///
    /// Failures are logged at warn and reported as `Abandoned`, never returned.
    pub async fn tick(&self) -> CycleOutcome {
        self.sync_once().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Sync cycle abandoned");
            CycleOutcome::Abandoned
        })
    }

    /// Sync on a fixed interval until `shutdown` resolves.
    ///
    /// The first cycle runs immediately. Ticks missed while a cycle is
    /// pending are skipped rather than replayed.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = Duration::from_secs(self.config.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(
            interval_secs = period.as_secs(),
            endpoint = %self.config.endpoint,
            "Periodic sync started"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Periodic sync stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let CycleOutcome::Completed(report) = self.tick().await {
                        tracing::info!(
                            added = report.added,
                            total = report.total,
                            "Quotes synced with server"
                        );
                    }
                }
            }
        }
    }

    async fn set_phase(&self, phase: SyncPhase) {
        let mut state = self.state.lock().await;
        *state = state.clone().entering(phase);
    }

    async fn run_cycle(&self) -> Result<SyncReport> {
        let start = std::time::Instant::now();

        self.set_phase(SyncPhase::Fetching).await;
        let records = self.remote.fetch(self.config.batch_size).await?;
        let incoming = map_remote(&records, self.config.batch_size, &self.config.server_category);

        self.set_phase(SyncPhase::Reconciling).await;
        // Nothing below awaits while the store is held, so the merge and save
        // happen as one step with respect to other store users.
        let store = self.store.lock().await;
        let mut collection = store.try_load()?;
        let fetched = incoming.len();
        let outcome = collection.merge_remote(incoming);
        store.save(&collection)?;
        drop(store);

        let report = SyncReport {
            fetched,
            added: outcome.added,
            skipped: outcome.skipped,
            total: collection.len(),
            finished_at: Utc::now(),
        };

        tracing::info!(
            fetched = report.fetched,
            added = report.added,
            skipped = report.skipped,
            duration_ms = start.elapsed().as_millis(),
            "Sync completed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppError, Quote, QuoteCollection, RemoteRecord};
    use crate::infrastructure::remote::parse_records;
    use crate::infrastructure::LocalStorage;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    /// In-memory remote serving a fixed payload, optionally slowly or not at all.
    struct FakeRemote {
        body: String,
        fail: bool,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeRemote {
        fn serving(titles: &[&str]) -> Self {
            let records: Vec<serde_json::Value> = titles
                .iter()
                .enumerate()
                .map(|(id, title)| serde_json::json!({"userId": 1, "id": id + 1, "title": title}))
                .collect();
            Self::serving_body(&serde_json::Value::Array(records).to_string())
        }

        fn serving_body(body: &str) -> Self {
            Self {
                body: body.to_string(),
                fail: false,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::serving(&[])
            }
        }
    }

    #[async_trait]
    impl RemoteSource for FakeRemote {
        async fn fetch(&self, limit: usize) -> Result<Vec<RemoteRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(AppError::remote_parse(
                    serde_json::from_str::<Vec<RemoteRecord>>("{}").unwrap_err(),
                ));
            }
            parse_records(&self.body, limit)
        }
    }

    fn quote(text: &str, category: &str) -> Quote {
        Quote {
            text: text.to_string(),
            category: category.to_string(),
        }
    }

    fn service_with(local: &QuoteCollection, remote: FakeRemote) -> SyncService<FakeRemote> {
        let store = QuoteStore::with_storage(LocalStorage::open_in_memory().unwrap());
        store.save(local).unwrap();
        SyncService::new(SyncConfig::default(), Arc::new(Mutex::new(store)), remote)
    }

    async fn stored(service: &SyncService<FakeRemote>) -> QuoteCollection {
        service.store().lock().await.load()
    }

    fn completed(outcome: CycleOutcome) -> SyncReport {
        match outcome {
            CycleOutcome::Completed(report) => report,
            other => panic!("expected a completed cycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sync_appends_distinct_pairs() {
        let local = QuoteCollection::new(vec![quote("Be bold", "A")]);
        let service = service_with(&local, FakeRemote::serving(&["Be bold", "Stay curious"]));

        let report = completed(service.sync_once().await.unwrap());

        assert_eq!(report.added, 2);
        assert_eq!(report.total, 3);
        assert_eq!(
            stored(&service).await.as_slice(),
            &[
                quote("Be bold", "A"),
                quote("Be bold", "ServerQuote"),
                quote("Stay curious", "ServerQuote"),
            ]
        );
    }

    #[tokio::test]
    async fn test_sync_twice_adds_nothing_new() {
        let service = service_with(
            &QuoteCollection::defaults(),
            FakeRemote::serving(&["a", "b", "c", "d", "e"]),
        );

        service.sync_once().await.unwrap();
        let after_first = stored(&service).await;
        let second = completed(service.tick().await);

        assert_eq!(second.added, 0);
        assert_eq!(second.skipped, 5);
        assert_eq!(stored(&service).await, after_first);
    }

    #[tokio::test]
    async fn test_sync_uses_only_first_batch() {
        let service = service_with(
            &QuoteCollection::default(),
            FakeRemote::serving(&["1", "2", "3", "4", "5", "6", "7"]),
        );

        let report = completed(service.tick().await);

        assert_eq!(report.fetched, 5);
        assert!(!stored(&service).await.contains(&quote("6", "ServerQuote")));
    }

    #[tokio::test]
    async fn test_sync_ignores_malformed_records_past_batch() {
        let body = r#"[
            {"id": 1, "title": "one"}, {"id": 2, "title": "two"}, {"id": 3, "title": "three"},
            {"id": 4, "title": "four"}, {"id": 5, "title": "five"},
            {"id": 6, "body": "no title here"}
        ]"#;
        let service = service_with(&QuoteCollection::default(), FakeRemote::serving_body(body));

        let report = completed(service.tick().await);

        assert_eq!(report.added, 5);
        assert!(stored(&service).await.contains(&quote("five", "ServerQuote")));
    }

    #[tokio::test]
    async fn test_sync_keeps_remote_title_verbatim() {
        let service = service_with(&QuoteCollection::default(), FakeRemote::serving(&[" Be bold "]));

        completed(service.tick().await);

        assert_eq!(
            stored(&service).await.as_slice(),
            &[quote(" Be bold ", "ServerQuote")]
        );
    }

    #[tokio::test]
    async fn test_sync_keeps_local_prefix() {
        let local = QuoteCollection::defaults();
        let service = service_with(&local, FakeRemote::serving(&["x", "y"]));

        completed(service.tick().await);

        let after = stored(&service).await;
        assert_eq!(&after.as_slice()[..local.len()], local.as_slice());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_store_unchanged() {
        let local = QuoteCollection::defaults();
        let service = service_with(&local, FakeRemote::failing());

        assert!(service.sync_once().await.is_err());
        assert!(matches!(service.tick().await, CycleOutcome::Abandoned));

        assert_eq!(stored(&service).await, local);
        let state = service.state().await;
        assert_eq!(state.phase, SyncPhase::Idle);
        assert_eq!(state.cycles_failed, 2);
        assert!(state.last_error.is_some());
    }

    #[tokio::test]
    async fn test_failed_manual_trigger_is_not_surfaced() {
        let service = service_with(&QuoteCollection::default(), FakeRemote::serving_body("<html>"));

        // The manual trigger goes through `tick`, which has no error to return.
        let outcome = service.tick().await;

        assert!(matches!(outcome, CycleOutcome::Abandoned));
        assert!(stored(&service).await.is_empty());
        assert!(service.state().await.last_error.is_some());
    }

    #[tokio::test]
    async fn test_unreadable_store_aborts_cycle_without_overwriting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.db");
        let store = QuoteStore::open(&path).unwrap();
        store.save(&QuoteCollection::defaults()).unwrap();
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute("UPDATE storage SET value = x'00ff' WHERE key = 'quotes'", [])
            .unwrap();
        let service = SyncService::new(
            SyncConfig::default(),
            Arc::new(Mutex::new(store)),
            FakeRemote::serving(&["fresh"]),
        );

        assert!(matches!(
            service.sync_once().await,
            Err(AppError::Storage { .. })
        ));

        let raw: Vec<u8> = rusqlite::Connection::open(&path)
            .unwrap()
            .query_row("SELECT value FROM storage WHERE key = 'quotes'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(raw, vec![0x00, 0xff]);
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_skipped() {
        let mut remote = FakeRemote::serving(&["slow"]);
        remote.delay = Some(Duration::from_millis(50));
        let service = service_with(&QuoteCollection::default(), remote);

        let (first, second) = tokio::join!(service.sync_once(), service.sync_once());

        assert!(matches!(first.unwrap(), CycleOutcome::Completed(_)));
        assert!(matches!(second.unwrap(), CycleOutcome::Skipped));
        assert_eq!(service.remote.calls.load(Ordering::SeqCst), 1);

        // The flag is released once the cycle ends.
        assert!(matches!(
            service.sync_once().await.unwrap(),
            CycleOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn test_state_tracks_completed_cycles() {
        let service = service_with(&QuoteCollection::default(), FakeRemote::serving(&["one"]));

        completed(service.tick().await);

        let state = service.state().await;
        assert_eq!(state.phase, SyncPhase::Idle);
        assert_eq!(state.cycles_completed, 1);
        assert_eq!(state.quotes_added, 1);
        assert!(state.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let service = service_with(&QuoteCollection::default(), FakeRemote::serving(&["tick"]));

        service
            .run(tokio::time::sleep(Duration::from_millis(20)))
            .await;

        assert!(service.remote.calls.load(Ordering::SeqCst) >= 1);
        assert!(stored(&service).await.contains(&quote("tick", "ServerQuote")));
    }
}
