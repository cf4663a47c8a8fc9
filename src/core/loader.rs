//! Load-once coordination for the course catalog.
//!
//! The first `load()` starts a single fetch from the bridge. Callers arriving
//! while it is in flight await that same fetch, and once it succeeds every
//! later call is served from the installed snapshot. A failed load installs
//! nothing and returns the loader to `Unloaded`, so the next call fetches again.
//!
//! The loader only keeps a weak handle on the in-flight fetch. If every waiter
//! goes away before it finishes, the fetch is dropped and the next `load()`
//! starts over.

use crate::core::catalog::CourseCatalog;
use crate::core::normalize::normalize_ranges;
use crate::domain::model::WANTED_RANGES;
use crate::domain::ports::RangeFetcher;
use crate::utils::error::{CatalogError, Result};
use futures::future::{BoxFuture, FutureExt, WeakShared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::broadcast;

type LoadFuture = BoxFuture<'static, std::result::Result<Arc<CourseCatalog>, Arc<CatalogError>>>;

enum LoadState {
    Unloaded,
    // Strong handles live with the waiters; the future itself holds `Arc<Inner>`.
    Loading(WeakShared<LoadFuture>),
    Loaded(Arc<CourseCatalog>),
}

/// Observable phase of a [`CatalogLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Unloaded,
    Loading,
    Loaded,
}

struct Inner<F> {
    fetcher: F,
    sheet_id: String,
    state: Mutex<LoadState>,
    snapshot: RwLock<Arc<CourseCatalog>>,
    loaded_tx: broadcast::Sender<Arc<CourseCatalog>>,
}

/// Caller-owned catalog loader. Clones share the same state and snapshot.
pub struct CatalogLoader<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for CatalogLoader<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: RangeFetcher + 'static> CatalogLoader<F> {
    pub fn new(fetcher: F, sheet_id: impl Into<String>) -> Self {
        let (loaded_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                fetcher,
                sheet_id: sheet_id.into(),
                state: Mutex::new(LoadState::Unloaded),
                snapshot: RwLock::new(Arc::new(CourseCatalog::default())),
                loaded_tx,
            }),
        }
    }

    pub fn sheet_id(&self) -> &str {
        &self.inner.sheet_id
    }

    /// Load the catalog, fetching it at most once across all callers.
    pub async fn load(&self) -> Result<Arc<CourseCatalog>> {
        let pending = {
            let mut state = self.inner.lock_state();
            let in_flight = match &*state {
                LoadState::Loaded(catalog) => return Ok(Arc::clone(catalog)),
                LoadState::Loading(weak) => {
                    let upgraded = weak.upgrade();
                    if upgraded.is_none() {
                        tracing::debug!("Previous catalog load was abandoned, starting again");
                    }
                    upgraded
                }
                LoadState::Unloaded => None,
            };

            match in_flight {
                Some(pending) => {
                    tracing::debug!("Catalog load already in flight, waiting on it");
                    pending
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let pending = async move { inner.fetch_and_install().await }
                        .boxed()
                        .shared();
                    *state = match pending.downgrade() {
                        Some(weak) => LoadState::Loading(weak),
                        None => LoadState::Unloaded,
                    };
                    pending
                }
            }
        };

        pending.await.map_err(CatalogError::LoadFailed)
    }

    /// Current snapshot; empty until the first successful load.
    pub fn catalog(&self) -> Arc<CourseCatalog> {
        Arc::clone(
            &self
                .inner
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    pub fn phase(&self) -> LoadPhase {
        match &*self.inner.lock_state() {
            LoadState::Unloaded => LoadPhase::Unloaded,
            LoadState::Loading(weak) if weak.upgrade().is_some() => LoadPhase::Loading,
            LoadState::Loading(_) => LoadPhase::Unloaded,
            LoadState::Loaded(_) => LoadPhase::Loaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.phase() == LoadPhase::Loaded
    }

    /// Receive the snapshot once the first load succeeds.
    ///
    /// The event fires a single time; subscribing after it has fired yields nothing,
    /// so check [`is_loaded`](Self::is_loaded) first.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<CourseCatalog>> {
        self.inner.loaded_tx.subscribe()
    }
}

impl<F: RangeFetcher> Inner<F> {
    fn lock_state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_and_install(&self) -> std::result::Result<Arc<CourseCatalog>, Arc<CatalogError>> {
        tracing::debug!("Fetching ranges {:?} for sheet {}", WANTED_RANGES, self.sheet_id);

        let ranges = match self.fetcher.fetch_ranges(&self.sheet_id, &WANTED_RANGES).await {
            Ok(ranges) => ranges,
            Err(e) => {
                tracing::warn!("Catalog load for sheet {} failed: {}", self.sheet_id, e);
                *self.lock_state() = LoadState::Unloaded;
                return Err(Arc::new(e));
            }
        };

        let catalog = Arc::new(normalize_ranges(ranges));

        // Snapshot goes in before any waiter can observe success.
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&catalog);
        *self.lock_state() = LoadState::Loaded(Arc::clone(&catalog));

        tracing::info!(
            "Loaded {} courses and {} lessons from sheet {}",
            catalog.courses().len(),
            catalog.lessons().len(),
            self.sheet_id
        );

        // No subscribers is fine.
        let _ = self.loaded_tx.send(Arc::clone(&catalog));

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NamedRange, RawRow, SheetRanges};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Fetcher that counts calls and, when gated, blocks until released.
    #[derive(Clone)]
    struct MockFetcher {
        calls: Arc<AtomicUsize>,
        gate: Option<Arc<Notify>>,
        fail_first: usize,
        ranges: SheetRanges,
    }

    impl MockFetcher {
        fn new(ranges: SheetRanges) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                gate: None,
                fail_first: 0,
                ranges,
            }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn failing_first(mut self, n: usize) -> Self {
            self.fail_first = n;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RangeFetcher for MockFetcher {
        async fn fetch_ranges(&self, sheet_id: &str, wanted: &[&str]) -> Result<SheetRanges> {
            assert_eq!(sheet_id, "sheet-1");
            assert_eq!(wanted, ["courses", "lessons"]);

            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if call < self.fail_first {
                return Err(CatalogError::BridgeError {
                    message: "sheet not published".to_string(),
                });
            }
            Ok(self.ranges.clone())
        }
    }

    fn rows(values: serde_json::Value) -> NamedRange {
        serde_json::from_value::<Vec<RawRow>>(values).unwrap().into()
    }

    fn sample_ranges() -> SheetRanges {
        let mut ranges = SheetRanges::new();
        ranges.insert(
            "courses".to_string(),
            rows(json!([
                {"id": "1", "title": "Intro", "slug": "intro", "description": "basics", "category": "dev", "price": "0"},
                {"id": "2", "title": "Color", "slug": "color", "description": "palettes", "category": "design", "price": "12"}
            ])),
        );
        ranges.insert(
            "lessons".to_string(),
            rows(json!([
                {"id": "l1", "course_id": "1", "order": "2"},
                {"id": "l2", "course_id": "1", "order": "1"},
                {"id": "l3", "course_id": "1", "order": "abc"}
            ])),
        );
        ranges
    }

    #[tokio::test]
    async fn test_load_installs_snapshot() {
        let loader = CatalogLoader::new(MockFetcher::new(sample_ranges()), "sheet-1");
        assert_eq!(loader.phase(), LoadPhase::Unloaded);
        assert!(loader.catalog().is_empty());

        let catalog = loader.load().await.unwrap();

        assert!(loader.is_loaded());
        assert_eq!(catalog.courses().len(), 2);
        assert!(Arc::ptr_eq(&catalog, &loader.catalog()));

        let orders: Vec<i64> = catalog.lessons().iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![2, 1, 0]);
        let sorted: Vec<i64> = catalog.lessons_for_course("1").iter().map(|l| l.order).collect();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let fetcher = MockFetcher::new(sample_ranges());
        let loader = CatalogLoader::new(fetcher.clone(), "sheet-1");

        let first = loader.load().await.unwrap();
        let second = loader.load().await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let gate = Arc::new(Notify::new());
        let fetcher = MockFetcher::new(sample_ranges()).gated(Arc::clone(&gate));
        let loader = CatalogLoader::new(fetcher.clone(), "sheet-1");

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load().await })
            })
            .collect();

        while fetcher.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(loader.phase(), LoadPhase::Loading);
        gate.notify_one();

        let mut results = Vec::new();
        for waiter in waiters {
            results.push(waiter.await.unwrap().unwrap());
        }

        assert_eq!(fetcher.calls(), 1);
        assert!(results.iter().all(|c| Arc::ptr_eq(c, &results[0])));
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter_and_allows_retry() {
        let gate = Arc::new(Notify::new());
        let fetcher = MockFetcher::new(sample_ranges())
            .gated(Arc::clone(&gate))
            .failing_first(1);
        let loader = CatalogLoader::new(fetcher.clone(), "sheet-1");

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load().await })
            })
            .collect();

        while fetcher.calls() == 0 {
            tokio::task::yield_now().await;
        }
        // Let the remaining waiters attach to the in-flight load.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        for waiter in waiters {
            let err = waiter.await.unwrap().unwrap_err();
            assert!(matches!(err.root(), CatalogError::BridgeError { .. }));
        }
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(loader.phase(), LoadPhase::Unloaded);
        assert!(loader.catalog().courses().is_empty());

        // Retry goes back to the bridge.
        gate.notify_one();
        let catalog = loader.load().await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(catalog.courses().len(), 2);
    }

    #[tokio::test]
    async fn test_loaded_event_fires_once_after_install() {
        let loader = CatalogLoader::new(MockFetcher::new(sample_ranges()), "sheet-1");
        let mut events = loader.subscribe();

        let catalog = loader.load().await.unwrap();
        let event = events.recv().await.unwrap();
        assert!(Arc::ptr_eq(&catalog, &event));
        assert_eq!(event.categories(), vec!["design", "dev"]);

        loader.load().await.unwrap();
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_independent_instances_do_not_share_state() {
        let first = CatalogLoader::new(MockFetcher::new(sample_ranges()), "sheet-1");
        let second = CatalogLoader::new(MockFetcher::new(SheetRanges::new()), "sheet-1");

        first.load().await.unwrap();

        assert!(first.is_loaded());
        assert!(!second.is_loaded());
        assert!(second.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_loader_with_abandoned_load_is_freed() {
        let gate = Arc::new(Notify::new());
        let fetcher = MockFetcher::new(sample_ranges()).gated(gate);
        let loader = CatalogLoader::new(fetcher.clone(), "sheet-1");
        let inner = Arc::downgrade(&loader.inner);

        let timed_out = tokio::time::timeout(Duration::from_millis(20), loader.load()).await;
        assert!(timed_out.is_err());
        assert_eq!(fetcher.calls(), 1);

        drop(loader);
        assert!(inner.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_abandoned_load_restarts_on_next_call() {
        let gate = Arc::new(Notify::new());
        let fetcher = MockFetcher::new(sample_ranges()).gated(Arc::clone(&gate));
        let loader = CatalogLoader::new(fetcher.clone(), "sheet-1");

        let timed_out = tokio::time::timeout(Duration::from_millis(20), loader.load()).await;
        assert!(timed_out.is_err());
        assert_eq!(loader.phase(), LoadPhase::Unloaded);

        gate.notify_one();
        let catalog = loader.load().await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(catalog.courses().len(), 2);
        assert!(loader.is_loaded());
    }
}
