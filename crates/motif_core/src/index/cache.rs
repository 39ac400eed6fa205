//! Shared, lazily built pattern index

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use super::PatternIndex;
use crate::error::IndexBuildError;
use crate::search::SearchOptions;
use crate::store::{PatternId, PatternStore};

/// Default number of documents read at once while building
pub const DEFAULT_LOAD_CONCURRENCY: usize = 32;

type BuildResult = Result<Arc<PatternIndex>, IndexBuildError>;
type PendingBuild = Shared<BoxFuture<'static, BuildResult>>;

#[derive(Default)]
struct CacheState {
    ready: Option<Arc<PatternIndex>>,
    /// In-flight build and the generation it was started in
    pending: Option<(u64, PendingBuild)>,
    /// Bumped on every invalidation so stale builds are never published
    generation: u64,
}

/// Owns the current [`PatternIndex`] for a store.
///
/// The first caller of [`get`](Self::get) starts a build; everyone arriving
/// while it runs awaits the same shared future and receives the same `Arc`.
/// The lock only guards state transitions and is never held across an await.
pub struct PatternIndexCache {
    store: Arc<dyn PatternStore>,
    load_concurrency: usize,
    state: Mutex<CacheState>,
    builds: AtomicU64,
}

impl fmt::Debug for PatternIndexCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PatternIndexCache")
            .field("store", &self.store)
            .field("load_concurrency", &self.load_concurrency)
            .field("ready", &state.ready.is_some())
            .field("building", &state.pending.is_some())
            .field("generation", &state.generation)
            .finish()
    }
}

impl PatternIndexCache {
    pub fn new(store: Arc<dyn PatternStore>) -> Self {
        Self {
            store,
            load_concurrency: DEFAULT_LOAD_CONCURRENCY,
            state: Mutex::new(CacheState::default()),
            builds: AtomicU64::new(0),
        }
    }

    pub fn with_load_concurrency(mut self, load_concurrency: usize) -> Self {
        self.load_concurrency = load_concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn PatternStore> {
        &self.store
    }

    /// Number of builds started over the cache's lifetime
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }

    /// The published index, if one is ready. Never starts a build.
    pub fn peek(&self) -> Option<Arc<PatternIndex>> {
        self.state.lock().ready.clone()
    }

    /// Get the current index, building it if needed.
    pub async fn get(&self) -> BuildResult {
        let (generation, build) = {
            let mut state = self.state.lock();
            if let Some(index) = &state.ready {
                return Ok(Arc::clone(index));
            }
            match &state.pending {
                Some((generation, build)) => (*generation, build.clone()),
                None => {
                    let generation = state.generation;
                    let build = self.start_build();
                    state.pending = Some((generation, build.clone()));
                    (generation, build)
                }
            }
        };

        let result = build.await;

        let mut state = self.state.lock();
        if state.generation == generation {
            // First waiter back publishes; the rest find `pending` already gone
            if state
                .pending
                .as_ref()
                .is_some_and(|(pending, _)| *pending == generation)
            {
                state.pending = None;
            }
            if let Ok(index) = &result {
                if state.ready.is_none() {
                    state.ready = Some(Arc::clone(index));
                }
            }
        } else {
            tracing::debug!(generation, "Discarding index built before invalidation");
        }
        result
    }

    /// Throw away the current index and build a fresh one.
    pub async fn build(&self) -> BuildResult {
        self.invalidate();
        self.get().await
    }

    /// Drop the published index and any in-flight build.
    ///
    /// Callers already awaiting a build still get its result, but that result
    /// is never published.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.ready = None;
        state.pending = None;
        state.generation += 1;
        tracing::debug!(generation = state.generation, "Pattern index invalidated");
    }

    /// Indexed search. Same results as [`crate::search::search_patterns`],
    /// returned as sorted ids.
    pub async fn search_fast(
        &self,
        options: &SearchOptions,
    ) -> Result<Vec<PatternId>, IndexBuildError> {
        Ok(self.get().await?.search(options))
    }

    fn start_build(&self) -> PendingBuild {
        let build = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(build, "Starting pattern index build");
        let store = Arc::clone(&self.store);
        let load_concurrency = self.load_concurrency;
        async move {
            PatternIndex::build(store.as_ref(), load_concurrency)
                .await
                .map(Arc::new)
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, Result as CoreResult};
    use crate::pattern::{Category, Framework, PatternRecord};
    use crate::store::FsPatternStore;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tempfile::TempDir;

    fn grid(name: &str) -> PatternRecord {
        PatternRecord::new(
            name,
            Category::Layout,
            ["grid"],
            [Framework::React],
            ["Align to the grid"],
        )
    }

    /// Store wrapper that slows down listing and can be told to fail it
    #[derive(Debug)]
    struct SlowStore {
        inner: FsPatternStore,
        fail_list: AtomicBool,
    }

    #[async_trait]
    impl PatternStore for SlowStore {
        async fn save(&self, record: &PatternRecord) -> CoreResult<PatternId> {
            self.inner.save(record).await
        }

        async fn load(&self, id: &PatternId) -> CoreResult<PatternRecord> {
            self.inner.load(id).await
        }

        async fn delete(&self, id: &PatternId) -> CoreResult<()> {
            self.inner.delete(id).await
        }

        async fn list(&self, category: Option<Category>) -> CoreResult<Vec<PatternId>> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(CoreError::io(
                    self.inner.root(),
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                ));
            }
            self.inner.list(category).await
        }

        fn location(&self) -> String {
            self.inner.location()
        }
    }

    async fn slow_store(names: &[&str]) -> (TempDir, Arc<SlowStore>) {
        let dir = TempDir::new().unwrap();
        let inner = FsPatternStore::new(dir.path());
        for name in names {
            inner.save(&grid(name)).await.unwrap();
        }
        let store = Arc::new(SlowStore {
            inner,
            fail_list: AtomicBool::new(false),
        });
        (dir, store)
    }

    #[tokio::test]
    async fn concurrent_gets_share_one_build() {
        let (_dir, store) = slow_store(&["Card Grid", "Photo Grid"]).await;
        let cache = PatternIndexCache::new(store);

        let results = futures::future::join_all((0..10).map(|_| cache.get())).await;
        let indexes: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(cache.builds(), 1);
        assert!(indexes.iter().all(|i| Arc::ptr_eq(i, &indexes[0])));
        assert_eq!(indexes[0].len(), 2);

        // Later calls reuse the published index
        let again = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&again, &indexes[0]));
        assert_eq!(cache.builds(), 1);
    }

    #[tokio::test]
    async fn concurrent_gets_across_tasks_share_one_build() {
        let (_dir, store) = slow_store(&["Card Grid"]).await;
        let cache = Arc::new(PatternIndexCache::new(store));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await })
            })
            .collect();
        let mut indexes = Vec::new();
        for handle in handles {
            indexes.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(cache.builds(), 1);
        assert!(indexes.iter().all(|i| Arc::ptr_eq(i, &indexes[0])));
    }

    #[tokio::test]
    async fn rebuild_is_idempotent() {
        let (_dir, store) = slow_store(&["Card Grid", "Photo Grid", "Hero Grid"]).await;
        let cache = PatternIndexCache::new(store);

        let first = cache.build().await.unwrap();
        let second = cache.build().await.unwrap();
        assert_eq!(cache.builds(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.by_id, second.by_id);
        assert_eq!(first.by_tag, second.by_tag);
        assert_eq!(first.by_category, second.by_category);
        assert_eq!(first.by_framework, second.by_framework);
    }

    #[tokio::test]
    async fn invalidation_picks_up_new_records() {
        let (_dir, store) = slow_store(&["Card Grid"]).await;
        let cache = PatternIndexCache::new(store.clone());
        assert_eq!(cache.get().await.unwrap().len(), 1);

        store.save(&grid("Photo Grid")).await.unwrap();
        assert_eq!(cache.get().await.unwrap().len(), 1);

        cache.invalidate();
        assert!(cache.peek().is_none());
        assert_eq!(cache.get().await.unwrap().len(), 2);
        assert_eq!(cache.builds(), 2);
    }

    #[tokio::test]
    async fn build_in_flight_during_invalidation_is_not_published() {
        let (_dir, store) = slow_store(&["Card Grid"]).await;
        let cache = PatternIndexCache::new(store);

        let (stale, ()) = tokio::join!(cache.get(), async {
            tokio::task::yield_now().await;
            cache.invalidate();
        });
        assert_eq!(stale.unwrap().len(), 1);
        assert!(cache.peek().is_none());

        cache.get().await.unwrap();
        assert_eq!(cache.builds(), 2);
        assert!(cache.peek().is_some());
    }

    #[tokio::test]
    async fn enumeration_failure_is_not_cached() {
        let (_dir, store) = slow_store(&["Card Grid"]).await;
        store.fail_list.store(true, Ordering::SeqCst);
        let cache = PatternIndexCache::new(store.clone());

        let err = cache.get().await.unwrap_err();
        assert!(matches!(err, IndexBuildError::Enumerate { .. }));
        assert!(cache.peek().is_none());

        store.fail_list.store(false, Ordering::SeqCst);
        let index = cache.get().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(cache.builds(), 2);
    }

    #[tokio::test]
    async fn search_fast_builds_on_demand() {
        let (_dir, store) = slow_store(&["Card Grid"]).await;
        let cache = PatternIndexCache::new(store).with_load_concurrency(0);
        let ids = cache
            .search_fast(&SearchOptions::new().tag("GRID"))
            .await
            .unwrap();
        assert_eq!(ids, vec![PatternId::from("layout/card-grid.yaml")]);
        assert_eq!(cache.builds(), 1);
    }
}
