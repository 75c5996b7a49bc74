//! Batched, deduplicating object loader
//!
//! Every keyed fetch in a context goes through one [`PentLoader`]. Loads that
//! arrive before the current window closes share one `fetch_objects` call, and
//! a load for an identifier already in flight joins that flight instead of
//! asking again.
//!
//! The window is run by a spawned task that waits for the next scheduler
//! yield (or the configured delay), takes the window's identifiers and
//! dispatches them. Waiters hold a shared handle on that task's result. Loader
//! state sits behind a mutex that is never held across an await.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

use crate::config::LoaderConfig;
use crate::domain::GraphStore;
use crate::error::{PentError, PentResult};
use crate::pent::PentObject;
use crate::registry::TypeRegistry;

type BatchOutput = Result<Arc<HashMap<Uuid, Option<PentObject>>>, PentError>;
type BatchFuture = Shared<BoxFuture<'static, BatchOutput>>;

/// Counters for one loader's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Loads answered from the cache or by joining an in-flight batch
    pub hits: u64,
    /// Loads that queued an identifier for fetching
    pub misses: u64,
    /// Calls made to `fetch_objects`
    pub batches: u64,
    /// Identifiers sent across all batches
    pub fetched_ids: u64,
}

enum CacheEntry {
    Resolved(Option<PentObject>),
    Pending { batch: u64, future: BatchFuture },
}

struct OpenWindow {
    batch: u64,
    future: BatchFuture,
}

#[derive(Default)]
struct LoaderState {
    cache: HashMap<Uuid, CacheEntry>,
    open: Option<OpenWindow>,
    queued: HashMap<u64, Vec<Uuid>>,
    next_batch: u64,
    stats: LoaderStats,
}

enum Lookup {
    Ready(Option<PentObject>),
    Waiting(BatchFuture),
}

impl Lookup {
    async fn resolve(self, obj_id: Uuid) -> PentResult<Option<PentObject>> {
        match self {
            Lookup::Ready(object) => Ok(object),
            Lookup::Waiting(future) => {
                let objects = future.await?;
                Ok(objects.get(&obj_id).cloned().flatten())
            }
        }
    }
}

/// Request-scoped cache and batch dispatcher.
///
/// Owned by exactly one [`PentContext`](crate::PentContext). Requires a tokio
/// runtime, since each batch window runs as a task.
pub struct PentLoader {
    state: Arc<Mutex<LoaderState>>,
    store: Arc<dyn GraphStore>,
    registry: Arc<TypeRegistry>,
    config: LoaderConfig,
}

impl PentLoader {
    pub fn new(
        store: Arc<dyn GraphStore>,
        registry: Arc<TypeRegistry>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(LoaderState::default())),
            store,
            registry,
            config,
        }
    }

    /// Load one object. A cached result returns without suspending.
    pub async fn load(&self, obj_id: Uuid) -> PentResult<Option<PentObject>> {
        self.enqueue(obj_id).resolve(obj_id).await
    }

    /// Load many objects, returned in the order asked for, duplicates
    /// included. All uncached identifiers join the current window before
    /// anything is awaited.
    #[instrument(skip(self, obj_ids), fields(count = obj_ids.len()))]
    pub async fn load_many(&self, obj_ids: &[Uuid]) -> PentResult<Vec<Option<PentObject>>> {
        let lookups: Vec<Lookup> = obj_ids.iter().map(|id| self.enqueue(*id)).collect();
        futures::future::try_join_all(
            lookups
                .into_iter()
                .zip(obj_ids.iter().copied())
                .map(|(lookup, obj_id)| lookup.resolve(obj_id)),
        )
        .await
    }

    /// Evict `obj_id`, resolved or pending. The next load fetches it again.
    ///
    /// Callers already waiting on an in-flight batch still get that batch's
    /// result, but it is not written back to the cache.
    pub fn clear(&self, obj_id: Uuid) -> bool {
        let removed = self.state.lock().cache.remove(&obj_id).is_some();
        debug!(%obj_id, removed, "Cleared loader entry");
        removed
    }

    /// Whether a resolved entry is cached for `obj_id`.
    pub fn is_cached(&self, obj_id: Uuid) -> bool {
        matches!(
            self.state.lock().cache.get(&obj_id),
            Some(CacheEntry::Resolved(_))
        )
    }

    pub fn stats(&self) -> LoaderStats {
        self.state.lock().stats
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn enqueue(&self, obj_id: Uuid) -> Lookup {
        let mut state = self.state.lock();

        match state.cache.get(&obj_id) {
            Some(CacheEntry::Resolved(object)) => {
                let object = object.clone();
                state.stats.hits += 1;
                trace!(%obj_id, "Loader cache hit");
                return Lookup::Ready(object);
            }
            Some(CacheEntry::Pending { future, .. }) => {
                let future = future.clone();
                state.stats.hits += 1;
                trace!(%obj_id, "Joined in-flight load");
                return Lookup::Waiting(future);
            }
            None => {}
        }

        let window = match state.open.take() {
            Some(window) => window,
            None => self.open_window(&mut state),
        };
        let batch = window.batch;
        let future = window.future.clone();

        let queued = state.queued.entry(batch).or_default();
        if !queued.contains(&obj_id) {
            queued.push(obj_id);
        }
        let full = queued.len() >= self.config.batch_limit();
        if !full {
            state.open = Some(window);
        }

        state.stats.misses += 1;
        state.cache.insert(
            obj_id,
            CacheEntry::Pending {
                batch,
                future: future.clone(),
            },
        );
        Lookup::Waiting(future)
    }

    fn open_window(&self, state: &mut LoaderState) -> OpenWindow {
        let batch = state.next_batch;
        state.next_batch += 1;

        let task = tokio::spawn(run_batch(
            batch,
            Arc::downgrade(&self.state),
            Arc::clone(&self.store),
            Arc::clone(&self.registry),
            self.config.clone(),
        ));
        let future = async move {
            match task.await {
                Ok(output) => output,
                Err(e) => Err(PentError::BatchAborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        trace!(batch, "Opened batch window");
        OpenWindow { batch, future }
    }
}

impl std::fmt::Debug for PentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PentLoader")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

async fn run_batch(
    batch: u64,
    state: Weak<Mutex<LoaderState>>,
    store: Arc<dyn GraphStore>,
    registry: Arc<TypeRegistry>,
    config: LoaderConfig,
) -> BatchOutput {
    match config.batch_delay() {
        Some(delay) => tokio::time::sleep(delay).await,
        None => tokio::task::yield_now().await,
    }

    let ids = {
        let state = state
            .upgrade()
            .ok_or_else(|| PentError::BatchAborted("loader dropped".to_string()))?;
        let mut state = state.lock();
        if state.open.as_ref().map(|w| w.batch) == Some(batch) {
            state.open = None;
        }
        let mut seen = HashSet::new();
        let mut ids = state.queued.remove(&batch).unwrap_or_default();
        ids.retain(|id| seen.insert(*id));
        ids
    };

    debug!(batch, size = ids.len(), "Dispatching batch");
    let result = fetch_batch(&ids, store.as_ref(), &registry).await;

    let state = state
        .upgrade()
        .ok_or_else(|| PentError::BatchAborted("loader dropped".to_string()))?;
    let mut state = state.lock();
    state.stats.batches += 1;
    state.stats.fetched_ids += ids.len() as u64;

    for obj_id in &ids {
        let ours = matches!(
            state.cache.get(obj_id),
            Some(CacheEntry::Pending { batch: b, .. }) if *b == batch
        );
        if !ours {
            continue;
        }
        match &result {
            Ok(objects) if config.cache_enabled => {
                let object = objects.get(obj_id).cloned().flatten();
                state.cache.insert(*obj_id, CacheEntry::Resolved(object));
            }
            _ => {
                state.cache.remove(obj_id);
            }
        }
    }

    if let Err(e) = &result {
        warn!(batch, error = %e, "Batch failed");
    }
    result.map(Arc::new)
}

async fn fetch_batch(
    ids: &[Uuid],
    store: &dyn GraphStore,
    registry: &TypeRegistry,
) -> PentResult<HashMap<Uuid, Option<PentObject>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let records = store.fetch_objects(ids).await?;

    let mut objects = HashMap::with_capacity(ids.len());
    for (obj_id, record) in records {
        let object = match record {
            Some(record) if !record.is_empty() => {
                Some(PentObject::from_record(registry, obj_id, record)?)
            }
            _ => None,
        };
        objects.insert(obj_id, object);
    }
    Ok(objects)
}
