//! # Query Cache
//!
//! Per-key memory of what the backend last said.
//!
//! ## Entry State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One Cache Entry                                  │
//! │                                                                         │
//! │  ┌──────┐  fetch   ┌─────────┐  ok    ┌──────────┐                     │
//! │  │ Idle │ ───────► │ Pending │ ─────► │ Resolved │                     │
//! │  └──────┘          └────┬────┘        └────┬─────┘                     │
//! │                         │ err              │ stale / invalidated        │
//! │                         ▼                  │ + fetch                    │
//! │                    ┌────────┐              │                            │
//! │                    │ Failed │ ─── fetch ───┴───► Pending                │
//! │                    └────────┘                                           │
//! │                                                                         │
//! │  SINGLE FLIGHT                                                         │
//! │  ─────────────                                                         │
//! │  While Pending, every caller joins the same shared future.              │
//! │                                                                         │
//! │  GENERATIONS                                                           │
//! │  ───────────                                                           │
//! │  invalidate() and clear() draw a new generation from a cache-wide      │
//! │  counter that only grows, and detach the in-flight request. A response  │
//! │  is written back only if the generation it was started under is still  │
//! │  current, so an old answer can never overwrite data fetched after a     │
//! │  mutation or a clear.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use stockbook_core::EntityKind;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{QueryError, QueryResult};

/// A fetch that several callers can await.
pub type SharedFetch = Shared<BoxFuture<'static, QueryResult<Arc<Value>>>>;

// =============================================================================
// Cache Key
// =============================================================================

/// `(kind)` for a collection, `(kind, id)` for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub id: Option<String>,
}

impl CacheKey {
    pub fn collection(kind: EntityKind) -> Self {
        CacheKey { kind, id: None }
    }

    pub fn entity(kind: EntityKind, id: impl Into<String>) -> Self {
        CacheKey {
            kind,
            id: Some(id.into()),
        }
    }

    /// Backend path this key is fetched from.
    pub fn path(&self) -> String {
        match &self.id {
            Some(id) => self.kind.entity_path(id),
            None => self.kind.collection_path(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

// =============================================================================
// Snapshots
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// A request is in flight.
    Pending,
    /// Last request succeeded.
    Resolved,
    /// Last request failed.
    Failed,
}

/// Read-only view of one entry.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub status: QueryStatus,
    /// Last successfully fetched value (kept across later failures).
    pub data: Option<Arc<Value>>,
    pub error: Option<QueryError>,
    /// True when the next fetch will go to the network.
    pub is_stale: bool,
}

impl QueryState {
    fn idle() -> Self {
        QueryState {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_stale: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Failed
    }
}

// =============================================================================
// Cache Entry
// =============================================================================

#[derive(Default)]
struct CacheEntry {
    value: Option<Arc<Value>>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<SharedFetch>,
    error: Option<QueryError>,
    generation: u64,
}

impl CacheEntry {
    fn is_stale(&self, stale_time: Duration) -> bool {
        if self.invalidated || self.error.is_some() {
            return true;
        }
        match self.fetched_at {
            Some(at) => at.elapsed() >= stale_time,
            None => true,
        }
    }

    fn status(&self) -> QueryStatus {
        if self.in_flight.is_some() {
            QueryStatus::Pending
        } else if self.error.is_some() {
            QueryStatus::Failed
        } else if self.value.is_some() {
            QueryStatus::Resolved
        } else {
            QueryStatus::Idle
        }
    }
}

/// What the cache has for a key right now.
pub(crate) enum Lookup {
    /// Fresh value; no request needed.
    Hit(Arc<Value>),
    /// A request is running (possibly just started); await it.
    InFlight(SharedFetch),
}

/// Entries plus the counter every generation is drawn from.
#[derive(Default)]
struct Entries {
    map: HashMap<CacheKey, CacheEntry>,
    epoch: u64,
}

impl Entries {
    fn next_generation(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

// =============================================================================
// Query Cache
// =============================================================================

/// The process-wide entry store. Construct once and share through an `Arc`.
pub struct QueryCache {
    entries: Mutex<Entries>,
    stale_time: Duration,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        QueryCache {
            entries: Mutex::new(Entries::default()),
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Returns a fresh value, joins the running request, or starts one.
    ///
    /// `start` receives the generation the new request belongs to and runs
    /// under the cache lock, so two callers can never both start a request
    /// for the same key.
    pub(crate) fn lookup_or_start(
        &self,
        key: &CacheKey,
        start: impl FnOnce(u64) -> SharedFetch,
    ) -> Lookup {
        let mut entries = self.entries.lock().expect("query cache mutex poisoned");
        let Entries { map, epoch } = &mut *entries;
        let entry = map.entry(key.clone()).or_insert_with(|| CacheEntry {
            generation: *epoch,
            ..CacheEntry::default()
        });

        if let Some(fetch) = &entry.in_flight {
            debug!(%key, "Joining in-flight request");
            return Lookup::InFlight(fetch.clone());
        }

        if !entry.is_stale(self.stale_time) {
            if let Some(value) = &entry.value {
                debug!(%key, "Cache hit");
                return Lookup::Hit(value.clone());
            }
        }

        debug!(%key, generation = entry.generation, "Cache miss, starting request");
        let fetch = start(entry.generation);
        entry.in_flight = Some(fetch.clone());
        Lookup::InFlight(fetch)
    }

    /// Records the outcome of a request started under `generation`.
    ///
    /// Returns false, leaving the entry untouched, when the entry was
    /// invalidated or cleared since the request started.
    pub(crate) fn complete(
        &self,
        key: &CacheKey,
        generation: u64,
        result: &QueryResult<Arc<Value>>,
    ) -> bool {
        let mut entries = self.entries.lock().expect("query cache mutex poisoned");
        let Some(entry) = entries.map.get_mut(key) else {
            debug!(%key, "Dropping response for cleared entry");
            return false;
        };
        if entry.generation != generation {
            debug!(%key, generation, current = entry.generation, "Dropping superseded response");
            return false;
        }

        entry.in_flight = None;
        match result {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.fetched_at = Some(Instant::now());
                entry.invalidated = false;
                entry.error = None;
            }
            Err(err) => {
                entry.error = Some(err.clone());
            }
        }
        true
    }

    /// Marks one entry stale and detaches its in-flight request.
    pub fn invalidate(&self, key: &CacheKey) {
        let mut entries = self.entries.lock().expect("query cache mutex poisoned");
        let generation = entries.next_generation();
        if let Some(entry) = entries.map.get_mut(key) {
            Self::invalidate_entry(key, entry, generation);
        }
    }

    /// Invalidates the collection and every entity entry of a kind.
    pub fn invalidate_kind(&self, kind: EntityKind) {
        let mut entries = self.entries.lock().expect("query cache mutex poisoned");
        let generation = entries.next_generation();
        for (key, entry) in entries.map.iter_mut().filter(|(k, _)| k.kind == kind) {
            Self::invalidate_entry(key, entry, generation);
        }
    }

    fn invalidate_entry(key: &CacheKey, entry: &mut CacheEntry, generation: u64) {
        entry.generation = generation;
        entry.invalidated = true;
        entry.in_flight = None;
        debug!(%key, generation = entry.generation, "Invalidated");
    }

    /// Drops every entry. Running requests finish but are not recorded.
    ///
    /// Entries recreated afterwards start at a generation no earlier request
    /// holds.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("query cache mutex poisoned");
        let dropped = entries.map.len();
        entries.map.clear();
        let epoch = entries.next_generation();
        debug!(dropped, epoch, "Query cache cleared");
    }

    /// Snapshot of one entry without issuing a request.
    pub fn state(&self, key: &CacheKey) -> QueryState {
        let entries = self.entries.lock().expect("query cache mutex poisoned");
        match entries.map.get(key) {
            Some(entry) => QueryState {
                status: entry.status(),
                data: entry.value.clone(),
                error: entry.error.clone(),
                is_stale: entry.is_stale(self.stale_time),
            },
            None => QueryState::idle(),
        }
    }

    /// Number of entries (including idle ones created by lookups).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("query cache mutex poisoned").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        QueryCache::new(Duration::from_secs(300))
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("stale_time", &self.stale_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    fn ready(value: Value) -> SharedFetch {
        let value = Arc::new(value);
        async move { Ok(value) }.boxed().shared()
    }

    fn start_and_complete(cache: &QueryCache, key: &CacheKey, value: Value) -> u64 {
        let mut started = None;
        cache.lookup_or_start(key, |generation| {
            started = Some(generation);
            ready(value.clone())
        });
        let generation = started.unwrap();
        assert!(cache.complete(key, generation, &Ok(Arc::new(value))));
        generation
    }

    #[test]
    fn test_key_paths() {
        assert_eq!(CacheKey::collection(EntityKind::Products).path(), "/products");
        assert_eq!(CacheKey::entity(EntityKind::Sales, "s1").path(), "/sales/s1");
        assert_eq!(CacheKey::entity(EntityKind::Sales, "s1").to_string(), "sales/s1");
    }

    #[test]
    fn test_unknown_key_is_idle() {
        let cache = QueryCache::default();
        let state = cache.state(&CacheKey::collection(EntityKind::Products));
        assert_eq!(state.status, QueryStatus::Idle);
        assert!(state.data.is_none());
        assert!(state.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_lookup_joins_in_flight() {
        let cache = QueryCache::default();
        let key = CacheKey::entity(EntityKind::Products, "p1");

        let mut starts = 0;
        cache.lookup_or_start(&key, |_| {
            starts += 1;
            ready(json!({}))
        });
        let second = cache.lookup_or_start(&key, |_| {
            starts += 1;
            ready(json!({}))
        });

        assert_eq!(starts, 1);
        assert!(matches!(second, Lookup::InFlight(_)));
        assert!(cache.state(&key).is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_value_is_a_hit_until_stale() {
        let cache = QueryCache::new(Duration::from_secs(300));
        let key = CacheKey::collection(EntityKind::Platforms);
        start_and_complete(&cache, &key, json!([1]));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(matches!(
            cache.lookup_or_start(&key, |_| ready(json!([2]))),
            Lookup::Hit(_)
        ));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.state(&key).is_stale);
        assert!(matches!(
            cache.lookup_or_start(&key, |_| ready(json!([2]))),
            Lookup::InFlight(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_response_is_dropped() {
        let cache = QueryCache::default();
        let key = CacheKey::entity(EntityKind::Sales, "s1");

        let mut old_generation = None;
        cache.lookup_or_start(&key, |g| {
            old_generation = Some(g);
            ready(json!("old"))
        });
        cache.invalidate(&key);

        let recorded = cache.complete(&key, old_generation.unwrap(), &Ok(Arc::new(json!("old"))));
        assert!(!recorded);
        assert!(cache.state(&key).data.is_none());

        start_and_complete(&cache, &key, json!("new"));
        assert_eq!(*cache.state(&key).data.unwrap(), json!("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_started_before_clear_is_dropped() {
        let cache = QueryCache::default();
        let key = CacheKey::collection(EntityKind::Platforms);

        let mut old_generation = None;
        cache.lookup_or_start(&key, |g| {
            old_generation = Some(g);
            ready(json!("old"))
        });
        cache.clear();

        let mut new_generation = None;
        cache.lookup_or_start(&key, |g| {
            new_generation = Some(g);
            ready(json!("new"))
        });
        assert_ne!(old_generation, new_generation);

        let recorded = cache.complete(&key, old_generation.unwrap(), &Ok(Arc::new(json!("old"))));
        assert!(!recorded);
        assert!(cache.state(&key).is_loading());

        assert!(cache.complete(&key, new_generation.unwrap(), &Ok(Arc::new(json!("new")))));
        assert_eq!(*cache.state(&key).data.unwrap(), json!("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_last_value() {
        let cache = QueryCache::default();
        let key = CacheKey::collection(EntityKind::Products);
        start_and_complete(&cache, &key, json!([1]));
        cache.invalidate(&key);

        let mut generation = None;
        cache.lookup_or_start(&key, |g| {
            generation = Some(g);
            ready(json!(null))
        });
        let err = QueryError::Network("down".into());
        cache.complete(&key, generation.unwrap(), &Err(err));

        let state = cache.state(&key);
        assert_eq!(state.status, QueryStatus::Failed);
        assert_eq!(*state.data.unwrap(), json!([1]));
        assert!(state.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_kind_and_clear() {
        let cache = QueryCache::default();
        let list = CacheKey::collection(EntityKind::Products);
        let one = CacheKey::entity(EntityKind::Products, "p1");
        let other = CacheKey::collection(EntityKind::Sales);
        for key in [&list, &one, &other] {
            start_and_complete(&cache, key, json!({}));
        }

        cache.invalidate_kind(EntityKind::Products);
        assert!(cache.state(&list).is_stale);
        assert!(cache.state(&one).is_stale);
        assert!(!cache.state(&other).is_stale);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.state(&other).status, QueryStatus::Idle);
    }
}
