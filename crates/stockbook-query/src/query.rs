//! # Query Client
//!
//! Typed reads through the cache.
//!
//! ## Fetch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     fetch_one::<Product>("p1")                          │
//! │                                                                         │
//! │  CacheKey(products, p1)                                                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  QueryCache::lookup_or_start                                            │
//! │        ├── fresh ─────────────► decode ──► Product                      │
//! │        ├── in flight ─────────► await shared ──► decode                 │
//! │        └── stale / missing ───► tokio::spawn(request task)              │
//! │                                   │  send ── fail ── backoff ── send    │
//! │                                   ▼                                     │
//! │                                 cache.complete(generation)              │
//! │                                                                         │
//! │  The request runs in its own task: a caller that stops waiting does     │
//! │  not cancel it, and the cache still records the answer.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures::future::join_all;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stockbook_core::{EntityKind, Product, Resource, Sale};
use tracing::{debug, warn};

use crate::cache::{CacheKey, Lookup, QueryCache, QueryState, QueryStatus};
use crate::config::QueryConfig;
use crate::error::{QueryError, QueryResult};
use crate::transport::{ApiRequest, HttpTransport, Transport};

// =============================================================================
// Retry Policy
// =============================================================================

/// How failed requests are repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay before the first retry; later retries back off exponentially.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 1,
            initial_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// No automatic retries.
    pub const fn none() -> Self {
        RetryPolicy {
            retries: 0,
            initial_delay: Duration::ZERO,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_delay,
            max_interval: self.initial_delay * 8,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Sends a request, repeating it on retryable failures.
pub(crate) async fn send_with_retry(
    transport: &dyn Transport,
    request: &ApiRequest,
    policy: RetryPolicy,
) -> QueryResult<Value> {
    let mut backoff = policy.backoff();
    let mut attempt = 0;

    loop {
        match transport.send(request).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                attempt += 1;
                let delay = backoff.next_backoff().unwrap_or(policy.initial_delay);
                warn!(
                    %request,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(%request, error = %e, "Request failed");
                return Err(e);
            }
        }
    }
}

// =============================================================================
// Aggregate Results
// =============================================================================

/// Outcome of a batch fetch, aligned with the requested ids.
#[derive(Debug, Clone)]
pub struct BatchResult<T> {
    /// One slot per requested id; `None` where that fetch failed.
    pub data: Vec<Option<T>>,
    /// First failure in id order.
    pub error: Option<QueryError>,
}

impl<T> BatchResult<T> {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Snapshot of several entries at once.
#[derive(Debug, Clone)]
pub struct BatchState {
    pub states: Vec<QueryState>,
}

impl BatchState {
    /// True while any constituent is loading.
    pub fn is_loading(&self) -> bool {
        self.states.iter().any(QueryState::is_loading)
    }

    /// True if any constituent failed.
    pub fn is_error(&self) -> bool {
        self.states.iter().any(QueryState::is_error)
    }

    /// First constituent error.
    pub fn error(&self) -> Option<&QueryError> {
        self.states.iter().find_map(|s| s.error.as_ref())
    }
}

/// A sale with the products of its line items.
#[derive(Debug, Clone)]
pub struct SaleWithProducts {
    pub sale: Option<Sale>,
    /// Aligned with the sale's line items; `None` where a product failed.
    pub products: Vec<Option<Product>>,
    /// Sale error first, otherwise the first product error.
    pub error: Option<QueryError>,
}

impl SaleWithProducts {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// =============================================================================
// Query Client
// =============================================================================

/// Entry point for every read (and, see `mutation`, every write).
///
/// Cheap to clone; clones share the transport and cache.
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    cache: Arc<QueryCache>,
    retry: RetryPolicy,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<QueryCache>, retry: RetryPolicy) -> Self {
        QueryClient {
            transport,
            cache,
            retry,
        }
    }

    /// Builds an HTTP client and a fresh cache from configuration.
    pub fn from_config(config: &QueryConfig) -> QueryResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(QueryCache::new(config.stale_time())),
            config.retry_policy(),
        ))
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    // =========================================================================
    // Raw Fetch
    // =========================================================================

    /// Fetches the JSON stored under a key, through the cache.
    pub async fn fetch(&self, key: &CacheKey) -> QueryResult<Arc<Value>> {
        let lookup = self.cache.lookup_or_start(key, |generation| {
            let transport = self.transport.clone();
            let cache = self.cache.clone();
            let retry = self.retry;
            let key = key.clone();

            let task = tokio::spawn(async move {
                let request = ApiRequest::get(key.path());
                let result = send_with_retry(transport.as_ref(), &request, retry)
                    .await
                    .map(Arc::new);
                cache.complete(&key, generation, &result);
                result
            });

            async move {
                task.await
                    .unwrap_or_else(|e| Err(QueryError::Internal(e.to_string())))
            }
            .boxed()
            .shared()
        });

        match lookup {
            Lookup::Hit(value) => Ok(value),
            Lookup::InFlight(fetch) => fetch.await,
        }
    }

    // =========================================================================
    // Typed Fetches
    // =========================================================================

    /// GET `/<kind>/<id>`.
    pub async fn fetch_one<T>(&self, id: &str) -> QueryResult<T>
    where
        T: Resource + DeserializeOwned,
    {
        let value = self.fetch(&CacheKey::entity(T::KIND, id)).await?;
        decode(&value)
    }

    /// GET `/<kind>`.
    pub async fn fetch_many<T>(&self) -> QueryResult<Vec<T>>
    where
        T: Resource + DeserializeOwned,
    {
        let value = self.fetch(&CacheKey::collection(T::KIND)).await?;
        decode(&value)
    }

    /// Fetches several entities concurrently, one slot per id.
    pub async fn fetch_batch<T>(&self, ids: &[String]) -> BatchResult<T>
    where
        T: Resource + DeserializeOwned,
    {
        let results = join_all(ids.iter().map(|id| self.fetch_one::<T>(id))).await;

        let mut error = None;
        let data = results
            .into_iter()
            .map(|result| match result {
                Ok(item) => Some(item),
                Err(e) => {
                    error.get_or_insert(e);
                    None
                }
            })
            .collect();

        BatchResult { data, error }
    }

    /// Fetches a sale, then the products its line items reference.
    pub async fn fetch_sale_with_products(&self, sale_id: &str) -> SaleWithProducts {
        let sale = match self.fetch_one::<Sale>(sale_id).await {
            Ok(sale) => sale,
            Err(e) => {
                return SaleWithProducts {
                    sale: None,
                    products: Vec::new(),
                    error: Some(e),
                }
            }
        };

        let ids = sale.product_ids();
        if ids.is_empty() {
            debug!(sale_id, "Sale has no line items");
            return SaleWithProducts {
                sale: Some(sale),
                products: Vec::new(),
                error: None,
            };
        }

        let batch = self.fetch_batch::<Product>(&ids).await;
        SaleWithProducts {
            sale: Some(sale),
            products: batch.data,
            error: batch.error,
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Current state of one key; never issues a request.
    pub fn state(&self, key: &CacheKey) -> QueryState {
        self.cache.state(key)
    }

    /// Current state of several entities of one kind.
    pub fn batch_state(&self, kind: EntityKind, ids: &[String]) -> BatchState {
        BatchState {
            states: ids
                .iter()
                .map(|id| self.cache.state(&CacheKey::entity(kind, id.as_str())))
                .collect(),
        }
    }

    /// Combined state of a sale and the products it references.
    ///
    /// The product phase only counts once the sale itself is known.
    pub fn sale_with_products_state(&self, sale_id: &str) -> BatchState {
        let sale_state = self.cache.state(&CacheKey::entity(EntityKind::Sales, sale_id));

        let product_ids: Vec<String> = match (&sale_state.status, &sale_state.data) {
            (QueryStatus::Resolved, Some(value)) => decode::<Sale>(value)
                .map(|sale| sale.product_ids())
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let mut states = vec![sale_state];
        states.extend(self.batch_state(EntityKind::Products, &product_ids).states);
        BatchState { states }
    }

    /// Forgets every cached entry.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .finish()
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> QueryResult<T> {
    T::deserialize(value).map_err(|e| QueryError::Decode(e.to_string()))
}
