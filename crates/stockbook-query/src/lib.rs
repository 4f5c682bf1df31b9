//! # stockbook-query: Remote Resource Query Layer for Stockbook
//!
//! Fetches products, sales and platforms from the REST backend, remembers
//! them for a while, and forgets them when a write makes them outdated.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Query Layer Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    QueryClient (cheap to clone)                  │  │
//! │  │                                                                  │  │
//! │  │  fetch_one / fetch_many / fetch_batch / fetch_sale_with_products │  │
//! │  │  mutate / create_* / update_* / delete_*                         │  │
//! │  └──────────────┬───────────────────────────────┬───────────────────┘  │
//! │                 │                               │                       │
//! │                 ▼                               ▼                       │
//! │  ┌────────────────────────────┐  ┌──────────────────────────────────┐  │
//! │  │ QueryCache (Arc, injected) │  │ dyn Transport                    │  │
//! │  │                            │  │                                  │  │
//! │  │ (kind, id?) ──► entry      │  │ HttpTransport (reqwest)          │  │
//! │  │ single-flight, staleness,  │  │ GET/POST/PUT/PATCH/DELETE, JSON  │  │
//! │  │ generations, clear()       │  │                                  │  │
//! │  └────────────────────────────┘  └──────────────────────────────────┘  │
//! │                                                                         │
//! │  POLICY: fresh for 5 minutes • one retry • writes invalidate the kind  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Backend URL, staleness and retry settings
//! - [`error`] - Query error types
//! - [`transport`] - Transport trait and reqwest implementation
//! - [`cache`] - Cache entries, keys and snapshots
//! - [`query`] - Typed reads and aggregate views
//! - [`mutation`] - Writes and invalidation
//!
//! ## Usage
//! ```rust,no_run
//! use stockbook_core::Product;
//! use stockbook_query::{QueryClient, QueryConfig};
//!
//! # async fn demo() -> stockbook_query::QueryResult<()> {
//! let config = QueryConfig::load_or_default(None);
//! let client = QueryClient::from_config(&config)?;
//!
//! let products: Vec<Product> = client.fetch_many().await?;
//! let first: Product = client.fetch_one(&products[0].id).await?;
//! client.delete_product(&first.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod mutation;
pub mod query;
pub mod transport;

#[cfg(test)]
mod mock;

pub use cache::{CacheKey, QueryCache, QueryState, QueryStatus};
pub use config::QueryConfig;
pub use error::{QueryError, QueryResult};
pub use mutation::Mutation;
pub use query::{BatchResult, BatchState, QueryClient, RetryPolicy, SaleWithProducts};
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
