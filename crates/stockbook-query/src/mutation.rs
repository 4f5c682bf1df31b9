//! # Mutations
//!
//! Writes to the backend, followed by cache invalidation.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_product(form)                                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  validate_product_form ── errors ──► QueryError::Validation (no I/O)    │
//! │        │ ok                                                             │
//! │        ▼                                                                │
//! │  POST /products ──── failure ──► QueryError (cache untouched)           │
//! │        │ 2xx                                                            │
//! │        ▼                                                                │
//! │  invalidate every `products` entry (list + each product)                │
//! │  next read of any of them goes to the network                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! POST is never retried automatically (it is not idempotent); PUT and DELETE
//! get the same single retry as reads.

use serde::Serialize;
use serde_json::Value;
use stockbook_core::validation::{validate_product_form, validate_sale_form};
use stockbook_core::{EntityKind, ProductFormData, SaleFormData};
use tracing::info;

use crate::error::{QueryError, QueryResult};
use crate::query::{send_with_retry, QueryClient, RetryPolicy};
use crate::transport::ApiRequest;

/// A write against one resource kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// POST `/<kind>`
    Create(Value),
    /// PUT `/<kind>/<id>`
    Update { id: String, payload: Value },
    /// DELETE `/<kind>/<id>`
    Delete { id: String },
}

impl Mutation {
    /// Builds a create mutation from any serializable payload.
    pub fn create<T: Serialize>(payload: &T) -> QueryResult<Self> {
        Ok(Mutation::Create(encode(payload)?))
    }

    /// Builds an update mutation from any serializable payload.
    pub fn update<T: Serialize>(id: impl Into<String>, payload: &T) -> QueryResult<Self> {
        Ok(Mutation::Update {
            id: id.into(),
            payload: encode(payload)?,
        })
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Mutation::Delete { id: id.into() }
    }

    /// The HTTP request this mutation sends for a kind.
    pub fn request(&self, kind: EntityKind) -> ApiRequest {
        match self {
            Mutation::Create(payload) => ApiRequest::post(kind.collection_path(), payload.clone()),
            Mutation::Update { id, payload } => {
                ApiRequest::put(kind.entity_path(id), payload.clone())
            }
            Mutation::Delete { id } => ApiRequest::delete(kind.entity_path(id)),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }
}

fn encode<T: Serialize>(payload: &T) -> QueryResult<Value> {
    serde_json::to_value(payload).map_err(|e| QueryError::Encode(e.to_string()))
}

impl QueryClient {
    /// Sends a mutation and, on success, invalidates every entry of `kind`.
    ///
    /// Returns the backend's response body (`Null` when it sent none).
    pub async fn mutate(&self, kind: EntityKind, mutation: Mutation) -> QueryResult<Value> {
        let request = mutation.request(kind);
        let policy = if request.method.is_idempotent() {
            self.retry_policy()
        } else {
            RetryPolicy::none()
        };

        let response = send_with_retry(self.transport(), &request, policy).await?;

        info!(%kind, action = mutation.label(), %request, "Mutation succeeded, invalidating");
        self.cache().invalidate_kind(kind);

        Ok(response)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Validates and creates a product.
    pub async fn create_product(&self, form: &ProductFormData) -> QueryResult<Value> {
        let form = validate_product_form(form)?;
        self.mutate(EntityKind::Products, Mutation::create(&form)?).await
    }

    /// Validates and replaces a product.
    pub async fn update_product(&self, id: &str, form: &ProductFormData) -> QueryResult<Value> {
        let form = validate_product_form(form)?;
        self.mutate(EntityKind::Products, Mutation::update(id, &form)?)
            .await
    }

    pub async fn delete_product(&self, id: &str) -> QueryResult<Value> {
        self.mutate(EntityKind::Products, Mutation::delete(id)).await
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Validates and records a sale. The total is recomputed from the items.
    pub async fn create_sale(&self, form: &SaleFormData) -> QueryResult<Value> {
        let form = validate_sale_form(form)?;
        self.mutate(EntityKind::Sales, Mutation::create(&form)?).await
    }

    /// Validates and replaces a sale.
    pub async fn update_sale(&self, id: &str, form: &SaleFormData) -> QueryResult<Value> {
        let form = validate_sale_form(form)?;
        self.mutate(EntityKind::Sales, Mutation::update(id, &form)?)
            .await
    }

    pub async fn delete_sale(&self, id: &str) -> QueryResult<Value> {
        self.mutate(EntityKind::Sales, Mutation::delete(id)).await
    }
}
