//! In-process REST backend for command tests.
//!
//! Serves `/{kind}` and `/{kind}/{id}` for `products`, `sales` and
//! `platform` out of an in-memory store, and records every request so tests
//! can tell cache hits from network calls.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use stockbook_query::QueryConfig;

use crate::state::ClientState;

/// Date stamped on every sale the backend creates.
pub const SALE_DATE: &str = "2024-05-01T10:00:00.000Z";

#[derive(Debug, Default)]
pub struct Store {
    pub products: Vec<Value>,
    pub sales: Vec<Value>,
    pub platforms: Vec<Value>,
    /// `METHOD /path` of every request, in arrival order.
    pub requests: Vec<String>,
    pub next_id: u32,
}

impl Store {
    fn table(&mut self, kind: &str) -> Option<&mut Vec<Value>> {
        match kind {
            "products" => Some(&mut self.products),
            "sales" => Some(&mut self.sales),
            "platform" => Some(&mut self.platforms),
            _ => None,
        }
    }

    fn log(&mut self, method: &str, path: String) {
        self.requests.push(format!("{} {}", method, path));
    }
}

type SharedStore = Arc<Mutex<Store>>;

pub struct Backend {
    store: SharedStore,
    base_url: String,
}

impl Backend {
    pub async fn spawn(store: Store) -> Self {
        let store = Arc::new(Mutex::new(store));
        let app = Router::new()
            .route("/{kind}", get(list).post(create))
            .route("/{kind}/{id}", get(show).put(replace).delete(remove))
            .with_state(store.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Backend {
            store,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A client with its own cache and no automatic retries.
    pub fn client(&self) -> ClientState {
        let mut config = QueryConfig::default();
        config.api.base_url = self.base_url.clone();
        config.cache.retries = 0;
        ClientState::from_config(&config).unwrap()
    }

    /// How many times `METHOD /path` was requested.
    pub fn hits(&self, route: &str) -> usize {
        self.with_store(|s| s.requests.iter().filter(|r| *r == route).count())
    }

    pub fn with_store<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        f(&mut self.store.lock().unwrap())
    }
}

fn not_found(kind: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("{} not found", kind) })),
    )
        .into_response()
}

async fn list(State(store): State<SharedStore>, Path(kind): Path<String>) -> Response {
    let mut store = store.lock().unwrap();
    store.log("GET", format!("/{}", kind));
    match store.table(&kind) {
        Some(rows) => Json(Value::Array(rows.clone())).into_response(),
        None => not_found(&kind),
    }
}

async fn create(
    State(store): State<SharedStore>,
    Path(kind): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut store = store.lock().unwrap();
    store.log("POST", format!("/{}", kind));
    store.next_id += 1;
    let id = format!("{}{}", &kind[..1], 100 + store.next_id);

    body["_id"] = json!(id);
    if kind == "sales" {
        body["date"] = json!(SALE_DATE);
        if let Some(items) = body["products"].as_array_mut() {
            for (i, item) in items.iter_mut().enumerate() {
                item["_id"] = json!(format!("{}-{}", id, i));
                item["saleId"] = json!(id);
            }
        }
    }

    match store.table(&kind) {
        Some(rows) => {
            rows.push(body.clone());
            (StatusCode::CREATED, Json(body)).into_response()
        }
        None => not_found(&kind),
    }
}

async fn show(
    State(store): State<SharedStore>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    let mut store = store.lock().unwrap();
    store.log("GET", format!("/{}/{}", kind, id));
    let found = store
        .table(&kind)
        .and_then(|rows| rows.iter().find(|r| r["_id"] == id.as_str()).cloned());
    match found {
        Some(row) => Json(row).into_response(),
        None => not_found(&kind),
    }
}

async fn replace(
    State(store): State<SharedStore>,
    Path((kind, id)): Path<(String, String)>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut store = store.lock().unwrap();
    store.log("PUT", format!("/{}/{}", kind, id));
    body["_id"] = json!(id);
    let slot = store
        .table(&kind)
        .and_then(|rows| rows.iter_mut().find(|r| r["_id"] == id.as_str()));
    match slot {
        Some(row) => {
            *row = body.clone();
            Json(body).into_response()
        }
        None => not_found(&kind),
    }
}

async fn remove(
    State(store): State<SharedStore>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    let mut store = store.lock().unwrap();
    store.log("DELETE", format!("/{}/{}", kind, id));
    let removed = store.table(&kind).and_then(|rows| {
        let index = rows.iter().position(|r| r["_id"] == id.as_str())?;
        Some(rows.remove(index))
    });
    match removed {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&kind),
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn product(id: &str, name: &str, price: f64, stock: i64) -> Value {
    json!({
        "_id": id,
        "name": name,
        "price": price,
        "description": format!("{} (PAL)", name),
        "category": "juegos",
        "platformId": "n64",
        "stock": stock,
        "status": "loose",
        "internCode": format!("IC-{}", id)
    })
}

pub fn sale(id: &str, client: &str, items: &[(&str, i64, f64)]) -> Value {
    let total: f64 = items.iter().map(|(_, q, p)| *q as f64 * p).sum();
    json!({
        "_id": id,
        "date": SALE_DATE,
        "total": total,
        "products": items
            .iter()
            .enumerate()
            .map(|(i, (product_id, quantity, unit_price))| json!({
                "_id": format!("{}-{}", id, i),
                "saleId": id,
                "productId": product_id,
                "quantity": quantity,
                "unitPrice": unit_price
            }))
            .collect::<Vec<_>>(),
        "clientName": client,
        "__v": 0
    })
}

pub fn platform(id: &str, name: &str) -> Value {
    json!({ "_id": id, "name": name, "manufacturer": "Nintendo", "releaseYear": 1996 })
}
