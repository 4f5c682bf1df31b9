//! Scripted in-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::transport::{ApiRequest, Method, Transport};

/// Replays queued responses per `METHOD path`.
///
/// Each call takes the next queued response; the last one repeats. Routes
/// with nothing queued answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<QueryResult<Value>>>>,
    calls: Mutex<Vec<ApiRequest>>,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(delay: Duration) -> Self {
        MockTransport {
            delay,
            ..Self::default()
        }
    }

    pub fn respond(&self, method: Method, path: &str, result: QueryResult<Value>) {
        self.routes
            .lock()
            .expect("mock routes mutex poisoned")
            .entry(route(method, path))
            .or_default()
            .push_back(result);
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .expect("mock calls mutex poisoned")
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("mock calls mutex poisoned").len()
    }

    /// Body of the most recent call to a route.
    pub fn last_body(&self, method: Method, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .expect("mock calls mutex poisoned")
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .and_then(|r| r.body.clone())
    }

    fn next_response(&self, request: &ApiRequest) -> QueryResult<Value> {
        let mut routes = self.routes.lock().expect("mock routes mutex poisoned");
        match routes.get_mut(&route(request.method, &request.path)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(Value::Null)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(Value::Null)),
            None => Err(QueryError::Http {
                status: 404,
                message: "Not found".into(),
            }),
        }
    }
}

fn route(method: Method, path: &str) -> String {
    format!("{} {}", method, path)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> QueryResult<Value> {
        self.calls
            .lock()
            .expect("mock calls mutex poisoned")
            .push(request.clone());
        let response = self.next_response(request);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        response
    }
}
