//! # Client State
//!
//! Wraps the `QueryClient` every command reads and writes through.

use stockbook_query::{QueryClient, QueryConfig};

use crate::error::ViewError;

/// Wrapper around `QueryClient` for command access.
#[derive(Debug, Clone)]
pub struct ClientState {
    client: QueryClient,
}

impl ClientState {
    pub fn new(client: QueryClient) -> Self {
        ClientState { client }
    }

    /// Builds the HTTP-backed client described by `config`.
    pub fn from_config(config: &QueryConfig) -> Result<Self, ViewError> {
        Ok(ClientState::new(QueryClient::from_config(config)?))
    }

    /// Returns a reference to the inner client.
    pub fn inner(&self) -> &QueryClient {
        &self.client
    }
}
