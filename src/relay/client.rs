//! Outbound HTTP client lifecycle.

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Whether the outbound connection pool outlives a single request.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionReuse {
    /// One client, and its keep-alive pool, for the whole process.
    #[default]
    Shared,
    /// A fresh client per request with idle pooling disabled.
    PerRequest,
}

/// Source of the client used for each outbound check.
#[derive(Debug, Clone)]
pub enum OutboundClient {
    Shared(Client),
    PerRequest,
}

impl OutboundClient {
    /// Create the client source for the given reuse policy.
    ///
    /// In shared mode the client is built eagerly so that TLS backend
    /// failures surface at startup.
    pub fn new(reuse: ConnectionReuse) -> Result<Self, reqwest::Error> {
        match reuse {
            ConnectionReuse::Shared => Ok(OutboundClient::Shared(build_client(reuse)?)),
            ConnectionReuse::PerRequest => Ok(OutboundClient::PerRequest),
        }
    }

    pub fn reuse(&self) -> ConnectionReuse {
        match self {
            OutboundClient::Shared(_) => ConnectionReuse::Shared,
            OutboundClient::PerRequest => ConnectionReuse::PerRequest,
        }
    }

    /// Get a client for one request.
    pub fn acquire(&self) -> Result<Client, reqwest::Error> {
        match self {
            OutboundClient::Shared(client) => Ok(client.clone()),
            OutboundClient::PerRequest => build_client(ConnectionReuse::PerRequest),
        }
    }
}

fn build_client(reuse: ConnectionReuse) -> Result<Client, reqwest::Error> {
    let builder = Client::builder();
    let builder = match reuse {
        ConnectionReuse::Shared => builder,
        ConnectionReuse::PerRequest => builder.pool_max_idle_per_host(0),
    };
    builder.build()
}
