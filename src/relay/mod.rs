//! Health check relay.
//!
//! Each inbound request triggers exactly one outbound GET to the configured
//! target; the classified [`RelayOutcome`] is rendered back to the caller.

mod check;
mod client;
mod outcome;
mod response;
mod target;

pub use check::check_target;
pub use client::{ConnectionReuse, OutboundClient};
pub use outcome::{OutcomeKind, RelayOutcome, TodoPayload};
pub use response::{render, RelayResponse};
pub use target::{Scheme, Target, TargetError};

use hyper::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Resolved, immutable relay settings.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Address being health-checked.
    pub target: Target,
    /// Bound on the whole outbound exchange.
    pub timeout: Duration,
    /// Client lifecycle policy.
    pub connection_reuse: ConnectionReuse,
    /// Whether a 200 body is decoded as a [`TodoPayload`].
    pub parse_payload: bool,
    /// Status returned for connection and status failures.
    pub failure_status: StatusCode,
}

/// Errors raised while constructing a relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to build outbound client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// The relay: settings plus the outbound client source.
#[derive(Debug)]
pub struct Relay {
    settings: RelaySettings,
    client: OutboundClient,
}

impl Relay {
    /// Create a relay, building the shared client when the policy asks for one.
    pub fn new(settings: RelaySettings) -> Result<Self, RelayError> {
        let client = OutboundClient::new(settings.connection_reuse)?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Run one outbound check.
    pub async fn check(&self) -> RelayOutcome {
        let client = match self.client.acquire() {
            Ok(client) => client,
            Err(e) => {
                return RelayOutcome::ConnectionFailure(format!(
                    "failed to build outbound client: {}",
                    check::describe_error(&e)
                ));
            }
        };

        check_target(
            &client,
            &self.settings.target,
            self.settings.timeout,
            self.settings.parse_payload,
        )
        .await
    }

    /// Render an outcome using this relay's target and failure status.
    pub fn respond(&self, outcome: &RelayOutcome) -> RelayResponse {
        render(outcome, &self.settings.target, self.settings.failure_status)
    }
}
