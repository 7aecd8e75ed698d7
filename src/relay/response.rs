//! Rendering an outcome for the inbound caller.

use crate::relay::{RelayOutcome, Target};
use hyper::StatusCode;

/// Status and plain-text body returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Format `outcome` into a response.
///
/// Connection and status failures use `failure_status`; an undecodable
/// payload is always 503.
pub fn render(outcome: &RelayOutcome, target: &Target, failure_status: StatusCode) -> RelayResponse {
    match outcome {
        RelayOutcome::Success {
            status,
            payload: None,
        } => RelayResponse {
            status: StatusCode::OK,
            body: format!(
                "Successfully connected to external API: {} (status {})\n",
                target, status
            ),
        },
        RelayOutcome::Success {
            status,
            payload: Some(payload),
        } => RelayResponse {
            status: StatusCode::OK,
            body: format!(
                "Successfully connected to external API: {} (status {})\nPayload: {}\n",
                target,
                status,
                payload.to_json()
            ),
        },
        RelayOutcome::ConnectionFailure(detail) => RelayResponse {
            status: failure_status,
            body: format!("Error reaching external API {}: {}\n", target, detail),
        },
        RelayOutcome::BadStatus(status) => RelayResponse {
            status: failure_status,
            body: format!(
                "Error: external API {} returned status {} (expected 200)\n",
                target,
                status.as_u16()
            ),
        },
        RelayOutcome::BadPayload(detail) => RelayResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: format!(
                "Error decoding response from external API {}: {}\n",
                target, detail
            ),
        },
    }
}
