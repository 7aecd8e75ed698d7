//! Classified result of one outbound attempt.

use hyper::StatusCode;
use serde::{Deserialize, Serialize};

/// Record returned by the JSON test endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPayload {
    pub user_id: i64,
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

impl TodoPayload {
    /// Compact JSON with fields in wire order.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Outcome of a single relay cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The target answered 200; `payload` is set when decoding was requested.
    Success {
        status: StatusCode,
        payload: Option<TodoPayload>,
    },
    /// The request never completed: network error, DNS failure or timeout.
    ConnectionFailure(String),
    /// The target answered with something other than 200.
    BadStatus(StatusCode),
    /// The body was empty or not the expected JSON shape.
    BadPayload(String),
}

/// Outcome class without the detail, used for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    ConnectionFailure,
    BadStatus,
    BadPayload,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::ConnectionFailure => "connection_failure",
            OutcomeKind::BadStatus => "bad_status",
            OutcomeKind::BadPayload => "bad_payload",
        }
    }
}

impl RelayOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            RelayOutcome::Success { .. } => OutcomeKind::Success,
            RelayOutcome::ConnectionFailure(_) => OutcomeKind::ConnectionFailure,
            RelayOutcome::BadStatus(_) => OutcomeKind::BadStatus,
            RelayOutcome::BadPayload(_) => OutcomeKind::BadPayload,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind() == OutcomeKind::Success
    }
}
