//! The outbound health check itself.

use crate::relay::{RelayOutcome, Target, TodoPayload};
use hyper::StatusCode;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Perform one GET against `target` and classify the result.
///
/// The whole exchange, body included, is bounded by `check_timeout`.
/// Only an exact 200 counts as success.
pub async fn check_target(
    client: &Client,
    target: &Target,
    check_timeout: Duration,
    parse_payload: bool,
) -> RelayOutcome {
    match timeout(check_timeout, exchange(client, target, parse_payload)).await {
        Ok(outcome) => outcome,
        Err(_) => RelayOutcome::ConnectionFailure(format!(
            "request timed out after {}",
            humantime::format_duration(check_timeout)
        )),
    }
}

async fn exchange(client: &Client, target: &Target, parse_payload: bool) -> RelayOutcome {
    let response = match client.get(target.url().clone()).send().await {
        Ok(response) => response,
        Err(e) => return RelayOutcome::ConnectionFailure(describe_error(&e)),
    };

    let status = response.status();
    debug!(upstream = %target, status = %status, "outbound response received");

    if status != StatusCode::OK {
        return RelayOutcome::BadStatus(status);
    }

    if !parse_payload {
        return RelayOutcome::Success {
            status,
            payload: None,
        };
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return RelayOutcome::ConnectionFailure(describe_error(&e)),
    };

    match decode_payload(&body) {
        Ok(payload) => RelayOutcome::Success {
            status,
            payload: Some(payload),
        },
        Err(reason) => RelayOutcome::BadPayload(reason),
    }
}

/// Decode a todo record, treating a blank body as its own failure.
fn decode_payload(body: &[u8]) -> Result<TodoPayload, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err("empty response body".to_string());
    }

    serde_json::from_slice(body).map_err(|e| format!("invalid JSON payload: {}", e))
}

/// Flatten an error and its sources into one line.
pub(crate) fn describe_error(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
