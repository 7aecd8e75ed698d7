//! healthrelay - a minimal HTTP health check relay
//!
//! Every inbound request triggers one bounded outbound GET to a configured
//! target, and the classified result is returned as a plain-text response.
//! This crate provides:
//! - Preset and file based configuration with an `EXTERNAL_API` override
//! - Shared or per-request outbound clients
//! - Optional JSON payload decoding
//! - Prometheus metrics

pub mod config;
pub mod metrics;
pub mod relay;
pub mod server;
pub mod util;

pub use config::Config;
pub use relay::{Relay, RelayOutcome};
