//! Metrics collection and exposition.

mod collector;
mod server;

pub use collector::{MetricsCollector, RequestTimer};
pub use server::MetricsServer;
