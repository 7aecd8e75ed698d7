//! Inbound HTTP surface for the relay.

mod handler;
mod listener;

pub use handler::{handle_request, RelayContext, REQUEST_ID_HEADER};
pub use listener::RelayListener;
