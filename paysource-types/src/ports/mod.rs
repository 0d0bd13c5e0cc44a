//! Port traits (interfaces for adapters).
//!
//! The execution core depends on these traits, not on a concrete HTTP
//! client or logging sink.

mod listener;
mod transport;

pub use listener::ResponseListener;
pub use transport::{ApiRequest, ApiResponse, HttpMethod, Transport};
