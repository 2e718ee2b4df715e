//! Observability for the gateway.
//!
//! Structured logging with JSON or pretty output; per-request logs come
//! from `tower-http`'s `TraceLayer` on the router.

mod logging;

pub use logging::{init_logging, LogFormat};
