//! HTTP server for the paint-by-number production pipeline.
//!
//! Exposed as a library so integration tests can build the router
//! in-process without binding a socket.

pub mod api;
pub mod metrics;
pub mod state;
