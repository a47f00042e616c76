//! HTTP API: REST control endpoints and SSE event stream

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, wire_engine_events, AppContext};
