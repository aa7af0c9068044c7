//! HTTP API
//!
//! Content management, playlist control, player state and the event
//! stream, served by axum.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, AppContext};
