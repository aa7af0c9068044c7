//! # Signage Player Library (signage-player)
//!
//! Looping digital-signage playback: a scheduler cycles a playlist of
//! images, videos and web pages, a playback engine switches render targets
//! with an audio fade, and every state change is fanned out to observers.
//!
//! **Architecture:** scheduler loop (tokio task) → playback engine → render
//! backends (mpv over JSON IPC, kiosk browser processes); content registry in
//! SQLite; HTTP/SSE control interface via axum.

pub mod api;
pub mod config;
pub mod content_store;
pub mod db;
pub mod error;
pub mod playback;
pub mod registry;
pub mod render;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
