//! # Signage Common Library
//!
//! Shared code for the signage player and its collaborators:
//! - Content descriptor and player state models
//! - Event catalogue (`SignageEvent`) and the `NotificationHub` fan-out
//! - Root folder and TOML configuration resolution
//! - Common error type

pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod player;

pub use content::{ContentDescriptor, ContentId, ContentType};
pub use error::{Error, Result};
pub use events::{NotificationHub, SignageEvent, Subscription};
pub use player::PlayerState;
