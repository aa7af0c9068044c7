//! Database access layer
//!
//! SQLite persistence for content descriptors.

pub mod content;
pub mod init;

pub use init::{connect, init_schema};
