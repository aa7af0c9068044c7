//! Content descriptor model
//!
//! A descriptor is the immutable-id record describing one playable item.
//! Descriptors serialize with the fields `id, name, type, path, duration,
//! created_at, file_hash`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Unique, permanent content identifier
pub type ContentId = Uuid;

/// Slot duration used when the caller does not supply one (seconds)
pub const DEFAULT_DURATION_SECS: u32 = 10;

/// Render backend a descriptor is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Still image shown fullscreen
    Image,
    /// Video looped fullscreen with hardware decode
    Video,
    /// Web page shown by a kiosk-mode browser process
    Web,
}

impl ContentType {
    /// Wire/database name of the content type
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Web => "web",
        }
    }

    /// Whether the content lives in a stored file (as opposed to a URI)
    pub fn is_file_backed(&self) -> bool {
        !matches!(self, ContentType::Web)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(ContentType::Image),
            "video" => Ok(ContentType::Video),
            "web" => Ok(ContentType::Web),
            other => Err(Error::InvalidInput(format!("Unknown content type: {}", other))),
        }
    }
}

/// Content descriptor
///
/// `id` uniquely identifies the descriptor for its whole lifetime; the other
/// fields are fixed at creation as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    pub id: ContentId,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// File path (image/video) or URI (web)
    pub path: String,
    /// Slot duration in seconds
    #[serde(default = "default_duration")]
    pub duration: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub file_hash: Option<String>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

impl ContentDescriptor {
    /// Create a descriptor with a fresh id and creation timestamp
    ///
    /// Rejects a zero slot duration.
    pub fn new(
        name: impl Into<String>,
        content_type: ContentType,
        path: impl Into<String>,
        duration: u32,
    ) -> Result<Self> {
        if duration == 0 {
            return Err(Error::InvalidInput(
                "Slot duration must be a positive number of seconds".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content_type,
            path: path.into(),
            duration,
            created_at: Utc::now(),
            file_hash: None,
        })
    }

    /// Attach the short content hash used in the stored filename
    pub fn with_file_hash(mut self, file_hash: impl Into<String>) -> Self {
        self.file_hash = Some(file_hash.into());
        self
    }

    /// Slot duration as a `Duration`
    pub fn slot_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.duration.max(1)))
    }
}
