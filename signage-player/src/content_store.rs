//! Content ingestion and on-disk storage
//!
//! Uploaded files are classified by MIME type and written under the content
//! directory as `images/<hash>_<name>` or `videos/<hash>_<name>`, where
//! `hash` is the first 8 hex digits of the SHA-256 of the file bytes. Web
//! content is a validated URI and stores nothing on disk.
//!
//! Ingestion either yields a descriptor or an error; on error nothing is
//! left on disk.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use signage_common::{ContentDescriptor, ContentType};

use crate::error::{Error, Result};

const IMAGES_DIR: &str = "images";
const VIDEOS_DIR: &str = "videos";

/// Hex digits of the content hash kept in stored filenames
const HASH_LEN: usize = 8;

/// URI schemes accepted for web content
const WEB_SCHEMES: &[&str] = &["http://", "https://", "file://"];

/// Stored content files under one content directory
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open the store, creating its directories if missing
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [IMAGES_DIR, VIDEOS_DIR] {
            tokio::fs::create_dir_all(root.join(dir)).await?;
        }
        debug!("Content store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Content type for an uploaded MIME type (`image/*` or `video/*`)
    pub fn classify(mime: &str) -> Result<ContentType> {
        let top_level = mime.split('/').next().unwrap_or_default().trim();
        match top_level.to_ascii_lowercase().as_str() {
            "image" => Ok(ContentType::Image),
            "video" => Ok(ContentType::Video),
            _ => Err(Error::UnsupportedType(mime.to_string())),
        }
    }

    /// Short hash of file contents used to prefix stored filenames
    pub fn file_hash(bytes: &[u8]) -> String {
        let digest = format!("{:x}", Sha256::digest(bytes));
        digest[..HASH_LEN].to_string()
    }

    /// Store an uploaded file and build its descriptor
    ///
    /// The descriptor is not registered; the caller does that and calls
    /// [`ContentStore::discard`] if registration fails.
    pub async fn ingest(
        &self,
        filename: &str,
        mime: &str,
        bytes: &[u8],
        duration: u32,
    ) -> Result<ContentDescriptor> {
        let content_type = Self::classify(mime)?;
        let name = sanitize_filename(filename)?;
        let hash = Self::file_hash(bytes);

        let subdir = match content_type {
            ContentType::Image => IMAGES_DIR,
            ContentType::Video => VIDEOS_DIR,
            ContentType::Web => {
                return Err(Error::UnsupportedType(format!("{} (web content is not uploaded)", mime)))
            }
        };
        let path = self.root.join(subdir).join(format!("{}_{}", hash, name));

        // Validate before touching the disk
        let descriptor =
            ContentDescriptor::new(name, content_type, path.to_string_lossy(), duration)?
                .with_file_hash(hash);

        tokio::fs::write(&path, bytes).await?;
        info!(
            "Stored {} upload '{}' ({} bytes) at {}",
            content_type,
            descriptor.name,
            bytes.len(),
            path.display()
        );

        Ok(descriptor)
    }

    /// Build a descriptor for a web page
    pub fn web(name: &str, url: &str, duration: u32) -> Result<ContentDescriptor> {
        let url = url.trim();
        if !WEB_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            return Err(Error::BadRequest(format!(
                "Unsupported URL '{}': expected http, https or file",
                url
            )));
        }

        let name = name.trim();
        let name = if name.is_empty() { url } else { name };

        Ok(ContentDescriptor::new(name, ContentType::Web, url, duration)?)
    }

    /// Delete the stored file of a descriptor, best effort
    pub async fn discard(&self, content: &ContentDescriptor) {
        if !content.content_type.is_file_backed() {
            return;
        }

        let path = Path::new(&content.path);
        if !path.starts_with(&self.root) {
            warn!("Not deleting {}: outside the content directory", path.display());
            return;
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Deleted {}", path.display()),
            Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
}

/// Final path component of an uploaded filename
fn sanitize_filename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::BadRequest(format!("Invalid filename '{}'", filename)));
    }

    Ok(name.to_string())
}
