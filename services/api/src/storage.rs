//! Recipe image storage on the local filesystem
//!
//! Uploaded files are renamed to a fresh UUID (original extension kept) and
//! written under the media root; the public path recorded on the recipe is
//! what clients can later resolve against a static-file server.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

/// Public URL prefix for stored recipe images
pub const UPLOAD_PREFIX: &str = "/uploads/recipe";

/// Build the public path for an upload, keeping the original extension
pub fn recipe_image_path(stem: &str, original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{UPLOAD_PREFIX}/{stem}.{ext}"),
        _ => format!("{UPLOAD_PREFIX}/{stem}"),
    }
}

/// Sniff the magic bytes of common image formats
pub fn is_known_image(bytes: &[u8]) -> bool {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = b"\xff\xd8\xff";
    const GIF87A: &[u8] = b"GIF87a";
    const GIF89A: &[u8] = b"GIF89a";

    if bytes.starts_with(PNG)
        || bytes.starts_with(JPEG)
        || bytes.starts_with(GIF87A)
        || bytes.starts_with(GIF89A)
    {
        return true;
    }

    // RIFF container with a WEBP form type
    bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP"
}

/// Filesystem-backed image store
#[derive(Clone)]
pub struct ImageStore {
    media_root: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at the given media directory
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Persist an upload and return its public path
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let stem = Uuid::new_v4().to_string();
        let public_path = recipe_image_path(&stem, original_name);

        // Public paths are rooted at UPLOAD_PREFIX; strip the slash so the
        // file lands inside media_root.
        let target = self.media_root.join(public_path.trim_start_matches('/'));

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        info!("Stored recipe image at {}", target.display());

        Ok(public_path)
    }
}
