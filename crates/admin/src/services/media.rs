//! Item photo storage on the local filesystem.
//!
//! Photos live under `<media_dir>/itens/` and are referenced from the
//! database by their path relative to the media directory. They are served
//! back under `/media/`.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;

/// Largest accepted photo, in bytes.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Subdirectory of the media directory holding item photos.
const PHOTO_DIR: &str = "itens";

/// Errors from photo handling.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("photo is empty")]
    Empty,

    #[error("photo must be at most {} MiB", MAX_PHOTO_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("photo must be an image, got {0}")]
    NotAnImage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded photo, as received from a multipart field.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl PhotoUpload {
    /// Check size and content type.
    ///
    /// # Errors
    ///
    /// Returns a `MediaError` describing why the photo is rejected.
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(MediaError::TooLarge);
        }
        match self.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => Ok(()),
            Some(ct) => Err(MediaError::NotAnImage(ct.to_string())),
            None => Err(MediaError::NotAnImage("unknown content type".to_string())),
        }
    }

    /// File extension for the stored copy.
    fn extension(&self) -> String {
        let from_type = match self.content_type.as_deref() {
            Some("image/jpeg") => Some("jpg"),
            Some("image/png") => Some("png"),
            Some("image/gif") => Some("gif"),
            Some("image/webp") => Some("webp"),
            _ => None,
        };
        if let Some(ext) = from_type {
            return ext.to_string();
        }

        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map_or_else(|| "img".to_string(), str::to_ascii_lowercase)
    }
}

/// Photo storage rooted at the configured media directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Validate and write a photo. Returns its path relative to the root.
    ///
    /// # Errors
    ///
    /// Returns a `MediaError` if the photo is rejected or cannot be written.
    pub async fn save(&self, upload: &PhotoUpload) -> Result<String, MediaError> {
        upload.validate()?;

        let dir = self.root.join(PHOTO_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}.{}", uuid::Uuid::new_v4().simple(), upload.extension());
        tokio::fs::write(dir.join(&name), &upload.bytes).await?;

        let relative = format!("{PHOTO_DIR}/{name}");
        tracing::debug!(path = %relative, size = upload.bytes.len(), "stored photo");
        Ok(relative)
    }

    /// Delete a stored photo. Failures are logged, not returned.
    pub async fn remove(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!(path = %relative, "refusing to remove photo outside media directory");
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %relative, error = %e, "failed to remove photo");
        }
    }

    /// Absolute path of a stored photo, if `relative` points inside the store.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        let inside = path.starts_with(PHOTO_DIR)
            && path
                .components()
                .all(|c| matches!(c, std::path::Component::Normal(_)));
        inside.then(|| self.root.join(path))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(content_type: &str, name: &str, size: usize) -> PhotoUpload {
        PhotoUpload {
            content_type: Some(content_type.to_string()),
            file_name: Some(name.to_string()),
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_validate_accepts_images() {
        assert!(upload("image/png", "a.png", 10).validate().is_ok());
        assert!(upload("image/jpeg", "a.jpg", MAX_PHOTO_BYTES).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_large_and_non_images() {
        assert!(matches!(
            upload("image/png", "a.png", MAX_PHOTO_BYTES + 1).validate(),
            Err(MediaError::TooLarge)
        ));
        assert!(matches!(
            upload("application/pdf", "a.pdf", 10).validate(),
            Err(MediaError::NotAnImage(_))
        ));
        assert!(matches!(upload("image/png", "a.png", 0).validate(), Err(MediaError::Empty)));
    }

    #[test]
    fn test_extension() {
        assert_eq!(upload("image/jpeg", "photo.jpeg", 1).extension(), "jpg");
        assert_eq!(upload("image/bmp", "Photo.BMP", 1).extension(), "bmp");
        assert_eq!(upload("image/x-foo", "../../etc", 1).extension(), "img");
    }

    #[test]
    fn test_resolve_stays_inside_store() {
        let store = MediaStore::new("/srv/media");
        assert_eq!(
            store.resolve("itens/abc.png"),
            Some(PathBuf::from("/srv/media/itens/abc.png"))
        );
        assert_eq!(store.resolve("itens/../secret"), None);
        assert_eq!(store.resolve("/etc/passwd"), None);
        assert_eq!(store.resolve("other/abc.png"), None);
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("doacoes-media-{}", std::process::id()));
        let store = MediaStore::new(&root);

        let path = store.save(&upload("image/png", "a.png", 16)).await.unwrap();
        assert!(path.starts_with("itens/"));
        assert!(path.ends_with(".png"));

        let absolute = store.resolve(&path).unwrap();
        assert!(absolute.exists());

        store.remove(&path).await;
        assert!(!absolute.exists());

        let _ = std::fs::remove_dir_all(root);
    }
}
