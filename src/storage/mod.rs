//! Binary image attachments on disk. The database stores only the filename;
//! files live under the configured image directory with generated names, so
//! client input never reaches the filesystem path.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid image filename: {0}")]
    InvalidFilename(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Content types accepted for upload, with the extension used on disk.
const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpeg"),
    ("image/gif", "gif"),
];

/// Map an upload's Content-Type to a file extension; `None` means the type
/// is not an accepted image format.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ACCEPTED_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

/// Content-Type served for a stored filename, keyed on its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Write image bytes under a fresh generated name and return the filename to
/// store against the owning row.
pub async fn save(prefix: &str, extension: &str, bytes: &[u8]) -> Result<String, StorageError> {
    save_in(&image_dir(), prefix, extension, bytes).await
}

/// Read a stored image; `None` when the file has gone missing from disk.
pub async fn read(filename: &str) -> Result<Option<Vec<u8>>, StorageError> {
    read_in(&image_dir(), filename).await
}

/// Remove a stored image; a file already gone is not an error.
pub async fn remove(filename: &str) -> Result<(), StorageError> {
    remove_in(&image_dir(), filename).await
}

async fn save_in(
    dir: &Path,
    prefix: &str,
    extension: &str,
    bytes: &[u8],
) -> Result<String, StorageError> {
    tokio::fs::create_dir_all(dir).await?;

    let filename = format!("{}_{}.{}", prefix, Uuid::new_v4().simple(), extension);
    let mut file = tokio::fs::File::create(dir.join(&filename)).await?;
    file.write_all(bytes).await?;

    Ok(filename)
}

async fn read_in(dir: &Path, filename: &str) -> Result<Option<Vec<u8>>, StorageError> {
    let path = safe_path(dir, filename)?;
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_in(dir: &Path, filename: &str) -> Result<(), StorageError> {
    let path = safe_path(dir, filename)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn image_dir() -> PathBuf {
    PathBuf::from(&config::config().storage.image_dir)
}

/// Filenames come from our own database column, but refuse anything that
/// could point outside the image directory.
fn safe_path(dir: &Path, filename: &str) -> Result<PathBuf, StorageError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(StorageError::InvalidFilename(filename.to_string()));
    }
    Ok(dir.join(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_content_types_map_to_extensions() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/gif"), Some("gif"));
        assert_eq!(extension_for("image/webp"), None);
        assert_eq!(extension_for("application/json"), None);
    }

    #[test]
    fn served_content_type_follows_the_stored_extension() {
        assert_eq!(content_type_for("42_abc.png"), "image/png");
        assert_eq!(content_type_for("42_abc.gif"), "image/gif");
        assert_eq!(content_type_for("42_abc.jpeg"), "image/jpeg");
        // default for anything unexpected already on disk
        assert_eq!(content_type_for("42_abc"), "image/jpeg");
    }

    #[test]
    fn path_traversal_is_rejected() {
        let dir = Path::new("target/test-images");
        assert!(safe_path(dir, "../etc/passwd").is_err());
        assert!(safe_path(dir, "a/b.png").is_err());
        assert!(safe_path(dir, "").is_err());
        assert!(safe_path(dir, "user_1_abc.png").is_ok());
    }

    #[tokio::test]
    async fn save_read_remove_round_trip() {
        let dir = PathBuf::from("target/test-images");

        let filename = save_in(&dir, "user_1", "png", b"not really a png")
            .await
            .unwrap();
        assert!(filename.starts_with("user_1_"));
        assert!(filename.ends_with(".png"));

        let bytes = read_in(&dir, &filename).await.unwrap().unwrap();
        assert_eq!(bytes, b"not really a png");

        remove_in(&dir, &filename).await.unwrap();
        assert_eq!(read_in(&dir, &filename).await.unwrap(), None);
        // removing twice is fine
        remove_in(&dir, &filename).await.unwrap();
    }
}
