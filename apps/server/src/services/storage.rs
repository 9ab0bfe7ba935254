// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-backed storage for label files, the annotation document and
//! annotation images.
//!
//! Every write replaces the whole file. Mesh names and image filenames coming
//! from clients are reduced to plain file names before touching the disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ApiError;

/// Label file served when a mesh has none of its own.
pub const FALLBACK_LABEL_FILE: &str = "label.json";

/// Annotation document file name inside the data directory.
pub const ANNOTATIONS_FILE: &str = "annotations.json";

/// Image extensions accepted for upload (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "bmp", "png", "tif", "tiff"];

/// Where label data and images live on disk.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    upload_dir: PathBuf,
}

impl Storage {
    /// Create the storage, making sure both directories exist.
    pub async fn new(data_dir: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        let storage = Self {
            data_dir: data_dir.into(),
            upload_dir: upload_dir.into(),
        };
        for dir in [&storage.data_dir, &storage.upload_dir] {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                tracing::warn!(
                    error = %e,
                    path = %dir.display(),
                    "Failed to create storage directory"
                );
            }
        }
        storage
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    // =========================================================================
    // Label files
    // =========================================================================

    /// Overwrite the label file for `mesh`. Returns the sanitized name used.
    pub async fn save_labels(&self, mesh: &str, document: &[u8]) -> Result<String, ApiError> {
        let name = sanitize_mesh_name(mesh)?;
        let path = self.data_dir.join(format!("{name}.json"));
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(&path, document).await?;
        tracing::info!(mesh = %name, path = %path.display(), size = document.len(), "Saved label file");
        Ok(name)
    }

    /// Overwrite the shared label file every mesh falls back to.
    pub async fn save_shared_labels(&self, document: &[u8]) -> Result<(), ApiError> {
        let path = self.data_dir.join(FALLBACK_LABEL_FILE);
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(&path, document).await?;
        tracing::info!(path = %path.display(), size = document.len(), "Saved shared label file");
        Ok(())
    }

    /// The label file for `mesh`, falling back to the shared label file.
    pub async fn load_labels(&self, mesh: &str) -> Result<Option<Vec<u8>>, ApiError> {
        let name = sanitize_mesh_name(mesh)?;
        if let Some(data) = read_optional(&self.data_dir.join(format!("{name}.json"))).await? {
            tracing::debug!(mesh = %name, "Label file HIT");
            return Ok(Some(data));
        }
        let fallback = read_optional(&self.data_dir.join(FALLBACK_LABEL_FILE)).await?;
        tracing::debug!(mesh = %name, fallback = fallback.is_some(), "Label file MISS");
        Ok(fallback)
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    /// The annotation document, if one was ever saved.
    pub async fn load_annotations(&self) -> Result<Option<Vec<u8>>, ApiError> {
        read_optional(&self.data_dir.join(ANNOTATIONS_FILE)).await
    }

    /// Overwrite the annotation document.
    pub async fn save_annotations(&self, document: &[u8]) -> Result<(), ApiError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(self.data_dir.join(ANNOTATIONS_FILE), document).await?;
        tracing::info!(size = document.len(), "Saved annotations");
        Ok(())
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Store an uploaded image as `{unix_seconds}_{name}`. Returns the stored
    /// file name.
    pub async fn save_image(&self, original_name: &str, data: &[u8]) -> Result<String, ApiError> {
        let name = plain_file_name(original_name)?;
        if !has_image_extension(name) {
            return Err(ApiError::UnsupportedExtension);
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let stored = format!("{timestamp}_{name}");

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(self.upload_dir.join(&stored), data).await?;
        tracing::info!(file = %stored, size = data.len(), "Stored annotation image");
        Ok(stored)
    }

    /// Delete an uploaded image. `Ok(false)` when it does not exist.
    pub async fn delete_image(&self, filename: &str) -> Result<bool, ApiError> {
        let name = plain_file_name(filename)?;
        match tokio::fs::remove_file(self.upload_dir.join(name)).await {
            Ok(()) => {
                tracing::info!(file = %name, "Deleted annotation image");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps ASCII alphanumerics, `_` and `-`. A name with nothing left is rejected.
pub fn sanitize_mesh_name(mesh: &str) -> Result<String, ApiError> {
    let name: String = mesh
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if name.is_empty() {
        return Err(ApiError::InvalidMeshName(mesh.to_string()));
    }
    Ok(name)
}

/// Whether the part after the last dot is an accepted image extension.
pub fn has_image_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Rejects anything that is not a single path component.
fn plain_file_name(filename: &str) -> Result<&str, ApiError> {
    let trimmed = filename.trim();
    let valid = !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !trimmed.contains(['/', '\\', '\0']);
    if valid {
        Ok(trimmed)
    } else {
        Err(ApiError::InvalidFilename(filename.to_string()))
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ApiError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> PathBuf {
        std::env::temp_dir().join(format!("facemark-storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn mesh_names_are_sanitized() {
        assert_eq!(sanitize_mesh_name("trench_04-b").unwrap(), "trench_04-b");
        assert_eq!(sanitize_mesh_name("../../etc/passwd").unwrap(), "etcpasswd");
        assert!(matches!(
            sanitize_mesh_name("../"),
            Err(ApiError::InvalidMeshName(_))
        ));
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(has_image_extension("photo.JPG"));
        assert!(has_image_extension("scan.final.tiff"));
        assert!(!has_image_extension("notes.txt"));
        assert!(!has_image_extension("png"));
    }

    #[tokio::test]
    async fn label_files_fall_back_to_shared_file() {
        let root = scratch();
        let storage = Storage::new(root.join("data"), root.join("uploads")).await;

        assert!(storage.load_labels("site").await.unwrap().is_none());

        storage.save_shared_labels(b"[]").await.unwrap();
        assert!(storage.data_dir().join(FALLBACK_LABEL_FILE).exists());
        assert_eq!(storage.load_labels("site").await.unwrap().unwrap(), b"[]");

        storage.save_labels("si/te", b"{\"labels\":[]}").await.unwrap();
        assert_eq!(
            storage.load_labels("site").await.unwrap().unwrap(),
            b"{\"labels\":[]}"
        );

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn images_are_timestamped_and_deletable() {
        let root = scratch();
        let storage = Storage::new(root.join("data"), root.join("uploads")).await;

        let stored = storage.save_image("pit.png", b"png").await.unwrap();
        assert!(stored.ends_with("_pit.png"));
        assert!(storage.upload_dir().join(&stored).exists());

        assert!(storage.delete_image(&stored).await.unwrap());
        assert!(!storage.delete_image(&stored).await.unwrap());
        assert!(matches!(
            storage.delete_image("../data/annotations.json").await,
            Err(ApiError::InvalidFilename(_))
        ));
        assert!(matches!(
            storage.save_image("notes.txt", b"").await,
            Err(ApiError::UnsupportedExtension)
        ));

        let _ = tokio::fs::remove_dir_all(root).await;
    }
}
