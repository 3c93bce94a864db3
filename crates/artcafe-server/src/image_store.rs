//! On-disk storage for uploaded images.
//!
//! Files live at `{root}/{folder}/{uuid}_{name}` and are addressed publicly
//! as `/images/{folder}/{uuid}_{name}`; the router serves `/images` straight
//! from `root`.

use std::path::{Component, Path, PathBuf};

use artcafe_shared::ImageFolder;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

const PUBLIC_ROOT: &str = "/images/";

/// Resolve `relative` under `base`, refusing anything that climbs out.
fn ensure_within(base: &Path, relative: &Path) -> Result<PathBuf, ApiError> {
    let mut resolved = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ApiError::BadRequest("Path traversal detected".to_string()));
            }
        }
    }
    if !resolved.starts_with(base) {
        return Err(ApiError::BadRequest("Path traversal detected".to_string()));
    }
    Ok(resolved)
}

/// Reduce a client-supplied file name to a safe single path segment.
fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_size: usize,
}

impl ImageStore {
    pub async fn new(root: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        for folder in [ImageFolder::Posts, ImageFolder::Profile] {
            let dir = root.join(folder.as_str());
            fs::create_dir_all(&dir).await.map_err(|e| {
                ApiError::Internal(format!(
                    "Failed to create image directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        info!(path = %root.display(), max_size, "Image store initialized");

        Ok(Self { root, max_size })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an image and return its public path.
    pub async fn save(
        &self,
        folder: ImageFolder,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, ApiError> {
        if data.is_empty() {
            return Err(ApiError::BadRequest("Image file is empty".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::PayloadTooLarge(format!(
                "Image too large: {} bytes (max {})",
                data.len(),
                self.max_size
            )));
        }

        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let path = ensure_within(&self.root, &Path::new(folder.as_str()).join(&file_name))?;

        fs::write(&path, data).await.map_err(|e| {
            ApiError::Internal(format!("Failed to write image {}: {}", path.display(), e))
        })?;

        debug!(folder = folder.as_str(), file = %file_name, size = data.len(), "Stored image");
        Ok(format!("{}{}", folder.public_prefix(), file_name))
    }

    /// Delete the file behind a public `/images/...` path. Returns whether a
    /// file was removed; unknown or foreign paths are left alone.
    pub async fn delete(&self, public_path: &str) -> Result<bool, ApiError> {
        let Some(path) = self.resolve(public_path)? else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted image");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ApiError::Internal(format!(
                "Failed to delete image {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Like [`ImageStore::delete`], but failures are only logged.
    pub async fn delete_best_effort(&self, public_path: Option<&str>) {
        let Some(public_path) = public_path else {
            return;
        };
        if let Err(e) = self.delete(public_path).await {
            tracing::warn!(path = public_path, error = %e, "Could not delete image");
        }
    }

    /// Map `/images/{folder}/{file}` to a file under the root. `None` for
    /// paths this store does not own, such as external URLs.
    fn resolve(&self, public_path: &str) -> Result<Option<PathBuf>, ApiError> {
        let Some(rest) = public_path.strip_prefix(PUBLIC_ROOT) else {
            return Ok(None);
        };
        let Some((folder, file)) = rest.split_once('/') else {
            return Ok(None);
        };
        if folder.parse::<ImageFolder>().is_err() || file.is_empty() {
            return Ok(None);
        }
        ensure_within(&self.root, &Path::new(folder).join(file)).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (ImageStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 1024).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let (store, dir) = test_store().await;

        let public = store.save(ImageFolder::Posts, "sunset.png", b"png-bytes").await.unwrap();
        assert!(public.starts_with("/images/posts/"));
        assert!(public.ends_with("_sunset.png"));

        let on_disk = dir.path().join(public.trim_start_matches("/images/"));
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"png-bytes");

        assert!(store.delete(&public).await.unwrap());
        assert!(!on_disk.exists());
        assert!(!store.delete(&public).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.save(ImageFolder::Profile, "a.png", b"").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            store.save(ImageFolder::Profile, "a.png", &[0u8; 2048]).await,
            Err(ApiError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_traversal_in_name_is_neutralized() {
        let (store, dir) = test_store().await;
        let public = store
            .save(ImageFolder::Posts, "../../etc/passwd", b"x")
            .await
            .unwrap();
        assert!(public.ends_with("_passwd"));
        assert!(dir.path().join(public.trim_start_matches("/images/")).exists());
    }

    #[tokio::test]
    async fn test_delete_refuses_traversal() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.delete("/images/posts/../../secret").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(!store.delete("https://cdn.example.com/a.png").await.unwrap());
        assert!(!store.delete("/images/other/a.png").await.unwrap());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_file_name("..."), "image");
        assert_eq!(sanitize_file_name(""), "image");
    }
}
