//! Filesystem backend: `<root>/<bucket>/<key>`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::ObjectStore;
use crate::error::VariantError;

/// [`ObjectStore`] that keeps each bucket as a directory under `root`.
///
/// Content types are not persisted; they only appear in the log.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Use `root` as the directory holding all buckets.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding all buckets.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `bucket/key`.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::InvalidKey`] for empty names, absolute keys,
    /// or keys that would escape the bucket directory.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, VariantError> {
        if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
            return Err(VariantError::InvalidKey(format!("bad bucket name {bucket:?}")));
        }
        if key.is_empty() || key.starts_with('/') {
            return Err(VariantError::InvalidKey(format!("bad key {key:?}")));
        }
        let relative = Path::new(key);
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(VariantError::InvalidKey(format!(
                "key {key:?} resolves outside its bucket"
            )));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, VariantError> {
        let path = self.object_path(bucket, key)?;
        if !fs::try_exists(&path).await? {
            return Err(VariantError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        let bytes = fs::copy(&path, dest)
            .await
            .map_err(|error| VariantError::storage(bucket, key, error))?;
        log::info!("Copied {} to {} ({} bytes)", path.display(), dest.display(), bytes);
        Ok(bytes)
    }

    async fn upload(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<u64, VariantError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let bytes = fs::copy(src, &path)
            .await
            .map_err(|error| VariantError::storage(bucket, key, error))?;
        log::info!("Stored {} ({}, {} bytes)", path.display(), content_type, bytes);
        Ok(bytes)
    }
}
