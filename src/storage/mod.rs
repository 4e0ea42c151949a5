//! Object storage abstraction.
//!
//! The generator reads one object and writes up to ten through the
//! [`ObjectStore`] trait. [`S3ObjectStore`] talks to Amazon S3;
//! [`LocalObjectStore`] maps buckets to directories for local runs.

mod local;
mod s3;

use std::path::Path;

use async_trait::async_trait;

use crate::error::VariantError;

pub use local::LocalObjectStore;
pub use s3::S3ObjectStore;

/// Storage operations the generator depends on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy `bucket/key` into the local file `dest`, returning the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// [`VariantError::ObjectNotFound`] when the object does not exist,
    /// [`VariantError::Storage`] for any other failure.
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, VariantError>;

    /// Store the local file `src` as `bucket/key` with the given content
    /// type, replacing any existing object. Returns the number of bytes sent.
    ///
    /// # Errors
    ///
    /// [`VariantError::Storage`] on network or permission failures.
    async fn upload(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<u64, VariantError>;
}
