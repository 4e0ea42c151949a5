//! Amazon S3 backend.

use std::{path::Path, time::Instant};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
};

use super::ObjectStore;
use crate::error::VariantError;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// [`ObjectStore`] backed by the AWS SDK S3 client.
///
/// Construct it once per process and reuse it across invocations; the
/// client keeps its connection pool and credential cache.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration (environment,
    /// profile, or the function's execution role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    /// The underlying SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, VariantError> {
        let start = Instant::now();

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                if error
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_no_such_key())
                {
                    VariantError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    VariantError::storage(bucket, key, DisplayErrorContext(&error))
                }
            })?;

        let mut reader = response.body.into_async_read();
        let mut file = File::create(dest).await?;
        let bytes = copy_body(&mut reader, &mut file, bucket, key).await?;

        log::info!(
            "Downloaded s3://{}/{} ({} bytes, {:.1} ms)",
            bucket,
            key,
            bytes,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(bytes)
    }

    async fn upload(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<u64, VariantError> {
        let start = Instant::now();
        let bytes = tokio::fs::metadata(src).await?.len();

        let body = ByteStream::from_path(src)
            .await
            .map_err(|error| VariantError::storage(bucket, key, error))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|error| {
                log::error!("S3 upload to s3://{bucket}/{key} failed: {error}");
                VariantError::storage(bucket, key, DisplayErrorContext(&error))
            })?;

        log::info!(
            "Uploaded s3://{}/{} ({}, {} bytes, {:.1} ms)",
            bucket,
            key,
            content_type,
            bytes,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(bytes)
    }
}

/// Stream an object body into `writer`.
///
/// Read failures come from the network and are reported as
/// [`VariantError::Storage`]. Write failures come from the local disk and
/// stay [`VariantError::IoError`].
async fn copy_body<R, W>(
    reader: &mut R,
    writer: &mut W,
    bucket: &str,
    key: &str,
) -> Result<u64, VariantError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let read = reader
            .read(&mut buffer)
            .await
            .map_err(|error| VariantError::storage(bucket, key, error))?;
        if read == 0 {
            break;
        }
        writer.write_all(&buffer[..read]).await?;
        total += read as u64;
    }
    writer.flush().await?;
    Ok(total)
}
