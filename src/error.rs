//! Error types for the `clip-variants` crate.
//!
//! This module defines [`VariantError`], the unified error type returned by
//! every fallible operation in the crate, and [`ErrorKind`], a coarse
//! classification that lets callers tell transient storage failures apart
//! from bad input.

use std::{fmt::Display, io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// Coarse classification of a [`VariantError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The trigger payload could not be interpreted.
    Event,
    /// Object storage rejected or failed a request.
    Storage,
    /// The source could not be opened or decoded as video.
    Decode,
    /// A variant could not be scaled or encoded.
    Encode,
    /// Local scratch space or configuration problems.
    Filesystem,
}

/// The unified error type for all `clip-variants` operations.
///
/// Variants carry the bucket, key or path involved so the hosting platform's
/// log of the failed invocation is enough to diagnose it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VariantError {
    /// The trigger did not contain a usable record.
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),

    /// The source object does not exist.
    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was queried.
        key: String,
    },

    /// A download or upload failed.
    #[error("Storage error for s3://{bucket}/{key}: {reason}")]
    Storage {
        /// Bucket involved in the request.
        bucket: String,
        /// Key involved in the request.
        key: String,
        /// Underlying reason reported by the store.
        reason: String,
    },

    /// A storage key is not acceptable for the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the opener.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A target size cannot be produced by the encoder.
    #[error("Invalid target dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Video encoding failed.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// An error originating from the FFmpeg libraries while producing a
    /// variant (scaling or muxing).
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An error from the `image` crate while writing a thumbnail.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An I/O error occurred while reading or writing scratch files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration for {name}: {reason}")]
    Config {
        /// Name of the setting (environment variable or option).
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl VariantError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VariantError::InvalidEvent(_) => ErrorKind::Event,
            VariantError::ObjectNotFound { .. }
            | VariantError::Storage { .. }
            | VariantError::InvalidKey(_) => ErrorKind::Storage,
            VariantError::FileOpen { .. }
            | VariantError::NoVideoStream
            | VariantError::VideoDecodeError(_) => ErrorKind::Decode,
            VariantError::InvalidDimensions { .. }
            | VariantError::VideoEncodeError(_)
            | VariantError::FfmpegError(_)
            | VariantError::ImageError(_) => ErrorKind::Encode,
            VariantError::IoError(_) | VariantError::Config { .. } => ErrorKind::Filesystem,
        }
    }

    /// Returns `true` when re-running the same invocation may succeed.
    ///
    /// Only network-level storage failures qualify; a missing object or a
    /// source that does not decode will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VariantError::Storage { .. })
    }

    pub(crate) fn storage(bucket: &str, key: &str, reason: impl ToString) -> Self {
        VariantError::Storage {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a failure raised while demuxing or decoding the source.
    pub(crate) fn decode(context: &str, error: impl Display) -> Self {
        VariantError::VideoDecodeError(format!("{context}: {error}"))
    }
}

impl From<FfmpegError> for VariantError {
    fn from(error: FfmpegError) -> Self {
        VariantError::FfmpegError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_read_failures_are_decode_errors() {
        let error = VariantError::decode("seek failed", FfmpegError::InvalidData);
        assert!(matches!(
            error,
            VariantError::VideoDecodeError(ref message) if message.starts_with("seek failed: ")
        ));
        assert_eq!(error.kind(), ErrorKind::Decode);
        assert!(!error.is_retryable());
    }

    #[test]
    fn only_storage_transport_failures_are_retryable() {
        let transport = VariantError::storage("media", "videos/cat-org.mp4", "connection reset");
        assert_eq!(transport.kind(), ErrorKind::Storage);
        assert!(transport.is_retryable());

        let disk_full = VariantError::from(IoError::from(std::io::ErrorKind::StorageFull));
        assert_eq!(disk_full.kind(), ErrorKind::Filesystem);
        assert!(!disk_full.is_retryable());

        let missing = VariantError::ObjectNotFound {
            bucket: "media".to_string(),
            key: "videos/cat-org.mp4".to_string(),
        };
        assert!(!missing.is_retryable());

        let encoder = VariantError::from(FfmpegError::EncoderNotFound);
        assert_eq!(encoder.kind(), ErrorKind::Encode);
    }
}
