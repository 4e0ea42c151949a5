//! # clip-variants
//!
//! Generate thumbnails and resolution variants for videos landing in object
//! storage.
//!
//! For every source video, `clip-variants` produces ten derived objects and
//! stores them next to the source:
//!
//! | Suffix | Size (landscape) | Type |
//! |--------|------------------|------|
//! | `-xs.jpg` | 320×240 | `image/jpeg` |
//! | `-sm.jpg` | 640×480 | `image/jpeg` |
//! | `-md.jpg` | 800×600 | `image/jpeg` |
//! | `-lg.jpg` | 1024×768 | `image/jpeg` |
//! | `-xl.jpg` | 1280×960 | `image/jpeg` |
//! | `-240p.mp4` | 426×240 | `video/mp4` |
//! | `-360p.mp4` | 640×360 | `video/mp4` |
//! | `-480p.mp4` | 854×480 | `video/mp4` |
//! | `-720p.mp4` | 1280×720 | `video/mp4` |
//! | `-1080p.mp4` | 1920×1080 | `video/mp4` |
//!
//! Thumbnails are taken from the frame at one second. Sources taller than
//! they are wide get every target size transposed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clip_variants::{
//!     GeneratorConfig, S3ObjectStore, Trigger, VariantError, VariantGenerator, ffmpeg,
//! };
//!
//! # async fn run(trigger: Trigger) -> Result<(), VariantError> {
//! let config = GeneratorConfig::from_env()?;
//! ffmpeg::initialize(config.ffmpeg_log_level())?;
//!
//! let store = S3ObjectStore::from_env().await;
//! let engine = config.ffmpeg_engine();
//! let generator = VariantGenerator::new(store, engine, config);
//!
//! let result = generator.handle(&trigger).await?;
//! assert_eq!(result.status_code, 200);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`generator`]: orchestration and the invocation result
//! - [`storage`]: the [`ObjectStore`] seam with S3 and filesystem backends
//! - [`media`]: the [`MediaEngine`] seam and its FFmpeg implementation
//! - [`keys`]: derived key naming and source filtering
//! - [`event`]: trigger payloads
//!
//! ## Requirements
//!
//! FFmpeg development libraries (with `libx264`) must be installed on the
//! build machine and present at runtime.

pub mod clip;
pub mod config;
mod conversion;
pub mod error;
pub mod event;
pub mod ffmpeg;
pub mod generator;
pub mod keys;
pub mod media;
pub mod metadata;
pub mod progress;
pub mod storage;
pub mod thumbnail;
pub mod transcode;
pub mod variants;

pub use clip::MediaClip;
pub use config::GeneratorConfig;
pub use error::{ErrorKind, VariantError};
pub use event::{SourceReference, Trigger};
pub use ffmpeg::FfmpegLogLevel;
pub use generator::{
    GenerationReport, InvocationResult, PlannedVariant, UploadedVariant, VariantGenerator,
};
pub use media::{ClipHandle, FfmpegEngine, MediaEngine};
pub use metadata::{ClipMetadata, Orientation};
pub use progress::{ProgressInfo, ProgressStage, VariantProgress};
pub use storage::{LocalObjectStore, ObjectStore, S3ObjectStore};
pub use thumbnail::ThumbnailHandle;
pub use transcode::ClipResizer;
pub use variants::{RESOLUTION_SPECS, Size, THUMBNAIL_SPECS, VariantKind, VariantSpec};
