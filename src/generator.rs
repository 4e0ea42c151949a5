//! Variant generation.
//!
//! [`VariantGenerator`] ties the pieces together: it resolves a trigger to a
//! source object, downloads it into a private scratch directory, renders the
//! five thumbnails and then the five resolutions through a
//! [`MediaEngine`], and uploads each output through an [`ObjectStore`]
//! before moving on to the next.
//!
//! # Example
//!
//! ```no_run
//! use clip_variants::{
//!     FfmpegLogLevel, GeneratorConfig, LocalObjectStore, SourceReference, VariantError,
//!     VariantGenerator, ffmpeg,
//! };
//!
//! # async fn run() -> Result<(), VariantError> {
//! ffmpeg::initialize(FfmpegLogLevel::Error)?;
//! let config = GeneratorConfig::new();
//! let engine = config.ffmpeg_engine();
//! let generator = VariantGenerator::new(LocalObjectStore::new("./buckets"), engine, config);
//!
//! let report = generator
//!     .generate(&SourceReference::new("media", "videos/cat-org.mp4"))
//!     .await?;
//! for variant in &report.variants {
//!     println!("{} ({} bytes)", variant.key, variant.bytes);
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use serde::Serialize;
use tokio::{
    fs,
    runtime::{Handle, RuntimeFlavor},
    task,
};

use crate::{
    config::GeneratorConfig,
    error::VariantError,
    event::{SourceReference, Trigger},
    keys,
    media::{ClipHandle, MediaEngine},
    metadata::Orientation,
    progress::{NoOpProgress, ProgressInfo, ProgressStage, VariantProgress},
    storage::ObjectStore,
    variants::{Size, VariantKind, VariantSpec, all_specs},
};

/// Message returned after all ten variants were uploaded.
pub const SUCCESS_MESSAGE: &str =
    "Thumbnails and video resolutions generated and uploaded successfully";

/// Response returned to the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    /// HTTP-style status code; always 200 for returned results.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Human-readable outcome.
    #[serde(rename = "body")]
    pub message: String,
}

impl InvocationResult {
    /// All variants were produced.
    pub fn success() -> Self {
        Self {
            status_code: 200,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    /// The source was deliberately not processed.
    pub fn skipped(reason: &str) -> Self {
        Self {
            status_code: 200,
            message: format!("File skipped: {reason}"),
        }
    }
}

/// One uploaded output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedVariant {
    /// Key the output was stored under.
    pub key: String,
    /// MIME type it was stored with.
    pub content_type: &'static str,
    /// Pixel size of the output.
    pub size: Size,
    /// Bytes uploaded.
    pub bytes: u64,
}

/// Summary of a completed [`VariantGenerator::generate`] run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    /// The processed object.
    pub source: SourceReference,
    /// Orientation derived from the source dimensions.
    pub orientation: Orientation,
    /// Source dimensions.
    pub source_size: Size,
    /// Uploaded outputs in processing order.
    pub variants: Vec<UploadedVariant>,
}

/// A variant as it will be produced for a given source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedVariant {
    /// The table entry.
    pub spec: &'static VariantSpec,
    /// Destination key.
    pub key: String,
    /// Target size after orientation is applied.
    pub size: Size,
}

/// The ten variants for `source_key`, thumbnails first, in table order.
///
/// ```
/// use clip_variants::{Orientation, generator::plan};
///
/// let plan = plan("videos/tall-org.mp4", Orientation::Portrait);
/// assert_eq!(plan.len(), 10);
/// assert_eq!(plan[0].key, "videos/tall-xs.jpg");
/// assert_eq!((plan[0].size.width, plan[0].size.height), (240, 320));
/// ```
pub fn plan(source_key: &str, orientation: Orientation) -> Vec<PlannedVariant> {
    all_specs()
        .map(|spec| PlannedVariant {
            spec,
            key: keys::derive_key(source_key, spec.suffix),
            size: spec.target_size(orientation),
        })
        .collect()
}

/// Run blocking media work without stalling a multi-threaded runtime.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            task::block_in_place(work)
        }
        _ => work(),
    }
}

/// Produces and uploads the ten variants of a source video.
pub struct VariantGenerator<S, M> {
    store: S,
    engine: M,
    config: GeneratorConfig,
    progress: Arc<dyn VariantProgress>,
}

impl<S, M> VariantGenerator<S, M>
where
    S: ObjectStore,
    M: MediaEngine,
{
    /// Create a generator over the given store and engine.
    pub fn new(store: S, engine: M, config: GeneratorConfig) -> Self {
        Self {
            store,
            engine,
            config,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn VariantProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// The object store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The media engine.
    pub fn engine(&self) -> &M {
        &self.engine
    }

    /// The active configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Process one trigger.
    ///
    /// Derived outputs (and, with `originals_only`, unmarked keys) are
    /// acknowledged with [`InvocationResult::skipped`] without touching
    /// storage.
    ///
    /// # Errors
    ///
    /// Any error from resolving the trigger or from
    /// [`generate`](VariantGenerator::generate), unchanged.
    pub async fn handle(&self, trigger: &Trigger) -> Result<InvocationResult, VariantError> {
        let source = trigger.source().inspect_err(|error| {
            log::error!("Rejected trigger ({:?}): {}", error.kind(), error);
        })?;

        if let Some(reason) = keys::skip_reason(&source.key, self.config.originals_only()) {
            log::info!("Skipping {}: {}", source, reason);
            return Ok(InvocationResult::skipped(reason));
        }

        match self.generate(&source).await {
            Ok(report) => {
                log::info!(
                    "Generated {} variants for {} ({}, {:?})",
                    report.variants.len(),
                    report.source,
                    report.source_size,
                    report.orientation
                );
                Ok(InvocationResult::success())
            }
            Err(error) => {
                log::error!(
                    "Variant generation for {} failed ({:?}, retryable: {}): {}",
                    source,
                    error.kind(),
                    error.is_retryable(),
                    error
                );
                Err(error)
            }
        }
    }

    /// Download `source`, produce all ten variants and upload them.
    ///
    /// The scratch directory is removed when this returns, whether or not
    /// generation succeeded. Variants uploaded before a failure stay in
    /// place.
    ///
    /// # Errors
    ///
    /// The first storage, decode, encode or filesystem error encountered.
    pub async fn generate(&self, source: &SourceReference) -> Result<GenerationReport, VariantError> {
        fs::create_dir_all(self.config.scratch_dir()).await?;
        let scratch = tempfile::Builder::new()
            .prefix("clip-variants-")
            .tempdir_in(self.config.scratch_dir())?;
        log::debug!("Scratch directory {}", scratch.path().display());

        let local_source = scratch.path().join(local_file_name(&source.key));
        self.store
            .download(&source.bucket, &source.key, &local_source)
            .await?;

        let mut clip = run_blocking(|| self.engine.open(&local_source))?;
        let metadata = clip.metadata();
        let source_size = Size::new(metadata.width, metadata.height);
        let orientation = metadata.orientation();
        log::debug!(
            "Opened {} ({}, {:?}, {:?})",
            source,
            source_size,
            orientation,
            metadata.duration
        );

        let rendered = self
            .render_all(&mut clip, source, orientation, scratch.path())
            .await;

        run_blocking(|| self.engine.close(clip));
        let variants = rendered?;
        fs::remove_file(&local_source).await?;

        Ok(GenerationReport {
            source: source.clone(),
            orientation,
            source_size,
            variants,
        })
    }

    async fn render_all(
        &self,
        clip: &mut M::Clip,
        source: &SourceReference,
        orientation: Orientation,
        scratch: &Path,
    ) -> Result<Vec<UploadedVariant>, VariantError> {
        let planned = plan(&source.key, orientation);
        let total = planned.len();
        let stem = keys::scratch_stem(&source.key);
        let started = Instant::now();
        let mut uploaded = Vec::with_capacity(total);

        for (index, variant) in planned.into_iter().enumerate() {
            let PlannedVariant { spec, key, size } = variant;
            self.report(spec, &key, index, total, ProgressStage::Started, started);

            let path = scratch.join(format!("{stem}{}", spec.suffix));
            log::debug!("Rendering {} at {} to {}", spec.suffix, size, path.display());
            run_blocking(|| match spec.kind {
                VariantKind::Thumbnail => self.engine.save_frame(
                    clip,
                    self.config.thumbnail_timestamp(),
                    size,
                    &path,
                ),
                VariantKind::Resolution => self.engine.write_resized(clip, size, &path),
            })?;

            let bytes = self
                .store
                .upload(&path, &source.bucket, &key, spec.content_type())
                .await?;
            fs::remove_file(&path).await?;
            log::info!("Uploaded {} to s3://{}/{}", spec.suffix, source.bucket, key);

            self.report(spec, &key, index, total, ProgressStage::Completed, started);
            uploaded.push(UploadedVariant {
                key,
                content_type: spec.content_type(),
                size,
                bytes,
            });
        }

        Ok(uploaded)
    }

    fn report(
        &self,
        spec: &'static VariantSpec,
        key: &str,
        index: usize,
        total: usize,
        stage: ProgressStage,
        started: Instant,
    ) {
        self.progress.on_variant(&ProgressInfo {
            spec,
            key: key.to_string(),
            index,
            total,
            stage,
            elapsed: started.elapsed(),
        });
    }
}

/// Name of the local copy of the source inside the scratch directory.
fn local_file_name(key: &str) -> PathBuf {
    match keys::file_name(key) {
        "" | "." | ".." => PathBuf::from("source"),
        name => PathBuf::from(name),
    }
}
