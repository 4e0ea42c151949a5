//! Generator configuration.
//!
//! [`GeneratorConfig`] is a builder that threads the operational settings
//! (scratch location, thumbnail timestamp, encoder quality, source filter)
//! through the generator. Every field has a default matching the behaviour
//! of the function as deployed; [`GeneratorConfig::from_env`] overrides
//! them from `CLIP_VARIANTS_*` environment variables.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use clip_variants::GeneratorConfig;
//!
//! let config = GeneratorConfig::new()
//!     .with_thumbnail_timestamp(Duration::from_millis(500))
//!     .with_crf(28)
//!     .with_originals_only(true);
//! assert_eq!(config.crf(), 28);
//! ```

use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::{error::VariantError, ffmpeg::FfmpegLogLevel, media::FfmpegEngine};

/// Environment variable for [`GeneratorConfig::with_scratch_dir`].
pub const ENV_SCRATCH_DIR: &str = "CLIP_VARIANTS_SCRATCH_DIR";
/// Environment variable for [`GeneratorConfig::with_thumbnail_timestamp`] (seconds).
pub const ENV_THUMBNAIL_SECONDS: &str = "CLIP_VARIANTS_THUMBNAIL_SECONDS";
/// Environment variable for [`GeneratorConfig::with_jpeg_quality`].
pub const ENV_JPEG_QUALITY: &str = "CLIP_VARIANTS_JPEG_QUALITY";
/// Environment variable for [`GeneratorConfig::with_crf`].
pub const ENV_CRF: &str = "CLIP_VARIANTS_CRF";
/// Environment variable for [`GeneratorConfig::with_preset`].
pub const ENV_PRESET: &str = "CLIP_VARIANTS_PRESET";
/// Environment variable for [`GeneratorConfig::with_keep_audio`].
pub const ENV_KEEP_AUDIO: &str = "CLIP_VARIANTS_KEEP_AUDIO";
/// Environment variable for [`GeneratorConfig::with_originals_only`].
pub const ENV_ORIGINALS_ONLY: &str = "CLIP_VARIANTS_ORIGINALS_ONLY";
/// Environment variable for [`GeneratorConfig::with_ffmpeg_log_level`].
pub const ENV_FFMPEG_LOG_LEVEL: &str = "CLIP_VARIANTS_FFMPEG_LOG_LEVEL";

/// Settings for a [`VariantGenerator`](crate::VariantGenerator).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    scratch_dir: PathBuf,
    thumbnail_timestamp: Duration,
    jpeg_quality: u8,
    crf: u8,
    preset: String,
    keep_audio: bool,
    originals_only: bool,
    ffmpeg_log_level: FfmpegLogLevel,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorConfig {
    /// Create a configuration with default settings.
    ///
    /// Defaults: system temp directory, thumbnail at 1 s, JPEG quality 90,
    /// CRF 23, preset `medium`, audio kept, every key processed, FFmpeg
    /// logging at `error`.
    pub fn new() -> Self {
        Self {
            scratch_dir: env::temp_dir(),
            thumbnail_timestamp: Duration::from_secs(1),
            jpeg_quality: 90,
            crf: 23,
            preset: "medium".to_string(),
            keep_audio: true,
            originals_only: false,
            ffmpeg_log_level: FfmpegLogLevel::Error,
        }
    }

    /// Build a configuration from `CLIP_VARIANTS_*` environment variables,
    /// falling back to the defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::Config`] naming the first variable whose
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, VariantError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`from_env`](GeneratorConfig::from_env) but reading values
    /// through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VariantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(dir) = value(ENV_SCRATCH_DIR) {
            config = config.with_scratch_dir(dir);
        }
        if let Some(seconds) = value(ENV_THUMBNAIL_SECONDS) {
            let seconds: f64 = parse(ENV_THUMBNAIL_SECONDS, &seconds)?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(invalid(ENV_THUMBNAIL_SECONDS, "must be a non-negative number"));
            }
            let timestamp = Duration::try_from_secs_f64(seconds)
                .map_err(|error| invalid(ENV_THUMBNAIL_SECONDS, error))?;
            config = config.with_thumbnail_timestamp(timestamp);
        }
        if let Some(quality) = value(ENV_JPEG_QUALITY) {
            config = config.with_jpeg_quality(parse(ENV_JPEG_QUALITY, &quality)?);
        }
        if let Some(crf) = value(ENV_CRF) {
            config = config.with_crf(parse(ENV_CRF, &crf)?);
        }
        if let Some(preset) = value(ENV_PRESET) {
            config = config.with_preset(preset.trim());
        }
        if let Some(keep) = value(ENV_KEEP_AUDIO) {
            config = config.with_keep_audio(parse_flag(ENV_KEEP_AUDIO, &keep)?);
        }
        if let Some(only) = value(ENV_ORIGINALS_ONLY) {
            config = config.with_originals_only(parse_flag(ENV_ORIGINALS_ONLY, &only)?);
        }
        if let Some(level) = value(ENV_FFMPEG_LOG_LEVEL) {
            let level = level
                .parse::<FfmpegLogLevel>()
                .map_err(|error| invalid(ENV_FFMPEG_LOG_LEVEL, error))?;
            config = config.with_ffmpeg_log_level(level);
        }

        Ok(config)
    }

    /// Directory under which each invocation creates its scratch directory.
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Timestamp thumbnails are taken at.
    #[must_use]
    pub fn with_thumbnail_timestamp(mut self, timestamp: Duration) -> Self {
        self.thumbnail_timestamp = timestamp;
        self
    }

    /// JPEG quality for thumbnails, clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// H.264 Constant Rate Factor, clamped to `0..=51`.
    #[must_use]
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(51);
        self
    }

    /// H.264 encoder preset.
    #[must_use]
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Copy source audio into resized clips.
    #[must_use]
    pub fn with_keep_audio(mut self, keep: bool) -> Self {
        self.keep_audio = keep;
        self
    }

    /// Only process keys carrying the `-org` marker.
    #[must_use]
    pub fn with_originals_only(mut self, only: bool) -> Self {
        self.originals_only = only;
        self
    }

    /// Verbosity of FFmpeg's own logger.
    #[must_use]
    pub fn with_ffmpeg_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.ffmpeg_log_level = level;
        self
    }

    /// Directory under which scratch directories are created.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Timestamp thumbnails are taken at.
    pub fn thumbnail_timestamp(&self) -> Duration {
        self.thumbnail_timestamp
    }

    /// JPEG quality for thumbnails.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// H.264 Constant Rate Factor.
    pub fn crf(&self) -> u8 {
        self.crf
    }

    /// H.264 encoder preset.
    pub fn preset(&self) -> &str {
        &self.preset
    }

    /// Whether source audio is copied into resized clips.
    pub fn keep_audio(&self) -> bool {
        self.keep_audio
    }

    /// Whether keys without the `-org` marker are skipped.
    pub fn originals_only(&self) -> bool {
        self.originals_only
    }

    /// Verbosity of FFmpeg's own logger.
    pub fn ffmpeg_log_level(&self) -> FfmpegLogLevel {
        self.ffmpeg_log_level
    }

    /// An [`FfmpegEngine`] using this configuration's encoder settings.
    pub fn ffmpeg_engine(&self) -> FfmpegEngine {
        FfmpegEngine::new()
            .with_jpeg_quality(self.jpeg_quality)
            .with_crf(self.crf)
            .with_preset(self.preset.clone())
            .with_keep_audio(self.keep_audio)
    }
}

fn invalid(name: &str, reason: impl ToString) -> VariantError {
    VariantError::Config {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(name: &str, value: &str) -> Result<T, VariantError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|error: T::Err| invalid(name, error))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, VariantError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(name, format!("expected a boolean, got `{other}`"))),
    }
}
