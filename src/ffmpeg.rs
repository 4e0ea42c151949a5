//! FFmpeg initialisation and log level configuration.
//!
//! FFmpeg writes to stderr through its own logger, not through the
//! [`log`](https://crates.io/crates/log) facade. Inside a function host every
//! line FFmpeg prints to stderr ends up in the invocation log, so the
//! generator silences it down to [`FfmpegLogLevel::Error`] unless configured
//! otherwise.
//!
//! # Example
//!
//! ```no_run
//! use clip_variants::FfmpegLogLevel;
//!
//! let level: FfmpegLogLevel = "warning".parse().unwrap();
//! clip_variants::ffmpeg::initialize(level).unwrap();
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use ffmpeg_next::util::log::Level;

use crate::error::VariantError;

/// Verbosity of FFmpeg's own logger.
///
/// Messages less severe than the chosen level are dropped. Parses from the
/// lowercase names used by the `ffmpeg` command (`warn` is accepted too).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Nothing at all.
    Quiet,
    /// Only log unrecoverable errors.
    Fatal,
    /// Errors the library recovered from.
    #[default]
    Error,
    /// Log warnings (FFmpeg's own default).
    Warning,
    /// Stream and codec information.
    Info,
    /// Everything useful for debugging.
    Debug,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Debug => "debug",
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = VariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(VariantError::Config {
                name: "ffmpeg log level".to_string(),
                reason: format!("unknown level `{other}`"),
            }),
        }
    }
}

/// Initialise FFmpeg and apply `level` to its internal logger.
///
/// Safe to call more than once; FFmpeg's own initialisation is idempotent.
pub fn initialize(level: FfmpegLogLevel) -> Result<(), VariantError> {
    ffmpeg_next::init()?;
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
    log::debug!("FFmpeg initialised (log level {level})");
    Ok(())
}
