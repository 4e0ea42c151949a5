//! The media-processing seam used by the generator.
//!
//! [`MediaEngine`] is the narrow contract the generator needs from a media
//! library: open a clip, read its dimensions, save one scaled frame, write a
//! scaled copy of the whole clip, close it. [`FfmpegEngine`] is the
//! production implementation; tests substitute their own.

use std::{path::Path, time::Duration};

use crate::{
    clip::MediaClip,
    error::VariantError,
    metadata::ClipMetadata,
    thumbnail::ThumbnailHandle,
    transcode::{ClipResizer, DEFAULT_CRF, DEFAULT_PRESET},
    variants::Size,
};

/// Read access to an opened clip.
pub trait ClipHandle {
    /// Metadata read when the clip was opened.
    fn metadata(&self) -> &ClipMetadata;
}

impl ClipHandle for MediaClip {
    fn metadata(&self) -> &ClipMetadata {
        MediaClip::metadata(self)
    }
}

/// Media operations needed to produce variants.
///
/// All methods block; callers inside an async runtime are expected to move
/// them off the reactor.
pub trait MediaEngine: Send + Sync {
    /// The opened-clip type.
    type Clip: ClipHandle + Send;

    /// Open a local file as a video clip.
    fn open(&self, path: &Path) -> Result<Self::Clip, VariantError>;

    /// Write the frame at `timestamp`, scaled to `size`, as JPEG to `dest`.
    fn save_frame(
        &self,
        clip: &mut Self::Clip,
        timestamp: Duration,
        size: Size,
        dest: &Path,
    ) -> Result<u64, VariantError>;

    /// Write the whole clip scaled to `size` as MP4 to `dest`.
    fn write_resized(
        &self,
        clip: &mut Self::Clip,
        size: Size,
        dest: &Path,
    ) -> Result<u64, VariantError>;

    /// Release the clip's decoder resources.
    fn close(&self, clip: Self::Clip);
}

/// [`MediaEngine`] backed by FFmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    jpeg_quality: u8,
    crf: u8,
    preset: String,
    keep_audio: bool,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            crf: DEFAULT_CRF,
            preset: DEFAULT_PRESET.to_string(),
            keep_audio: true,
        }
    }
}

impl FfmpegEngine {
    /// Create an engine with default encoder settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JPEG quality used for thumbnails (1-100).
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set the H.264 Constant Rate Factor (0-51).
    #[must_use]
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(51);
        self
    }

    /// Set the H.264 preset.
    #[must_use]
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Copy the source audio into resized clips.
    #[must_use]
    pub fn with_keep_audio(mut self, keep: bool) -> Self {
        self.keep_audio = keep;
        self
    }
}

impl MediaEngine for FfmpegEngine {
    type Clip = MediaClip;

    fn open(&self, path: &Path) -> Result<MediaClip, VariantError> {
        MediaClip::open(path)
    }

    fn save_frame(
        &self,
        clip: &mut MediaClip,
        timestamp: Duration,
        size: Size,
        dest: &Path,
    ) -> Result<u64, VariantError> {
        ThumbnailHandle::save_jpeg(clip, timestamp, size, dest, self.jpeg_quality)
    }

    fn write_resized(
        &self,
        clip: &mut MediaClip,
        size: Size,
        dest: &Path,
    ) -> Result<u64, VariantError> {
        ClipResizer::new(clip, size)
            .crf(self.crf)
            .preset(self.preset.as_str())
            .keep_audio(self.keep_audio)
            .run(dest)
    }

    fn close(&self, clip: MediaClip) {
        clip.close();
    }
}
