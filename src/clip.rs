//! Core [`MediaClip`] implementation.
//!
//! `MediaClip` opens a local video file, locates its best video (and audio)
//! stream, and caches [`ClipMetadata`]. Frame extraction lives in
//! [`thumbnail`](crate::thumbnail) and whole-clip re-encoding in
//! [`transcode`](crate::transcode); both borrow the clip mutably.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{
    conversion,
    error::VariantError,
    metadata::{ClipMetadata, Orientation},
};

/// An opened video file.
///
/// Created via [`MediaClip::open`]. Dropping the clip (or calling
/// [`close`](MediaClip::close)) releases the demuxer.
///
/// # Example
///
/// ```no_run
/// use clip_variants::{MediaClip, VariantError};
///
/// let clip = MediaClip::open("input.mp4")?;
/// println!("{}x{} ({:?})", clip.metadata().width, clip.metadata().height, clip.orientation());
/// clip.close();
/// # Ok::<(), VariantError>(())
/// ```
pub struct MediaClip {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Cached metadata extracted at open time.
    pub(crate) metadata: ClipMetadata,
    /// Index of the best video stream.
    pub(crate) video_stream_index: usize,
    /// Index of the best audio stream, if one exists.
    pub(crate) audio_stream_index: Option<usize>,
    /// Path to the opened file (kept for error messages).
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaClip {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaClip")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("audio_stream_index", &self.audio_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaClip {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::FileOpen`] if the file cannot be opened or its
    /// video decoder cannot be created, and [`VariantError::NoVideoStream`]
    /// if the container has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VariantError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening clip: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| VariantError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| VariantError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let video_stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(VariantError::NoVideoStream)?;
        let video_stream_index = video_stream.index();

        let audio_stream_index = input_context
            .streams()
            .best(Type::Audio)
            .map(|stream| stream.index());

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let decoder_context = CodecContext::from_parameters(video_stream.parameters())
            .map_err(|error| VariantError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to read video codec parameters: {error}"),
            })?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| VariantError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let coded_width = video_decoder.width();
        let coded_height = video_decoder.height();
        if coded_width == 0 || coded_height == 0 {
            return Err(VariantError::FileOpen {
                path: file_path,
                reason: "video stream reports zero dimensions".to_string(),
            });
        }

        let rotation = conversion::stream_rotation(&video_stream);
        let (width, height) = if conversion::is_quarter_turn(rotation) {
            (coded_height, coded_width)
        } else {
            (coded_width, coded_height)
        };

        let frames_per_second =
            conversion::frames_per_second(video_stream.avg_frame_rate(), video_stream.rate());
        let frame_count = if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = ClipMetadata {
            width,
            height,
            rotation,
            frames_per_second,
            frame_count,
            duration,
            codec,
            format: input_context.format().name().to_string(),
            has_audio: audio_stream_index.is_some(),
        };

        log::info!(
            "Opened clip: {} ({}x{}, rotation={}, {:.2} fps, {:.2}s, codec={}, audio={})",
            file_path.display(),
            metadata.width,
            metadata.height,
            metadata.rotation,
            metadata.frames_per_second,
            metadata.duration.as_secs_f64(),
            metadata.codec,
            metadata.has_audio,
        );

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            audio_stream_index,
            file_path,
        })
    }

    /// Get a reference to the cached clip metadata.
    pub fn metadata(&self) -> &ClipMetadata {
        &self.metadata
    }

    /// Orientation derived from the displayed dimensions, so a rotated
    /// phone recording stored as landscape frames is portrait.
    pub fn orientation(&self) -> Orientation {
        self.metadata.orientation()
    }

    /// Path the clip was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Release the demuxer and any decoder state.
    pub fn close(self) {
        log::debug!("Closing clip: {}", self.file_path.display());
    }

    /// Rewind the demuxer to the start of the file.
    pub(crate) fn rewind(&mut self) -> Result<(), VariantError> {
        self.input_context
            .seek(0, ..0)
            .map_err(|error| VariantError::decode("rewind failed", error))?;
        Ok(())
    }
}
