//! Single-frame thumbnail extraction.
//!
//! A thumbnail is the first decoded frame at or after a timestamp, scaled to
//! an exact target size and written as JPEG. Aspect ratio is not preserved:
//! the variant tables already carry the intended ratio and portrait sources
//! receive transposed sizes. Frames from streams with a display rotation are
//! turned upright after scaling.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder};

use crate::{clip::MediaClip, conversion, error::VariantError, variants::Size};

/// Thumbnail extraction helpers.
///
/// All methods are stateless functions that accept a [`MediaClip`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use clip_variants::{MediaClip, Size, ThumbnailHandle, VariantError};
///
/// let mut clip = MediaClip::open("input.mp4")?;
/// ThumbnailHandle::save_jpeg(
///     &mut clip,
///     Duration::from_secs(1),
///     Size::new(320, 240),
///     "thumb.jpg",
///     90,
/// )?;
/// # Ok::<(), VariantError>(())
/// ```
pub struct ThumbnailHandle;

impl ThumbnailHandle {
    /// Decode the frame shown at `timestamp` and scale it to `size`.
    ///
    /// Timestamps past the end of the clip resolve to the last frame.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::InvalidDimensions`] for a zero-sized target,
    /// or [`VariantError::VideoDecodeError`] if no frame could be decoded.
    pub fn at_timestamp(
        clip: &mut MediaClip,
        timestamp: Duration,
        size: Size,
    ) -> Result<DynamicImage, VariantError> {
        if size.width == 0 || size.height == 0 {
            return Err(VariantError::InvalidDimensions {
                width: size.width,
                height: size.height,
            });
        }

        let duration = clip.metadata.duration;
        let timestamp = if !duration.is_zero() && timestamp > duration {
            log::warn!(
                "Thumbnail timestamp {:?} is past the end of {} ({:?}); using the last frame",
                timestamp,
                clip.file_path.display(),
                duration,
            );
            duration
        } else {
            timestamp
        };

        log::debug!("Extracting frame at {:?} scaled to {}", timestamp, size);

        let video_stream_index = clip.video_stream_index;
        let stream = clip
            .input_context
            .stream(video_stream_index)
            .ok_or(VariantError::NoVideoStream)?;
        let time_base = stream.time_base();
        let rotation = clip.metadata.rotation;
        let scaled_size = conversion::unrotated_size(size, rotation);
        let mut decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| VariantError::decode("cannot create video decoder", error))?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            scaled_size.width,
            scaled_size.height,
            ScalingFlags::BILINEAR,
        )?;

        // Seek to the nearest keyframe before the target, then decode forward.
        let seek_target = conversion::duration_to_seek_timestamp(timestamp);
        clip.input_context
            .seek(seek_target, ..seek_target)
            .map_err(|error| VariantError::decode("seek failed", error))?;

        let target_seconds = timestamp.as_secs_f64();
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();
        let mut last_frame: Option<VideoFrame> = None;

        for (stream, packet) in clip.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| VariantError::decode("send_packet failed", error))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.timestamp().or(decoded_frame.pts()).unwrap_or(0);
                if conversion::pts_to_seconds(pts, time_base) >= target_seconds {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return convert_frame_to_image(&rgb_frame, scaled_size, rotation);
                }
                last_frame = Some(decoded_frame.clone());
            }
        }

        decoder
            .send_eof()
            .map_err(|error| VariantError::decode("send_eof failed", error))?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.timestamp().or(decoded_frame.pts()).unwrap_or(0);
            if conversion::pts_to_seconds(pts, time_base) >= target_seconds {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return convert_frame_to_image(&rgb_frame, scaled_size, rotation);
            }
            last_frame = Some(decoded_frame.clone());
        }

        match last_frame {
            Some(frame) => {
                scaler.run(&frame, &mut rgb_frame)?;
                convert_frame_to_image(&rgb_frame, scaled_size, rotation)
            }
            None => Err(VariantError::VideoDecodeError(format!(
                "no frame could be decoded at or before {timestamp:?}"
            ))),
        }
    }

    /// Extract a thumbnail and write it to `path` as JPEG.
    ///
    /// `quality` is clamped to `1..=100`. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns errors from [`at_timestamp`](ThumbnailHandle::at_timestamp), or
    /// [`VariantError::ImageError`] / [`VariantError::IoError`] if the file
    /// cannot be written.
    pub fn save_jpeg<P: AsRef<Path>>(
        clip: &mut MediaClip,
        timestamp: Duration,
        size: Size,
        path: P,
        quality: u8,
    ) -> Result<u64, VariantError> {
        let image = Self::at_timestamp(clip, timestamp, size)?;
        let path = path.as_ref();

        let mut writer = BufWriter::new(File::create(path)?);
        image.write_with_encoder(JpegEncoder::new_with_quality(
            &mut writer,
            quality.clamp(1, 100),
        ))?;
        writer.flush()?;

        let bytes = std::fs::metadata(path)?.len();
        log::debug!("Wrote {} byte thumbnail to {}", bytes, path.display());
        Ok(bytes)
    }
}

/// Convert a scaled RGB24 video frame to an [`image::DynamicImage`] and
/// turn it clockwise by `rotation` degrees.
fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    size: Size,
    rotation: u32,
) -> Result<DynamicImage, VariantError> {
    let buffer = conversion::frame_to_rgb_buffer(rgb_frame, size.width, size.height);
    let rgb_image = RgbImage::from_raw(size.width, size.height, buffer).ok_or_else(|| {
        VariantError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    let image = DynamicImage::ImageRgb8(rgb_image);
    Ok(match rotation {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    })
}
