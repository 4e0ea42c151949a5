//! Whole-clip resizing (decode, scale, re-encode).
//!
//! [`ClipResizer`] decodes every frame of the clip's video stream, scales it
//! to a fixed size and re-encodes it as H.264 into a new container whose
//! format is inferred from the output extension. Sources with a display
//! rotation are re-encoded upright, so the output carries no rotation. The
//! first audio stream is copied packet-for-packet unless disabled.
//!
//! # Example
//!
//! ```no_run
//! use clip_variants::{ClipResizer, MediaClip, Size, VariantError};
//!
//! let mut clip = MediaClip::open("input.mp4")?;
//! ClipResizer::new(&mut clip, Size::new(640, 360))
//!     .crf(23)
//!     .preset("fast")
//!     .run("output-360p.mp4")?;
//! # Ok::<(), VariantError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{
    Dictionary, Packet, Rational,
    codec::{Flags as CodecFlags, Id, context::Context as CodecContext},
    decoder,
    encoder,
    format::{Flags as FormatFlags, Pixel, context::Output},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{clip::MediaClip, conversion, error::VariantError, variants::Size};

/// Default Constant Rate Factor.
pub const DEFAULT_CRF: u8 = 23;

/// Default x264 preset.
pub const DEFAULT_PRESET: &str = "medium";

/// Builder for a single resize-and-re-encode pass over a clip.
///
/// Obtained via [`ClipResizer::new`]. The clip is rewound before decoding,
/// so several resizers can run one after another on the same clip.
pub struct ClipResizer<'a> {
    clip: &'a mut MediaClip,
    size: Size,
    crf: u8,
    preset: String,
    keep_audio: bool,
}

impl<'a> ClipResizer<'a> {
    /// Create a resizer targeting `size`.
    pub fn new(clip: &'a mut MediaClip, size: Size) -> Self {
        Self {
            clip,
            size,
            crf: DEFAULT_CRF,
            preset: DEFAULT_PRESET.to_string(),
            keep_audio: true,
        }
    }

    /// Set the Constant Rate Factor (0-51, lower is better).
    #[must_use]
    pub fn crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(51);
        self
    }

    /// Set the encoder speed preset (e.g. `"veryfast"`, `"medium"`).
    #[must_use]
    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Copy the clip's audio stream into the output. Defaults to `true`.
    #[must_use]
    pub fn keep_audio(mut self, keep: bool) -> Self {
        self.keep_audio = keep;
        self
    }

    /// Run the resize and write the result to `path`.
    ///
    /// Returns the size of the written file in bytes.
    ///
    /// # Errors
    ///
    /// - [`VariantError::InvalidDimensions`] if the target is zero or odd
    ///   in either dimension (4:2:0 chroma needs even sizes).
    /// - [`VariantError::VideoEncodeError`] if no H.264 encoder is available
    ///   or the output cannot be written.
    /// - [`VariantError::VideoDecodeError`] if the source cannot be read.
    /// - [`VariantError::FfmpegError`] for scaling failures.
    pub fn run<P: AsRef<Path>>(self, path: P) -> Result<u64, VariantError> {
        let path = path.as_ref();
        let Size { width, height } = self.size;
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(VariantError::InvalidDimensions { width, height });
        }

        log::info!(
            "Resizing {} to {} -> {} (crf={}, preset={}, audio={})",
            self.clip.file_path.display(),
            self.size,
            path.display(),
            self.crf,
            self.preset,
            self.keep_audio && self.clip.audio_stream_index.is_some(),
        );

        self.clip.rewind()?;

        let mut output = ffmpeg_next::format::output(&path).map_err(|error| {
            VariantError::VideoEncodeError(format!("cannot open output {}: {error}", path.display()))
        })?;
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        // Video: decoder for the source stream, H.264 encoder for the output.
        let video_input_index = self.clip.video_stream_index;
        let (input_time_base, frame_rate, decoder) = {
            let stream = self
                .clip
                .input_context
                .stream(video_input_index)
                .ok_or(VariantError::NoVideoStream)?;
            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| VariantError::decode("cannot create video decoder", error))?;
            (stream.time_base(), stream.avg_frame_rate(), decoder)
        };

        let codec = encoder::find(Id::H264)
            .ok_or_else(|| VariantError::VideoEncodeError("H.264 encoder not available".to_string()))?;

        let (video_output_index, encoder) = {
            let mut stream = output.add_stream(codec).map_err(|error| {
                VariantError::VideoEncodeError(format!("cannot add video stream: {error}"))
            })?;

            let mut video_encoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.encoder().video())
                .map_err(|error| {
                    VariantError::VideoEncodeError(format!("cannot create video encoder: {error}"))
                })?;
            video_encoder.set_width(width);
            video_encoder.set_height(height);
            video_encoder.set_format(Pixel::YUV420P);
            video_encoder.set_time_base(input_time_base);
            if frame_rate.numerator() > 0 && frame_rate.denominator() > 0 {
                video_encoder.set_frame_rate(Some(frame_rate));
            }
            if needs_global_header {
                video_encoder.set_flags(CodecFlags::GLOBAL_HEADER);
            }

            let mut options = Dictionary::new();
            options.set("crf", &self.crf.to_string());
            options.set("preset", &self.preset);

            let opened = video_encoder.open_as_with(codec, options).map_err(|error| {
                VariantError::VideoEncodeError(format!("cannot open encoder: {error}"))
            })?;
            stream.set_parameters(&opened);
            (stream.index(), opened)
        };

        // Audio: plain packet copy into a second output stream.
        let audio_mapping = match self.clip.audio_stream_index {
            Some(audio_input_index) if self.keep_audio => {
                let input_stream = self
                    .clip
                    .input_context
                    .stream(audio_input_index)
                    .ok_or_else(|| {
                        VariantError::VideoEncodeError("audio stream disappeared".to_string())
                    })?;
                let mut output_stream = output.add_stream(encoder::find(Id::None))?;
                output_stream.set_parameters(input_stream.parameters());
                // Let the muxer pick the codec tag for the new container.
                unsafe {
                    (*output_stream.parameters().as_mut_ptr()).codec_tag = 0;
                }
                Some((audio_input_index, output_stream.index()))
            }
            _ => None,
        };

        output.write_header().map_err(|error| {
            VariantError::VideoEncodeError(format!("cannot write header: {error}"))
        })?;

        let output_time_base = output
            .stream(video_output_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| VariantError::VideoEncodeError("output stream missing".to_string()))?;

        let rotation = self.clip.metadata.rotation;
        let scaled_size = conversion::unrotated_size(self.size, rotation);
        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::YUV420P,
            scaled_size.width,
            scaled_size.height,
            ScalingFlags::BILINEAR,
        )?;

        let mut pipeline = VideoPipeline {
            decoder,
            scaler,
            encoder,
            rotation,
            output_index: video_output_index,
            input_time_base,
            output_time_base,
            frames: 0,
        };

        for (stream, mut packet) in self.clip.input_context.packets() {
            let index = stream.index();
            if index == video_input_index {
                pipeline
                    .decoder
                    .send_packet(&packet)
                    .map_err(|error| VariantError::decode("send_packet failed", error))?;
                pipeline.drain_decoder(&mut output)?;
                continue;
            }

            let Some((_, audio_output_index)) =
                audio_mapping.filter(|(audio_input_index, _)| *audio_input_index == index)
            else {
                continue;
            };
            let audio_time_base = output
                .stream(audio_output_index)
                .map(|stream| stream.time_base())
                .ok_or_else(|| {
                    VariantError::VideoEncodeError("audio output stream missing".to_string())
                })?;
            packet.set_stream(audio_output_index);
            packet.rescale_ts(stream.time_base(), audio_time_base);
            packet.set_position(-1);
            packet.write_interleaved(&mut output).map_err(|error| {
                VariantError::VideoEncodeError(format!("write audio packet failed: {error}"))
            })?;
        }

        pipeline
            .decoder
            .send_eof()
            .map_err(|error| VariantError::decode("send_eof failed", error))?;
        pipeline.drain_decoder(&mut output)?;
        pipeline.encoder.send_eof().map_err(|error| {
            VariantError::VideoEncodeError(format!("send_eof failed: {error}"))
        })?;
        pipeline.drain_encoder(&mut output)?;

        output.write_trailer().map_err(|error| {
            VariantError::VideoEncodeError(format!("cannot write trailer: {error}"))
        })?;

        if pipeline.frames == 0 {
            return Err(VariantError::VideoDecodeError(
                "source produced no video frames".to_string(),
            ));
        }

        let bytes = std::fs::metadata(path)?.len();
        log::debug!(
            "Encoded {} frames ({} bytes) to {}",
            pipeline.frames,
            bytes,
            path.display()
        );
        Ok(bytes)
    }
}

/// Decoder → scaler → encoder chain for the video stream.
struct VideoPipeline {
    decoder: decoder::Video,
    scaler: ScalingContext,
    encoder: encoder::video::Encoder,
    /// Clockwise turn applied after scaling.
    rotation: u32,
    output_index: usize,
    input_time_base: Rational,
    output_time_base: Rational,
    frames: u64,
}

impl VideoPipeline {
    /// Scale and encode every frame the decoder has ready.
    fn drain_decoder(&mut self, output: &mut Output) -> Result<(), VariantError> {
        let mut decoded_frame = VideoFrame::empty();
        while self.decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.timestamp().or(decoded_frame.pts());

            // A fresh destination per frame: the encoder may still reference
            // the previous one.
            let mut scaled_frame = VideoFrame::empty();
            self.scaler.run(&decoded_frame, &mut scaled_frame)?;
            if self.rotation != 0 {
                scaled_frame = conversion::rotate_planar_frame(&scaled_frame, self.rotation);
            }
            scaled_frame.set_pts(pts);

            self.encoder.send_frame(&scaled_frame).map_err(|error| {
                VariantError::VideoEncodeError(format!("send_frame failed: {error}"))
            })?;
            self.frames += 1;
            self.drain_encoder(output)?;
        }
        Ok(())
    }

    /// Write every packet the encoder has ready.
    fn drain_encoder(&mut self, output: &mut Output) -> Result<(), VariantError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.output_index);
            packet.rescale_ts(self.input_time_base, self.output_time_base);
            packet.write_interleaved(output).map_err(|error| {
                VariantError::VideoEncodeError(format!("write packet failed: {error}"))
            })?;
        }
        Ok(())
    }
}
