//! Clip metadata types.
//!
//! [`ClipMetadata`] is read once when a clip is opened and cached for the
//! lifetime of the [`MediaClip`](crate::MediaClip). The generator only needs
//! the displayed dimensions (to derive [`Orientation`]) and the duration (to
//! clamp the thumbnail timestamp); the rest is logged and shown by the CLI.

use std::time::Duration;

use serde::Serialize;

/// Metadata for the best video stream of a clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use]
pub struct ClipMetadata {
    /// Displayed width in pixels, after applying `rotation`.
    pub width: u32,
    /// Displayed height in pixels, after applying `rotation`.
    pub height: u32,
    /// Clockwise rotation (0, 90, 180 or 270 degrees) the player applies to
    /// decoded frames, taken from the stream's display matrix.
    pub rotation: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, computed from duration and frame rate.
    pub frame_count: u64,
    /// Total duration of the container.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
    /// Whether the container also carries an audio stream.
    pub has_audio: bool,
}

impl ClipMetadata {
    /// Orientation derived from the displayed dimensions.
    pub fn orientation(&self) -> Orientation {
        Orientation::from_dimensions(self.width, self.height)
    }
}

/// Whether a clip is taller than it is wide.
///
/// Variant tables are written for landscape sources; portrait sources get
/// every target size transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Width is greater than or equal to height.
    Landscape,
    /// Width is strictly less than height.
    Portrait,
}

impl Orientation {
    /// Classify a `width × height` frame. Square frames are landscape.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width < height {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Returns `true` for [`Orientation::Portrait`].
    pub fn is_vertical(self) -> bool {
        self == Orientation::Portrait
    }
}
