//! The fixed variant tables.
//!
//! Every source produces the same ten outputs: five JPEG thumbnails
//! ([`THUMBNAIL_SPECS`]) followed by five MP4 renditions
//! ([`RESOLUTION_SPECS`]). Both tables are ordered smallest first and are
//! processed in that order.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::metadata::Orientation;

/// A pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The same size with width and height swapped.
    pub const fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which family a variant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// A single still frame encoded as JPEG.
    Thumbnail,
    /// The whole clip scaled and re-encoded as H.264/MP4.
    Resolution,
}

impl VariantKind {
    /// MIME type the variant is uploaded with.
    pub const fn content_type(self) -> &'static str {
        match self {
            VariantKind::Thumbnail => "image/jpeg",
            VariantKind::Resolution => "video/mp4",
        }
    }
}

/// One output descriptor: a key suffix and a landscape target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariantSpec {
    /// Suffix that replaces the source's extension (and `-org` marker).
    pub suffix: &'static str,
    /// Target size for landscape sources.
    pub size: Size,
    /// Thumbnail or resolution.
    pub kind: VariantKind,
}

impl VariantSpec {
    const fn thumbnail(suffix: &'static str, width: u32, height: u32) -> Self {
        Self {
            suffix,
            size: Size::new(width, height),
            kind: VariantKind::Thumbnail,
        }
    }

    const fn resolution(suffix: &'static str, width: u32, height: u32) -> Self {
        Self {
            suffix,
            size: Size::new(width, height),
            kind: VariantKind::Resolution,
        }
    }

    /// Target size for a source of the given orientation.
    pub fn target_size(&self, orientation: Orientation) -> Size {
        match orientation {
            Orientation::Landscape => self.size,
            Orientation::Portrait => self.size.transposed(),
        }
    }

    /// MIME type the variant is uploaded with.
    pub fn content_type(&self) -> &'static str {
        self.kind.content_type()
    }
}

/// Thumbnail table, xs through xl.
pub static THUMBNAIL_SPECS: [VariantSpec; 5] = [
    VariantSpec::thumbnail("-xs.jpg", 320, 240),
    VariantSpec::thumbnail("-sm.jpg", 640, 480),
    VariantSpec::thumbnail("-md.jpg", 800, 600),
    VariantSpec::thumbnail("-lg.jpg", 1024, 768),
    VariantSpec::thumbnail("-xl.jpg", 1280, 960),
];

/// Resolution table, 240p through 1080p.
pub static RESOLUTION_SPECS: [VariantSpec; 5] = [
    VariantSpec::resolution("-240p.mp4", 426, 240),
    VariantSpec::resolution("-360p.mp4", 640, 360),
    VariantSpec::resolution("-480p.mp4", 854, 480),
    VariantSpec::resolution("-720p.mp4", 1280, 720),
    VariantSpec::resolution("-1080p.mp4", 1920, 1080),
];

/// All ten variants in processing order: thumbnails, then resolutions.
pub fn all_specs() -> impl Iterator<Item = &'static VariantSpec> {
    THUMBNAIL_SPECS.iter().chain(RESOLUTION_SPECS.iter())
}
