//! Progress reporting.
//!
//! A [`VariantProgress`] implementation observes each of the ten variants
//! as it starts and as its upload completes. The command-line tool drives
//! a progress bar from it; the function binary uses the default no-op.
//!
//! # Example
//!
//! ```
//! use clip_variants::{ProgressInfo, ProgressStage, VariantProgress};
//!
//! struct PrintProgress;
//!
//! impl VariantProgress for PrintProgress {
//!     fn on_variant(&self, info: &ProgressInfo) {
//!         if info.stage == ProgressStage::Completed {
//!             println!("[{}/{}] {}", info.index + 1, info.total, info.key);
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use crate::variants::VariantSpec;

/// Where a variant is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// Rendering has begun.
    Started,
    /// The variant has been uploaded and its scratch file removed.
    Completed,
}

/// A snapshot of generation progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The variant being produced.
    pub spec: &'static VariantSpec,
    /// Destination key of the variant.
    pub key: String,
    /// Zero-based position of the variant in processing order.
    pub index: usize,
    /// Number of variants in this run.
    pub total: usize,
    /// Started or completed.
    pub stage: ProgressStage,
    /// Wall-clock time since the source download finished.
    pub elapsed: Duration,
}

/// Receives progress updates from a [`VariantGenerator`](crate::VariantGenerator).
///
/// Callbacks observe but cannot halt generation.
pub trait VariantProgress: Send + Sync {
    /// Called when a variant starts and again when it completes.
    fn on_variant(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
pub(crate) struct NoOpProgress;

impl VariantProgress for NoOpProgress {
    fn on_variant(&self, _info: &ProgressInfo) {}
}
