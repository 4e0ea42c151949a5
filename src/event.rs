//! Trigger payloads.
//!
//! The generator accepts either a storage notification (one or more
//! records, of which only the first is processed) or a direct
//! `{"bucket": ..., "key": ...}` invocation payload.

use std::fmt::{Display, Formatter, Result as FmtResult};

use aws_lambda_events::event::s3::S3Event;
use serde::{Deserialize, Serialize};

use crate::{error::VariantError, keys};

/// The object an invocation works on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceReference {
    /// Bucket holding the source and receiving the variants.
    pub bucket: String,
    /// Key of the source object.
    pub key: String,
}

impl SourceReference {
    /// Create a reference.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl Display for SourceReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Anything that can start an invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    /// A direct invocation naming the object. Keys are used verbatim.
    Direct(SourceReference),
    /// A storage notification.
    Notification(S3Event),
}

impl Trigger {
    /// Resolve the object to process.
    ///
    /// For notifications only the first record is used; any further
    /// records are ignored with a warning. Notification keys are decoded.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::InvalidEvent`] for a notification without
    /// records or whose first record lacks a bucket name or key.
    pub fn source(&self) -> Result<SourceReference, VariantError> {
        match self {
            Trigger::Direct(source) => Ok(source.clone()),
            Trigger::Notification(event) => {
                let record = event.records.first().ok_or_else(|| {
                    VariantError::InvalidEvent("notification contains no records".to_string())
                })?;
                if event.records.len() > 1 {
                    log::warn!(
                        "Notification carries {} records; only the first is processed",
                        event.records.len()
                    );
                }

                let bucket = record.s3.bucket.name.clone().ok_or_else(|| {
                    VariantError::InvalidEvent("record has no bucket name".to_string())
                })?;
                let raw_key = record.s3.object.key.as_deref().ok_or_else(|| {
                    VariantError::InvalidEvent("record has no object key".to_string())
                })?;

                Ok(SourceReference {
                    bucket,
                    key: keys::decode_notification_key(raw_key),
                })
            }
        }
    }
}
