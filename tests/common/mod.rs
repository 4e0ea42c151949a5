//! In-memory store and scripted media engine shared by the generator tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use clip_variants::{
    ClipHandle, ClipMetadata, MediaEngine, ObjectStore, Size, VariantError,
};

/// Bytes that the fake engine refuses to open.
pub const NOT_A_VIDEO: &[u8] = b"not a video";

// ── Store ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub contents: Vec<u8>,
}

/// Object store that keeps objects in memory and records every upload.
#[derive(Default)]
pub struct RecordingStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    fail_upload_at: Option<usize>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str, contents: &[u8]) -> Self {
        self.put(bucket, key, contents);
        self
    }

    /// Fail the upload with this zero-based index with a storage error.
    pub fn failing_upload_at(mut self, index: usize) -> Self {
        self.fail_upload_at = Some(index);
        self
    }

    pub fn put(&self, bucket: &str, key: &str, contents: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), contents.to_vec());
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads().into_iter().map(|upload| upload.key).collect()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, VariantError> {
        let contents = self.get(bucket, key).ok_or_else(|| VariantError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        fs::write(dest, &contents)?;
        Ok(contents.len() as u64)
    }

    async fn upload(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<u64, VariantError> {
        let index = self.uploads.lock().unwrap().len();
        if self.fail_upload_at == Some(index) {
            return Err(VariantError::Storage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "connection reset".to_string(),
            });
        }

        let contents = fs::read(src)?;
        self.put(bucket, key, &contents);
        self.uploads.lock().unwrap().push(RecordedUpload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            contents: contents.clone(),
        });
        Ok(contents.len() as u64)
    }
}

// ── Engine ─────────────────────────────────────────────────────────

pub struct FakeClip {
    metadata: ClipMetadata,
}

impl ClipHandle for FakeClip {
    fn metadata(&self) -> &ClipMetadata {
        &self.metadata
    }
}

/// Media engine that writes a one-line description of each render.
pub struct ScriptedEngine {
    width: u32,
    height: u32,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MediaEngine for ScriptedEngine {
    type Clip = FakeClip;

    fn open(&self, path: &Path) -> Result<FakeClip, VariantError> {
        let contents = fs::read(path).map_err(|error| VariantError::FileOpen {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        if contents == NOT_A_VIDEO {
            return Err(VariantError::NoVideoStream);
        }
        self.record(format!("open {}", file_name(path)));
        Ok(FakeClip {
            metadata: ClipMetadata {
                width: self.width,
                height: self.height,
                rotation: 0,
                frames_per_second: 30.0,
                frame_count: 90,
                duration: Duration::from_secs(3),
                codec: "h264".to_string(),
                format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
                has_audio: true,
            },
        })
    }

    fn save_frame(
        &self,
        _clip: &mut FakeClip,
        timestamp: Duration,
        size: Size,
        dest: &Path,
    ) -> Result<u64, VariantError> {
        let body = format!("jpeg {size} @ {}ms", timestamp.as_millis());
        fs::write(dest, &body)?;
        self.record(format!("frame {size} {}", file_name(dest)));
        Ok(body.len() as u64)
    }

    fn write_resized(
        &self,
        _clip: &mut FakeClip,
        size: Size,
        dest: &Path,
    ) -> Result<u64, VariantError> {
        let body = format!("mp4 {size}");
        fs::write(dest, &body)?;
        self.record(format!("resize {size} {}", file_name(dest)));
        Ok(body.len() as u64)
    }

    fn close(&self, _clip: FakeClip) {
        self.record("close".to_string());
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
