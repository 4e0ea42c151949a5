//! FFmpeg-backed media tests.
//!
//! Require the fixtures produced by `tests/fixtures/generate_fixtures.sh`;
//! each test returns early when its fixture is missing.

use std::{path::Path, time::Duration};

use clip_variants::{
    ClipResizer, FfmpegEngine, FfmpegLogLevel, GeneratorConfig, LocalObjectStore, MediaClip,
    MediaEngine, Orientation, Size, SourceReference, ThumbnailHandle, VariantError,
    VariantGenerator, ffmpeg,
};
use image::DynamicImage;
use tempfile::TempDir;

const LANDSCAPE: &str = "tests/fixtures/landscape.mp4";
const PORTRAIT: &str = "tests/fixtures/portrait.mp4";
const ROTATED: &str = "tests/fixtures/rotated.mp4";

fn fixture(path: &'static str) -> Option<&'static str> {
    if !Path::new(path).exists() {
        return None;
    }
    ffmpeg::initialize(FfmpegLogLevel::Error).expect("ffmpeg init");
    Some(path)
}

/// Mean absolute difference per RGB channel of two same-sized images.
fn mean_difference(a: &DynamicImage, b: &DynamicImage) -> f64 {
    let (a, b) = (a.to_rgb8(), b.to_rgb8());
    assert_eq!(a.dimensions(), b.dimensions());
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.as_raw().len() as f64
}

/// The landscape fixture's frame at `timestamp`, turned the way a player
/// shows the rotated fixture.
fn upright_reference(rotation: u32, timestamp: Duration) -> (DynamicImage, DynamicImage) {
    let mut landscape = MediaClip::open(LANDSCAPE).expect("open landscape");
    let frame = ThumbnailHandle::at_timestamp(&mut landscape, timestamp, Size::new(320, 240))
        .expect("landscape thumbnail");
    match rotation {
        90 => (frame.rotate90(), frame.rotate270()),
        270 => (frame.rotate270(), frame.rotate90()),
        other => panic!("expected a quarter-turn rotation, got {other}"),
    }
}

// ── Opening ────────────────────────────────────────────────────────

#[test]
fn open_reads_metadata() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let clip = MediaClip::open(path).expect("open");
    let metadata = clip.metadata();
    assert_eq!((metadata.width, metadata.height), (640, 360));
    assert!(metadata.duration >= Duration::from_secs(2));
    assert!(metadata.frames_per_second > 0.0);
    assert!(metadata.has_audio);
    assert_eq!(clip.orientation(), Orientation::Landscape);
    clip.close();
}

#[test]
fn portrait_fixture_is_vertical() {
    let Some(path) = fixture(PORTRAIT) else {
        return;
    };

    let clip = MediaClip::open(path).expect("open");
    assert_eq!((clip.metadata().width, clip.metadata().height), (360, 640));
    assert!(clip.orientation().is_vertical());
}

#[test]
fn rotated_fixture_is_portrait() {
    let Some(path) = fixture(ROTATED) else {
        return;
    };

    let clip = MediaClip::open(path).expect("open");
    let metadata = clip.metadata();
    assert!(matches!(metadata.rotation, 90 | 270), "{}", metadata.rotation);
    assert_eq!((metadata.width, metadata.height), (360, 640));
    assert_eq!(clip.orientation(), Orientation::Portrait);
}

#[test]
fn open_missing_file_fails() {
    ffmpeg::initialize(FfmpegLogLevel::Quiet).expect("ffmpeg init");
    let result = MediaClip::open("tests/fixtures/does_not_exist.mp4");
    assert!(matches!(result, Err(VariantError::FileOpen { .. })));
}

#[test]
fn open_non_media_file_fails() {
    ffmpeg::initialize(FfmpegLogLevel::Quiet).expect("ffmpeg init");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.mp4");
    std::fs::write(&path, b"definitely not a video").unwrap();

    let error = MediaClip::open(&path).unwrap_err();
    assert_eq!(error.kind(), clip_variants::ErrorKind::Decode);
}

// ── Thumbnails ─────────────────────────────────────────────────────

#[test]
fn thumbnail_has_exact_target_size() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let mut clip = MediaClip::open(path).expect("open");
    let image = ThumbnailHandle::at_timestamp(&mut clip, Duration::from_secs(1), Size::new(320, 240))
        .expect("thumbnail");
    assert_eq!((image.width(), image.height()), (320, 240));
}

#[test]
fn thumbnail_past_end_uses_last_frame() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let mut clip = MediaClip::open(path).expect("open");
    let image =
        ThumbnailHandle::at_timestamp(&mut clip, Duration::from_secs(600), Size::new(160, 90))
            .expect("thumbnail");
    assert_eq!((image.width(), image.height()), (160, 90));
}

#[test]
fn save_jpeg_writes_a_jpeg() {
    let Some(path) = fixture(PORTRAIT) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("thumb.jpg");
    let mut clip = MediaClip::open(path).expect("open");
    let bytes = ThumbnailHandle::save_jpeg(
        &mut clip,
        Duration::from_secs(1),
        Size::new(240, 320),
        &output,
        85,
    )
    .expect("save");

    assert!(bytes > 0);
    let written = std::fs::read(&output).unwrap();
    assert_eq!(&written[..2], &[0xFF, 0xD8], "expected JPEG SOI marker");
    let decoded = image::load_from_memory(&written).expect("decode jpeg");
    assert_eq!((decoded.width(), decoded.height()), (240, 320));
}

#[test]
fn rotated_thumbnail_is_upright() {
    let Some(path) = fixture(ROTATED) else {
        return;
    };

    let mut clip = MediaClip::open(path).expect("open");
    let thumbnail =
        ThumbnailHandle::at_timestamp(&mut clip, Duration::from_secs(1), Size::new(240, 320))
            .expect("thumbnail");
    assert_eq!((thumbnail.width(), thumbnail.height()), (240, 320));

    let (upright, turned_wrong_way) =
        upright_reference(clip.metadata().rotation, Duration::from_secs(1));
    let difference = mean_difference(&thumbnail, &upright);
    assert!(difference < 12.0, "upright difference {difference}");
    assert!(difference < mean_difference(&thumbnail, &turned_wrong_way));
}

#[test]
fn zero_sized_thumbnail_is_rejected() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let mut clip = MediaClip::open(path).expect("open");
    let result = ThumbnailHandle::at_timestamp(&mut clip, Duration::ZERO, Size::new(0, 240));
    assert!(matches!(result, Err(VariantError::InvalidDimensions { .. })));
}

// ── Resizing ───────────────────────────────────────────────────────

#[test]
fn resized_clip_has_target_dimensions() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out-240p.mp4");
    let mut clip = MediaClip::open(path).expect("open");
    let bytes = ClipResizer::new(&mut clip, Size::new(426, 240))
        .preset("ultrafast")
        .run(&output)
        .expect("resize");
    assert!(bytes > 0);

    let resized = MediaClip::open(&output).expect("open output");
    assert_eq!((resized.metadata().width, resized.metadata().height), (426, 240));
    assert_eq!(resized.metadata().codec, "h264");
    assert!(resized.metadata().has_audio);
}

#[test]
fn rotated_clip_is_resized_upright() {
    let Some(path) = fixture(ROTATED) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tall-360p.mp4");
    let mut clip = MediaClip::open(path).expect("open");
    let rotation = clip.metadata().rotation;
    ClipResizer::new(&mut clip, Size::new(360, 640))
        .preset("ultrafast")
        .run(&output)
        .expect("resize");

    let mut resized = MediaClip::open(&output).expect("open output");
    assert_eq!(resized.metadata().rotation, 0);
    assert_eq!((resized.metadata().width, resized.metadata().height), (360, 640));

    let frame =
        ThumbnailHandle::at_timestamp(&mut resized, Duration::from_secs(1), Size::new(240, 320))
            .expect("thumbnail of resized clip");
    let (upright, turned_wrong_way) = upright_reference(rotation, Duration::from_secs(1));
    let difference = mean_difference(&frame, &upright);
    assert!(difference < 20.0, "upright difference {difference}");
    assert!(difference < mean_difference(&frame, &turned_wrong_way));
}

#[test]
fn resizing_without_audio_drops_the_track() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("silent.mp4");
    let mut clip = MediaClip::open(path).expect("open");
    ClipResizer::new(&mut clip, Size::new(320, 180))
        .preset("ultrafast")
        .keep_audio(false)
        .run(&output)
        .expect("resize");

    let resized = MediaClip::open(&output).expect("open output");
    assert!(!resized.metadata().has_audio);
}

#[test]
fn odd_dimensions_are_rejected() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let mut clip = MediaClip::open(path).expect("open");
    let result = ClipResizer::new(&mut clip, Size::new(427, 240)).run(dir.path().join("odd.mp4"));
    assert!(matches!(
        result,
        Err(VariantError::InvalidDimensions { width: 427, height: 240 })
    ));
}

#[test]
fn thumbnail_after_resize_still_works() {
    let Some(path) = fixture(LANDSCAPE) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let engine = FfmpegEngine::new().with_preset("ultrafast");
    let mut clip = engine.open(Path::new(path)).expect("open");
    engine
        .write_resized(&mut clip, Size::new(426, 240), &dir.path().join("a.mp4"))
        .expect("resize");
    let bytes = engine
        .save_frame(
            &mut clip,
            Duration::from_secs(1),
            Size::new(320, 240),
            &dir.path().join("a.jpg"),
        )
        .expect("thumbnail");
    assert!(bytes > 0);
    engine.close(clip);
}

// ── End to end ─────────────────────────────────────────────────────

#[tokio::test]
async fn generates_all_variants_for_portrait_source() {
    let Some(path) = fixture(PORTRAIT) else {
        return;
    };

    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let bucket_dir = root.path().join("media/videos");
    std::fs::create_dir_all(&bucket_dir).unwrap();
    std::fs::copy(path, bucket_dir.join("tall-org.mp4")).unwrap();

    let config = GeneratorConfig::new()
        .with_scratch_dir(scratch.path())
        .with_preset("ultrafast");
    let engine = config.ffmpeg_engine();
    let generator = VariantGenerator::new(LocalObjectStore::new(root.path()), engine, config);

    let report = generator
        .generate(&SourceReference::new("media", "videos/tall-org.mp4"))
        .await
        .expect("generate");

    assert_eq!(report.orientation, Orientation::Portrait);
    assert_eq!(report.variants.len(), 10);
    let xs = image::open(bucket_dir.join("tall-xs.jpg")).expect("xs thumbnail");
    assert_eq!((xs.width(), xs.height()), (240, 320));
    let p360 = MediaClip::open(bucket_dir.join("tall-360p.mp4")).expect("360p");
    assert_eq!((p360.metadata().width, p360.metadata().height), (360, 640));
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
