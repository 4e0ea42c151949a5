//! Generator configuration defaults, builders and environment parsing.

use std::{collections::HashMap, env, path::Path, time::Duration};

use clip_variants::{ErrorKind, FfmpegLogLevel, GeneratorConfig, VariantError};

fn from_pairs(pairs: &[(&str, &str)]) -> Result<GeneratorConfig, VariantError> {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    GeneratorConfig::from_lookup(|name| values.get(name).cloned())
}

#[test]
fn defaults() {
    let config = GeneratorConfig::default();
    assert_eq!(config.scratch_dir(), env::temp_dir().as_path());
    assert_eq!(config.thumbnail_timestamp(), Duration::from_secs(1));
    assert_eq!(config.jpeg_quality(), 90);
    assert_eq!(config.crf(), 23);
    assert_eq!(config.preset(), "medium");
    assert!(config.keep_audio());
    assert!(!config.originals_only());
    assert_eq!(config.ffmpeg_log_level(), FfmpegLogLevel::Error);
}

#[test]
fn builder_clamps_encoder_settings() {
    let config = GeneratorConfig::new().with_jpeg_quality(0).with_crf(80);
    assert_eq!(config.jpeg_quality(), 1);
    assert_eq!(config.crf(), 51);

    let config = GeneratorConfig::new().with_jpeg_quality(250);
    assert_eq!(config.jpeg_quality(), 100);
}

#[test]
fn empty_environment_gives_defaults() {
    assert_eq!(from_pairs(&[]).unwrap(), GeneratorConfig::new());
}

#[test]
fn environment_overrides() {
    let config = from_pairs(&[
        ("CLIP_VARIANTS_SCRATCH_DIR", "/mnt/scratch"),
        ("CLIP_VARIANTS_THUMBNAIL_SECONDS", "2.5"),
        ("CLIP_VARIANTS_JPEG_QUALITY", "75"),
        ("CLIP_VARIANTS_CRF", " 28 "),
        ("CLIP_VARIANTS_PRESET", "veryfast"),
        ("CLIP_VARIANTS_KEEP_AUDIO", "false"),
        ("CLIP_VARIANTS_ORIGINALS_ONLY", "yes"),
        ("CLIP_VARIANTS_FFMPEG_LOG_LEVEL", "warn"),
    ])
    .unwrap();

    assert_eq!(config.scratch_dir(), Path::new("/mnt/scratch"));
    assert_eq!(config.thumbnail_timestamp(), Duration::from_millis(2500));
    assert_eq!(config.jpeg_quality(), 75);
    assert_eq!(config.crf(), 28);
    assert_eq!(config.preset(), "veryfast");
    assert!(!config.keep_audio());
    assert!(config.originals_only());
    assert_eq!(config.ffmpeg_log_level(), FfmpegLogLevel::Warning);
}

#[test]
fn blank_values_are_ignored() {
    let config = from_pairs(&[("CLIP_VARIANTS_CRF", "  ")]).unwrap();
    assert_eq!(config.crf(), 23);
}

#[test]
fn invalid_values_name_the_variable() {
    let cases = [
        ("CLIP_VARIANTS_CRF", "high"),
        ("CLIP_VARIANTS_JPEG_QUALITY", "-3"),
        ("CLIP_VARIANTS_THUMBNAIL_SECONDS", "-1"),
        ("CLIP_VARIANTS_THUMBNAIL_SECONDS", "soon"),
        ("CLIP_VARIANTS_KEEP_AUDIO", "maybe"),
        ("CLIP_VARIANTS_FFMPEG_LOG_LEVEL", "chatty"),
    ];
    for (name, value) in cases {
        let error = from_pairs(&[(name, value)]).unwrap_err();
        match &error {
            VariantError::Config { name: reported, .. } => assert_eq!(reported, name),
            other => panic!("expected config error for {name}, got {other:?}"),
        }
        assert_eq!(error.kind(), ErrorKind::Filesystem);
    }
}

#[test]
fn oversized_thumbnail_timestamp_is_a_config_error() {
    for value in ["1e20", "1e300"] {
        let error = from_pairs(&[("CLIP_VARIANTS_THUMBNAIL_SECONDS", value)]).unwrap_err();
        assert!(
            matches!(
                &error,
                VariantError::Config { name, .. } if name == "CLIP_VARIANTS_THUMBNAIL_SECONDS"
            ),
            "{value}: {error:?}"
        );
    }

    let config = from_pairs(&[("CLIP_VARIANTS_THUMBNAIL_SECONDS", "86400")]).unwrap();
    assert_eq!(config.thumbnail_timestamp(), Duration::from_secs(86_400));
}

#[test]
fn engine_inherits_encoder_settings() {
    let config = GeneratorConfig::new().with_crf(30).with_preset("fast");
    // FfmpegEngine keeps its settings private; Debug output is enough to
    // see they were carried over.
    let debug = format!("{:?}", config.ffmpeg_engine());
    assert!(debug.contains("crf: 30"));
    assert!(debug.contains("\"fast\""));
}
