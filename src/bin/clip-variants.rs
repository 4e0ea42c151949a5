use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use clip_variants::{
    FfmpegLogLevel, GeneratorConfig, LocalObjectStore, MediaClip, Orientation, ProgressInfo,
    ProgressStage, SourceReference, VariantGenerator, VariantProgress, ffmpeg, generator, keys,
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const CLI_AFTER_HELP: &str = "Examples:\n  clip-variants generate --root ./buckets --bucket media --key videos/cat-org.mp4 --progress\n  clip-variants plan videos/cat-org.mp4 --width 1080 --height 1920 --json\n  clip-variants probe input.mp4\n  clip-variants completions zsh > _clip-variants";

#[derive(Debug, Parser)]
#[command(
    name = "clip-variants",
    version,
    about = "Generate thumbnails and resolution variants for stored videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Produce all ten variants of an object in a local bucket directory.
    Generate {
        /// Directory holding one subdirectory per bucket.
        #[arg(long)]
        root: PathBuf,

        /// Bucket name (subdirectory of --root).
        #[arg(long)]
        bucket: String,

        /// Key of the source video inside the bucket.
        #[arg(long)]
        key: String,

        /// Thumbnail timestamp in seconds.
        #[arg(long, default_value_t = 1.0)]
        thumbnail_at: f64,

        /// H.264 Constant Rate Factor (0-51).
        #[arg(long)]
        crf: Option<u8>,

        /// x264 preset (ultrafast .. veryslow).
        #[arg(long)]
        preset: Option<String>,

        /// Drop the audio track from resized clips.
        #[arg(long)]
        no_audio: bool,

        /// Skip keys without the `-org` marker.
        #[arg(long)]
        originals_only: bool,

        /// Print the generation report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the keys and sizes a source would produce, without media work.
    Plan {
        /// Source key.
        key: String,

        /// Source width in pixels.
        #[arg(long)]
        width: u32,

        /// Source height in pixels.
        #[arg(long)]
        height: u32,

        #[arg(long)]
        json: bool,
    },
    /// Print clip metadata and orientation.
    Probe {
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    value.parse().ok()
}

fn parse_thumbnail_seconds(seconds: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("--thumbnail-at must be a non-negative number, got {seconds}").into());
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|error| format!("--thumbnail-at {seconds} is out of range: {error}").into())
}

fn apply_global_options(global: &GlobalOptions) -> Result<FfmpegLogLevel, Box<dyn std::error::Error>> {
    let filter = if global.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let level = match &global.log_level {
        Some(level) => {
            parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?
        }
        None => FfmpegLogLevel::default(),
    };
    ffmpeg::initialize(level)?;
    Ok(level)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl VariantProgress for TerminalProgress {
    fn on_variant(&self, info: &ProgressInfo) {
        match info.stage {
            ProgressStage::Started => self.bar.set_message(info.key.clone()),
            ProgressStage::Completed => {
                self.bar.inc(1);
                if info.index + 1 == info.total {
                    self.bar.finish_with_message("done");
                }
            }
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            root,
            bucket,
            key,
            thumbnail_at,
            crf,
            preset,
            no_audio,
            originals_only,
            json,
        } => {
            let level = apply_global_options(&cli.global)?;
            let mut config = GeneratorConfig::new()
                .with_thumbnail_timestamp(parse_thumbnail_seconds(thumbnail_at)?)
                .with_keep_audio(!no_audio)
                .with_originals_only(originals_only)
                .with_ffmpeg_log_level(level);
            if let Some(crf) = crf {
                config = config.with_crf(crf);
            }
            if let Some(preset) = preset {
                config = config.with_preset(preset);
            }

            let engine = config.ffmpeg_engine();
            let mut variant_generator =
                VariantGenerator::new(LocalObjectStore::new(root), engine, config);
            if cli.global.progress {
                variant_generator =
                    variant_generator.with_progress(Arc::new(TerminalProgress::new(10)?));
            }

            let source = SourceReference::new(bucket, key);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            if let Some(reason) = keys::skip_reason(&source.key, originals_only) {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("skipping {source}: {reason}").yellow()
                );
                return Ok(());
            }

            let report = runtime.block_on(variant_generator.generate(&source))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for variant in &report.variants {
                    println!(
                        "{} {} ({}, {}, {} bytes)",
                        "saved".green().bold(),
                        variant.key,
                        variant.size,
                        variant.content_type,
                        variant.bytes
                    );
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Generated {} variant(s) for {} ({}, {:?})",
                        report.variants.len(),
                        report.source,
                        report.source_size,
                        report.orientation
                    )
                    .green()
                );
            }
        }
        Commands::Plan {
            key,
            width,
            height,
            json,
        } => {
            if width == 0 || height == 0 {
                return Err("--width and --height must be non-zero".into());
            }
            let orientation = Orientation::from_dimensions(width, height);
            let planned = generator::plan(&key, orientation);
            if json {
                let payload = json!({
                    "source": key,
                    "orientation": orientation,
                    "variants": planned.iter().map(|variant| json!({
                        "key": variant.key,
                        "content_type": variant.spec.content_type(),
                        "width": variant.size.width,
                        "height": variant.size.height,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Orientation: {orientation:?}");
                for variant in &planned {
                    println!(
                        "{:<40} {:>9} {}",
                        variant.key,
                        variant.size.to_string(),
                        variant.spec.content_type()
                    );
                }
            }
        }
        Commands::Probe { input, json } => {
            apply_global_options(&cli.global)?;
            let clip = MediaClip::open(&input)?;
            let metadata = clip.metadata();
            if json {
                let payload = json!({
                    "metadata": metadata,
                    "orientation": metadata.orientation(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Codec: {}", metadata.codec);
                println!("Dimensions: {}x{}", metadata.width, metadata.height);
                if metadata.rotation != 0 {
                    println!("Rotation: {} degrees", metadata.rotation);
                }
                println!("Orientation: {:?}", metadata.orientation());
                println!("Frame rate: {:.3}", metadata.frames_per_second);
                println!("Frames: {}", metadata.frame_count);
                println!("Duration: {:?}", metadata.duration);
                println!("Audio: {}", if metadata.has_audio { "yes" } else { "no" });
            }
            clip.close();
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "clip-variants", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
