use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use faceseek_core::OnnxFaceEngine;
use faceseek_video::VideoCodec;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

mod config;
mod reference;
mod report;
mod scanner;

use config::{resolve_model_dir, ScanConfig};
use scanner::ScanOptions;

#[derive(Parser)]
#[command(
    name = "faceseek",
    about = "Scan a video for known faces and write an annotated copy"
)]
struct Cli {
    /// Directory of reference photos (.png/.jpg/.jpeg), one person per image
    reference_dir: PathBuf,

    /// Input video to scan
    video: PathBuf,

    /// Output path for the annotated video
    #[arg(short, long, default_value = "output_with_matches.mp4")]
    output: PathBuf,

    /// Match tolerance; lower is stricter
    #[arg(short, long, default_value_t = 0.6)]
    tolerance: f32,

    /// Downscale factor applied before detection (1.0 disables)
    #[arg(short, long, default_value_t = 0.25)]
    downscale: f32,

    /// Output video codec
    #[arg(long, value_enum, default_value_t = CodecArg::Mpeg4)]
    codec: CodecArg,

    /// Directory containing det_10g.onnx and w600k_r50.onnx
    /// (defaults to $FACESEEK_MODEL_DIR, then ./models)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Also write the match list as JSON to this path
    #[arg(long)]
    json_report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    Mpeg4,
    H264,
}

impl From<CodecArg> for VideoCodec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Mpeg4 => VideoCodec::Mpeg4,
            CodecArg::H264 => VideoCodec::H264,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ScanConfig {
        reference_dir: cli.reference_dir,
        video: cli.video,
        output: cli.output,
        tolerance: cli.tolerance,
        downscale: cli.downscale,
        codec: cli.codec.into(),
        model_dir: resolve_model_dir(cli.model_dir),
        json_report: cli.json_report,
    };
    config.validate()?;

    let mut engine = OnnxFaceEngine::load(&config.model_dir).with_context(|| {
        format!(
            "failed to load ONNX models from {}",
            config.model_dir.display()
        )
    })?;

    let known = reference::load_reference_faces(&config.reference_dir, &mut engine)?;
    if known.is_empty() {
        println!(
            "No valid reference faces found in {}; nothing to search for.",
            config.reference_dir.display()
        );
        return Ok(());
    }
    tracing::info!(count = known.len(), "reference faces loaded");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = scanner::scan_video(
        &config.video,
        &config.output,
        config.codec,
        engine,
        known,
        ScanOptions {
            tolerance: config.tolerance,
            downscale: config.downscale,
        },
        |frame_index| spinner.set_message(format!("frame {frame_index}")),
    )?;
    spinner.finish_and_clear();

    tracing::info!(
        frames = outcome.frames,
        matches = outcome.matches.len(),
        "scan complete"
    );

    report::print_summary(&outcome, &config.output);
    if let Some(path) = &config.json_report {
        report::write_json_report(&outcome, path)?;
        println!("JSON report saved to {}", path.display());
    }

    Ok(())
}
