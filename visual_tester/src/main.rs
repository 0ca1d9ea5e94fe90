// Command-line host for the detector: runs a directory of frames (or, with the
// `opencv` feature, a video file) through the pipeline at the configured tick
// and writes the annotated frames out as PNGs.

mod source;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use motion_sentry::driver::{Driver, FrameSource};
use motion_sentry::{DetectionPipeline, PipelineConfig};

use crate::source::{DirectorySource, PngSink};

#[derive(Debug, Parser)]
#[command(name = "visual_tester", about = "Run the motion detector over recorded frames")]
struct Args {
    /// Directory of PNG/JPEG frames, or a video file when built with `opencv`.
    #[arg(long)]
    input: PathBuf,
    /// Directory the annotated frames are written to.
    #[arg(long)]
    output: PathBuf,
    /// TOML configuration. Falls back to MOTION_SENTRY_CONFIG, then defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides driver.tick_interval_ms.
    #[arg(long)]
    tick_ms: Option<u64>,
}

fn open_source(input: &std::path::Path) -> anyhow::Result<Box<dyn FrameSource>> {
    if input.is_dir() {
        return Ok(Box::new(DirectorySource::open(input)?));
    }
    #[cfg(feature = "opencv")]
    {
        Ok(Box::new(source::VideoSource::open(input)?))
    }
    #[cfg(not(feature = "opencv"))]
    {
        bail!(
            "{} is not a directory; video input needs the `opencv` feature",
            input.display()
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_path(path),
        None => PipelineConfig::load(),
    }
    .context("loading configuration")?;

    let driver = match args.tick_ms {
        Some(0) => bail!("--tick-ms must be at least 1"),
        Some(ms) => Driver::new(Duration::from_millis(ms)),
        None => Driver::from_config(&config.driver),
    };

    let mut pipeline = DetectionPipeline::new(config)?;
    let mut source = open_source(&args.input)?;
    let mut sink = PngSink::create(&args.output)?;

    let summary = driver
        .run(&mut pipeline, source.as_mut(), &mut sink)
        .await
        .with_context(|| format!("processing {}", args.input.display()))?;

    println!(
        "Processing complete. {} frames, {} events. Output saved to {}",
        summary.frames_processed,
        summary.events.len(),
        args.output.display()
    );
    Ok(())
}
