// Example runner for the `motion_sentry` library: a synthetic scene where a
// bright square walks in, stays a while and leaves, ticked by the driver.

use anyhow::Context;
use motion_sentry::core_modules::frame::{Frame, fill_rect, solid_frame};
use motion_sentry::driver::{Driver, IterSource, NullSink};
use motion_sentry::{DetectionPipeline, PipelineConfig};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const SIDE: u32 = 80;

fn synthetic_scene() -> impl Iterator<Item = Frame> {
    (0..60u32).map(|i| {
        let mut frame = solid_frame(WIDTH, HEIGHT, [40, 45, 50]);
        if (10..40).contains(&i) {
            let x = 20 + (i - 10) * 6;
            fill_rect(&mut frame, x, 80, SIDE, SIDE, [230, 220, 200]);
        }
        frame
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::load().context("loading configuration")?;
    let driver = Driver::from_config(&config.driver);
    let mut pipeline = DetectionPipeline::new(config)?;

    println!("Motion Sentry - Example Runner");
    let summary = driver
        .run(&mut pipeline, &mut IterSource::new(synthetic_scene()), &mut NullSink)
        .await?;

    for event in &summary.events {
        println!("{event}");
    }
    println!("{} frames processed", summary.frames_processed);
    Ok(())
}
