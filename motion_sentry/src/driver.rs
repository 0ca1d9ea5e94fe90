// THEORY:
// The driver is the periodic host loop around a `DetectionPipeline`. On a fixed
// tick it pulls one frame from a `FrameSource`, runs it through the pipeline and
// hands the outcome to a `FrameSink`. A source that has nothing left yields
// `None`, which the pipeline sees as an empty frame; that tick reports
// `continue_processing == false` and the loop stops without presenting it.
//
// A tick that overruns its interval does not cause a burst of catch-up ticks:
// the next tick is scheduled one full interval after the late one.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::config::DriverConfig;
use crate::core_modules::event_log::LogEvent;
use crate::core_modules::frame::{self, Frame};
use crate::error::Result;
use crate::pipeline::{DetectionPipeline, FrameOutcome};

/// Anything that can hand out frames one at a time.
pub trait FrameSource {
    /// The next frame, or `None` once the source is exhausted.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Receives every outcome the driver produces, in tick order.
pub trait FrameSink {
    fn present(&mut self, outcome: &FrameOutcome) -> Result<()>;
}

/// Adapts any iterator of frames into a `FrameSource`.
pub struct IterSource<I> {
    frames: I,
}

impl<I> IterSource<I> {
    pub fn new(frames: I) -> Self {
        Self { frames }
    }
}

impl<I: Iterator<Item = Frame>> FrameSource for IterSource<I> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.next())
    }
}

/// Keeps every outcome in memory.
impl FrameSink for Vec<FrameOutcome> {
    fn present(&mut self, outcome: &FrameOutcome) -> Result<()> {
        self.push(outcome.clone());
        Ok(())
    }
}

/// Discards outcomes.
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _outcome: &FrameOutcome) -> Result<()> {
        Ok(())
    }
}

/// What one `Driver::run` session produced.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub frames_processed: u64,
    /// Events logged during this session only.
    pub events: Vec<LogEvent>,
}

#[derive(Debug, Clone)]
pub struct Driver {
    tick: Duration,
}

impl Driver {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn from_config(config: &DriverConfig) -> Self {
        Self::new(Duration::from_millis(config.tick_interval_ms))
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Runs one session to the end of `source`.
    ///
    /// The pipeline is reset before the first tick. Errors from the source or
    /// the sink end the session immediately.
    pub async fn run<S, K>(
        &self,
        pipeline: &mut DetectionPipeline,
        source: &mut S,
        sink: &mut K,
    ) -> Result<SessionSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        pipeline.reset_session();
        let logged_before = pipeline.event_log().len();

        let mut interval = time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("driver started, ticking every {:?}", self.tick);

        loop {
            interval.tick().await;
            let frame = source.read_frame()?.unwrap_or_else(frame::empty_frame);
            let outcome = pipeline.process_frame(&frame);
            if !outcome.continue_processing {
                break;
            }
            sink.present(&outcome)?;
        }

        let summary = SessionSummary {
            frames_processed: pipeline.frame_counter(),
            events: pipeline.event_log().events()[logged_before..].to_vec(),
        };
        log::info!(
            "source exhausted after {} frames, {} events logged",
            summary.frames_processed,
            summary.events.len()
        );
        Ok(summary)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::from_config(&DriverConfig::default())
    }
}
