// THEORY:
// The `pipeline` module is the top-level API of the detector. A host owns one
// `DetectionPipeline` per video source, feeds it frames one tick at a time and
// gets back a `FrameOutcome`: the annotated copy of the frame, at most one log
// event, and whether it should keep ticking.
//
// Stages, in strict order on every frame:
// 1.  Background model update -> raw foreground mask.
// 2.  Mask cleaning (opening, then closing).
// 3.  External region extraction.
// 4.  Size filtering and annotation of the survivors.
// 5.  Detection state transition and event logging.
//
// All session state (background model, frame counter, detection flag) lives
// here and nowhere else. `reset_session` clears it in one call, so the next
// source starts from exactly the state a fresh pipeline would have. The event
// log is the exception: it is append-only and outlives sessions.

use crate::config::PipelineConfig;
use crate::core_modules::annotate::Annotator;
use crate::core_modules::background_model::{self, BackgroundModel};
use crate::core_modules::detection_tracker::{DetectionState, DetectionTracker, Transition};
use crate::core_modules::event_log::{Clock, EventLog, LogEvent, SystemClock};
use crate::core_modules::frame::{self, Frame, Mask};
use crate::core_modules::mask_cleaner::MaskCleaner;
use crate::core_modules::region_extractor::region_extractor;
use crate::core_modules::region_filter::RegionFilter;
use crate::error::Result;

// Re-export key data structures for the public API.
pub use crate::core_modules::region::{BoundingBox, Point, Region};

/// The result of one tick.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// The input frame with every surviving region outlined and labelled.
    /// Empty when the tick saw the end of the stream.
    pub annotated: Frame,
    /// Set only on a reportable Idle -> Detected transition.
    pub event: Option<LogEvent>,
    /// False once the source is exhausted; the host should stop ticking.
    pub continue_processing: bool,
    /// The detection flag after this tick.
    pub object_detected: bool,
    /// Regions that passed the size filter on this frame.
    pub detections: Vec<Region>,
}

impl FrameOutcome {
    fn end_of_stream(object_detected: bool) -> Self {
        Self {
            annotated: frame::empty_frame(),
            event: None,
            continue_processing: false,
            object_detected,
            detections: Vec::new(),
        }
    }
}

/// The main, top-level struct for the detector.
pub struct DetectionPipeline {
    config: PipelineConfig,
    model: Box<dyn BackgroundModel>,
    cleaner: MaskCleaner,
    filter: RegionFilter,
    annotator: Annotator,
    tracker: DetectionTracker,
    frame_counter: u64,
    last_mask: Mask,
    event_log: EventLog,
    clock: Box<dyn Clock>,
}

impl DetectionPipeline {
    /// Builds a pipeline with the background model selected by the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let model = background_model::from_config(&config.background);
        Self::with_model(config, model)
    }

    /// Builds a pipeline around a caller-supplied background model.
    pub fn with_model(config: PipelineConfig, model: Box<dyn BackgroundModel>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cleaner: MaskCleaner::new(&config.morphology),
            filter: RegionFilter::new(&config.filter),
            annotator: Annotator::new(&config.annotation)?,
            tracker: DetectionTracker::new(),
            frame_counter: 0,
            last_mask: Mask::new(0, 0),
            event_log: EventLog::new(),
            clock: Box::new(SystemClock),
            model,
            config,
        })
    }

    /// Replaces the wall clock used to timestamp events.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Starts a new session: forgets the background, zeroes the frame counter
    /// and clears the detection flag.
    pub fn reset_session(&mut self) {
        log::info!(
            "resetting session after {} frames ({} model)",
            self.frame_counter,
            self.model.name()
        );
        self.model.reset();
        self.tracker.reset();
        self.frame_counter = 0;
        self.last_mask = Mask::new(0, 0);
    }

    pub fn process_frame(&mut self, frame: &Frame) -> FrameOutcome {
        if frame::is_empty(frame) {
            log::debug!("empty frame after {} frames, end of stream", self.frame_counter);
            return FrameOutcome::end_of_stream(self.tracker.is_detected());
        }
        self.frame_counter += 1;

        // Stage 1: Background Model
        if let Some(seeded) = self
            .model
            .dimensions()
            .filter(|dims| *dims != frame.dimensions())
        {
            log::warn!(
                "frame size changed from {:?} to {:?}, resetting {} model",
                seeded,
                frame.dimensions(),
                self.model.name()
            );
            self.model.reset();
        }
        let raw_mask = self.model.update(frame);
        if frame::is_empty(&raw_mask) {
            log::debug!("frame {}: background model returned no mask", self.frame_counter);
            self.last_mask = raw_mask;
            return FrameOutcome {
                annotated: frame.clone(),
                event: None,
                continue_processing: true,
                object_detected: self.tracker.is_detected(),
                detections: Vec::new(),
            };
        }

        // Stage 2: Mask Cleaning
        self.last_mask = self.cleaner.clean(&raw_mask);

        // Stage 3: Region Extraction
        let regions = region_extractor::extract(&self.last_mask);
        log::debug!(
            "frame {}: {} foreground pixels, {} regions",
            self.frame_counter,
            frame::foreground_count(&self.last_mask),
            regions.len()
        );

        // Stage 4: Region Filtering & Annotation
        let verdict = self.filter.filter(regions);
        let mut annotated = frame.clone();
        for region in &verdict.survivors {
            self.annotator.draw(&mut annotated, &region.bounding_box);
        }

        // Stage 5: Detection State
        let transition = self.tracker.observe(verdict.object_detected, self.frame_counter);
        match transition {
            Transition::Appeared { report: false } => {
                log::debug!("object present on the first frame, not reported");
            }
            Transition::Cleared => log::debug!("frame {}: scene clear", self.frame_counter),
            _ => {}
        }
        let event = transition
            .should_report()
            .then(|| LogEvent::detection(self.clock.now()));
        if let Some(event) = &event {
            log::info!("frame {}: {}", self.frame_counter, event);
            self.event_log.append(event.clone());
        }

        FrameOutcome {
            annotated,
            event,
            continue_processing: true,
            object_detected: verdict.object_detected,
            detections: verdict.survivors,
        }
    }

    /// True while the last processed frame contained an object.
    pub fn object_present(&self) -> bool {
        self.tracker.is_detected()
    }

    pub fn detection_state(&self) -> DetectionState {
        self.tracker.state()
    }

    /// Frames processed in the current session.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// The cleaned mask of the most recent frame.
    pub fn last_mask(&self) -> &Mask {
        &self.last_mask
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }
}
