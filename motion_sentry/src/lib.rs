// THEORY:
// This file is the library entry point for `motion_sentry`. It exports the
// `DetectionPipeline` and its configuration as the high-level interface of the
// detector, plus the `driver` that ticks a pipeline against a frame source.
//
// The stages themselves (`core_modules`) are public for hosts that want to run
// a single stage, but the pipeline is the only place session state lives.

pub mod config;
pub mod core_modules;
pub mod driver;
pub mod error;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::{DetectionPipeline, FrameOutcome};
