// THEORY:
// The background model is the only stateful stage of the per-frame pipeline
// besides the detection flag. It learns what the static scene looks like and
// answers, pixel by pixel, whether the newest frame departs from it.
//
// Any adaptive algorithm can sit behind `BackgroundModel` as long as it keeps
// this contract:
// 1.  `update` classifies the frame against what has been learned so far, then
//     folds the frame into the model. The returned mask matches the frame size.
// 2.  The first frame after construction or `reset` seeds the model and comes
//     back entirely background.
// 3.  Degenerate frames (1x1, blank) never fail; they just produce masks with
//     nothing in them.

use crate::config::{BackgroundConfig, ModelKind};
use crate::core_modules::frame::{Frame, Mask};
use crate::core_modules::mixture_model::MixtureModel;
use crate::core_modules::running_average::RunningAverageModel;

pub trait BackgroundModel: Send {
    /// Model identifier, used in log lines.
    fn name(&self) -> &'static str;

    /// Classifies `frame` and learns from it.
    fn update(&mut self, frame: &Frame) -> Mask;

    /// Discards everything learned. The next frame seeds a fresh model.
    fn reset(&mut self);

    /// Dimensions of the frames the model was seeded with, if any.
    fn dimensions(&self) -> Option<(u32, u32)>;
}

/// Builds the model selected by `config.kind`.
pub fn from_config(config: &BackgroundConfig) -> Box<dyn BackgroundModel> {
    match config.kind {
        ModelKind::Mixture => Box::new(MixtureModel::new(config)),
        ModelKind::RunningAverage => Box::new(RunningAverageModel::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_honours_kind() {
        let mut cfg = BackgroundConfig::default();
        assert_eq!(from_config(&cfg).name(), "mixture");
        cfg.kind = ModelKind::RunningAverage;
        assert_eq!(from_config(&cfg).name(), "running_average");
    }

    #[test]
    fn fresh_models_are_unseeded() {
        let cfg = BackgroundConfig::default();
        assert_eq!(from_config(&cfg).dimensions(), None);
    }
}
