use crate::config::BackgroundConfig;
use crate::core_modules::background_model::BackgroundModel;
use crate::core_modules::frame::{self, BACKGROUND, FOREGROUND, Frame, Mask};

/// Single-mean background model: an exponential running average per pixel,
/// with a fixed per-channel tolerance.
///
/// Cheaper than [`MixtureModel`](crate::core_modules::mixture_model::MixtureModel)
/// but blind to multi-modal backgrounds (swaying trees, flicker).
pub struct RunningAverageModel {
    history: u32,
    threshold: f32,
    learning_rate: Option<f32>,
    width: u32,
    height: u32,
    mean: Vec<[f32; 3]>,
    frames_seen: u64,
}

impl RunningAverageModel {
    pub fn new(config: &BackgroundConfig) -> Self {
        Self {
            history: config.history.max(1),
            threshold: config.average_threshold as f32,
            learning_rate: config.learning_rate.map(|r| r as f32),
            width: 0,
            height: 0,
            mean: Vec::new(),
            frames_seen: 0,
        }
    }

    fn seed(&mut self, frame: &Frame) {
        self.width = frame.width();
        self.height = frame.height();
        self.mean = frame
            .pixels()
            .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
            .collect();
        self.frames_seen = 1;
    }
}

impl BackgroundModel for RunningAverageModel {
    fn name(&self) -> &'static str {
        "running_average"
    }

    fn update(&mut self, frame: &Frame) -> Mask {
        if frame::is_empty(frame) {
            return Mask::new(frame.width(), frame.height());
        }
        if self.dimensions() != Some(frame.dimensions()) {
            self.seed(frame);
            return Mask::new(frame.width(), frame.height());
        }

        self.frames_seen += 1;
        let alpha = self
            .learning_rate
            .unwrap_or_else(|| 1.0 / self.frames_seen.min(self.history as u64) as f32);

        let mut mask = Mask::new(frame.width(), frame.height());
        for ((px, mean), out) in frame.pixels().zip(self.mean.iter_mut()).zip(mask.iter_mut()) {
            let mut moved = false;
            for (m, v) in mean.iter_mut().zip(px.0) {
                let v = v as f32;
                moved |= (v - *m).abs() > self.threshold;
                *m += alpha * (v - *m);
            }
            *out = if moved { FOREGROUND } else { BACKGROUND };
        }
        mask
    }

    fn reset(&mut self) {
        self.width = 0;
        self.height = 0;
        self.mean.clear();
        self.frames_seen = 0;
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        (self.frames_seen > 0).then_some((self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::{fill_rect, foreground_count, solid_frame};

    #[test]
    fn flags_pixels_beyond_tolerance() {
        let mut m = RunningAverageModel::new(&BackgroundConfig::default());
        let scene = solid_frame(6, 6, [100, 100, 100]);
        m.update(&scene);
        m.update(&scene);

        let mut frame = scene.clone();
        fill_rect(&mut frame, 0, 0, 2, 1, [100, 100, 131]);
        fill_rect(&mut frame, 4, 4, 1, 1, [100, 100, 129]);
        let mask = m.update(&frame);
        assert_eq!(foreground_count(&mask), 2);
        assert_eq!(mask.get_pixel(4, 4).0[0], BACKGROUND);
    }

    #[test]
    fn seeding_and_reset_follow_the_contract() {
        let mut m = RunningAverageModel::new(&BackgroundConfig::default());
        assert_eq!(foreground_count(&m.update(&solid_frame(3, 3, [0, 0, 0]))), 0);
        m.reset();
        assert_eq!(m.dimensions(), None);
        assert_eq!(foreground_count(&m.update(&solid_frame(3, 3, [255, 0, 0]))), 0);
    }
}
