// THEORY:
// `MixtureModel` keeps, for every pixel, a small set of Gaussian components
// describing the colours that pixel has shown over its recent history. Each
// component has a weight (how often it explained the pixel), an RGB mean and a
// single isotropic variance.
//
// Per frame and per pixel:
// 1.  **Decay**: every weight shrinks by the learning rate, minus a small
//     complexity prior that lets rarely-seen components die out.
// 2.  **Match**: walking the components from heaviest to lightest, the first
//     one within `var_threshold_gen` absorbs the sample (mean and variance move
//     towards it, weight grows). Components stay sorted by weight.
// 3.  **Classify**: the pixel is background if a component within
//     `var_threshold` is reached before the accumulated weight passes
//     `background_ratio`. The heavy components are the background; the light
//     tail is recent, transient stuff.
// 4.  **Spawn**: an unmatched sample replaces the lightest component (or takes
//     a free slot) with a low-weight, wide component centred on it.
//
// Non-background pixels that look like a darkened copy of a background
// component are reported as shadows when shadow detection is on.

use crate::config::BackgroundConfig;
use crate::core_modules::background_model::BackgroundModel;
use crate::core_modules::frame::{self, BACKGROUND, FOREGROUND, Frame, Mask};

#[derive(Debug, Clone, Copy, Default)]
struct Component {
    weight: f32,
    mean: [f32; 3],
    variance: f32,
}

/// Hot-loop copy of the tunables, converted to `f32` once.
#[derive(Debug, Clone, Copy)]
struct MixtureParams {
    history: u32,
    max_mixtures: usize,
    var_threshold: f32,
    var_threshold_gen: f32,
    background_ratio: f32,
    var_init: f32,
    var_min: f32,
    var_max: f32,
    complexity_reduction: f32,
    detect_shadows: bool,
    shadow_value: u8,
    shadow_threshold: f32,
    learning_rate: Option<f32>,
}

impl From<&BackgroundConfig> for MixtureParams {
    fn from(cfg: &BackgroundConfig) -> Self {
        Self {
            history: cfg.history.max(1),
            max_mixtures: cfg.max_mixtures.max(1),
            var_threshold: cfg.var_threshold as f32,
            var_threshold_gen: cfg.var_threshold_gen as f32,
            background_ratio: cfg.background_ratio as f32,
            var_init: cfg.var_init as f32,
            var_min: cfg.var_min as f32,
            var_max: cfg.var_max as f32,
            complexity_reduction: cfg.complexity_reduction as f32,
            detect_shadows: cfg.detect_shadows,
            shadow_value: cfg.shadow_value,
            shadow_threshold: cfg.shadow_threshold as f32,
            learning_rate: cfg.learning_rate.map(|r| r as f32),
        }
    }
}

/// Adaptive Gaussian-mixture background model.
pub struct MixtureModel {
    params: MixtureParams,
    width: u32,
    height: u32,
    /// `max_mixtures` slots per pixel, pixel-major.
    components: Vec<Component>,
    modes_used: Vec<u8>,
    /// Frames folded in since the model was seeded, the seed frame included.
    frames_seen: u64,
}

impl MixtureModel {
    pub fn new(config: &BackgroundConfig) -> Self {
        Self {
            params: MixtureParams::from(config),
            width: 0,
            height: 0,
            components: Vec::new(),
            modes_used: Vec::new(),
            frames_seen: 0,
        }
    }

    fn seeded(&self) -> bool {
        self.frames_seen > 0
    }

    fn seed(&mut self, frame: &Frame) {
        let n = self.params.max_mixtures;
        let pixels = (frame.width() * frame.height()) as usize;
        self.width = frame.width();
        self.height = frame.height();
        self.components = vec![Component::default(); pixels * n];
        self.modes_used = vec![1; pixels];
        for (idx, px) in frame.pixels().enumerate() {
            self.components[idx * n] = Component {
                weight: 1.0,
                mean: to_f32(px.0),
                variance: self.params.var_init,
            };
        }
        self.frames_seen = 1;
    }

    /// Fixed per-frame rate: a component needs on the order of `history`
    /// frames of evidence before it is trusted as background.
    fn learning_rate(&self) -> f32 {
        self.params
            .learning_rate
            .unwrap_or(1.0 / self.params.history as f32)
    }
}

impl BackgroundModel for MixtureModel {
    fn name(&self) -> &'static str {
        "mixture"
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
        let alpha = self.learning_rate();
        let params = self.params;
        let n = params.max_mixtures;

        let mut mask = Mask::new(frame.width(), frame.height());
        for (idx, (px, out)) in frame.pixels().zip(mask.iter_mut()).enumerate() {
            let gmm = &mut self.components[idx * n..(idx + 1) * n];
            *out = update_pixel(&params, gmm, &mut self.modes_used[idx], to_f32(px.0), alpha);
        }
        mask
    }

    fn reset(&mut self) {
        self.width = 0;
        self.height = 0;
        self.components.clear();
        self.modes_used.clear();
        self.frames_seen = 0;
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.seeded().then_some((self.width, self.height))
    }
}

fn to_f32(px: [u8; 3]) -> [f32; 3] {
    [px[0] as f32, px[1] as f32, px[2] as f32]
}

fn update_pixel(
    p: &MixtureParams,
    gmm: &mut [Component],
    modes_used: &mut u8,
    data: [f32; 3],
    alpha: f32,
) -> u8 {
    let alpha1 = 1.0 - alpha;
    let prune = -alpha * p.complexity_reduction;
    let n_modes = *modes_used as usize;
    let mut kept_modes = n_modes;
    let mut background = false;
    let mut fits = false;
    let mut total_weight = 0.0f32;

    for mode in 0..n_modes {
        let mut weight = alpha1 * gmm[mode].weight + prune;
        let mut swaps = 0;

        if !fits {
            let var = gmm[mode].variance;
            let diff = [
                gmm[mode].mean[0] - data[0],
                gmm[mode].mean[1] - data[1],
                gmm[mode].mean[2] - data[2],
            ];
            let dist2 = diff[0] * diff[0] + diff[1] * diff[1] + diff[2] * diff[2];

            if total_weight < p.background_ratio && dist2 < p.var_threshold * var {
                background = true;
            }

            if dist2 < p.var_threshold_gen * var {
                fits = true;
                weight += alpha;
                let k = alpha / weight;
                for (mean, d) in gmm[mode].mean.iter_mut().zip(diff) {
                    *mean -= k * d;
                }
                gmm[mode].variance = (var + k * (dist2 - var)).clamp(p.var_min, p.var_max);

                // Bubble the matched component up; the weight is written after the swaps.
                let mut i = mode;
                while i > 0 && weight >= gmm[i - 1].weight {
                    gmm.swap(i, i - 1);
                    swaps += 1;
                    i -= 1;
                }
            }
        }

        if weight < -prune {
            weight = 0.0;
            kept_modes -= 1;
        }
        gmm[mode - swaps].weight = weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        let norm = 1.0 / total_weight;
        for component in gmm.iter_mut().take(kept_modes) {
            component.weight *= norm;
        }
    }

    let mut n_modes = kept_modes;
    if !fits && alpha > 0.0 {
        let slot = if n_modes == p.max_mixtures {
            p.max_mixtures - 1
        } else {
            n_modes += 1;
            n_modes - 1
        };

        if n_modes == 1 {
            gmm[slot].weight = 1.0;
        } else {
            gmm[slot].weight = alpha;
            for component in gmm.iter_mut().take(n_modes - 1) {
                component.weight *= alpha1;
            }
        }
        gmm[slot].mean = data;
        gmm[slot].variance = p.var_init;

        let mut i = slot;
        while i > 0 && alpha >= gmm[i - 1].weight {
            gmm.swap(i, i - 1);
            i -= 1;
        }
    }
    *modes_used = n_modes as u8;

    if background {
        BACKGROUND
    } else if p.detect_shadows && is_shadow(p, &gmm[..n_modes], data) {
        p.shadow_value
    } else {
        FOREGROUND
    }
}

/// A shadow keeps the hue of a background component but is uniformly darker.
fn is_shadow(p: &MixtureParams, gmm: &[Component], data: [f32; 3]) -> bool {
    let mut accumulated = 0.0f32;
    for component in gmm {
        let mean = component.mean;
        let numerator = data[0] * mean[0] + data[1] * mean[1] + data[2] * mean[2];
        let denominator = mean[0] * mean[0] + mean[1] * mean[1] + mean[2] * mean[2];
        if denominator == 0.0 {
            return false;
        }

        if numerator <= denominator && numerator >= p.shadow_threshold * denominator {
            let a = numerator / denominator;
            let dist2a: f32 = (0..3).map(|c| (a * mean[c] - data[c]).powi(2)).sum();
            if dist2a < p.var_threshold * component.variance * a * a {
                return true;
            }
        }

        accumulated += component.weight;
        if accumulated > p.background_ratio {
            return false;
        }
    }
    false
}
