// THEORY:
// Every tunable of the detector lives in one `PipelineConfig`, grouped by the
// stage that consumes it. All sections default to the values the detector was
// calibrated with, so an empty TOML file (or no file at all) yields the stock
// behaviour: a 500-frame, threshold-16 mixture model with shadow detection, a
// 5x5 opening/closing applied twice, and a 5000 px / 50x50 size gate.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming a TOML file to load the configuration from.
pub const CONFIG_ENV: &str = "MOTION_SENTRY_CONFIG";

const MAX_MIXTURES: usize = 8;

/// Which background-modeling algorithm the pipeline instantiates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Mixture,
    RunningAverage,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    pub kind: ModelKind,
    /// Number of frames that shape the automatic learning rate.
    pub history: u32,
    /// Squared Mahalanobis distance below which a pixel matches the background.
    pub var_threshold: f64,
    /// Mark darkened copies of the background as shadows instead of foreground.
    pub detect_shadows: bool,
    pub max_mixtures: usize,
    /// Share of the total component weight that counts as background.
    pub background_ratio: f64,
    /// Squared distance below which a sample updates an existing component.
    pub var_threshold_gen: f64,
    pub var_init: f64,
    pub var_min: f64,
    pub var_max: f64,
    /// Prior that prunes components whose weight decays below it.
    pub complexity_reduction: f64,
    /// Mask value written for shadow pixels.
    pub shadow_value: u8,
    /// Minimum brightness ratio for a pixel to count as a shadow.
    pub shadow_threshold: f64,
    /// Fixed learning rate. `None` uses `1 / history` for the mixture model and a
    /// running mean (capped at `history`) for the running-average model.
    pub learning_rate: Option<f64>,
    /// Per-channel difference used by the running-average model.
    pub average_threshold: u8,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Mixture,
            history: 500,
            var_threshold: 16.0,
            detect_shadows: true,
            max_mixtures: 5,
            background_ratio: 0.9,
            var_threshold_gen: 9.0,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            complexity_reduction: 0.05,
            shadow_value: 127,
            shadow_threshold: 0.5,
            learning_rate: None,
            average_threshold: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MorphologyConfig {
    /// Side of the square structuring element. Must be odd.
    pub kernel_size: u32,
    pub open_iterations: u32,
    pub close_iterations: u32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            open_iterations: 2,
            close_iterations: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub min_area: f64,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_area: 5000.0,
            min_width: 50,
            min_height: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotationConfig {
    pub color: [u8; 3],
    pub thickness: u32,
    pub label: String,
    /// Distance between the label baseline and the top edge of the box.
    pub label_offset: u32,
    /// Pixel height of the label font, ascender to descender.
    pub label_size: f32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            color: [0, 255, 0],
            thickness: 2,
            label: String::from("Object"),
            label_offset: 10,
            label_size: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    pub tick_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { tick_interval_ms: 30 }
    }
}

/// Configuration for the DetectionPipeline and its driver.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub background: BackgroundConfig,
    pub morphology: MorphologyConfig,
    pub filter: FilterConfig,
    pub annotation: AnnotationConfig,
    pub driver: DriverConfig,
}

impl PipelineConfig {
    /// Loads the file named by `MOTION_SENTRY_CONFIG`, or the defaults when unset.
    pub fn load() -> Result<Self> {
        Self::load_from(std::env::var_os(CONFIG_ENV).map(PathBuf::from).as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                let cfg = Self::default();
                cfg.validate()?;
                Ok(cfg)
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let bg = &self.background;
        if bg.history == 0 {
            return Err(invalid("background.history must be at least 1"));
        }
        if !(bg.var_threshold > 0.0) || !(bg.var_threshold_gen > 0.0) {
            return Err(invalid("background variance thresholds must be positive"));
        }
        if bg.max_mixtures == 0 || bg.max_mixtures > MAX_MIXTURES {
            return Err(invalid(format!(
                "background.max_mixtures must be within 1..={MAX_MIXTURES}"
            )));
        }
        if !(bg.background_ratio > 0.0 && bg.background_ratio <= 1.0) {
            return Err(invalid("background.background_ratio must be within (0, 1]"));
        }
        if !(bg.shadow_threshold > 0.0 && bg.shadow_threshold <= 1.0) {
            return Err(invalid("background.shadow_threshold must be within (0, 1]"));
        }
        if !(bg.var_min > 0.0 && bg.var_min <= bg.var_init && bg.var_init <= bg.var_max) {
            return Err(invalid(
                "background variances must satisfy 0 < var_min <= var_init <= var_max",
            ));
        }
        if bg.complexity_reduction < 0.0 {
            return Err(invalid("background.complexity_reduction must not be negative"));
        }
        if let Some(rate) = bg.learning_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid("background.learning_rate must be within [0, 1]"));
            }
        }

        let morph = &self.morphology;
        if morph.kernel_size == 0 || morph.kernel_size % 2 == 0 {
            return Err(invalid("morphology.kernel_size must be odd"));
        }

        if self.filter.min_area < 0.0 {
            return Err(invalid("filter.min_area must not be negative"));
        }

        if !(self.annotation.label_size > 0.0) {
            return Err(invalid("annotation.label_size must be positive"));
        }

        if self.driver.tick_interval_ms == 0 {
            return Err(invalid("driver.tick_interval_ms must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfig(msg.into())
}
