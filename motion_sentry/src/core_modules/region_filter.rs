// THEORY:
// The `RegionFilter` is the decision point of the spatial layer. Morphology has
// already removed speckle; what remains can still be too small to be an object
// worth reporting (a waving leaf, a passing shadow edge). A region counts only
// when it is big in every sense at once: enough enclosed area AND a bounding
// box at least `min_width` wide AND `min_height` tall. Thresholds are
// inclusive. The frame reports "object detected" as soon as one region
// survives.

use crate::config::FilterConfig;
use crate::core_modules::region::Region;

/// The verdict for one frame.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub object_detected: bool,
    /// Regions that passed every threshold, in extraction order.
    pub survivors: Vec<Region>,
}

#[derive(Debug, Clone)]
pub struct RegionFilter {
    min_area: f64,
    min_width: u32,
    min_height: u32,
}

impl RegionFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            min_area: config.min_area,
            min_width: config.min_width,
            min_height: config.min_height,
        }
    }

    pub fn passes(&self, region: &Region) -> bool {
        region.area >= self.min_area
            && region.bounding_box.width >= self.min_width
            && region.bounding_box.height >= self.min_height
    }

    pub fn filter(&self, regions: Vec<Region>) -> FilterOutcome {
        let total = regions.len();
        let survivors: Vec<Region> = regions
            .into_iter()
            .filter(|region| {
                let keep = self.passes(region);
                if !keep {
                    log::trace!(
                        "rejected region area={} box={:?}",
                        region.area,
                        region.bounding_box
                    );
                }
                keep
            })
            .collect();
        log::debug!("{} of {} regions survived filtering", survivors.len(), total);

        FilterOutcome {
            object_detected: !survivors.is_empty(),
            survivors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::region::BoundingBox;

    fn region(area: f64, width: u32, height: u32) -> Region {
        Region {
            contour: Vec::new(),
            area,
            bounding_box: BoundingBox { x: 0, y: 0, width, height },
        }
    }

    fn filter() -> RegionFilter {
        RegionFilter::new(&FilterConfig::default())
    }

    #[test]
    fn exact_thresholds_pass() {
        assert!(filter().passes(&region(5000.0, 50, 50)));
    }

    #[test]
    fn each_threshold_is_required() {
        let f = filter();
        assert!(!f.passes(&region(4999.0, 50, 50)));
        assert!(!f.passes(&region(5000.0, 49, 50)));
        assert!(!f.passes(&region(5000.0, 50, 49)));
        assert!(!f.passes(&region(4999.0, 49, 49)));
        // A long thin sliver has the area but not the height.
        assert!(!f.passes(&region(9000.0, 300, 30)));
    }

    #[test]
    fn one_survivor_flags_the_frame() {
        let outcome = filter().filter(vec![
            region(100.0, 10, 10),
            region(6400.0, 80, 80),
            region(4000.0, 200, 20),
        ]);
        assert!(outcome.object_detected);
        assert_eq!(outcome.survivors.len(), 1);
        assert_eq!(outcome.survivors[0].area, 6400.0);
    }

    #[test]
    fn no_regions_means_nothing_detected() {
        let outcome = filter().filter(Vec::new());
        assert!(!outcome.object_detected);
        assert!(outcome.survivors.is_empty());
    }
}
