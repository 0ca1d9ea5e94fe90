// THEORY:
// The raw mask coming out of the background model is speckled: sensor noise
// and compression artifacts light up isolated pixels, and real objects come
// back with pinholes where their colour happens to match the background.
//
// The cleaner runs two morphological operations with a square structuring
// element:
// 1.  **Opening** (erode, then dilate) wipes out anything narrower than the
//     element while giving larger blobs their original outline back.
// 2.  **Closing** (dilate, then erode) fills holes and bridges gaps that are
//     narrower than the element.
// Opening runs first so that noise is gone before closing gets a chance to
// merge it into something that looks like an object.
//
// A square element is separable, so each pass is a horizontal sweep followed
// by a vertical one. Neighbours outside the image are skipped, which leaves
// blobs touching the border intact.

use crate::config::MorphologyConfig;
use crate::core_modules::frame::Mask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Erode,
    Dilate,
}

/// Stateless opening-then-closing filter.
#[derive(Debug, Clone)]
pub struct MaskCleaner {
    radius: u32,
    open_iterations: u32,
    close_iterations: u32,
}

impl MaskCleaner {
    pub fn new(config: &MorphologyConfig) -> Self {
        Self {
            radius: config.kernel_size / 2,
            open_iterations: config.open_iterations,
            close_iterations: config.close_iterations,
        }
    }

    pub fn clean(&self, mask: &Mask) -> Mask {
        let opened = self.open(mask);
        self.close(&opened)
    }

    pub fn open(&self, mask: &Mask) -> Mask {
        let eroded = self.repeat(mask, Op::Erode, self.open_iterations);
        self.repeat(&eroded, Op::Dilate, self.open_iterations)
    }

    pub fn close(&self, mask: &Mask) -> Mask {
        let dilated = self.repeat(mask, Op::Dilate, self.close_iterations);
        self.repeat(&dilated, Op::Erode, self.close_iterations)
    }

    fn repeat(&self, mask: &Mask, op: Op, iterations: u32) -> Mask {
        let mut out = mask.clone();
        if self.radius == 0 {
            return out;
        }
        for _ in 0..iterations {
            out = morph(&out, self.radius, op);
        }
        out
    }
}

fn morph(mask: &Mask, radius: u32, op: Op) -> Mask {
    let (width, height) = mask.dimensions();
    let (w, h, r) = (width as usize, height as usize, radius as usize);
    let src = mask.as_raw();
    let pick = |a: u8, b: u8| match op {
        Op::Erode => a.min(b),
        Op::Dilate => a.max(b),
    };

    let mut horizontal = vec![0u8; src.len()];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            horizontal[y * w + x] = row[lo..=hi].iter().copied().reduce(pick).unwrap_or(0);
        }
    }

    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        let lo = y.saturating_sub(r);
        let hi = (y + r).min(h - 1);
        for x in 0..w {
            out[y * w + x] = (lo..=hi)
                .map(|yy| horizontal[yy * w + x])
                .reduce(pick)
                .unwrap_or(0);
        }
    }

    Mask::from_raw(width, height, out).unwrap_or_else(|| Mask::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::{FOREGROUND, foreground_count};
    use image::Luma;

    fn cleaner() -> MaskCleaner {
        MaskCleaner::new(&MorphologyConfig::default())
    }

    fn mask_with(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Mask {
        let mut mask = Mask::new(width, height);
        for &(x, y, w, h) in rects {
            for py in y..y + h {
                for px in x..x + w {
                    mask.put_pixel(px, py, Luma([FOREGROUND]));
                }
            }
        }
        mask
    }

    #[test]
    fn speckles_are_removed() {
        let mask = mask_with(40, 40, &[(5, 5, 1, 1), (20, 20, 3, 3), (30, 8, 2, 6)]);
        assert_eq!(foreground_count(&cleaner().clean(&mask)), 0);
    }

    #[test]
    fn large_blob_keeps_its_outline() {
        let mask = mask_with(100, 100, &[(20, 20, 60, 60)]);
        let cleaned = cleaner().clean(&mask);
        assert_eq!(cleaned, mask);
    }

    #[test]
    fn blob_on_border_survives() {
        let mask = mask_with(50, 50, &[(0, 0, 20, 20)]);
        assert_eq!(cleaner().clean(&mask), mask);
    }

    #[test]
    fn pinholes_are_filled() {
        let mut mask = mask_with(80, 80, &[(20, 20, 40, 40)]);
        for (x, y) in [(30, 30), (31, 30), (30, 31), (31, 31), (45, 50)] {
            mask.put_pixel(x, y, Luma([0]));
        }
        let cleaned = cleaner().clean(&mask);
        assert_eq!(cleaned, mask_with(80, 80, &[(20, 20, 40, 40)]));
    }

    #[test]
    fn narrow_gap_is_bridged() {
        let mask = mask_with(100, 60, &[(10, 10, 30, 30), (43, 10, 30, 30)]);
        let cleaned = cleaner().clean(&mask);
        let gap: usize = (40..43)
            .map(|x| (0..60).filter(|&y| cleaned.get_pixel(x, y).0[0] != 0).count())
            .sum();
        assert_eq!(gap, 3 * 30);
    }

    #[test]
    fn shadow_values_pass_through() {
        let mut mask = Mask::new(30, 30);
        for y in 5..25 {
            for x in 5..25 {
                mask.put_pixel(x, y, Luma([127]));
            }
        }
        let cleaned = cleaner().clean(&mask);
        assert_eq!(cleaned.get_pixel(15, 15).0[0], 127);
        assert_eq!(foreground_count(&cleaned), 400);
    }

    #[test]
    fn empty_and_tiny_masks_are_fine() {
        assert_eq!(cleaner().clean(&Mask::new(0, 0)).dimensions(), (0, 0));
        let one = mask_with(1, 1, &[(0, 0, 1, 1)]);
        assert_eq!(cleaner().clean(&one), one);
    }
}
