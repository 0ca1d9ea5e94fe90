// THEORY:
// The `Annotator` draws the display overlay onto a copy of the frame: a hollow
// box around every surviving region and a text label above it. The frame the
// detector works on is never touched.
//
// The box is `thickness` nested one-pixel rectangles, growing inwards from
// the region's bounding box. The label is placed like a text baseline: its
// baseline sits `label_offset` pixels above the top edge of the box, so the
// glyphs occupy the band just above it. Both are clipped to the frame, so
// regions at the image border still get whatever part of the overlay fits.

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::config::AnnotationConfig;
use crate::core_modules::frame::Frame;
use crate::core_modules::region::BoundingBox;
use crate::error::Result;

static LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

#[derive(Clone)]
pub struct Annotator {
    color: Rgb<u8>,
    thickness: u32,
    label: String,
    label_offset: u32,
    scale: PxScale,
    font: FontRef<'static>,
}

impl Annotator {
    pub fn new(config: &AnnotationConfig) -> Result<Self> {
        Ok(Self {
            color: Rgb(config.color),
            thickness: config.thickness,
            label: config.label.clone(),
            label_offset: config.label_offset,
            scale: PxScale::from(config.label_size),
            font: FontRef::try_from_slice(LABEL_FONT)?,
        })
    }

    /// Outlines `bb` and writes the label with its baseline `label_offset` px above the box.
    pub fn draw(&self, frame: &mut Frame, bb: &BoundingBox) {
        self.draw_outline(frame, bb);
        if self.label.is_empty() {
            return;
        }
        let ascent = self.font.as_scaled(self.scale).ascent().round() as i32;
        let baseline = bb.y as i32 - self.label_offset as i32;
        draw_text_mut(
            frame,
            self.color,
            bb.x as i32,
            baseline - ascent,
            self.scale,
            &self.font,
            &self.label,
        );
    }

    fn draw_outline(&self, frame: &mut Frame, bb: &BoundingBox) {
        for inset in 0..self.thickness {
            let (Some(width), Some(height)) = (
                bb.width.checked_sub(2 * inset).filter(|w| *w > 0),
                bb.height.checked_sub(2 * inset).filter(|h| *h > 0),
            ) else {
                break;
            };
            let rect = Rect::at((bb.x + inset) as i32, (bb.y + inset) as i32).of_size(width, height);
            draw_hollow_rect_mut(frame, rect, self.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::solid_frame;

    const GREEN: [u8; 3] = [0, 255, 0];
    const BLACK: [u8; 3] = [0, 0, 0];

    fn annotator() -> Annotator {
        Annotator::new(&AnnotationConfig::default()).unwrap()
    }

    /// Rows of `frame` above `limit` containing any non-black pixel.
    fn touched_rows(frame: &Frame, limit: u32) -> Vec<u32> {
        (0..limit)
            .filter(|&y| (0..frame.width()).any(|x| frame.get_pixel(x, y).0 != BLACK))
            .collect()
    }

    #[test]
    fn outline_is_two_pixels_thick() {
        let mut frame = solid_frame(100, 100, BLACK);
        let bb = BoundingBox { x: 20, y: 40, width: 30, height: 30 };
        annotator().draw(&mut frame, &bb);
        assert_eq!(frame.get_pixel(20, 40).0, GREEN);
        assert_eq!(frame.get_pixel(21, 41).0, GREEN);
        assert_eq!(frame.get_pixel(49, 69).0, GREEN);
        assert_eq!(frame.get_pixel(48, 68).0, GREEN);
        assert_eq!(frame.get_pixel(22, 42).0, BLACK);
        assert_eq!(frame.get_pixel(35, 55).0, BLACK);
    }

    #[test]
    fn label_sits_above_the_box() {
        let mut frame = solid_frame(100, 100, BLACK);
        let bb = BoundingBox { x: 20, y: 40, width: 30, height: 30 };
        annotator().draw(&mut frame, &bb);

        // Baseline at y = 30; nothing may reach the box edge at y = 40.
        let rows = touched_rows(&frame, 40);
        let (first, last) = (rows[0], rows[rows.len() - 1]);
        assert!((14..=22).contains(&first), "label starts at row {first}");
        assert!(rows.contains(&29));
        assert!(last < 38, "label reaches row {last}");

        let first_col = (0..100)
            .find(|&x| (0..40).any(|y| frame.get_pixel(x, y).0 != BLACK))
            .unwrap();
        assert!((20..=22).contains(&first_col));
    }

    #[test]
    fn empty_label_draws_only_the_outline() {
        let config = AnnotationConfig {
            label: String::new(),
            ..AnnotationConfig::default()
        };
        let mut frame = solid_frame(100, 100, BLACK);
        Annotator::new(&config)
            .unwrap()
            .draw(&mut frame, &BoundingBox { x: 20, y: 40, width: 30, height: 30 });
        assert!(touched_rows(&frame, 40).is_empty());
        assert_eq!(frame.get_pixel(20, 40).0, GREEN);
    }

    #[test]
    fn drawing_near_edges_is_clipped() {
        let mut frame = solid_frame(40, 40, BLACK);
        annotator().draw(&mut frame, &BoundingBox { x: 0, y: 0, width: 60, height: 60 });
        assert_eq!(frame.get_pixel(0, 0).0, GREEN);
        assert_eq!(frame.get_pixel(1, 1).0, GREEN);
        assert_eq!(frame.get_pixel(39, 39).0, BLACK);
    }

    #[test]
    fn thin_boxes_stop_insetting() {
        let mut frame = solid_frame(20, 20, BLACK);
        annotator().draw(&mut frame, &BoundingBox { x: 15, y: 15, width: 1, height: 3 });
        assert_eq!(frame.get_pixel(15, 15).0, GREEN);
        assert_eq!(frame.get_pixel(15, 17).0, GREEN);
    }
}
