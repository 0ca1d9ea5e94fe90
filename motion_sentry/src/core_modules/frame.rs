// THEORY:
// Frames and masks are plain `image` buffers. A `Frame` is the RGB picture the
// host hands in; a `Mask` is the single-channel verdict the background model
// hands back, one byte per pixel. Downstream stages only ever ask "is this
// byte non-zero?", so shadow pixels (127) travel with the foreground.

use image::{GrayImage, Rgb, RgbImage};

/// An RGB frame, three 8-bit channels per pixel.
pub type Frame = RgbImage;

/// A foreground mask with the same dimensions as the frame it was derived from.
pub type Mask = GrayImage;

pub const BACKGROUND: u8 = 0;
pub const FOREGROUND: u8 = 255;

pub fn is_foreground(value: u8) -> bool {
    value != BACKGROUND
}

/// An empty buffer has no pixels to look at. Sources use it to signal end of stream.
pub fn is_empty<P: image::Pixel>(buffer: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> bool {
    buffer.width() == 0 || buffer.height() == 0
}

pub fn empty_frame() -> Frame {
    Frame::new(0, 0)
}

/// A frame filled with a single colour.
pub fn solid_frame(width: u32, height: u32, color: [u8; 3]) -> Frame {
    Frame::from_pixel(width, height, Rgb(color))
}

/// Fills an axis-aligned rectangle, clipped to the frame.
pub fn fill_rect(frame: &mut Frame, x: u32, y: u32, width: u32, height: u32, color: [u8; 3]) {
    let x_end = x.saturating_add(width).min(frame.width());
    let y_end = y.saturating_add(height).min(frame.height());
    for py in y.min(y_end)..y_end {
        for px in x.min(x_end)..x_end {
            frame.put_pixel(px, py, Rgb(color));
        }
    }
}

pub fn foreground_count(mask: &Mask) -> usize {
    mask.as_raw().iter().filter(|v| is_foreground(**v)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_clips_to_frame() {
        let mut frame = solid_frame(10, 10, [0, 0, 0]);
        fill_rect(&mut frame, 8, 8, 5, 5, [9, 9, 9]);
        let filled = frame.pixels().filter(|p| p.0 == [9, 9, 9]).count();
        assert_eq!(filled, 4);
    }

    #[test]
    fn zero_sized_buffers_are_empty() {
        assert!(is_empty(&empty_frame()));
        assert!(is_empty(&Mask::new(4, 0)));
        assert!(!is_empty(&solid_frame(1, 1, [0, 0, 0])));
    }
}
