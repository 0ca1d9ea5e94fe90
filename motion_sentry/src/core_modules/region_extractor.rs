// THEORY:
// The `region_extractor` turns a cleaned foreground mask into a list of regions,
// one per outermost silhouette. Only gross object outlines matter, so holes
// in a blob and anything sitting inside those holes are ignored.
//
// Algorithm:
// 1.  **Outside map**: background is flooded (4-connected) from the image
//     border. Background that the flood cannot reach lies inside some hole.
// 2.  **Component scan**: the mask is scanned in raster order. The first
//     foreground pixel of each 8-connected component is its top-left-most
//     pixel, and its left neighbour is background. If that neighbour is
//     outside (or off the image) the component is external; otherwise it sits
//     in another component's hole and is skipped. Either way the whole
//     component is marked visited.
// 3.  **Border following**: external components are traced clockwise with
//     Moore-neighbour tracing, stopping when the walk re-enters the start
//     pixel heading the same way it first left it.
// 4.  **Chain compression**: points in the middle of straight horizontal,
//     vertical or diagonal runs are dropped.
//
// Regions come back in discovery order. The order carries no meaning.

use crate::core_modules::frame::{self, Mask};
use crate::core_modules::region::{Point, Region};

pub mod region_extractor {
    use super::*;

    /// Clockwise in image coordinates (y grows downwards), starting east.
    const DIRECTIONS: [(i32, i32); 8] = [
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
        (0, -1),
        (1, -1),
    ];
    const NORTH_WEST: usize = 5;

    /// Finds the external contours of every foreground region in `mask`.
    pub fn extract(mask: &Mask) -> Vec<Region> {
        if frame::is_empty(mask) {
            return Vec::new();
        }
        let grid = Grid::new(mask);
        let outside = grid.outside_background();
        let mut visited = vec![false; grid.len()];
        let mut regions = Vec::new();

        for y in 0..grid.height {
            for x in 0..grid.width {
                let idx = grid.index(x, y);
                if visited[idx] || !grid.is_foreground(x, y) {
                    continue;
                }

                let external = x == 0 || outside[idx - 1];
                grid.mark_component(x, y, &mut visited);
                if !external {
                    log::trace!("skipping nested component at ({x}, {y})");
                    continue;
                }

                let contour = compress(grid.trace_border(Point::new(x, y)));
                if let Some(region) = Region::from_contour(contour) {
                    regions.push(region);
                }
            }
        }

        regions
    }

    struct Grid<'a> {
        data: &'a [u8],
        width: i32,
        height: i32,
    }

    impl<'a> Grid<'a> {
        fn new(mask: &'a Mask) -> Self {
            Self {
                data: mask.as_raw(),
                width: mask.width() as i32,
                height: mask.height() as i32,
            }
        }

        fn len(&self) -> usize {
            self.data.len()
        }

        fn index(&self, x: i32, y: i32) -> usize {
            (y * self.width + x) as usize
        }

        fn in_bounds(&self, x: i32, y: i32) -> bool {
            x >= 0 && y >= 0 && x < self.width && y < self.height
        }

        fn is_foreground(&self, x: i32, y: i32) -> bool {
            self.in_bounds(x, y) && frame::is_foreground(self.data[self.index(x, y)])
        }

        /// Background pixels 4-connected to the image border.
        fn outside_background(&self) -> Vec<bool> {
            let mut outside = vec![false; self.len()];
            let mut stack = Vec::new();
            let seed = |x: i32, y: i32, outside: &mut Vec<bool>, stack: &mut Vec<(i32, i32)>| {
                let idx = self.index(x, y);
                if !outside[idx] && !self.is_foreground(x, y) {
                    outside[idx] = true;
                    stack.push((x, y));
                }
            };

            for x in 0..self.width {
                seed(x, 0, &mut outside, &mut stack);
                seed(x, self.height - 1, &mut outside, &mut stack);
            }
            for y in 0..self.height {
                seed(0, y, &mut outside, &mut stack);
                seed(self.width - 1, y, &mut outside, &mut stack);
            }

            while let Some((x, y)) = stack.pop() {
                for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    let (nx, ny) = (x + dx, y + dy);
                    if self.in_bounds(nx, ny) {
                        seed(nx, ny, &mut outside, &mut stack);
                    }
                }
            }
            outside
        }

        /// Marks every pixel 8-connected to `(x, y)` as visited.
        fn mark_component(&self, x: i32, y: i32, visited: &mut [bool]) {
            let mut stack = vec![(x, y)];
            visited[self.index(x, y)] = true;
            while let Some((cx, cy)) = stack.pop() {
                for (dx, dy) in DIRECTIONS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if self.is_foreground(nx, ny) {
                        let idx = self.index(nx, ny);
                        if !visited[idx] {
                            visited[idx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }
        }

        /// First foreground neighbour of `p`, sweeping clockwise from `from`.
        fn next_direction(&self, p: Point, from: usize) -> Option<usize> {
            (0..8).map(|i| (from + i) % 8).find(|&d| {
                let (dx, dy) = DIRECTIONS[d];
                self.is_foreground(p.x + dx, p.y + dy)
            })
        }

        /// Moore-neighbour tracing from the top-left-most pixel of a component.
        fn trace_border(&self, start: Point) -> Vec<Point> {
            let mut contour = vec![start];
            // West, north-west, north and north-east of the start are background.
            let Some(first) = self.next_direction(start, NORTH_WEST) else {
                return contour;
            };

            let mut current = start;
            let mut direction = first;
            loop {
                let (dx, dy) = DIRECTIONS[direction];
                current = Point::new(current.x + dx, current.y + dy);
                // Resume the sweep just after the background pixel checked last.
                let Some(next) = self.next_direction(current, (direction + 6) % 8) else {
                    break;
                };
                if current == start && next == first {
                    break;
                }
                contour.push(current);
                direction = next;
            }
            contour
        }
    }

    /// Drops points that continue a straight run in the same direction.
    fn compress(contour: Vec<Point>) -> Vec<Point> {
        let n = contour.len();
        if n <= 2 {
            return contour;
        }
        (0..n)
            .filter(|&i| {
                let prev = contour[(i + n - 1) % n];
                let cur = contour[i];
                let next = contour[(i + 1) % n];
                (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
            })
            .map(|i| contour[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::region_extractor::extract;
    use super::*;
    use crate::core_modules::region::BoundingBox;
    use image::Luma;

    fn paint(mask: &mut Mask, x: u32, y: u32, w: u32, h: u32, value: u8) {
        for py in y..y + h {
            for px in x..x + w {
                mask.put_pixel(px, py, Luma([value]));
            }
        }
    }

    #[test]
    fn blank_and_empty_masks_have_no_regions() {
        assert!(extract(&Mask::new(0, 0)).is_empty());
        assert!(extract(&Mask::new(32, 32)).is_empty());
    }

    #[test]
    fn filled_square_traces_its_corners() {
        let mut mask = Mask::new(100, 100);
        paint(&mut mask, 10, 20, 60, 60, 255);
        let regions = extract(&mask);
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(
            region.bounding_box,
            BoundingBox { x: 10, y: 20, width: 60, height: 60 }
        );
        assert_eq!(region.area, 59.0 * 59.0);
        assert_eq!(
            region.contour,
            vec![
                Point::new(10, 20),
                Point::new(69, 20),
                Point::new(69, 79),
                Point::new(10, 79),
            ]
        );
    }

    #[test]
    fn regions_come_in_raster_order() {
        let mut mask = Mask::new(50, 50);
        paint(&mut mask, 30, 5, 5, 5, 255);
        paint(&mut mask, 2, 20, 8, 4, 255);
        let regions = extract(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bounding_box.x, 30);
        assert_eq!(regions[1].bounding_box.x, 2);
    }

    #[test]
    fn diagonal_neighbours_share_a_region() {
        let mut mask = Mask::new(10, 10);
        paint(&mut mask, 2, 2, 2, 2, 255);
        paint(&mut mask, 4, 4, 2, 2, 255);
        let regions = extract(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(
            regions[0].bounding_box,
            BoundingBox { x: 2, y: 2, width: 4, height: 4 }
        );
    }

    #[test]
    fn nested_components_are_ignored() {
        let mut mask = Mask::new(60, 60);
        paint(&mut mask, 10, 10, 30, 30, 255);
        paint(&mut mask, 20, 20, 10, 10, 0);
        paint(&mut mask, 23, 23, 4, 4, 255);
        let regions = extract(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 29.0 * 29.0);
    }

    #[test]
    fn l_shape_cuts_the_inner_corner() {
        let mut mask = Mask::new(4, 4);
        paint(&mut mask, 0, 0, 4, 2, 255);
        paint(&mut mask, 0, 2, 2, 2, 255);
        let regions = extract(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(
            regions[0].contour,
            vec![
                Point::new(0, 0),
                Point::new(3, 0),
                Point::new(3, 1),
                Point::new(2, 1),
                Point::new(1, 2),
                Point::new(1, 3),
                Point::new(0, 3),
            ]
        );
        assert_eq!(regions[0].area, 5.5);
    }

    #[test]
    fn thin_line_and_single_pixel() {
        let mut mask = Mask::new(10, 10);
        paint(&mut mask, 1, 1, 5, 1, 255);
        paint(&mut mask, 8, 8, 1, 1, 127);
        let regions = extract(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].contour, vec![Point::new(1, 1), Point::new(5, 1)]);
        assert_eq!(regions[0].area, 0.0);
        assert_eq!(regions[0].bounding_box.width, 5);
        assert_eq!(regions[1].contour, vec![Point::new(8, 8)]);
        assert_eq!(
            regions[1].bounding_box,
            BoundingBox { x: 8, y: 8, width: 1, height: 1 }
        );
    }

    #[test]
    fn regions_touching_the_border_are_external() {
        let mut mask = Mask::new(20, 20);
        paint(&mut mask, 0, 0, 20, 5, 255);
        paint(&mut mask, 12, 15, 8, 5, 255);
        let regions = extract(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area, 19.0 * 4.0);
        assert_eq!(
            regions[1].bounding_box,
            BoundingBox { x: 12, y: 15, width: 8, height: 5 }
        );
    }
}
