// THEORY:
// A `Region` is the spatial summary of one connected patch of foreground in a
// single frame: its outer boundary polygon plus the two measurements the
// filter cares about, enclosed area and bounding rectangle. Like the mask it
// was cut from, a region lives for one frame and carries no history.

/// A pixel coordinate on the mask grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Smallest axis-aligned rectangle enclosing a set of pixels, inclusive of both edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn of_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}

/// One external contour of the foreground mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Closed boundary, clockwise, with straight runs reduced to their end points.
    pub contour: Vec<Point>,
    /// Absolute area of the contour polygon.
    pub area: f64,
    pub bounding_box: BoundingBox,
}

impl Region {
    pub fn from_contour(contour: Vec<Point>) -> Option<Self> {
        let bounding_box = BoundingBox::of_points(&contour)?;
        Some(Self {
            area: polygon_area(&contour),
            bounding_box,
            contour,
        })
    }
}

/// Shoelace formula over a closed polygon.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_ignores_orientation() {
        let cw = [Point::new(0, 0), Point::new(4, 0), Point::new(4, 3), Point::new(0, 3)];
        let mut ccw = cw;
        ccw.reverse();
        assert_eq!(polygon_area(&cw), 12.0);
        assert_eq!(polygon_area(&ccw), 12.0);
    }

    #[test]
    fn degenerate_polygons_have_no_area() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[Point::new(3, 3), Point::new(9, 3)]), 0.0);
    }

    #[test]
    fn bounding_box_is_inclusive() {
        let bb = BoundingBox::of_points(&[Point::new(2, 5), Point::new(7, 1), Point::new(4, 9)]).unwrap();
        assert_eq!(bb, BoundingBox { x: 2, y: 1, width: 6, height: 9 });
        assert_eq!(BoundingBox::of_points(&[]), None);
    }
}
