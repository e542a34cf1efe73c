use imageproc::point::Point;

use crate::types::Corners;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    pub start: Point<f32>,
    pub end: Point<f32>,
}

impl Segment {
    pub fn new(start: Point<f32>, end: Point<f32>) -> Self {
        Self { start, end }
    }

    pub fn from_points(start: Point<i32>, end: Point<i32>) -> Self {
        Self::new(to_f32(start), to_f32(end))
    }

    pub fn length(&self) -> f32 {
        distance_from_point_to_point(&self.start, &self.end)
    }
}

pub fn to_f32(point: Point<i32>) -> Point<f32> {
    Point::new(point.x as f32, point.y as f32)
}

pub fn distance_from_point_to_point(p1: &Point<f32>, p2: &Point<f32>) -> f32 {
    ((p1.x - p2.x).powf(2.0) + (p1.y - p2.y).powf(2.0)).sqrt()
}

/// Area enclosed by a simple polygon (shoelace formula).
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice_area.abs() as f64 / 2.0
}

/// Puts four points into top-left, top-right, bottom-right, bottom-left order.
///
/// top-left has the smallest `x + y`, bottom-right the largest; top-right has
/// the smallest `y - x`, bottom-left the largest. Ties go to the earliest point.
pub fn order_corners(points: &[Point<i32>; 4]) -> Corners {
    Corners {
        top_left: first_min_by_key(points, |p| p.x as i64 + p.y as i64),
        top_right: first_min_by_key(points, |p| p.y as i64 - p.x as i64),
        bottom_right: first_min_by_key(points, |p| -(p.x as i64 + p.y as i64)),
        bottom_left: first_min_by_key(points, |p| -(p.y as i64 - p.x as i64)),
    }
}

fn first_min_by_key(points: &[Point<i32>; 4], key: impl Fn(&Point<i32>) -> i64) -> Point<i32> {
    let mut best = points[0];
    for point in &points[1..] {
        if key(point) < key(&best) {
            best = *point;
        }
    }
    best
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Traces the outline of an axis-aligned rectangle clockwise from its
    /// top-left corner, one pixel at a time.
    pub fn rectangle_contour(x: i32, y: i32, width: i32, height: i32) -> Vec<Point<i32>> {
        let mut points = vec![];
        for i in 0..width {
            points.push(Point::new(x + i, y));
        }
        for i in 0..height {
            points.push(Point::new(x + width, y + i));
        }
        for i in 0..width {
            points.push(Point::new(x + width - i, y + height));
        }
        for i in 0..height {
            points.push(Point::new(x, y + height - i));
        }
        points
    }

    #[test]
    fn test_polygon_area_ignores_winding() {
        let clockwise = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ];
        let mut counter_clockwise = clockwise;
        counter_clockwise.reverse();
        assert_eq!(polygon_area(&clockwise), 50.0);
        assert_eq!(polygon_area(&counter_clockwise), 50.0);
    }

    #[test]
    fn test_order_corners_from_any_rotation() {
        let top_left = Point::new(10, 12);
        let top_right = Point::new(90, 8);
        let bottom_right = Point::new(95, 120);
        let bottom_left = Point::new(5, 118);
        let expected = Corners {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        };

        assert_eq!(
            order_corners(&[top_left, top_right, bottom_right, bottom_left]),
            expected
        );
        assert_eq!(
            order_corners(&[bottom_right, top_left, bottom_left, top_right]),
            expected
        );
        // counter-clockwise
        assert_eq!(
            order_corners(&[top_left, bottom_left, bottom_right, top_right]),
            expected
        );
    }

    #[test]
    fn test_segment_length() {
        let segment = Segment::from_points(Point::new(0, 0), Point::new(3, 4));
        assert!((segment.length() - 5.0).abs() < 1e-6);
    }
}
