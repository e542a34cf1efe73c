use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::geometry::{order_corners, polygon_area};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

/// The four corners of a quadrilateral in canonical order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Corners {
    pub top_left: Point<i32>,
    pub top_right: Point<i32>,
    pub bottom_right: Point<i32>,
    pub bottom_left: Point<i32>,
}

impl Corners {
    /// Corners in top-left, top-right, bottom-right, bottom-left order.
    pub fn to_array(&self) -> [Point<i32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn to_tuples(&self) -> [(i32, i32); 4] {
        self.to_array().map(|p| (p.x, p.y))
    }
}

/// A contour approximated to exactly four vertices.
///
/// `vertices` keeps the order the approximation emitted them in. Use
/// [`Quadrilateral::corners`] for a canonical order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Quadrilateral {
    pub vertices: [Point<i32>; 4],
    pub area: f64,
}

impl Quadrilateral {
    pub fn new(vertices: [Point<i32>; 4]) -> Self {
        Self {
            vertices,
            area: polygon_area(&vertices),
        }
    }

    pub fn corners(&self) -> Corners {
        order_corners(&self.vertices)
    }
}
