use std::ops::Index;

use anyhow::Result;

use crate::geometry::primitives::{Point, Rect};

/// A closed polygonal contour: ordered vertices without a duplicate closing
/// vertex. Counterclockwise winding yields a positive [`Contour::signed_area`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Contour { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Edges in order, including the closing edge back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Signed shoelace area: positive for counterclockwise winding.
    pub fn signed_area(&self) -> f64 {
        let mut sigma = 0.0;
        for (p1, p2) in self.edges() {
            sigma += (p1.y + p2.y) * (p1.x - p2.x);
        }
        0.5 * sigma
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn bounds(&self) -> Result<Rect> {
        Rect::from_points(&self.points)
    }
}

impl Index<usize> for Contour {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

impl From<Vec<Point>> for Contour {
    fn from(points: Vec<Point>) -> Self {
        Contour { points }
    }
}

impl FromIterator<Point> for Contour {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Contour {
            points: iter.into_iter().collect(),
        }
    }
}
