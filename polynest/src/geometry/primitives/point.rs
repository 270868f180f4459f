use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Geometric primitive representing a point
#[derive(Debug, Clone, PartialEq, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.sq_distance(other).sqrt()
    }

    pub fn sq_distance(&self, other: &Point) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    /// `true` when `other` lies strictly within `radius` of `self`.
    pub fn within_distance(&self, other: &Point, radius: f64) -> bool {
        self.sq_distance(other) < radius * radius
    }

    pub fn mid(&self, other: &Point) -> Point {
        Point {
            x: 0.5 * (self.x + other.x),
            y: 0.5 * (self.y + other.y),
        }
    }

    /// Squared distance from `self` to the segment `[a, b]`.
    pub fn sq_distance_to_segment(&self, a: &Point, b: &Point) -> f64 {
        let (mut x, mut y) = (a.x, a.y);
        let (dx, dy) = (b.x - x, b.y - y);
        if dx != 0.0 || dy != 0.0 {
            let t = ((self.x - x) * dx + (self.y - y) * dy) / (dx * dx + dy * dy);
            if t > 1.0 {
                x = b.x;
                y = b.y;
            } else if t > 0.0 {
                x += dx * t;
                y += dy * t;
            }
        }
        (self.x - x).powi(2) + (self.y - y).powi(2)
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}
