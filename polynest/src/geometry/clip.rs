//! Boolean operations, offsetting and containment on scaled integer
//! coordinates, backed by the Clipper bindings in [`geo_clipper`].

use geo_clipper::{Clipper, EndType, JoinType};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::geometry::primitives::{Contour, Point};
use crate::util::FPA;

/// Scaling factor for boolean operations and offsetting.
pub const CLIPPER_SCALE: f64 = 10_000_000.0;
/// Scaling for the containment test, deliberately coarse so that points on
/// the boundary resolve to "not inside".
const COARSE_SCALE: f64 = 1_000.0;
/// Miter limit for closed-polygon offsets.
const MITER_LIMIT: f64 = 4.0;

/// Resolves self-intersections under the non-zero fill rule, keeps the
/// largest surviving ring by absolute area and strips vertices coincident
/// within `0.01 * curve_tolerance`. `None` when nothing usable survives.
pub fn clean(contour: &Contour, curve_tolerance: f64) -> Option<Contour> {
    if contour.len() < 3 {
        return None;
    }
    let subject = to_geo(contour);
    let resolved = subject.union(&subject, CLIPPER_SCALE);
    let biggest = rings_of(&resolved)
        .into_iter()
        .max_by_key(|r| OrderedFloat(r.area()))?;
    let stripped = strip_coincident(&biggest.points, 0.01 * curve_tolerance);
    (stripped.len() >= 3).then(|| Contour::new(stripped))
}

/// Insets (`delta < 0`) or outsets (`delta > 0`) a contour with miter joins
/// (limit 4). A numerically zero delta returns the input unchanged; the
/// result may consist of several disjoint rings, holes wound clockwise.
pub fn offset(contour: &Contour, delta: f64) -> Vec<Contour> {
    if FPA(delta) == FPA(0.0) {
        return vec![contour.clone()];
    }
    let solution = to_geo(contour).offset(
        delta,
        JoinType::Miter(MITER_LIMIT),
        EndType::ClosedPolygon,
        CLIPPER_SCALE,
    );
    rings_of(&solution)
}

/// Boolean union of two contours, keeping the component with the largest
/// signed area.
pub fn union_max_area(a: &Contour, b: &Contour) -> Option<Contour> {
    let solution = to_geo(a).union(&to_geo(b), CLIPPER_SCALE);
    rings_of(&solution)
        .into_iter()
        .max_by_key(|r| OrderedFloat(r.signed_area()))
}

/// Coarse fixed-point containment test; points on the boundary count as
/// not inside.
pub fn point_in_contour(point: Point, contour: &Contour) -> bool {
    containment(point, contour) == Containment::Inside
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Containment {
    Outside,
    Inside,
    OnBoundary,
}

/// Winding-crossing containment on `i64` coordinates at [`COARSE_SCALE`].
fn containment(point: Point, contour: &Contour) -> Containment {
    let n = contour.len();
    if n < 3 {
        return Containment::Outside;
    }
    let (px, py) = scaled(point);
    let ring = contour.points.iter().map(|&p| scaled(p)).collect_vec();

    let mut inside = false;
    let (mut ix, mut iy) = ring[0];
    for i in 1..=n {
        let (nx, ny) = ring[i % n];
        if ny == py && (nx == px || (iy == py && ((nx > px) == (ix < px)))) {
            return Containment::OnBoundary;
        }
        if (iy < py) != (ny < py) && (ix >= px || nx > px) {
            if ix >= px && nx > px {
                inside = !inside;
            } else {
                let d = (ix - px) as i128 * (ny - py) as i128 - (nx - px) as i128 * (iy - py) as i128;
                if d == 0 {
                    return Containment::OnBoundary;
                }
                if (d > 0) == (ny > iy) {
                    inside = !inside;
                }
            }
        }
        (ix, iy) = (nx, ny);
    }
    match inside {
        true => Containment::Inside,
        false => Containment::Outside,
    }
}

fn scaled(p: Point) -> (i64, i64) {
    (
        (p.x * COARSE_SCALE).round() as i64,
        (p.y * COARSE_SCALE).round() as i64,
    )
}

/// Closes the ring and hands it to the clipper backend.
fn to_geo(contour: &Contour) -> Polygon<f64> {
    let mut ring: Vec<Coord<f64>> = contour.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if !ring.is_empty() && ring.first() != ring.last() {
        ring.push(ring[0]);
    }
    Polygon::new(LineString::new(ring), vec![])
}

/// Collects every ring of the solution (exterior and interior alike) back
/// into open contours, preserving winding.
fn rings_of(solution: &MultiPolygon<f64>) -> Vec<Contour> {
    let mut rings = vec![];
    for polygon in solution.0.iter() {
        for ls in std::iter::once(polygon.exterior()).chain(polygon.interiors().iter()) {
            let mut points: Vec<Point> = ls.0.iter().map(|c| Point::new(c.x, c.y)).collect();
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            if points.len() >= 3 {
                rings.push(Contour::new(points));
            }
        }
    }
    rings
}

/// Drops vertices closer than `distance` to their predecessor and vertices
/// that deviate less than `distance` from the line through their neighbours.
fn strip_coincident(points: &[Point], distance: f64) -> Vec<Point> {
    let sq_d = distance * distance;
    let mut dedup: Vec<Point> = vec![];
    for &p in points {
        match dedup.last() {
            Some(last) if last.sq_distance(&p) < sq_d => {}
            _ => dedup.push(p),
        }
    }
    while dedup.len() > 1 {
        let (first, last) = (dedup[0], dedup[dedup.len() - 1]);
        if first.sq_distance(&last) < sq_d {
            dedup.pop();
        } else {
            break;
        }
    }
    if dedup.len() < 3 {
        return dedup;
    }
    let n = dedup.len();
    let kept = (0..n)
        .filter(|&i| {
            let prev = dedup[(i + n - 1) % n];
            let next = dedup[(i + 1) % n];
            dedup[i].sq_distance_to_segment(&prev, &next) >= sq_d
        })
        .map(|i| dedup[i])
        .collect_vec();
    match kept.len() >= 3 {
        true => kept,
        false => dedup,
    }
}
