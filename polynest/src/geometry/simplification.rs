//! Tolerance-driven contour simplification with containment guarantees.
//!
//! A naive polyline reduction shrinks or grows the shape non-uniformly near
//! eliminated vertices. The pass below corrects for that: the reduced
//! contour is offset outward (or inward) by the working tolerance, then
//! pulled back vertex by vertex as long as no vertex of the original shape
//! crosses the corrected boundary. The result is guaranteed to lie entirely
//! outside (or inside) the true outline, so downstream packing can never
//! believe two parts fit when their real outlines would collide.

use itertools::Itertools;
use log::{debug, warn};
use ordered_float::OrderedFloat;

use crate::geometry::clip;
use crate::geometry::convex_hull::convex_hull_of;
use crate::geometry::primitives::{Contour, Point};
use crate::util::FPA;

/// Parameters of the simplification pass, snapshotted from the session
/// configuration.
#[derive(Debug, Clone, Copy)]
pub struct SimplifyConfig {
    /// Base tolerance in drawing units; the pass works at 4x this value.
    pub curve_tolerance: f64,
    /// Replace every contour with its convex hull instead of simplifying.
    pub hull_only: bool,
}

/// Outcome of a simplification pass.
#[derive(Debug, Clone)]
pub struct Simplified {
    pub contour: Contour,
    /// Closed loops incidentally produced while offsetting outward. Only
    /// populated for outside-biased passes.
    pub holes: Vec<Contour>,
}

impl Simplified {
    fn plain(contour: Contour) -> Self {
        Simplified {
            contour,
            holes: vec![],
        }
    }
}

/// Reduces `contour` within tolerance. With `inside` false the result lies
/// entirely outside-or-on the input, with `inside` true entirely
/// inside-or-on. Falls back to the input whenever an intermediate step
/// degenerates.
pub fn simplify(contour: &Contour, inside: bool, cfg: &SimplifyConfig) -> Simplified {
    let ct = cfg.curve_tolerance;
    let tolerance = 4.0 * ct;
    let sq_fixed = (40.0 * ct) * (40.0 * ct);

    if cfg.hull_only {
        return match convex_hull_of(contour) {
            Some(hull) => Simplified::plain(hull),
            None => Simplified::plain(contour.clone()),
        };
    }

    let original = match clip::clean(contour, ct) {
        Some(c) => c,
        None => return Simplified::plain(contour.clone()),
    };

    // close the ring and pin down both endpoints of every long edge
    let mut chain: Vec<Tagged> = original
        .iter()
        .map(|&pt| Tagged { pt, marked: false })
        .collect();
    chain.push(chain[0]);
    for i in 0..chain.len() - 1 {
        if chain[i].pt.sq_distance(&chain[i + 1].pt) > sq_fixed {
            chain[i].marked = true;
            chain[i + 1].marked = true;
        }
    }

    let mut reduced = rdp_reduce(&chain, tolerance);
    reduced.pop();
    let reduced: Contour = reduced.into_iter().map(|t| t.pt).collect();
    let simple = clip::clean(&reduced, ct).unwrap_or_else(|| original.clone());

    let delta = match inside {
        true => -tolerance,
        false => tolerance,
    };
    let offsets = clip::offset(&simple, delta);
    let corrected = offsets
        .iter()
        .max_by_key(|c| OrderedFloat(c.signed_area()))
        .cloned();
    let holes = offsets
        .iter()
        .filter(|c| c.signed_area() < 0.0)
        .cloned()
        .collect_vec();
    let Some(corrected) = corrected else {
        return Simplified::plain(original);
    };

    let exact = mark_exact(&simple, &original, ct);

    // intermediate shells between the reduced contour and the corrected one,
    // fallback targets when pulling a vertex all the way back would breach,
    // tried nearest the reduced contour first
    const SHELL_COUNT: usize = 4;
    let mut shells: Vec<Option<(Contour, f64)>> = vec![None; SHELL_COUNT];
    for (j, slot) in shells.iter_mut().enumerate().skip(1) {
        let magnitude = j as f64 * (tolerance / SHELL_COUNT as f64);
        let shell_delta = match inside {
            true => -magnitude,
            false => magnitude,
        };
        *slot = clip::offset(&simple, shell_delta)
            .into_iter()
            .next()
            .map(|c| (c, magnitude));
    }

    // pull each corrected vertex back onto the reduced contour when the
    // original shape stays on the right side of the result
    let mut pts = corrected.points;
    for i in 0..pts.len() {
        let from = pts[i];
        let Some(target) = nearest_target(from, &simple.points, &exact, 2.0 * tolerance) else {
            continue;
        };
        let mut test = pts.clone();
        test[i] = target;
        if !breaches(&test, &original, inside, ct) {
            pts[i] = target;
            continue;
        }
        for shell in shells.iter().flatten() {
            let (shell_contour, magnitude) = shell;
            if let Some(target) = nearest_target(from, &shell_contour.points, &[], 2.0 * magnitude)
            {
                test[i] = target;
                if !breaches(&test, &original, inside, ct) {
                    pts[i] = target;
                    break;
                }
            }
        }
    }

    straighten(&mut pts, &simple, ct, tolerance, sq_fixed);

    let corrected = Contour::new(pts);
    let mut finalized = clip::union_max_area(&corrected, &original).unwrap_or(corrected);
    if let Some(c) = clip::clean(&finalized, ct) {
        finalized = c;
    }

    let exact_after = mark_exact(&finalized, &original, ct);
    debug!(
        "[SIMPL] {} -> {} edges, {} exact, {} bias",
        original.len(),
        finalized.len(),
        exact_after.iter().filter(|&&e| e).count(),
        match inside {
            true => "inside",
            false => "outside",
        }
    );

    if !inside && !holes.is_empty() {
        warn!(
            "[SIMPL] outward offset produced {} hole(s), keeping them as children",
            holes.len()
        );
        return Simplified {
            contour: finalized,
            holes,
        };
    }
    Simplified::plain(finalized)
}

#[derive(Clone, Copy)]
struct Tagged {
    pt: Point,
    marked: bool,
}

/// Douglas-Peucker over an open polyline; marked vertices survive the
/// reduction regardless of their deviation.
fn rdp_reduce(chain: &[Tagged], tolerance: f64) -> Vec<Tagged> {
    if chain.len() <= 2 {
        return chain.to_vec();
    }
    let mut keep = vec![false; chain.len()];
    keep[0] = true;
    keep[chain.len() - 1] = true;
    rdp_step(chain, 0, chain.len() - 1, tolerance * tolerance, &mut keep);
    chain
        .iter()
        .zip(keep)
        .filter_map(|(t, k)| k.then_some(*t))
        .collect()
}

fn rdp_step(chain: &[Tagged], first: usize, last: usize, sq_tolerance: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }
    let mut max_sq = sq_tolerance;
    let mut split = None;
    for i in first + 1..last {
        let sq = chain[i]
            .pt
            .sq_distance_to_segment(&chain[first].pt, &chain[last].pt);
        if sq > max_sq {
            max_sq = sq;
            split = Some(i);
        }
    }
    // a marked vertex splits the span even when the whole span lies within
    // tolerance
    let split = split.or_else(|| (first + 1..last).find(|&i| chain[i].marked));
    if let Some(i) = split {
        keep[i] = true;
        rdp_step(chain, first, i, sq_tolerance, keep);
        rdp_step(chain, i, last, sq_tolerance, keep);
    }
}

/// Flags the vertices of `simple` whose edge coincides with an edge of
/// `original` (both endpoints match original vertices at adjacent indices).
fn mark_exact(simple: &Contour, original: &Contour, curve_tolerance: f64) -> Vec<bool> {
    let radius = curve_tolerance / 1000.0;
    let n = simple.len();
    let mut exact = vec![false; n];
    for i in 0..n {
        let j = (i + 1) % n;
        if let (Some(a), Some(b)) = (
            find_vertex(simple[i], original, radius),
            find_vertex(simple[j], original, radius),
        ) {
            if adjacent_indices(a, b, original.len()) {
                exact[i] = true;
                exact[j] = true;
            }
        }
    }
    exact
}

fn find_vertex(p: Point, contour: &Contour, radius: f64) -> Option<usize> {
    contour.iter().position(|v| v.within_distance(&p, radius))
}

fn adjacent_indices(a: usize, b: usize, n: usize) -> bool {
    let d = a.abs_diff(b);
    d == 1 || d == n - 1
}

/// Picks a relocation target for `from` among `candidates`: the nearest
/// candidate within `radius`, preferring exact-flagged ones; the globally
/// nearest candidate when none is in range.
fn nearest_target(from: Point, candidates: &[Point], exact: &[bool], radius: f64) -> Option<Point> {
    let is_exact = |i: usize| exact.get(i).copied().unwrap_or(false);
    let in_range = (0..candidates.len())
        .filter(|&i| candidates[i].within_distance(&from, radius))
        .collect_vec();
    let pool = if in_range.iter().any(|&i| is_exact(i)) {
        in_range.iter().copied().filter(|&i| is_exact(i)).collect_vec()
    } else if !in_range.is_empty() {
        in_range
    } else {
        (0..candidates.len()).collect_vec()
    };
    pool.into_iter()
        .min_by_key(|&i| OrderedFloat(candidates[i].sq_distance(&from)))
        .map(|i| candidates[i])
}

/// `true` when replacing the corrected contour by `test` would let some
/// vertex of `original` cross to the wrong side. Vertices coinciding with a
/// `test` vertex count as on the boundary and never breach.
fn breaches(test: &[Point], original: &Contour, inside: bool, curve_tolerance: f64) -> bool {
    let radius = curve_tolerance / 1000.0;
    let test_contour = Contour::new(test.to_vec());
    original.iter().any(|v| {
        if test.iter().any(|t| t.within_distance(v, radius)) {
            return false;
        }
        let v_inside = clip::point_in_contour(*v, &test_contour);
        match inside {
            false => !v_inside,
            true => v_inside,
        }
    })
}

/// Snaps long corrected edges onto nearby axis-aligned edges of the reduced
/// contour, removing residual staircasing on rectilinear shapes.
fn straighten(
    pts: &mut [Point],
    simple: &Contour,
    curve_tolerance: f64,
    tolerance: f64,
    sq_fixed: f64,
) {
    let snap_radius = 2.0 * tolerance;
    let identical = curve_tolerance / 1000.0;
    let n = pts.len();
    for i in 0..n {
        if pts[i].sq_distance(&pts[(i + 1) % n]) < sq_fixed {
            continue;
        }
        for j in 0..simple.len() {
            // re-read: an earlier snap may have moved either endpoint
            let p1 = pts[i];
            let p2 = pts[(i + 1) % n];
            if p1.sq_distance(&p2) < sq_fixed {
                continue;
            }
            let s1 = simple[j];
            let s2 = simple[(j + 1) % simple.len()];
            // only horizontal and vertical runs are worth straightening
            let aligned = FPA(s1.x) == FPA(s2.x) || FPA(s1.y) == FPA(s2.y);
            if aligned
                && p1.within_distance(&s1, snap_radius)
                && p2.within_distance(&s2, snap_radius)
                && (!p1.within_distance(&s1, identical) || !p2.within_distance(&s2, identical))
            {
                pts[i] = s1;
                pts[(i + 1) % n] = s2;
            }
        }
    }
}
