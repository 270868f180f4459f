//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;

use polynest::entities::{PartInstance, Placement, PolyTree, SheetPlacement};
use polynest::geometry::primitives::{Contour, Point, Rect};
use polynest::io::OutlineLoader;
use polynest::io::ext_repr::{EvalRequest, EvalResponse};
use polynest::opt::eval::PlacementEvaluator;

pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Counterclockwise axis-aligned square with its lower-left corner at `(x, y)`.
pub fn square_at(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + size, y),
        Point::new(x + size, y + size),
        Point::new(x, y + size),
    ]
}

pub fn square(size: f64) -> Vec<Point> {
    square_at(0.0, 0.0, size)
}

/// In-memory drawing, element per entry.
pub enum Element {
    Closed(Vec<Point>),
    Open(Vec<Point>),
}

pub struct VecLoader {
    pub elements: Vec<Element>,
}

impl OutlineLoader for VecLoader {
    type Element = Element;

    fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn is_closed(&self, element: &Element, _tolerance: f64) -> bool {
        matches!(element, Element::Closed(_))
    }

    fn polygonify(&self, element: &Element) -> Vec<Point> {
        match element {
            Element::Closed(points) | Element::Open(points) => points.clone(),
        }
    }
}

/// Deterministic evaluator lining the parts up in a row on the first sheet.
/// Fitness is the total row width, which does not depend on the ordering or
/// the rotations of the individual.
pub struct RowEvaluator;

impl PlacementEvaluator for RowEvaluator {
    fn evaluate(&self, request: EvalRequest) -> Result<EvalResponse> {
        let mut placements = vec![];
        let mut cursor = 0.0;
        for (k, outline) in request.individual.placement.iter().enumerate() {
            let bounds = Rect::from_points(outline)?;
            placements.push(Placement {
                id: request.ids[k],
                source: request.sources[k],
                x: cursor - bounds.x_min,
                y: -bounds.y_min,
                rotation: 0.0,
            });
            cursor += bounds.width();
        }
        Ok(EvalResponse {
            index: request.index,
            fitness: cursor,
            placements: vec![SheetPlacement {
                sheet: request.sheet_ids[0],
                sheet_source: request.sheet_sources[0],
                placements,
            }],
        })
    }
}

/// Instance pool of squares with strictly decreasing size, so the seed
/// ordering of the optimizer is predictable.
pub fn square_instances(n: usize) -> Vec<PartInstance> {
    (0..n)
        .map(|i| {
            let contour = Contour::new(square((n - i) as f64));
            PartInstance {
                id: i,
                source: i,
                tree: Arc::new(PolyTree::new(contour, Some(i), Some(i))),
            }
        })
        .collect()
}
