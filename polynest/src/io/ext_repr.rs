//! External representations crossing the evaluator boundary.
//!
//! The transport cannot carry object identity or cyclic references, so part
//! trees are flattened into plain nested point lists and the identity data
//! travels in parallel arrays alongside them.

use serde::{Deserialize, Serialize};

use crate::config::NestConfig;
use crate::entities::{NodeId, PolyTree, SheetPlacement};
use crate::geometry::primitives::Point;

/// External representation of one contour of a part tree, holes nested as
/// `children`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtPolygon {
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<ExtPolygon>,
}

impl ExtPolygon {
    /// Flattens the subtree rooted at `node` into nested point lists.
    pub fn from_tree(tree: &PolyTree, node: NodeId) -> ExtPolygon {
        let n = tree.node(node);
        ExtPolygon {
            points: n.contour.points.clone(),
            children: n
                .children()
                .iter()
                .map(|&c| ExtPolygon::from_tree(tree, c))
                .collect(),
        }
    }
}

/// External representation of one individual: bare outlines in placement
/// order plus the rotation assigned to each.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExtIndividual {
    pub placement: Vec<Vec<Point>>,
    /// Degrees, one entry per placement entry.
    pub rotation: Vec<f64>,
}

/// One placement evaluation submitted to the external evaluator.
#[derive(Serialize, Clone, Debug)]
pub struct EvalRequest {
    /// Index of the individual in the population.
    pub index: usize,
    pub individual: ExtIndividual,
    /// Outer outline per sheet instance, repeated per quantity unit.
    pub sheets: Vec<Vec<Point>>,
    pub sheet_ids: Vec<usize>,
    pub sheet_sources: Vec<usize>,
    pub sheet_children: Vec<Vec<ExtPolygon>>,
    pub config: NestConfig,
    /// Instance id per placement entry.
    pub ids: Vec<usize>,
    /// Definition index per placement entry.
    pub sources: Vec<usize>,
    /// Hole subtrees per placement entry.
    pub children: Vec<Vec<ExtPolygon>>,
}

/// Result of one placement evaluation.
#[derive(Deserialize, Clone, Debug)]
pub struct EvalResponse {
    /// Index of the evaluated individual in the population.
    pub index: usize,
    /// Scalar layout quality, lower is better.
    pub fitness: f64,
    pub placements: Vec<SheetPlacement>,
}
