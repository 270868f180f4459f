use std::sync::Arc;

use anyhow::{Result, ensure};

use crate::entities::PolyTree;
use crate::geometry::primitives::Rect;

/// A shape registered with the session, either placeable material or a sheet
/// to place onto. Created on import and owned by the session; the optimizer
/// only ever works on value copies.
#[derive(Clone, Debug)]
pub struct PartDefinition {
    pub tree: PolyTree,
    /// Bounding box of the outer contour.
    pub bounds: Rect,
    /// Bounding box area, used for rough size comparisons.
    pub area: f64,
    /// Number of physical copies to place, 0 excludes the part.
    pub quantity: u32,
    pub is_sheet: bool,
    /// Indices of the drawing elements claimed by this part, geometry and
    /// decoration alike. The first entry is the element the outer contour
    /// was flattened from.
    pub elements: Vec<usize>,
}

impl PartDefinition {
    pub fn new(tree: PolyTree, quantity: u32, is_sheet: bool) -> Result<Self> {
        ensure!(!tree.is_empty(), "part tree without a root contour");
        let bounds = tree.root().contour.bounds()?;
        let area = bounds.width() * bounds.height();
        Ok(PartDefinition {
            tree,
            bounds,
            area,
            quantity,
            is_sheet,
            elements: vec![],
        })
    }
}

/// One physical copy of a part, created when optimization starts.
///
/// All copies of the same definition share one spacing-adjusted tree, they
/// differ only in `id`. Cloning an instance is therefore cheap enough for the
/// optimizer to shuffle instances around freely.
#[derive(Clone, Debug)]
pub struct PartInstance {
    /// Unique across every instance of one optimization run.
    pub id: usize,
    /// Index of the originating [`PartDefinition`].
    pub source: usize,
    pub tree: Arc<PolyTree>,
}
