use serde::{Deserialize, Serialize};

/// Position and rotation assigned to one part instance by the evaluator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Placement {
    pub id: usize,
    pub source: usize,
    pub x: f64,
    pub y: f64,
    /// Degrees, counterclockwise.
    pub rotation: f64,
}

/// All placements assigned to one sheet instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetPlacement {
    pub sheet: usize,
    pub sheet_source: usize,
    pub placements: Vec<Placement>,
}

/// Externally evaluated layout for one individual, kept in the session's
/// bounded best-results list (capacity 10, best first).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NestResult {
    /// Scalar layout quality, lower is better.
    pub fitness: f64,
    pub placements: Vec<SheetPlacement>,
}
