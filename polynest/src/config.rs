use log::warn;
use serde::{Deserialize, Serialize};

/// Placement strategy hint, passed through to the external evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStrategy {
    /// Pack towards one side of the sheet.
    Gravity,
    /// Minimize the bounding box of the layout.
    Box,
    /// Minimize the convex hull of the layout.
    ConvexHull,
}

/// Configuration of a nesting session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestConfig {
    /// Maximum deviation from the true outline allowed by simplification and
    /// cleaning, in drawing units. Must stay positive.
    pub curve_tolerance: f64,
    /// Edge-to-edge clearance between placed parts, in drawing units.
    pub spacing: f64,
    /// Number of discrete rotation angles searched per part.
    pub rotations: u32,
    /// Number of individuals in the genetic population, at least 3.
    pub population_size: usize,
    /// Percent chance per gene of a mutation, per pass.
    pub mutation_rate: u32,
    /// Nominal evaluator concurrency cap, at most 8. Dispatch currently
    /// stays single-flight regardless.
    pub threads: u32,
    pub placement_type: PlacementStrategy,
    /// Evaluator hint: merge coincident edges when cutting.
    pub merge_lines: bool,
    /// Evaluator hint: time versus quality tradeoff in `[0, 1]`.
    pub time_ratio: f64,
    /// Default unit scale handed to the outline loader.
    pub scale: f64,
    /// Replace every contour with its convex hull before nesting.
    pub simplify: bool,
    /// Seed for the PRNG. If undefined, the optimizer seeds itself from
    /// entropy and runs non-deterministically.
    pub prng_seed: Option<u64>,
}

impl Default for NestConfig {
    fn default() -> Self {
        NestConfig {
            curve_tolerance: 0.3,
            spacing: 0.0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            threads: 4,
            placement_type: PlacementStrategy::Gravity,
            merge_lines: true,
            time_ratio: 0.5,
            scale: 72.0,
            simplify: false,
            prng_seed: None,
        }
    }
}

/// Partial configuration change. `None` fields leave the current value
/// untouched; invalid values are rejected field by field with the prior
/// value retained, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub curve_tolerance: Option<f64>,
    pub spacing: Option<f64>,
    pub rotations: Option<u32>,
    pub population_size: Option<usize>,
    pub mutation_rate: Option<u32>,
    pub threads: Option<u32>,
    pub placement_type: Option<PlacementStrategy>,
    pub merge_lines: Option<bool>,
    pub time_ratio: Option<f64>,
    pub scale: Option<f64>,
    pub simplify: Option<bool>,
    pub prng_seed: Option<u64>,
}

impl NestConfig {
    /// Applies `update` field by field, keeping the prior value whenever a
    /// new one fails validation.
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(v) = update.curve_tolerance {
            if v.is_finite() && v > 0.0 {
                self.curve_tolerance = v;
            } else {
                warn!("[CONF] rejected curve_tolerance {v}, keeping {}", self.curve_tolerance);
            }
        }
        if let Some(v) = update.spacing {
            if v.is_finite() && v >= 0.0 {
                self.spacing = v;
            } else {
                warn!("[CONF] rejected spacing {v}, keeping {}", self.spacing);
            }
        }
        if let Some(v) = update.rotations {
            if v > 0 {
                self.rotations = v;
            } else {
                warn!("[CONF] rejected rotations {v}, keeping {}", self.rotations);
            }
        }
        if let Some(v) = update.population_size {
            if v > 2 {
                self.population_size = v;
            } else {
                warn!("[CONF] rejected population_size {v}, keeping {}", self.population_size);
            }
        }
        if let Some(v) = update.mutation_rate {
            if v > 0 {
                self.mutation_rate = v;
            } else {
                warn!("[CONF] rejected mutation_rate {v}, keeping {}", self.mutation_rate);
            }
        }
        if let Some(v) = update.threads {
            if v > 0 {
                self.threads = v.min(8);
            } else {
                warn!("[CONF] rejected threads {v}, keeping {}", self.threads);
            }
        }
        if let Some(v) = update.placement_type {
            self.placement_type = v;
        }
        if let Some(v) = update.merge_lines {
            self.merge_lines = v;
        }
        if let Some(v) = update.time_ratio {
            if v.is_finite() {
                self.time_ratio = v;
            } else {
                warn!("[CONF] rejected time_ratio {v}, keeping {}", self.time_ratio);
            }
        }
        if let Some(v) = update.scale {
            if v.is_finite() && v > 0.0 {
                self.scale = v;
            } else {
                warn!("[CONF] rejected scale {v}, keeping {}", self.scale);
            }
        }
        if let Some(v) = update.simplify {
            self.simplify = v;
        }
        if let Some(v) = update.prng_seed {
            self.prng_seed = Some(v);
        }
    }
}
