pub mod clip;
pub mod convex_hull;
pub mod primitives;
pub mod simplification;
