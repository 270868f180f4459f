pub mod eval;
pub mod ga;
pub mod scheduler;
pub mod spacing;
