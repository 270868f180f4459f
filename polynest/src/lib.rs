//! Nesting optimization engine for 2D irregular cutting and packing problems.
//!
//! The engine has two halves: a polygon-tree geometry layer that cleans,
//! simplifies and offsets arbitrary input contours into a form suitable for
//! packing, and a genetic-algorithm optimizer that searches placement
//! orderings and rotations while an external evaluator scores candidate
//! layouts asynchronously.
//!
//! Contour extraction from drawings and the per-individual placement
//! evaluation are collaborators behind the [`io::OutlineLoader`] and
//! [`opt::eval::PlacementEvaluator`] traits; everything in between is owned
//! by a [`session::NestSession`].

pub mod config;
pub mod entities;
pub mod geometry;
pub mod io;
pub mod opt;
pub mod session;
pub mod util;
