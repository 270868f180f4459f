pub mod assertions;
mod fpa;

#[doc(inline)]
pub use fpa::FPA;
