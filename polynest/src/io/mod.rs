pub mod ext_repr;
mod import;

#[doc(inline)]
pub use import::ImportReport;
#[doc(inline)]
pub use import::Importer;
#[doc(inline)]
pub use import::OutlineLoader;
