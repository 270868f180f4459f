mod nest_result;
mod part;
mod poly_tree;

#[doc(inline)]
pub use nest_result::NestResult;
#[doc(inline)]
pub use nest_result::Placement;
#[doc(inline)]
pub use nest_result::SheetPlacement;
#[doc(inline)]
pub use part::PartDefinition;
#[doc(inline)]
pub use part::PartInstance;
#[doc(inline)]
pub use poly_tree::NodeId;
#[doc(inline)]
pub use poly_tree::PolyNode;
#[doc(inline)]
pub use poly_tree::PolyTree;
