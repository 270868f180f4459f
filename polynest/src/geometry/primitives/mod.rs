mod contour;
mod point;
mod rect;

#[doc(inline)]
pub use contour::Contour;
#[doc(inline)]
pub use point::Point;
#[doc(inline)]
pub use rect::Rect;
