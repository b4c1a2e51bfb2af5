//! Layout module: rectangle geometry shared by panels and widgets.

mod rect;

pub use rect::Rect;
