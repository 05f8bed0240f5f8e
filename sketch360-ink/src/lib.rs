pub mod color;
pub mod container;
pub mod curve;
pub mod geom;
pub mod render;
pub mod stroke;
pub mod wet;

pub use color::Color;
pub use geom::{Point, Rect};
pub use stroke::{DrawingAttributes, InkKind, InkPoint, InkStroke, PenTip};
