pub mod brush;
pub mod layout;
pub mod surface;

pub use brush::Brush;
pub use layout::{Container, Point, RenderedBox};
pub use surface::{MaskLayer, MaskSurface};
