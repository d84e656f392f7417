use serde::{Deserialize, Serialize};

/// A position in some local frame, in CSS-style pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Size of the element the image is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub width: u32,
    pub height: u32,
}

impl Container {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Container {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// The on-screen rectangle an image occupies inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedBox {
    pub origin: Point,
    pub width: u32,
    pub height: u32,
}

impl RenderedBox {
    /// Scales the natural size to fit inside `container` keeping aspect ratio,
    /// never enlarging it, and centres the result.
    ///
    /// The pixel size is truncated, matching how a canvas truncates a
    /// fractional width, while the origin keeps the exact centring offset.
    pub fn contain(natural_width: u32, natural_height: u32, container: Container) -> Self {
        if natural_width == 0 || natural_height == 0 {
            return Self {
                origin: Point::new(container.width as f32 / 2.0, container.height as f32 / 2.0),
                width: 0,
                height: 0,
            };
        }

        let scale = (container.width as f32 / natural_width as f32)
            .min(container.height as f32 / natural_height as f32)
            .min(1.0);
        let scaled_width = natural_width as f32 * scale;
        let scaled_height = natural_height as f32 * scale;

        Self {
            origin: Point::new(
                (container.width as f32 - scaled_width) / 2.0,
                (container.height as f32 - scaled_height) / 2.0,
            ),
            width: scaled_width as u32,
            height: scaled_height as u32,
        }
    }

    /// Translates a container-local position into this box's frame.
    pub fn to_local(&self, position: Point) -> Point {
        Point::new(position.x - self.origin.x, position.y - self.origin.y)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
