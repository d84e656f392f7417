use super::brush::Brush;
use super::layout::{Container, Point, RenderedBox};
use crate::error::{InpaintError, Result};
use crate::models::MaskPayload;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tiny_skia::{Color, Pixmap};

/// Drawing buffer registered 1:1 over the rendered image.
#[derive(Debug, Clone)]
pub struct MaskLayer {
    rendered: RenderedBox,
    pixmap: Pixmap,
    marked: bool,
}

impl MaskLayer {
    /// `None` when the rendered box has no area.
    fn new(rendered: RenderedBox) -> Option<Self> {
        Some(Self {
            rendered,
            pixmap: Pixmap::new(rendered.width, rendered.height)?,
            marked: false,
        })
    }

    pub fn rendered_box(&self) -> RenderedBox {
        self.rendered
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// The premultiplied drawing surface.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Running "any pixel painted" flag maintained during rasterization.
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Full scan for any pixel whose raw 32-bit value is non-zero.
    ///
    /// A premultiplied pixel is all-zero exactly when its straight form is,
    /// so scanning the pixmap gives the same answer as scanning the export.
    pub fn scan_marked(&self) -> bool {
        self.pixmap.data().iter().any(|&byte| byte != 0)
    }

    /// Converts the layer to straight (non-premultiplied) RGBA.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let (width, height) = self.dimensions();
        let mut image = RgbaImage::new(width, height);
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let a = src.alpha();
            if a == 0 {
                dst.0 = [0, 0, 0, 0];
            } else {
                let unmultiply = |c: u8| ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)) as u8;
                dst.0 = [
                    unmultiply(src.red()),
                    unmultiply(src.green()),
                    unmultiply(src.blue()),
                    a,
                ];
            }
        }
        image
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
        self.marked = false;
    }
}

/// Freehand mask painter over a displayed image.
///
/// Input positions are in the container's local frame. Nothing is drawn
/// until an image has been loaded.
#[derive(Debug, Clone)]
pub struct MaskSurface {
    brush: Brush,
    container: Container,
    natural_size: Option<(u32, u32)>,
    layer: Option<MaskLayer>,
    anchor: Option<Point>,
}

impl MaskSurface {
    pub fn new(container: Container, brush: Brush) -> Self {
        Self {
            brush,
            container,
            natural_size: None,
            layer: None,
            anchor: None,
        }
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn container(&self) -> Container {
        self.container
    }

    /// The current layer. `None` before an image is loaded, or while the
    /// rendered box has no area.
    pub fn layer(&self) -> Option<&MaskLayer> {
        self.layer.as_ref()
    }

    pub fn rendered_box(&self) -> Option<RenderedBox> {
        self.layer.as_ref().map(MaskLayer::rendered_box)
    }

    pub fn is_stroking(&self) -> bool {
        self.anchor.is_some()
    }

    /// Registers a newly loaded image of the given natural size.
    pub fn load(&mut self, natural_width: u32, natural_height: u32) {
        self.natural_size = Some((natural_width, natural_height));
        self.relayout();
    }

    /// The container changed size; the layer is rebuilt to match.
    pub fn resize(&mut self, container: Container) {
        self.container = container;
        self.relayout();
    }

    // Shared by both the load and resize triggers. Any previous mask is
    // discarded because it no longer lines up with the image.
    fn relayout(&mut self) {
        let Some((width, height)) = self.natural_size else {
            return;
        };
        let rendered = RenderedBox::contain(width, height, self.container);
        log::debug!(
            "Mask layer sized to {}x{} at ({:.1}, {:.1})",
            rendered.width,
            rendered.height,
            rendered.origin.x,
            rendered.origin.y
        );
        self.layer = MaskLayer::new(rendered);
        self.anchor = None;
    }

    /// Starts a stroke at `position` without painting anything.
    ///
    /// Ignored when no layer exists or the position is not finite.
    pub fn begin_stroke(&mut self, position: Point) {
        if self.layer.is_some() && position.is_finite() {
            self.anchor = Some(position);
        }
    }

    /// Paints a segment from the previous position to `position` and moves
    /// the anchor there. A non-finite position is dropped and the anchor
    /// stays put.
    pub fn extend_stroke(&mut self, position: Point) {
        if !position.is_finite() {
            return;
        }
        let (Some(anchor), Some(layer)) = (self.anchor, self.layer.as_mut()) else {
            return;
        };
        let from = layer.rendered.to_local(anchor);
        let to = layer.rendered.to_local(position);
        if self.brush.stroke_segment(&mut layer.pixmap, from, to) {
            layer.marked = true;
        }
        self.anchor = Some(position);
    }

    pub fn end_stroke(&mut self) {
        self.anchor = None;
    }

    /// Erases every painted pixel and resets the emptiness flag. An
    /// in-progress stroke keeps its anchor.
    pub fn clear(&mut self) {
        if let Some(layer) = self.layer.as_mut() {
            layer.clear();
        }
    }

    pub fn is_marked(&self) -> bool {
        self.layer.as_ref().is_some_and(MaskLayer::is_marked)
    }

    pub fn scan_marked(&self) -> bool {
        self.layer.as_ref().is_some_and(MaskLayer::scan_marked)
    }

    /// Encodes the layer as PNG. `None` when there is no layer.
    pub fn export_mask(&self) -> Result<Option<MaskPayload>> {
        let Some(layer) = self.layer.as_ref() else {
            return Ok(None);
        };
        let (width, height) = layer.dimensions();

        let mut bytes = Vec::new();
        layer
            .to_rgba_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| InpaintError::ImageEncodeError(e.to_string()))?;
        log::debug!("Exported {}x{} mask ({} bytes)", width, height, bytes.len());

        Ok(Some(MaskPayload {
            bytes,
            width,
            height,
        }))
    }
}
