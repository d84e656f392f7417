use super::layout::Point;
use crate::config::BrushConfig;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Round brush used to rasterize pointer movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    /// Stroke width in layer pixels.
    pub diameter: f32,
    /// Straight (non-premultiplied) RGBA fill.
    pub color: [u8; 4],
}

impl Default for Brush {
    fn default() -> Self {
        Self::from(&BrushConfig::default())
    }
}

impl From<&BrushConfig> for Brush {
    fn from(config: &BrushConfig) -> Self {
        Self {
            diameter: config.diameter,
            color: config.color,
        }
    }
}

impl Brush {
    pub fn radius(&self) -> f32 {
        self.diameter / 2.0
    }

    fn paint(&self) -> Paint<'static> {
        let [r, g, b, a] = self.color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint
    }

    /// Draws a round-capped, round-joined segment from `from` to `to`
    /// (layer-local coordinates) onto `layer`, composited source-over.
    ///
    /// Non-finite endpoints draw nothing. A zero-length segment stamps a
    /// single dot of the brush diameter.
    ///
    /// Returns true if any pixel the segment could touch is non-zero
    /// afterwards.
    pub fn stroke_segment(&self, layer: &mut Pixmap, from: Point, to: Point) -> bool {
        if !from.is_finite() || !to.is_finite() || self.diameter <= 0.0 {
            return false;
        }
        let paint = self.paint();

        if from == to {
            let Some(dot) = PathBuilder::from_circle(to.x, to.y, self.radius()) else {
                return false;
            };
            layer.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
        } else {
            let mut pb = PathBuilder::new();
            pb.move_to(from.x, from.y);
            pb.line_to(to.x, to.y);
            let Some(path) = pb.finish() else {
                return false;
            };
            let stroke = Stroke {
                width: self.diameter,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            layer.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        self.any_marked_near(layer, from, to)
    }

    // Only the segment's padded bounding box can have changed.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn any_marked_near(&self, layer: &Pixmap, from: Point, to: Point) -> bool {
        let (width, height) = (layer.width(), layer.height());
        let reach = self.radius() + 1.0;
        let min_x = (from.x.min(to.x) - reach).floor().max(0.0);
        let min_y = (from.y.min(to.y) - reach).floor().max(0.0);
        let max_x = (from.x.max(to.x) + reach).ceil().min(width as f32);
        let max_y = (from.y.max(to.y) + reach).ceil().min(height as f32);
        if max_x <= min_x || max_y <= min_y {
            return false;
        }

        let pixels = layer.pixels();
        (min_y as u32..max_y as u32).any(|y| {
            let row = (y * width) as usize;
            pixels[row + min_x as usize..row + max_x as usize]
                .iter()
                .any(|p| p.alpha() != 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(layer: &Pixmap, x: u32, y: u32) -> u8 {
        layer.pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
    }

    #[test]
    fn test_dot_covers_brush_radius() {
        let mut layer = Pixmap::new(100, 100).unwrap();
        let brush = Brush::default();
        let p = Point::new(50.0, 50.0);
        assert!(brush.stroke_segment(&mut layer, p, p));

        let centre = alpha(&layer, 50, 50);
        assert!((177..=181).contains(&centre), "centre alpha {centre}");
        // 18 px away is inside a 20 px radius
        assert!(alpha(&layer, 68, 50) > 0);
        // 25 px away is well outside
        assert_eq!(alpha(&layer, 75, 50), 0);
        assert_eq!(alpha(&layer, 50, 25), 0);
    }

    #[test]
    fn test_segment_is_round_capped() {
        let mut layer = Pixmap::new(200, 100).unwrap();
        let brush = Brush::default();
        brush.stroke_segment(&mut layer, Point::new(50.0, 50.0), Point::new(150.0, 50.0));

        assert!(alpha(&layer, 100, 50) > 170);
        assert!(alpha(&layer, 100, 35) > 0);
        // cap extends past the endpoints by the radius
        assert!(alpha(&layer, 164, 50) > 0);
        assert!(alpha(&layer, 36, 50) > 0);
        // corners of the bounding box are outside the rounded cap
        assert_eq!(alpha(&layer, 167, 67), 0);
        assert_eq!(alpha(&layer, 100, 75), 0);
    }

    #[test]
    fn test_overlapping_segments_accumulate() {
        let mut layer = Pixmap::new(100, 100).unwrap();
        let brush = Brush::default();
        let p = Point::new(50.0, 50.0);
        brush.stroke_segment(&mut layer, p, p);
        let once = alpha(&layer, 50, 50);
        brush.stroke_segment(&mut layer, p, p);
        assert!(alpha(&layer, 50, 50) > once);
    }

    #[test]
    fn test_clipped_outside_layer() {
        let mut layer = Pixmap::new(10, 10).unwrap();
        let brush = Brush::default();
        let far = Point::new(-100.0, -100.0);
        assert!(!brush.stroke_segment(&mut layer, far, far));
        assert!(layer.pixels().iter().all(|p| p.alpha() == 0));

        // partly outside still paints the visible part
        let edge = Point::new(-5.0, 5.0);
        assert!(brush.stroke_segment(&mut layer, edge, edge));
    }

    #[test]
    fn test_non_finite_endpoints_draw_nothing() {
        let mut layer = Pixmap::new(100, 100).unwrap();
        let brush = Brush::default();
        let nan = Point::new(f32::NAN, f32::NAN);
        let inf = Point::new(f32::INFINITY, 10.0);
        let ok = Point::new(50.0, 50.0);

        assert!(!brush.stroke_segment(&mut layer, nan, nan));
        assert!(!brush.stroke_segment(&mut layer, ok, nan));
        assert!(!brush.stroke_segment(&mut layer, inf, ok));
        assert!(layer.pixels().iter().all(|p| p.alpha() == 0));
    }
}
