//! View transform between screen pixels and diagram units.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Pan and zoom of the view onto a diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen position of the diagram origin.
    pub offset: Vec2,
    /// Screen pixels per diagram unit.
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen to diagram transform.
    fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_diagram(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Diagram area visible in a viewport of `viewport` pixels.
    pub fn visible_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_diagram(Point::ZERO),
            self.screen_to_diagram(Point::new(viewport.width, viewport.height)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let camera = Camera::new();
        let point = Point::new(100.0, 200.0);
        assert_eq!(camera.screen_to_diagram(point), point);
    }

    #[test]
    fn test_visible_rect_follows_pan_and_zoom() {
        let camera = Camera {
            offset: Vec2::new(-40.0, 20.0),
            zoom: 2.0,
        };
        let visible = camera.visible_rect(Size::new(200.0, 100.0));
        assert!((visible.x0 - 20.0).abs() < 1e-10);
        assert!((visible.y0 + 10.0).abs() < 1e-10);
        assert!((visible.width() - 100.0).abs() < 1e-10);
        assert!((visible.height() - 50.0).abs() < 1e-10);
    }
}
