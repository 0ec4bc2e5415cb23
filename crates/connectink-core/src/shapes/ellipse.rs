//! Ellipse shape.

use super::{
    ControlPoint, ControlPointId, Frame, RelativePosition, ShapeId, ShapeTrait, planar_control_points,
};
use crate::input::ResizeModifiers;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ellipse inscribed in a rotatable frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    pub frame: Frame,
    #[serde(default)]
    pub caption: Option<String>,
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame: Frame::new(center, radius_x * 2.0, radius_y * 2.0),
            caption: None,
        }
    }

    /// Create a circle.
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, radius)
    }

    /// Create an ellipse from a bounding rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn radius_x(&self) -> f64 {
        self.frame.width / 2.0
    }

    pub fn radius_y(&self) -> f64 {
        self.frame.height / 2.0
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        // Exact extents of a rotated ellipse.
        let (sin, cos) = self.frame.radians().sin_cos();
        let (rx, ry) = (self.radius_x(), self.radius_y());
        let half_w = ((rx * cos).powi(2) + (ry * sin).powi(2)).sqrt();
        let half_h = ((rx * sin).powi(2) + (ry * cos).powi(2)).sqrt();
        let c = self.frame.center;
        Rect::new(c.x - half_w, c.y - half_h, c.x + half_w, c.y + half_h)
    }

    fn control_points(&self) -> Vec<ControlPoint> {
        planar_control_points(&self.frame)
    }

    fn contains_point(&self, point: Point, tolerance: f64) -> bool {
        let local = self.frame.to_local(point);
        let rx = self.radius_x() + tolerance;
        let ry = self.radius_y() + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        (local.x / rx).powi(2) + (local.y / ry).powi(2) <= 1.0
    }

    fn move_by(&mut self, delta: Vec2) {
        self.frame.center += delta;
    }

    fn move_control_point_by(&mut self, id: ControlPointId, delta: Vec2, modifiers: ResizeModifiers) -> bool {
        if id.0 == 9 {
            self.move_by(delta);
            return true;
        }
        self.frame.resize(id, delta, modifiers)
    }

    fn rotate_by(&mut self, angle: i32, pivot: Point) {
        self.frame.rotate_by(angle, pivot);
    }

    fn relative_position(&self, point: Point) -> RelativePosition {
        self.frame.relative_position(point)
    }

    fn absolute_position(&self, relative: RelativePosition) -> Point {
        self.frame.absolute_position(relative)
    }
}
