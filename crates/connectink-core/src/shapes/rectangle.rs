//! Rectangle shape.

use super::{
    ControlPoint, ControlPointId, Frame, RelativePosition, ShapeId, ShapeTrait, planar_control_points,
};
use crate::input::ResizeModifiers;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rotatable rectangle with an optional caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    pub frame: Frame,
    #[serde(default)]
    pub caption: Option<String>,
}

impl Rectangle {
    /// Create a new rectangle from its top-left corner and size.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self::from_rect(Rect::from_origin_size(position, (width, height)))
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::from_rect(Rect::from_points(p1, p2))
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame: Frame::from_rect(rect),
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.frame.bounds()
    }

    fn control_points(&self) -> Vec<ControlPoint> {
        planar_control_points(&self.frame)
    }

    fn contains_point(&self, point: Point, tolerance: f64) -> bool {
        self.frame.contains(point, tolerance)
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
