//! Group shape for combining multiple shapes.

use super::{
    Capabilities, ControlPoint, ControlPointId, RelativePosition, Shape, ShapeId, ShapeTrait,
    normalize_angle,
};
use crate::input::ResizeModifiers;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A group of shapes that can be manipulated as a single unit.
/// Groups can contain other groups, enabling nested hierarchies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: ShapeId,
    /// Child shapes in this group.
    pub children: Vec<Shape>,
    /// Accumulated rotation in tenths of a degree.
    #[serde(default)]
    pub angle: i32,
}

impl Group {
    /// Create a new group from a list of shapes.
    pub fn new(children: Vec<Shape>) -> Self {
        Self {
            id: Uuid::new_v4(),
            children,
            angle: 0,
        }
    }

    /// Get the children of this group.
    pub fn children(&self) -> &[Shape] {
        &self.children
    }

    /// Get mutable access to children.
    pub fn children_mut(&mut self) -> &mut Vec<Shape> {
        &mut self.children
    }

    /// Get all shape IDs in this group (including nested groups).
    pub fn all_shape_ids(&self) -> Vec<ShapeId> {
        let mut ids = vec![self.id];
        for child in &self.children {
            if let Shape::Group(group) = child {
                ids.extend(group.all_shape_ids());
            } else {
                ids.push(child.id());
            }
        }
        ids
    }

    /// Find a shape by ID within this group (including nested groups).
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        for child in &self.children {
            if child.id() == id {
                return Some(child);
            }
            if let Shape::Group(group) = child {
                if let Some(found) = group.find_shape(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Find a mutable shape by ID within this group (including nested groups).
    pub fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        for child in &mut self.children {
            if child.id() == id {
                return Some(child);
            }
            if let Shape::Group(group) = child {
                if let Some(found) = group.find_shape_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }
}

impl ShapeTrait for Group {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let Some((first, rest)) = self.children.split_first() else {
            return Rect::ZERO;
        };
        rest.iter()
            .fold(first.bounds(), |acc, child| acc.union(child.bounds()))
    }

    fn control_points(&self) -> Vec<ControlPoint> {
        let b = self.bounds();
        let c = b.center();
        let mut points: Vec<ControlPoint> = [
            Point::new(b.x0, b.y0),
            Point::new(c.x, b.y0),
            Point::new(b.x1, b.y0),
            Point::new(b.x0, c.y),
            Point::new(b.x1, c.y),
            Point::new(b.x0, b.y1),
            Point::new(c.x, b.y1),
            Point::new(b.x1, b.y1),
        ]
        .into_iter()
        .zip(1..)
        .map(|(position, id)| ControlPoint::new(id, position, Capabilities::NONE))
        .collect();
        points.push(ControlPoint::new(9, c, Capabilities::REFERENCE | Capabilities::ROTATE));
        points
    }

    fn contains_point(&self, point: Point, tolerance: f64) -> bool {
        self.children.iter().any(|child| child.contains_point(point, tolerance))
    }

    fn move_by(&mut self, delta: Vec2) {
        for child in &mut self.children {
            child.move_by(delta);
        }
    }

    fn move_control_point_by(&mut self, id: ControlPointId, delta: Vec2, _modifiers: ResizeModifiers) -> bool {
        if id.0 == 9 {
            self.move_by(delta);
            return true;
        }
        false
    }

    fn rotate_by(&mut self, angle: i32, pivot: Point) {
        for child in &mut self.children {
            child.rotate_by(angle, pivot);
        }
        self.angle = normalize_angle(self.angle + angle);
    }

    fn relative_position(&self, point: Point) -> RelativePosition {
        let b = self.bounds();
        let offset = point - b.center();
        RelativePosition::new(offset.x / b.width().max(1.0), offset.y / b.height().max(1.0))
    }

    fn absolute_position(&self, relative: RelativePosition) -> Point {
        let b = self.bounds();
        b.center() + Vec2::new(relative.a * b.width().max(1.0), relative.b * b.height().max(1.0))
    }
}
