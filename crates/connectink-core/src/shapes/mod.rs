//! Shape definitions for the diagram.

mod control_point;
mod ellipse;
mod frame;
mod group;
mod polyline;
mod rectangle;

pub use control_point::{Capabilities, ControlPoint, ControlPointId, RelativePosition};
pub use ellipse::Ellipse;
pub use frame::{Frame, MIN_FRAME_SIZE, ROTATE_HANDLE_OFFSET, rotate_point, rotate_vec};
pub use group::Group;
pub use polyline::{END_POINT, Polyline, START_POINT, Vertex};
pub use rectangle::Rectangle;

use crate::input::ResizeModifiers;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// A full turn in tenths of a degree.
pub const FULL_TURN: i32 = 3600;

/// Height of the caption area of planar shapes.
pub const CAPTION_HEIGHT: f64 = 20.0;

/// Bring an angle in tenths of a degree into `[0, 3600)`.
pub fn normalize_angle(tenths: i32) -> i32 {
    tenths.rem_euclid(FULL_TURN)
}

pub fn tenths_to_radians(tenths: i32) -> f64 {
    (f64::from(tenths) / 10.0).to_radians()
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Control points shared by every planar shape.
pub(crate) fn planar_control_points(frame: &Frame) -> Vec<ControlPoint> {
    (1..=10)
        .filter_map(|id| {
            let capabilities = match id {
                1..=8 => Capabilities::RESIZE | Capabilities::CONNECT,
                9 => Capabilities::REFERENCE | Capabilities::CONNECT,
                _ => Capabilities::ROTATE,
            };
            frame
                .point_position(ControlPointId(id))
                .map(|position| ControlPoint::new(id, position, capabilities))
        })
        .collect()
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the bounding box in diagram coordinates.
    fn bounds(&self) -> Rect;

    /// All control points, in id order.
    fn control_points(&self) -> Vec<ControlPoint>;

    /// Check if a point hits this shape.
    fn contains_point(&self, point: Point, tolerance: f64) -> bool;

    fn move_by(&mut self, delta: Vec2);

    /// Move one control point. Returns false if the point cannot be moved.
    fn move_control_point_by(&mut self, id: ControlPointId, delta: Vec2, modifiers: ResizeModifiers) -> bool;

    /// Rotate by `angle` tenths of a degree around `pivot`.
    fn rotate_by(&mut self, angle: i32, pivot: Point);

    fn relative_position(&self, point: Point) -> RelativePosition;

    fn absolute_position(&self, relative: RelativePosition) -> Point;
}

/// Concrete shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    Rectangle,
    Ellipse,
    Polyline,
    Group,
}

/// Enum wrapper for all shape types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Polyline(Polyline),
    Group(Group),
}

impl Shape {
    fn inner(&self) -> &dyn ShapeTrait {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Ellipse(s) => s,
            Shape::Polyline(s) => s,
            Shape::Group(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Ellipse(s) => s,
            Shape::Polyline(s) => s,
            Shape::Group(s) => s,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.inner().id()
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Rectangle(_) => ShapeType::Rectangle,
            Shape::Ellipse(_) => ShapeType::Ellipse,
            Shape::Polyline(_) => ShapeType::Polyline,
            Shape::Group(_) => ShapeType::Group,
        }
    }

    /// Linear shapes are the ones carrying glue points.
    pub fn is_linear(&self) -> bool {
        matches!(self, Shape::Polyline(_))
    }

    pub fn bounds(&self) -> Rect {
        self.inner().bounds()
    }

    /// Rotation pivot of the shape.
    pub fn center(&self) -> Point {
        match self.frame() {
            Some(frame) => frame.center,
            None => self.bounds().center(),
        }
    }

    /// Rotation in tenths of a degree; always 0 for polylines.
    pub fn angle(&self) -> i32 {
        match self {
            Shape::Rectangle(s) => s.frame.angle,
            Shape::Ellipse(s) => s.frame.angle,
            Shape::Polyline(_) => 0,
            Shape::Group(s) => s.angle,
        }
    }

    pub fn control_points(&self) -> Vec<ControlPoint> {
        self.inner().control_points()
    }

    /// Map sentinel ids onto the real point they stand for.
    pub fn resolve_point(&self, id: ControlPointId) -> Option<ControlPointId> {
        match id {
            ControlPointId::REFERENCE if self.is_linear() => Some(START_POINT),
            ControlPointId::REFERENCE => Some(ControlPointId(9)),
            ControlPointId::FIRST_VERTEX if self.is_linear() => Some(START_POINT),
            ControlPointId::LAST_VERTEX if self.is_linear() => Some(END_POINT),
            id if id.is_real() => Some(id),
            _ => None,
        }
    }

    /// Ids of the points having any of the `filter` capabilities.
    /// An empty filter lists every point.
    pub fn control_point_ids(&self, filter: Capabilities) -> Vec<ControlPointId> {
        self.control_points()
            .into_iter()
            .filter(|p| filter.is_empty() || p.capabilities.intersects(filter))
            .map(|p| p.id)
            .collect()
    }

    pub fn control_point(&self, id: ControlPointId) -> Option<ControlPoint> {
        let resolved = self.resolve_point(id)?;
        let mut point = self.control_points().into_iter().find(|p| p.id == resolved)?;
        if id == ControlPointId::REFERENCE {
            point.capabilities |= Capabilities::REFERENCE;
        }
        Some(point)
    }

    pub fn control_point_position(&self, id: ControlPointId) -> Option<Point> {
        self.control_point(id).map(|p| p.position)
    }

    pub fn control_point_capabilities(&self, id: ControlPointId) -> Capabilities {
        self.control_point(id)
            .map_or(Capabilities::NONE, |p| p.capabilities)
    }

    /// True when the point has any of the given capabilities.
    pub fn has_control_point_capability(&self, id: ControlPointId, capability: Capabilities) -> bool {
        self.control_point_capabilities(id).intersects(capability)
    }

    pub fn contains_point(&self, point: Point, tolerance: f64) -> bool {
        self.inner().contains_point(point, tolerance)
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.inner_mut().move_by(delta);
    }

    pub fn move_control_point_by(&mut self, id: ControlPointId, delta: Vec2, modifiers: ResizeModifiers) -> bool {
        match self.resolve_point(id) {
            Some(resolved) => self.inner_mut().move_control_point_by(resolved, delta, modifiers),
            None => false,
        }
    }

    /// Move a control point to an absolute position.
    pub fn move_control_point_to(&mut self, id: ControlPointId, target: Point, modifiers: ResizeModifiers) -> bool {
        match self.control_point_position(id) {
            Some(current) => self.move_control_point_by(id, target - current, modifiers),
            None => false,
        }
    }

    pub fn rotate_by(&mut self, angle: i32, pivot: Point) {
        self.inner_mut().rotate_by(angle, pivot);
    }

    pub fn relative_position(&self, point: Point) -> RelativePosition {
        self.inner().relative_position(point)
    }

    pub fn absolute_position(&self, relative: RelativePosition) -> Point {
        self.inner().absolute_position(relative)
    }

    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Shape::Rectangle(s) => Some(&s.frame),
            Shape::Ellipse(s) => Some(&s.frame),
            _ => None,
        }
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            Shape::Rectangle(s) => Some(&mut s.frame),
            Shape::Ellipse(s) => Some(&mut s.frame),
            _ => None,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            Shape::Rectangle(s) => s.caption.as_deref(),
            Shape::Ellipse(s) => s.caption.as_deref(),
            _ => None,
        }
    }

    /// Set the caption. Returns false for shapes that cannot carry one.
    pub fn set_caption(&mut self, caption: Option<String>) -> bool {
        match self {
            Shape::Rectangle(s) => s.caption = caption,
            Shape::Ellipse(s) => s.caption = caption,
            _ => return false,
        }
        true
    }

    fn caption_frame(&self) -> Option<Frame> {
        self.caption()?;
        let frame = self.frame()?;
        Some(Frame {
            center: frame.center,
            width: frame.width * 0.8,
            height: CAPTION_HEIGHT.min(frame.height),
            angle: frame.angle,
        })
    }

    /// Area covered by the caption, if the shape has one.
    pub fn caption_bounds(&self) -> Option<Rect> {
        self.caption_frame().map(|frame| frame.bounds())
    }

    pub fn caption_contains(&self, point: Point) -> bool {
        self.caption_frame()
            .is_some_and(|frame| frame.contains(point, 0.0))
    }

    pub fn children(&self) -> &[Shape] {
        match self {
            Shape::Group(g) => g.children(),
            _ => &[],
        }
    }

    /// Check if this shape is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, Shape::Group(_))
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Shape::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_polyline(&self) -> Option<&Polyline> {
        match self {
            Shape::Polyline(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_polyline_mut(&mut self) -> Option<&mut Polyline> {
        match self {
            Shape::Polyline(l) => Some(l),
            _ => None,
        }
    }

    /// Find this shape or one of its descendants by id.
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            Shape::Group(g) => g.find_shape(id),
            _ => None,
        }
    }

    pub fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            Shape::Group(g) => g.find_shape_mut(id),
            _ => None,
        }
    }

    /// Ids of all nested children, not including this shape.
    pub fn descendant_ids(&self) -> Vec<ShapeId> {
        match self {
            Shape::Group(g) => g.all_shape_ids().into_iter().skip(1).collect(),
            _ => Vec::new(),
        }
    }

    pub fn contains_descendant(&self, id: ShapeId) -> bool {
        match self {
            Shape::Group(g) => g.find_shape(id).is_some(),
            _ => false,
        }
    }

    /// Regenerate the IDs of this shape and all its children.
    pub fn regenerate_ids(&mut self) {
        let new_id = Uuid::new_v4();
        match self {
            Shape::Rectangle(s) => s.id = new_id,
            Shape::Ellipse(s) => s.id = new_id,
            Shape::Polyline(s) => s.id = new_id,
            Shape::Group(s) => {
                s.id = new_id;
                for child in &mut s.children {
                    child.regenerate_ids();
                }
            }
        }
    }

    fn regenerate_ids_recording(&mut self, pairs: &mut Vec<(ShapeId, ShapeId)>) {
        let original = self.id();
        let fresh = Uuid::new_v4();
        match self {
            Shape::Rectangle(s) => s.id = fresh,
            Shape::Ellipse(s) => s.id = fresh,
            Shape::Polyline(s) => s.id = fresh,
            Shape::Group(s) => {
                s.id = fresh;
                for child in &mut s.children {
                    child.regenerate_ids_recording(pairs);
                }
            }
        }
        pairs.push((original, fresh));
    }

    /// Clone with fresh ids for this shape and every descendant.
    ///
    /// Returns the clone together with `(original, clone)` id pairs.
    pub fn clone_as_preview(&self) -> (Shape, Vec<(ShapeId, ShapeId)>) {
        let mut preview = self.clone();
        let mut pairs = Vec::new();
        preview.regenerate_ids_recording(&mut pairs);
        (preview, pairs)
    }

    /// Copy geometry from `source`, keeping this shape's ids.
    ///
    /// Both shapes must have the same structure; mismatched parts are left alone.
    pub fn assign_geometry(&mut self, source: &Shape) {
        match (self, source) {
            (Shape::Rectangle(dst), Shape::Rectangle(src)) => dst.frame = src.frame,
            (Shape::Ellipse(dst), Shape::Ellipse(src)) => dst.frame = src.frame,
            (Shape::Polyline(dst), Shape::Polyline(src)) => dst.copy_vertices_from(src),
            (Shape::Group(dst), Shape::Group(src)) => {
                dst.angle = src.angle;
                for (child, source_child) in dst.children.iter_mut().zip(&src.children) {
                    child.assign_geometry(source_child);
                }
            }
            _ => {}
        }
    }
}
