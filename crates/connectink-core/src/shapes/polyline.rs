//! Polyline shape, the linear connector of a diagram.

use super::{
    Capabilities, ControlPoint, ControlPointId, RelativePosition, ShapeId, ShapeTrait,
    frame::rotate_point, point_to_segment_dist,
};
use crate::input::ResizeModifiers;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id of the start point.
pub const START_POINT: ControlPointId = ControlPointId(1);
/// Id of the end point.
pub const END_POINT: ControlPointId = ControlPointId(2);
/// First id handed out to inserted vertices.
const FIRST_INNER_ID: i32 = 3;

/// A vertex of a polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: ControlPointId,
    pub position: Point,
}

/// A line through a sequence of vertices.
///
/// The first vertex is always the start point (id 1) and the last is always
/// the end point (id 2). Both are glue points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline {
    pub(crate) id: ShapeId,
    vertices: Vec<Vertex>,
    next_vertex_id: i32,
}

impl Polyline {
    /// Create a new straight line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            vertices: vec![
                Vertex { id: START_POINT, position: start },
                Vertex { id: END_POINT, position: end },
            ],
            next_vertex_id: FIRST_INNER_ID,
        }
    }

    /// Create a polyline through `points`. Fewer than two points yield a
    /// degenerate line at the single (or origin) point.
    pub fn from_points(points: &[Point]) -> Self {
        let start = points.first().copied().unwrap_or(Point::ZERO);
        let end = points.last().copied().unwrap_or(start);
        let mut line = Self::new(start, end);
        if points.len() > 2 {
            for p in &points[1..points.len() - 1] {
                line.insert_vertex(*p);
            }
        }
        line
    }

    pub fn start(&self) -> Point {
        self.vertices[0].position
    }

    pub fn end(&self) -> Point {
        self.vertices[self.vertices.len() - 1].position
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All vertex positions from start to end.
    pub fn all_points(&self) -> Vec<Point> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Insert a vertex just before the end point and return its id.
    pub fn insert_vertex(&mut self, position: Point) -> ControlPointId {
        let id = ControlPointId(self.next_vertex_id);
        self.next_vertex_id += 1;
        let at = self.vertices.len() - 1;
        self.vertices.insert(at, Vertex { id, position });
        id
    }

    /// Remove an inner vertex. Start and end cannot be removed.
    pub fn remove_vertex(&mut self, id: ControlPointId) -> bool {
        if id == START_POINT || id == END_POINT {
            return false;
        }
        let before = self.vertices.len();
        self.vertices.retain(|v| v.id != id);
        self.vertices.len() != before
    }

    /// Set the position of a vertex directly.
    pub fn set_vertex(&mut self, id: ControlPointId, position: Point) -> bool {
        match self.vertices.iter_mut().find(|v| v.id == id) {
            Some(vertex) => {
                vertex.position = position;
                true
            }
            None => false,
        }
    }

    /// Total length along all segments.
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|w| w[0].position.distance(w[1].position))
            .sum()
    }

    /// Midpoint of the straight line between start and end.
    pub fn midpoint(&self) -> Point {
        self.start().midpoint(self.end())
    }

    /// Collapse to a straight line from `start` to `end`, dropping inner vertices.
    pub fn reset_vertices(&mut self, start: Point, end: Point) {
        self.vertices = vec![
            Vertex { id: START_POINT, position: start },
            Vertex { id: END_POINT, position: end },
        ];
        self.next_vertex_id = FIRST_INNER_ID;
    }

    pub(crate) fn copy_vertices_from(&mut self, other: &Polyline) {
        self.vertices = other.vertices.clone();
        self.next_vertex_id = other.next_vertex_id;
    }
}

impl ShapeTrait for Polyline {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let first = self.start();
        self.vertices
            .iter()
            .fold(Rect::from_points(first, first), |acc, v| acc.union_pt(v.position))
    }

    fn control_points(&self) -> Vec<ControlPoint> {
        self.vertices
            .iter()
            .map(|v| {
                let capabilities = if v.id == START_POINT || v.id == END_POINT {
                    Capabilities::RESIZE | Capabilities::GLUE
                } else {
                    Capabilities::RESIZE | Capabilities::CONNECT
                };
                ControlPoint {
                    id: v.id,
                    position: v.position,
                    capabilities,
                }
            })
            .collect()
    }

    fn contains_point(&self, point: Point, tolerance: f64) -> bool {
        self.vertices
            .windows(2)
            .any(|w| point_to_segment_dist(point, w[0].position, w[1].position) <= tolerance)
    }

    fn move_by(&mut self, delta: Vec2) {
        for vertex in &mut self.vertices {
            vertex.position += delta;
        }
    }

    fn move_control_point_by(&mut self, id: ControlPointId, delta: Vec2, _modifiers: ResizeModifiers) -> bool {
        match self.vertices.iter_mut().find(|v| v.id == id) {
            Some(vertex) => {
                vertex.position += delta;
                true
            }
            None => false,
        }
    }

    fn rotate_by(&mut self, angle: i32, pivot: Point) {
        for vertex in &mut self.vertices {
            vertex.position = rotate_point(vertex.position, pivot, angle);
        }
    }

    fn relative_position(&self, point: Point) -> RelativePosition {
        let mut best = (f64::INFINITY, 0.0);
        for (index, w) in self.vertices.windows(2).enumerate() {
            let (a, b) = (w[0].position, w[1].position);
            let seg = b - a;
            let len_sq = seg.hypot2();
            let t = if len_sq < f64::EPSILON {
                0.0
            } else {
                ((point - a).dot(seg) / len_sq).clamp(0.0, 1.0)
            };
            let dist = point.distance(a + seg * t);
            if dist < best.0 {
                best = (dist, index as f64 + t);
            }
        }
        RelativePosition::new(best.1, 0.0)
    }

    fn absolute_position(&self, relative: RelativePosition) -> Point {
        let segments = self.vertices.len() - 1;
        if segments == 0 {
            return self.start();
        }
        let clamped = relative.a.clamp(0.0, segments as f64);
        let index = (clamped.floor() as usize).min(segments - 1);
        let t = clamped - index as f64;
        self.vertices[index]
            .position
            .lerp(self.vertices[index + 1].position, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_points_are_glue_points() {
        let line = Polyline::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let points = line.control_points();
        assert_eq!(points.len(), 2);
        assert!(points[0].capabilities.contains(Capabilities::GLUE));
        assert!(points[1].capabilities.contains(Capabilities::GLUE));
        assert_eq!(points[1].id, END_POINT);
    }

    #[test]
    fn test_vertex_ids_never_reused() {
        let mut line = Polyline::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let a = line.insert_vertex(Point::new(30.0, 10.0));
        assert_eq!(a, ControlPointId(3));
        assert!(line.remove_vertex(a));
        let b = line.insert_vertex(Point::new(60.0, 10.0));
        assert_eq!(b, ControlPointId(4));
        // End point stays last
        assert_eq!(line.vertices().last().unwrap().id, END_POINT);
        assert!(!line.remove_vertex(START_POINT));
    }

    #[test]
    fn test_contains_point() {
        let line = Polyline::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ]);
        assert!(line.contains_point(Point::new(50.0, 3.0), 5.0));
        assert!(line.contains_point(Point::new(98.0, 50.0), 5.0));
        assert!(!line.contains_point(Point::new(50.0, 50.0), 5.0));
    }

    #[test]
    fn test_relative_position_on_second_segment() {
        let mut line = Polyline::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ]);
        let rel = line.relative_position(Point::new(102.0, 25.0));
        assert!((rel.a - 1.25).abs() < 1e-9);
        line.move_by(Vec2::new(10.0, 10.0));
        let p = line.absolute_position(rel);
        assert!((p.x - 110.0).abs() < 1e-9);
        assert!((p.y - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_length() {
        let line = Polyline::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < f64::EPSILON);
    }
}
