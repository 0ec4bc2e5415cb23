//! Rotatable box geometry shared by the planar shapes.

use super::{ControlPointId, RelativePosition, normalize_angle, tenths_to_radians};
use crate::input::ResizeModifiers;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest width or height a resize can produce.
pub const MIN_FRAME_SIZE: f64 = 1.0;
/// Distance of the rotate handle above the top edge.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Rotate a vector by `radians` around the origin.
pub fn rotate_vec(v: Vec2, radians: f64) -> Vec2 {
    let (sin, cos) = radians.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotate `point` around `pivot` by an angle in tenths of a degree.
pub fn rotate_point(point: Point, pivot: Point, angle: i32) -> Point {
    pivot + rotate_vec(point - pivot, tenths_to_radians(angle))
}

/// Which sides a resize handle drags: -1 left/top, 1 right/bottom, 0 neither.
fn handle_sides(id: ControlPointId) -> Option<(f64, f64)> {
    match id.0 {
        1 => Some((-1.0, -1.0)),
        2 => Some((0.0, -1.0)),
        3 => Some((1.0, -1.0)),
        4 => Some((-1.0, 0.0)),
        5 => Some((1.0, 0.0)),
        6 => Some((-1.0, 1.0)),
        7 => Some((0.0, 1.0)),
        8 => Some((1.0, 1.0)),
        _ => None,
    }
}

/// Center, size and rotation of a box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in tenths of a degree, always in `[0, 3600)`.
    pub angle: i32,
}

impl Frame {
    pub fn new(center: Point, width: f64, height: f64) -> Self {
        Self {
            center,
            width: width.max(MIN_FRAME_SIZE),
            height: height.max(MIN_FRAME_SIZE),
            angle: 0,
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.center(), rect.width(), rect.height())
    }

    pub fn radians(&self) -> f64 {
        tenths_to_radians(self.angle)
    }

    pub fn to_world(&self, local: Vec2) -> Point {
        self.center + rotate_vec(local, self.radians())
    }

    pub fn to_local(&self, point: Point) -> Vec2 {
        rotate_vec(point - self.center, -self.radians())
    }

    /// The four corners in world space, clockwise from top-left.
    pub fn corners(&self) -> [Point; 4] {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        [
            self.to_world(Vec2::new(-hw, -hh)),
            self.to_world(Vec2::new(hw, -hh)),
            self.to_world(Vec2::new(hw, hh)),
            self.to_world(Vec2::new(-hw, hh)),
        ]
    }

    /// Axis-aligned bounds of the rotated box.
    pub fn bounds(&self) -> Rect {
        let [first, rest @ ..] = self.corners();
        rest.iter()
            .fold(Rect::from_points(first, first), |acc, p| acc.union_pt(*p))
    }

    /// Local offset of a control point (1-10) from the center.
    pub fn point_offset(&self, id: ControlPointId) -> Option<Vec2> {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        if let Some((sx, sy)) = handle_sides(id) {
            return Some(Vec2::new(sx * hw, sy * hh));
        }
        match id.0 {
            9 => Some(Vec2::ZERO),
            10 => Some(Vec2::new(0.0, -hh - ROTATE_HANDLE_OFFSET)),
            _ => None,
        }
    }

    pub fn point_position(&self, id: ControlPointId) -> Option<Point> {
        self.point_offset(id).map(|offset| self.to_world(offset))
    }

    /// True when `point` lies inside the box grown by `tolerance`.
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.width / 2.0 + tolerance && local.y.abs() <= self.height / 2.0 + tolerance
    }

    /// Drag resize handle `id` by the world-space `delta`.
    ///
    /// Returns false if `id` is not a resize handle.
    pub fn resize(&mut self, id: ControlPointId, delta: Vec2, modifiers: ResizeModifiers) -> bool {
        let Some((sx, sy)) = handle_sides(id) else {
            return false;
        };
        let mirrored = modifiers.contains(ResizeModifiers::MIRRORED_RESIZE);
        let local = rotate_vec(delta, -self.radians());
        let factor = if mirrored { 2.0 } else { 1.0 };
        let mut width = self.width + sx * local.x * factor;
        let mut height = self.height + sy * local.y * factor;

        if modifiers.contains(ResizeModifiers::MAINTAIN_ASPECT) {
            let aspect = self.width / self.height;
            if sx == 0.0 {
                width = height * aspect;
            } else if sy == 0.0 {
                height = width / aspect;
            } else if (width / self.width - 1.0).abs() >= (height / self.height - 1.0).abs() {
                height = width / aspect;
            } else {
                width = height * aspect;
            }
        }
        let width = width.max(MIN_FRAME_SIZE);
        let height = height.max(MIN_FRAME_SIZE);

        // The opposite side stays put unless resizing around the center.
        if !mirrored {
            let shift = Vec2::new(sx * (width - self.width) / 2.0, sy * (height - self.height) / 2.0);
            self.center += rotate_vec(shift, self.radians());
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn rotate_by(&mut self, angle: i32, pivot: Point) {
        self.center = rotate_point(self.center, pivot, angle);
        self.angle = normalize_angle(self.angle + angle);
    }

    pub fn relative_position(&self, point: Point) -> RelativePosition {
        let local = self.to_local(point);
        RelativePosition::new(local.x / self.width, local.y / self.height)
    }

    pub fn absolute_position(&self, relative: RelativePosition) -> Point {
        self.to_world(Vec2::new(relative.a * self.width, relative.b * self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_resize_bottom_right_keeps_top_left() {
        let mut frame = Frame::from_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(frame.resize(ControlPointId(8), Vec2::new(20.0, 10.0), ResizeModifiers::NONE));
        let bounds = frame.bounds();
        assert!(approx(bounds.x0, 0.0) && approx(bounds.y0, 0.0));
        assert!(approx(bounds.x1, 120.0) && approx(bounds.y1, 60.0));
    }

    #[test]
    fn test_mirrored_resize_keeps_center() {
        let mut frame = Frame::from_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        frame.resize(ControlPointId(5), Vec2::new(10.0, 0.0), ResizeModifiers::MIRRORED_RESIZE);
        assert!(approx(frame.center.x, 50.0));
        assert!(approx(frame.width, 120.0));
        assert!(approx(frame.height, 50.0));
    }

    #[test]
    fn test_resize_maintain_aspect() {
        let mut frame = Frame::from_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        frame.resize(ControlPointId(8), Vec2::new(100.0, 0.0), ResizeModifiers::MAINTAIN_ASPECT);
        assert!(approx(frame.width, 200.0));
        assert!(approx(frame.height, 100.0));
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut frame = Frame::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        frame.resize(ControlPointId(5), Vec2::new(-50.0, 0.0), ResizeModifiers::NONE);
        assert!(approx(frame.width, MIN_FRAME_SIZE));
    }

    #[test]
    fn test_non_handle_is_rejected() {
        let mut frame = Frame::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!frame.resize(ControlPointId(9), Vec2::new(5.0, 5.0), ResizeModifiers::NONE));
        assert!(!frame.resize(ControlPointId(10), Vec2::new(5.0, 5.0), ResizeModifiers::NONE));
    }

    #[test]
    fn test_rotated_bounds_and_points() {
        let mut frame = Frame::from_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        frame.rotate_by(900, frame.center);
        let bounds = frame.bounds();
        assert!(approx(bounds.width(), 50.0));
        assert!(approx(bounds.height(), 100.0));
        // Top-left corner now sits at the top-right after a quarter turn clockwise.
        let tl = frame.point_position(ControlPointId(1)).unwrap();
        assert!(approx(tl.x, 75.0) && approx(tl.y, -25.0));
    }

    #[test]
    fn test_relative_position_survives_rotation() {
        let mut frame = Frame::from_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        let rel = frame.relative_position(Point::new(100.0, 25.0));
        assert!(approx(rel.a, 0.5) && approx(rel.b, 0.0));
        frame.rotate_by(900, frame.center);
        let p = frame.absolute_position(rel);
        assert!(approx(p.x, 50.0) && approx(p.y, 75.0));
    }

    #[test]
    fn test_rotation_wraps() {
        let mut frame = Frame::new(Point::ZERO, 10.0, 10.0);
        frame.rotate_by(-900, Point::ZERO);
        assert_eq!(frame.angle, 2700);
    }
}
