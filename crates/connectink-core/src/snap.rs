//! Snap functionality for aligning points to the grid and to connection points.

use crate::diagram::Diagram;
use crate::shapes::{Capabilities, ControlPointId, Shape, ShapeId};
use kurbo::{Point, Vec2};
use std::collections::HashSet;

/// Default grid size (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Which snapping is active for a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapMode {
    /// No snapping.
    #[default]
    None,
    /// Snap to grid lines and intersections.
    Grid,
    /// Snap to connection points of other shapes.
    Points,
    /// Point snapping first, grid otherwise.
    All,
}

impl SnapMode {
    pub fn from_flags(grid: bool, points: bool) -> Self {
        match (grid, points) {
            (false, false) => SnapMode::None,
            (true, false) => SnapMode::Grid,
            (false, true) => SnapMode::Points,
            (true, true) => SnapMode::All,
        }
    }

    /// Check if grid snapping is enabled.
    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    /// Check if point snapping is enabled.
    pub fn snaps_to_points(self) -> bool {
        matches!(self, SnapMode::Points | SnapMode::All)
    }
}

/// A control point found within snap distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSnap {
    pub target: ShapeId,
    /// The target's point, or `REFERENCE` when snapping onto its body.
    pub target_point: ControlPointId,
    /// Displacement that moves the snapped point onto the target point.
    pub delta: Vec2,
    pub distance: f64,
}

/// Displacement that snaps `point` to the grid, or zero when nothing is in reach.
///
/// Each axis snaps to its nearest grid line when that line is within
/// `snap_distance`. A grid intersection is taken only when it is strictly
/// closer than every line that qualified; on ties the per-axis snap wins.
pub fn nearest_grid_snap(point: Point, grid_size: f64, snap_distance: f64) -> Vec2 {
    if grid_size <= 0.0 {
        return Vec2::ZERO;
    }
    let nearest_line = |value: f64| {
        let below = (value / grid_size).floor() * grid_size;
        let above = below + grid_size;
        if value - below <= above - value {
            below - value
        } else {
            above - value
        }
    };
    let dx = nearest_line(point.x);
    let dy = nearest_line(point.y);

    let line_x = (dx.abs() <= snap_distance).then_some(dx);
    let line_y = (dy.abs() <= snap_distance).then_some(dy);
    let line_snap = Vec2::new(line_x.unwrap_or(0.0), line_y.unwrap_or(0.0));

    let grid_point = Vec2::new(dx, dy);
    let point_distance = grid_point.hypot();
    if point_distance <= snap_distance {
        let closest_line = [line_x, line_y]
            .into_iter()
            .flatten()
            .map(f64::abs)
            .fold(f64::INFINITY, f64::min);
        if point_distance < closest_line {
            return grid_point;
        }
    }
    line_snap
}

/// Snap an angle in tenths of a degree to a multiple of `step`.
pub fn snap_angle(angle: i32, step: i32) -> i32 {
    if step <= 0 {
        return angle;
    }
    (f64::from(angle) / f64::from(step)).round() as i32 * step
}

/// Nearest control point with `capability` within `snap_distance` of `position`.
///
/// Shapes in `exclude` are skipped. When no point is in reach but `position`
/// lies on the body of a connectable shape, the snap falls back to that
/// shape's `REFERENCE` with a zero displacement.
pub fn nearest_point_snap(
    diagram: &Diagram,
    position: Point,
    snap_distance: f64,
    capability: Capabilities,
    exclude: &HashSet<ShapeId>,
) -> Option<PointSnap> {
    let candidates: Vec<ShapeId> = diagram
        .find_shapes_from_position(position, snap_distance, capability)
        .into_iter()
        .filter(|id| !exclude.contains(id))
        .collect();

    let mut best: Option<PointSnap> = None;
    for &id in &candidates {
        let Some(shape) = diagram.find_shape(id) else {
            continue;
        };
        for point in shape.control_points() {
            if !point.capabilities.intersects(capability) {
                continue;
            }
            let distance = point.position.distance(position);
            if distance <= snap_distance && best.is_none_or(|b| distance < b.distance) {
                best = Some(PointSnap {
                    target: id,
                    target_point: point.id,
                    delta: point.position - position,
                    distance,
                });
            }
        }
    }
    if best.is_some() || !capability.intersects(Capabilities::CONNECT) {
        return best;
    }

    candidates.into_iter().find_map(|id| {
        let shape = diagram.find_shape(id)?;
        shape.contains_point(position, 0.0).then_some(PointSnap {
            target: id,
            target_point: ControlPointId::REFERENCE,
            delta: Vec2::ZERO,
            distance: 0.0,
        })
    })
}

/// Snap for control point `point_id` of `shape` displaced by `offset`.
///
/// `shape` itself is never a target.
pub fn nearest_control_point_snap(
    diagram: &Diagram,
    shape: &Shape,
    point_id: ControlPointId,
    offset: Vec2,
    snap_distance: f64,
    capability: Capabilities,
    exclude: &HashSet<ShapeId>,
) -> Option<PointSnap> {
    let position = shape.control_point_position(point_id)? + offset;
    let mut exclude = exclude.clone();
    exclude.insert(shape.id());
    nearest_point_snap(diagram, position, snap_distance, capability, &exclude)
}
