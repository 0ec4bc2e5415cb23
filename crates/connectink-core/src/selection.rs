//! Selection set and control point hit-testing.

use crate::diagram::Diagram;
use crate::shapes::{Capabilities, ControlPointId, Shape, ShapeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Ordered set of selected top-level shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single shape.
    pub fn select(&mut self, id: ShapeId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Add a shape. Returns false if it was already selected.
    pub fn add(&mut self, id: ShapeId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: ShapeId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|s| *s != id);
        self.ids.len() != before
    }

    /// Flip membership of `id`. Returns true if it is selected afterwards.
    pub fn toggle(&mut self, id: ShapeId) -> bool {
        if self.remove(id) {
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn set(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.ids.clear();
        for id in ids {
            self.add(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop ids that no longer exist in `diagram`.
    pub fn retain_existing(&mut self, diagram: &Diagram) {
        self.ids.retain(|id| diagram.contains(*id));
    }
}

/// Nearest control point of `shape` within `radius` of `point` that has any
/// of the capabilities in `filter`. An empty filter accepts every point.
pub fn hit_test_control_points(
    shape: &Shape,
    point: Point,
    radius: f64,
    filter: Capabilities,
) -> Option<ControlPointId> {
    shape
        .control_points()
        .into_iter()
        .filter(|cp| filter.is_empty() || cp.capabilities.intersects(filter))
        .map(|cp| (cp.id, cp.position.distance(point)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Control point of a selected shape under `point`, topmost selection entry first.
pub fn handle_at(
    diagram: &Diagram,
    selection: &Selection,
    point: Point,
    radius: f64,
    filter: Capabilities,
) -> Option<(ShapeId, ControlPointId)> {
    selection.ids().iter().rev().find_map(|&id| {
        let shape = diagram.find_shape(id)?;
        hit_test_control_points(shape, point, radius, filter).map(|cp| (id, cp))
    })
}
