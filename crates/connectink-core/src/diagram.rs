//! Diagram: shape storage, spatial queries and the live connection table.

use crate::connection::{ConnectionError, ConnectionInfo, ConnectionTable, expand_selection};
use crate::input::ResizeModifiers;
use crate::shapes::{Capabilities, ControlPointId, Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// Identifier of a domain object linked to a shape.
pub type ModelObjectId = Uuid;

/// Domain object inserted together with a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: ModelObjectId,
    pub name: String,
}

impl ModelObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A diagram containing all shapes and their connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagram {
    /// Diagram name.
    pub name: String,
    /// Top-level shapes keyed by ID. Group children live inside their group.
    shapes: HashMap<ShapeId, Shape>,
    /// Z-order of top-level shapes (back to front).
    z_order: Vec<ShapeId>,
    #[serde(default)]
    connections: ConnectionTable,
    #[serde(default)]
    models: HashMap<ModelObjectId, ModelObject>,
    #[serde(default)]
    shape_models: HashMap<ShapeId, ModelObjectId>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagram {
    /// Create a new empty diagram.
    pub fn new() -> Self {
        Self {
            name: "Untitled".to_string(),
            shapes: HashMap::new(),
            z_order: Vec::new(),
            connections: ConnectionTable::new(),
            models: HashMap::new(),
            shape_models: HashMap::new(),
        }
    }

    /// Add a shape on top of the z-order.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        id
    }

    /// Remove a top-level shape together with every connection touching it
    /// or one of its children.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(&id)?;
        self.z_order.retain(|&shape_id| shape_id != id);
        for member in std::iter::once(id).chain(shape.descendant_ids()) {
            self.connections.remove_shape(member);
            self.shape_models.remove(&member);
        }
        Some(shape)
    }

    /// Get a top-level shape by ID.
    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Find a shape by ID, looking inside groups.
    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        if let Some(shape) = self.shapes.get(&id) {
            return Some(shape);
        }
        self.shapes.values().find_map(|shape| shape.find_shape(id))
    }

    pub fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        if self.shapes.contains_key(&id) {
            return self.shapes.get_mut(&id);
        }
        self.shapes.values_mut().find_map(|shape| shape.find_shape_mut(id))
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.find_shape(id).is_some()
    }

    /// Top-level shape containing `id` (which may be `id` itself).
    pub fn top_level_of(&self, id: ShapeId) -> Option<ShapeId> {
        if self.shapes.contains_key(&id) {
            return Some(id);
        }
        self.shapes
            .values()
            .find(|shape| shape.contains_descendant(id))
            .map(|shape| shape.id())
    }

    /// True when `a` and `b` are the same shape or one contains the other.
    pub fn is_related(&self, a: ShapeId, b: ShapeId) -> bool {
        if a == b {
            return true;
        }
        let contains = |outer: ShapeId, inner: ShapeId| {
            self.find_shape(outer)
                .is_some_and(|shape| shape.contains_descendant(inner))
        };
        contains(a, b) || contains(b, a)
    }

    /// Get top-level shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn z_order(&self) -> &[ShapeId] {
        &self.z_order
    }

    /// Every shape including group children, front to back.
    /// Children come before the group holding them.
    pub fn all_shapes(&self) -> Vec<&Shape> {
        fn push_front_to_back<'a>(shape: &'a Shape, out: &mut Vec<&'a Shape>) {
            for child in shape.children().iter().rev() {
                push_front_to_back(child, out);
            }
            out.push(shape);
        }
        let mut out = Vec::new();
        for id in self.z_order.iter().rev() {
            if let Some(shape) = self.shapes.get(id) {
                push_front_to_back(shape, &mut out);
            }
        }
        out
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .values()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Find top-level shapes at a point, front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|&id| {
                self.shapes
                    .get(&id)
                    .filter(|s| s.contains_point(point, tolerance))
                    .map(|_| id)
            })
            .collect()
    }

    /// Find top-level shapes lying entirely inside a rectangle.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .filter_map(|&id| {
                self.shapes
                    .get(&id)
                    .filter(|s| {
                        let bounds = s.bounds();
                        rect.contains(bounds.origin()) && rect.contains(Point::new(bounds.x1, bounds.y1))
                    })
                    .map(|_| id)
            })
            .collect()
    }

    /// Shapes near `point` exposing a control point with `capability`, nearest first.
    ///
    /// A shape qualifies when one of its capable points is within `range`, or,
    /// for `CONNECT`, when `point` is on its body and it has connectable points.
    /// Shapes matched through their body sort after point matches, in z-order.
    pub fn find_shapes_from_position(&self, point: Point, range: f64, capability: Capabilities) -> Vec<ShapeId> {
        let mut hits: Vec<(f64, ShapeId)> = Vec::new();
        for shape in self.all_shapes() {
            if !shape.bounds().inflate(range, range).contains(point)
                && !shape.control_points().iter().any(|p| p.position.distance(point) <= range)
            {
                continue;
            }
            let capable: Vec<_> = shape
                .control_points()
                .into_iter()
                .filter(|p| p.capabilities.intersects(capability))
                .collect();
            if capable.is_empty() {
                continue;
            }
            let nearest = capable
                .iter()
                .map(|p| p.position.distance(point))
                .fold(f64::INFINITY, f64::min);
            if nearest <= range {
                hits.push((nearest, shape.id()));
            } else if capability.intersects(Capabilities::CONNECT)
                && capable.iter().any(|p| p.capabilities.contains(Capabilities::CONNECT))
                && shape.contains_point(point, range)
            {
                hits.push((f64::INFINITY, shape.id()));
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    /// Nearest shape from [`Diagram::find_shapes_from_position`].
    pub fn find_shape_from_position(&self, point: Point, range: f64, capability: Capabilities) -> Option<ShapeId> {
        self.find_shapes_from_position(point, range, capability)
            .into_iter()
            .next()
    }

    /// Check that `info` describes an allowed connection.
    pub fn validate_connection(&self, info: &ConnectionInfo) -> Result<(), ConnectionError> {
        let owner = self
            .find_shape(info.owner)
            .ok_or(ConnectionError::ShapeNotFound(info.owner))?;
        let target = self
            .find_shape(info.target)
            .ok_or(ConnectionError::ShapeNotFound(info.target))?;
        if !info.glue_point.is_real() || !owner.has_control_point_capability(info.glue_point, Capabilities::GLUE) {
            return Err(ConnectionError::NotAGluePoint {
                shape: info.owner,
                point: info.glue_point,
            });
        }
        if info.target_point != ControlPointId::REFERENCE
            && !target.has_control_point_capability(info.target_point, Capabilities::CONNECT)
        {
            return Err(ConnectionError::NotConnectable {
                shape: info.target,
                point: info.target_point,
            });
        }
        if self.is_related(info.owner, info.target) {
            return Err(ConnectionError::Cycle {
                owner: info.owner,
                target: info.target,
            });
        }
        Ok(())
    }

    /// Attach a glue point, replacing its previous connection.
    ///
    /// Body connections without a stored relative position take the glue
    /// point's current position.
    pub fn connect(&mut self, mut info: ConnectionInfo) -> Result<Option<ConnectionInfo>, ConnectionError> {
        self.validate_connection(&info)?;
        if info.target_point == ControlPointId::REFERENCE && info.relative.is_none() {
            let glue = self
                .find_shape(info.owner)
                .and_then(|owner| owner.control_point_position(info.glue_point));
            let target = self.find_shape(info.target);
            if let (Some(glue), Some(target)) = (glue, target) {
                info.relative = Some(target.relative_position(glue));
            }
        }
        Ok(self.connections.connect(info))
    }

    pub fn disconnect(&mut self, owner: ShapeId, glue_point: ControlPointId) -> Option<ConnectionInfo> {
        self.connections.disconnect(owner, glue_point)
    }

    /// Connections owned by `owner` at `glue_point` (`ANY` for all).
    pub fn connection_infos(&self, owner: ShapeId, glue_point: ControlPointId) -> Vec<ConnectionInfo> {
        self.connections.connections_of(owner, glue_point)
    }

    pub fn connections_to(&self, target: ShapeId) -> Vec<ConnectionInfo> {
        self.connections.connections_to(target)
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Where the glue point of `info` belongs given the target's geometry.
    pub fn target_position(&self, info: &ConnectionInfo) -> Option<Point> {
        info.position_on(self.find_shape(info.target)?)
    }

    /// Put the glue points of `moved` shapes back onto targets that did not move.
    pub fn reseat_glue_points(&mut self, moved: &[ShapeId]) {
        let moved = expand_selection(self, moved);
        for &owner in &moved {
            for info in self.connections.connections_of(owner, ControlPointId::ANY) {
                if moved.contains(&info.target) {
                    continue;
                }
                let Some(position) = self.target_position(&info) else {
                    continue;
                };
                if let Some(shape) = self.find_shape_mut(owner) {
                    shape.move_control_point_to(info.glue_point, position, ResizeModifiers::NONE);
                }
            }
        }
    }

    /// Move connected glue points after `moved` shapes changed geometry.
    ///
    /// Connectors that follow are treated as moved too, so chains of
    /// connectors are updated. Each connector is visited once.
    pub fn follow_connections(&mut self, moved: &[ShapeId]) {
        let moved_set: HashSet<ShapeId> = expand_selection(self, moved).into_iter().collect();
        let mut visited = moved_set.clone();
        let mut queue: VecDeque<ShapeId> = moved_set.iter().copied().collect();

        while let Some(target) = queue.pop_front() {
            for info in self.connections.connections_to(target) {
                if moved_set.contains(&info.owner) {
                    continue;
                }
                let Some(position) = self.target_position(&info) else {
                    continue;
                };
                if let Some(owner) = self.find_shape_mut(info.owner) {
                    owner.move_control_point_to(info.glue_point, position, ResizeModifiers::NONE);
                }
                if visited.insert(info.owner) {
                    queue.push_back(info.owner);
                }
            }
        }
    }

    /// Register a model object and link it to a shape.
    pub fn attach_model(&mut self, shape: ShapeId, model: ModelObject) {
        self.shape_models.insert(shape, model.id);
        self.models.insert(model.id, model);
    }

    pub fn model_of(&self, shape: ShapeId) -> Option<&ModelObject> {
        self.shape_models
            .get(&shape)
            .and_then(|id| self.models.get(id))
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelObject> {
        self.models.values()
    }

    /// Check if the diagram is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get the number of top-level shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Serialize the diagram to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a diagram from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
