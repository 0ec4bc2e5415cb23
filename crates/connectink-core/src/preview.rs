//! Transient preview shapes shown while a gesture is in progress.
//!
//! Previews are geometry-only clones of diagram shapes with fresh ids. Each
//! preview is paired with its original in both directions. Selected previews
//! are recomputed from the untouched original on every update. Auxiliary
//! previews stand in for connectors glued to moving shapes and follow the
//! previews they are glued to.

use crate::connection::{ConnectionInfo, ConnectionTable};
use crate::diagram::Diagram;
use crate::input::ResizeModifiers;
use crate::shapes::{ControlPointId, Shape, ShapeId};
use kurbo::{Point, Rect};
use std::collections::{HashMap, HashSet, VecDeque};

/// Owns the previews of one gesture.
#[derive(Debug, Default)]
pub struct PreviewManager {
    /// Top-level previews in creation order.
    previews: Vec<Shape>,
    preview_by_original: HashMap<ShapeId, ShapeId>,
    original_by_preview: HashMap<ShapeId, ShapeId>,
    /// Originals whose previews follow the gesture directly.
    selected: Vec<ShapeId>,
    /// Originals whose previews follow their glue targets.
    auxiliary: Vec<ShapeId>,
    /// Connections between previews, or from previews to real shapes.
    connections: ConnectionTable,
    /// Last reported bounds per top-level preview.
    regions: HashMap<ShapeId, Rect>,
}

impl PreviewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }

    /// Number of registered original/preview pairs.
    pub fn len(&self) -> usize {
        self.preview_by_original.len()
    }

    /// Top-level previews, for drawing.
    pub fn previews(&self) -> &[Shape] {
        &self.previews
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    pub fn selected_originals(&self) -> &[ShapeId] {
        &self.selected
    }

    pub fn auxiliary_originals(&self) -> &[ShapeId] {
        &self.auxiliary
    }

    /// Union of all preview bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.previews
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    fn register(&mut self, original: &Shape) {
        let (preview, pairs) = original.clone_as_preview();
        for (original_id, preview_id) in pairs {
            self.preview_by_original.insert(original_id, preview_id);
            self.original_by_preview.insert(preview_id, original_id);
        }
        self.regions.insert(preview.id(), preview.bounds());
        self.previews.push(preview);
    }

    /// Create a preview for every selected shape and its children.
    pub fn create_previews(&mut self, diagram: &Diagram, selection: &[ShapeId]) {
        for &id in selection {
            if self.preview_by_original.contains_key(&id) {
                continue;
            }
            let Some(shape) = diagram.find_shape(id) else {
                log::warn!("Cannot preview missing shape {id}");
                continue;
            };
            self.register(shape);
            self.selected.push(id);
        }
        log::trace!("Created {} preview pairs", self.len());
    }

    /// Mirror the glue connections around the previewed shapes.
    ///
    /// Connectors glued to a previewed shape get an auxiliary preview, and so
    /// do connectors glued to those, until no new connector is found. A
    /// connector a previewed shape is glued onto gets one too when it is
    /// itself glued further, and so on along the chain. Every previewed glue
    /// point is then connected to the preview of its target, or to the real
    /// target when that has no preview.
    pub fn connect_preview_graph(&mut self, diagram: &Diagram) {
        let mut visited: HashSet<ShapeId> = self.preview_by_original.keys().copied().collect();
        let mut queue: VecDeque<ShapeId> = self
            .selected
            .iter()
            .filter_map(|id| diagram.find_shape(*id))
            .flat_map(|shape| std::iter::once(shape.id()).chain(shape.descendant_ids()))
            .collect();

        while let Some(target) = queue.pop_front() {
            for info in diagram.connections_to(target) {
                if !visited.insert(info.owner) {
                    continue;
                }
                let Some(owner) = diagram.find_shape(info.owner) else {
                    continue;
                };
                self.register(owner);
                self.auxiliary.push(info.owner);
                queue.push_back(info.owner);
            }
        }

        let mut targets: Vec<ShapeId> = self
            .preview_by_original
            .keys()
            .flat_map(|id| diagram.connection_infos(*id, ControlPointId::ANY))
            .map(|info| info.target)
            .collect();
        while let Some(target) = targets.pop() {
            if !visited.insert(target) {
                continue;
            }
            let Some(shape) = diagram.find_shape(target).filter(|shape| shape.is_linear()) else {
                continue;
            };
            let onward = diagram.connection_infos(target, ControlPointId::ANY);
            if onward.is_empty() {
                continue;
            }
            self.register(shape);
            self.auxiliary.push(target);
            targets.extend(onward.into_iter().map(|info| info.target));
        }

        let pairs: Vec<(ShapeId, ShapeId)> = self
            .preview_by_original
            .iter()
            .map(|(original, preview)| (*original, *preview))
            .collect();
        for (original, preview) in pairs {
            for info in diagram.connection_infos(original, ControlPointId::ANY) {
                let target = self
                    .preview_by_original
                    .get(&info.target)
                    .copied()
                    .unwrap_or(info.target);
                self.connections.connect(ConnectionInfo {
                    owner: preview,
                    target,
                    ..info
                });
            }
        }
        log::trace!(
            "Preview graph: {} auxiliary previews, {} connections",
            self.auxiliary.len(),
            self.connections.len()
        );
    }

    /// Recompute all previews from their originals.
    ///
    /// Selected previews are reset to the original geometry and handed to
    /// `transform`. Auxiliary previews are then reset and moved so their glue
    /// points sit on their targets. Returns the regions touched by the update:
    /// the previous and the new bounds of every preview.
    pub fn update(&mut self, diagram: &Diagram, mut transform: impl FnMut(ShapeId, &mut Shape)) -> Vec<Rect> {
        for preview in &mut self.previews {
            let Some(&original_id) = self.original_by_preview.get(&preview.id()) else {
                continue;
            };
            let Some(original) = diagram.find_shape(original_id) else {
                continue;
            };
            preview.assign_geometry(original);
            if self.selected.contains(&original_id) {
                transform(original_id, preview);
            }
        }

        for original in self.auxiliary.clone() {
            let Some(&preview_id) = self.preview_by_original.get(&original) else {
                continue;
            };
            for info in self.connections.connections_of(preview_id, ControlPointId::ANY) {
                let Some(position) = self.glue_target_position(diagram, &info) else {
                    continue;
                };
                if let Some(preview) = self.find_preview_mut(preview_id) {
                    preview.move_control_point_to(info.glue_point, position, ResizeModifiers::NONE);
                }
            }
        }

        let mut dirty = Vec::with_capacity(self.previews.len() * 2);
        for preview in &self.previews {
            let bounds = preview.bounds();
            if let Some(previous) = self.regions.insert(preview.id(), bounds) {
                dirty.push(previous);
            }
            dirty.push(bounds);
        }
        dirty
    }

    /// Position a preview glue point should take, looking up the target among
    /// the previews first.
    fn glue_target_position(&self, diagram: &Diagram, info: &ConnectionInfo) -> Option<Point> {
        let target = match self.find_preview(info.target) {
            Some(preview) => preview,
            None => diagram.find_shape(info.target)?,
        };
        info.position_on(target)
    }

    fn find_preview(&self, preview_id: ShapeId) -> Option<&Shape> {
        self.previews
            .iter()
            .find_map(|preview| preview.find_shape(preview_id))
    }

    fn find_preview_mut(&mut self, preview_id: ShapeId) -> Option<&mut Shape> {
        self.previews
            .iter_mut()
            .find_map(|preview| preview.find_shape_mut(preview_id))
    }

    /// Preview of `original`, if one exists.
    pub fn preview_of(&self, original: ShapeId) -> Option<&Shape> {
        let preview_id = self.preview_by_original.get(&original)?;
        self.find_preview(*preview_id)
    }

    /// Preview of `original`.
    ///
    /// # Panics
    ///
    /// Panics if no preview was created for `original`; callers only ask for
    /// shapes they previewed.
    pub fn find_preview_of(&self, original: ShapeId) -> &Shape {
        match self.preview_of(original) {
            Some(preview) => preview,
            None => panic!("no preview registered for shape {original}"),
        }
    }

    pub fn original_of(&self, preview: ShapeId) -> Option<ShapeId> {
        self.original_by_preview.get(&preview).copied()
    }

    /// Drop every preview and preview connection.
    ///
    /// Returns the last regions of the dropped previews. Calling it with no
    /// previews is a no-op.
    pub fn clear_previews(&mut self) -> Vec<Rect> {
        if self.previews.is_empty() && self.preview_by_original.is_empty() {
            return Vec::new();
        }
        let keys: Vec<_> = self
            .connections
            .iter()
            .map(|info| (info.owner, info.glue_point))
            .collect();
        for (owner, glue_point) in keys {
            self.connections.disconnect(owner, glue_point);
        }
        let regions: Vec<Rect> = self
            .previews
            .iter()
            .map(|preview| {
                let current = preview.bounds();
                self.regions
                    .get(&preview.id())
                    .map_or(current, |last| last.union(current))
            })
            .collect();
        self.previews.clear();
        self.preview_by_original.clear();
        self.original_by_preview.clear();
        self.selected.clear();
        self.auxiliary.clear();
        self.regions.clear();
        log::trace!("Cleared previews");
        regions
    }
}
