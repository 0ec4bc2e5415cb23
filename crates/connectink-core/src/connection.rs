//! Glue-point connections between shapes.
//!
//! A glue point (the end of a connector) attaches to exactly one point of a
//! target shape, or to the target's body when the target point is
//! [`ControlPointId::REFERENCE`].

use crate::diagram::Diagram;
use crate::preview::PreviewManager;
use crate::shapes::{Capabilities, ControlPointId, RelativePosition, Shape, ShapeId};
use crate::snap;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Reasons a connection is refused.
#[derive(Debug, Error, PartialEq)]
pub enum ConnectionError {
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("Point {point} of shape {shape} is not a glue point")]
    NotAGluePoint { shape: ShapeId, point: ControlPointId },
    #[error("Point {point} of shape {shape} does not accept connections")]
    NotConnectable { shape: ShapeId, point: ControlPointId },
    #[error("Shape {owner} cannot connect to itself or a related shape {target}")]
    Cycle { owner: ShapeId, target: ShapeId },
}

/// One glue point attached to one target point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub owner: ShapeId,
    pub glue_point: ControlPointId,
    pub target: ShapeId,
    pub target_point: ControlPointId,
    /// Attachment position on the target's body, for `REFERENCE` targets.
    #[serde(default)]
    pub relative: Option<RelativePosition>,
}

impl ConnectionInfo {
    pub fn new(owner: ShapeId, glue_point: ControlPointId, target: ShapeId, target_point: ControlPointId) -> Self {
        Self {
            owner,
            glue_point,
            target,
            target_point,
            relative: None,
        }
    }

    pub fn with_relative(mut self, relative: RelativePosition) -> Self {
        self.relative = Some(relative);
        self
    }

    /// Where the glue point belongs on `target`.
    pub fn position_on(&self, target: &Shape) -> Option<Point> {
        match (self.target_point, self.relative) {
            (ControlPointId::REFERENCE, Some(relative)) => Some(target.absolute_position(relative)),
            (point, _) => target.control_point_position(point),
        }
    }

    /// Same glue point attached to the same target point.
    pub fn same_link(&self, other: &ConnectionInfo) -> bool {
        self.owner == other.owner
            && self.glue_point == other.glue_point
            && self.target == other.target
            && self.target_point == other.target_point
    }
}

/// Table of active connections, keyed by glue point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ConnectionInfo>", into = "Vec<ConnectionInfo>")]
pub struct ConnectionTable {
    by_glue_point: HashMap<(ShapeId, ControlPointId), ConnectionInfo>,
}

impl From<Vec<ConnectionInfo>> for ConnectionTable {
    fn from(infos: Vec<ConnectionInfo>) -> Self {
        let mut table = Self::default();
        for info in infos {
            table.connect(info);
        }
        table
    }
}

impl From<ConnectionTable> for Vec<ConnectionInfo> {
    fn from(table: ConnectionTable) -> Self {
        table.by_glue_point.into_values().collect()
    }
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection, replacing whatever the glue point was attached to.
    /// Returns the replaced connection.
    pub fn connect(&mut self, info: ConnectionInfo) -> Option<ConnectionInfo> {
        self.by_glue_point.insert((info.owner, info.glue_point), info)
    }

    /// Remove the connection of a glue point, if any.
    pub fn disconnect(&mut self, owner: ShapeId, glue_point: ControlPointId) -> Option<ConnectionInfo> {
        self.by_glue_point.remove(&(owner, glue_point))
    }

    /// Connections owned by `owner`; `ControlPointId::ANY` matches every glue point.
    pub fn connections_of(&self, owner: ShapeId, glue_point: ControlPointId) -> Vec<ConnectionInfo> {
        if glue_point != ControlPointId::ANY {
            return self
                .by_glue_point
                .get(&(owner, glue_point))
                .cloned()
                .into_iter()
                .collect();
        }
        let mut infos: Vec<_> = self
            .by_glue_point
            .values()
            .filter(|info| info.owner == owner)
            .cloned()
            .collect();
        infos.sort_by_key(|info| info.glue_point);
        infos
    }

    /// Connections attached to `target`.
    pub fn connections_to(&self, target: ShapeId) -> Vec<ConnectionInfo> {
        let mut infos: Vec<_> = self
            .by_glue_point
            .values()
            .filter(|info| info.target == target)
            .cloned()
            .collect();
        infos.sort_by_key(|info| (info.owner, info.glue_point));
        infos
    }

    /// Drop every connection owned by or attached to `shape`.
    pub fn remove_shape(&mut self, shape: ShapeId) -> Vec<ConnectionInfo> {
        let keys: Vec<_> = self
            .by_glue_point
            .iter()
            .filter(|(_, info)| info.owner == shape || info.target == shape)
            .map(|(key, _)| *key)
            .collect();
        keys.into_iter()
            .filter_map(|key| self.by_glue_point.remove(&key))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionInfo> {
        self.by_glue_point.values()
    }

    pub fn clear(&mut self) {
        self.by_glue_point.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_glue_point.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_glue_point.len()
    }
}

/// Selected shapes together with all of their descendants, in selection order.
pub fn expand_selection(diagram: &Diagram, selection: &[ShapeId]) -> Vec<ShapeId> {
    let mut seen = HashSet::new();
    let mut expanded = Vec::new();
    for &id in selection {
        let Some(shape) = diagram.find_shape(id) else {
            continue;
        };
        for member in std::iter::once(id).chain(shape.descendant_ids()) {
            if seen.insert(member) {
                expanded.push(member);
            }
        }
    }
    expanded
}

/// Connections of selected shapes that will not survive the pending commit.
///
/// A connection to another selected shape always survives. A connection to
/// an unselected target breaks when the glue point's preview position has left
/// the target point (or the target's body for `REFERENCE`) by more than
/// `snap_distance`.
pub fn reconcile_before_commit(
    diagram: &Diagram,
    previews: &PreviewManager,
    selection: &[ShapeId],
    snap_distance: f64,
) -> Vec<ConnectionInfo> {
    let selected = expand_selection(diagram, selection);
    let selected_set: HashSet<_> = selected.iter().copied().collect();
    let mut broken = Vec::new();

    for &id in &selected {
        let Some(preview) = previews.preview_of(id) else {
            continue;
        };
        for info in diagram.connection_infos(id, ControlPointId::ANY) {
            if selected_set.contains(&info.target) {
                continue;
            }
            let (Some(glue), Some(target)) = (
                preview.control_point_position(info.glue_point),
                diagram.find_shape(info.target),
            ) else {
                continue;
            };
            let stays = if info.target_point == ControlPointId::REFERENCE {
                target.contains_point(glue, snap_distance)
            } else {
                target
                    .control_point_position(info.target_point)
                    .is_some_and(|p| p.distance(glue) <= snap_distance)
            };
            if !stays {
                log::debug!("Glue point {} of {} leaves {}", info.glue_point, id, info.target);
                broken.push(info);
            }
        }
    }
    broken
}

/// New connections for glue points of selected shapes that end up free.
///
/// Only unselected shapes are considered as targets. Glue points whose
/// connection is unaffected by the commit are left alone.
pub fn reconcile_after_commit(
    diagram: &Diagram,
    previews: &PreviewManager,
    selection: &[ShapeId],
    snap_distance: f64,
    disconnected: &[ConnectionInfo],
) -> Vec<ConnectionInfo> {
    let selected = expand_selection(diagram, selection);
    let exclude: HashSet<_> = selected.iter().copied().collect();
    let mut created = Vec::new();

    for &id in &selected {
        let Some(preview) = previews.preview_of(id) else {
            continue;
        };
        for glue_point in preview.control_point_ids(Capabilities::GLUE) {
            let was_disconnected = disconnected
                .iter()
                .any(|d| d.owner == id && d.glue_point == glue_point);
            if !was_disconnected && !diagram.connection_infos(id, glue_point).is_empty() {
                continue;
            }
            let Some(position) = preview.control_point_position(glue_point) else {
                continue;
            };
            let Some(found) =
                snap::nearest_point_snap(diagram, position, snap_distance, Capabilities::CONNECT, &exclude)
            else {
                continue;
            };
            if diagram.is_related(id, found.target) {
                continue;
            }
            let mut info = ConnectionInfo::new(id, glue_point, found.target, found.target_point);
            if found.target_point == ControlPointId::REFERENCE {
                if let Some(target) = diagram.find_shape(found.target) {
                    info.relative = Some(target.relative_position(position));
                }
            }
            log::debug!("Glue point {} of {} lands on {}", glue_point, id, found.target);
            created.push(info);
        }
    }
    created
}
