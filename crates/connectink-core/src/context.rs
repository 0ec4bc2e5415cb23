//! The interface the tools use to talk to their host.

use crate::command::{Command, CommandError};
use crate::config::EditorConfig;
use crate::diagram::Diagram;
use crate::selection::Selection;
use crate::shapes::ShapeId;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Operations the host may deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Moving, resizing and rotating shapes.
    Layout,
    /// Inserting new shapes.
    Insert,
    /// Connecting and disconnecting glue points.
    Connect,
    /// Editing shape data such as captions.
    ModifyData,
}

/// What a tool needs from the view it is attached to.
pub trait DisplayContext {
    fn diagram(&self) -> &Diagram;

    fn selection(&self) -> &Selection;

    fn selection_mut(&mut self) -> &mut Selection;

    fn settings(&self) -> &EditorConfig;

    /// Current zoom factor.
    fn zoom(&self) -> f64 {
        1.0
    }

    /// Whether `permission` is granted for all of `shapes`.
    /// An empty slice asks about the diagram as a whole.
    fn is_granted(&self, permission: Permission, shapes: &[ShapeId]) -> bool;

    fn execute(&mut self, command: Command) -> Result<(), CommandError>;

    /// Request a repaint of `region` in diagram coordinates.
    fn invalidate(&mut self, region: Rect);

    /// Open the inline caption editor for `shape`.
    fn begin_caption_edit(&mut self, shape: ShapeId);

    /// Grab radius of control points in diagram units.
    fn handle_radius(&self) -> f64 {
        self.settings().handle_radius / self.zoom()
    }

    /// Minimum pointer travel before a press turns into a drag, in diagram units.
    fn min_drag_distance(&self) -> f64 {
        self.settings().min_drag_distance / self.zoom()
    }

    /// Invalidate `region` grown by the handle radius.
    fn invalidate_with_handles(&mut self, region: Rect) {
        let margin = self.handle_radius();
        self.invalidate(region.inflate(margin, margin));
    }

    /// Invalidate the area of `shapes`, including their handles.
    fn invalidate_shapes(&mut self, shapes: &[ShapeId]) {
        let regions: Vec<Rect> = shapes
            .iter()
            .filter_map(|id| self.diagram().find_shape(*id))
            .map(|shape| {
                shape
                    .control_points()
                    .iter()
                    .fold(shape.bounds(), |acc, p| acc.union_pt(p.position))
            })
            .collect();
        for region in regions {
            self.invalidate_with_handles(region);
        }
    }
}
