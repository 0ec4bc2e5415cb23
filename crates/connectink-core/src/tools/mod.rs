//! Tools: the state machines turning pointer and key input into commands.

mod linear;
mod planar;
mod pointer;
mod template;

pub use linear::{LinearState, LinearTool};
pub use planar::PlanarTool;
pub use pointer::PointerTool;
pub use template::Template;

use crate::context::DisplayContext;
use crate::input::{InputEvent, Key, KeyModifiers};
use crate::shapes::{Capabilities, ControlPointId, Shape, ShapeId};
use crate::snap::{self, PointSnap, SnapMode};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Pointer,
    LinearCreation,
    PlanarCreation,
}

/// What the current gesture is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolAction {
    #[default]
    None,
    Select,
    SelectWithFrame,
    EditCaption,
    MoveShape,
    MoveHandle,
    Rotate,
}

/// State of one gesture, from mouse-down to commit or cancel.
///
/// Settings are captured when the gesture starts and stay fixed until it ends.
#[derive(Debug, Clone)]
pub struct GestureContext {
    pub start: Point,
    pub current: Point,
    /// Modifiers held at the latest event.
    pub modifiers: KeyModifiers,
    pub clicks: u32,
    pub grid_size: f64,
    pub snap_distance: f64,
    pub snap_mode: SnapMode,
    pub min_drag_distance: f64,
    pub handle_radius: f64,
    /// Rotation snapping step in tenths of a degree.
    pub rotate_snap_step: i32,
    /// Whether the pointer has travelled past the drag threshold.
    pub dragging: bool,
    /// Top-level shape under the cursor at mouse-down.
    pub hit_shape: Option<ShapeId>,
    /// Control point of a selected shape under the cursor at mouse-down.
    pub handle: Option<(ShapeId, ControlPointId)>,
    /// Snapped displacement of the last update.
    pub offset: Vec2,
    /// Snapped rotation of the last update, in tenths of a degree.
    pub angle: i32,
    /// Connection point the dragged glue point currently rests on.
    pub point_snap: Option<PointSnap>,
}

impl GestureContext {
    pub fn begin(ctx: &dyn DisplayContext, position: Point, modifiers: KeyModifiers, clicks: u32) -> Self {
        let settings = ctx.settings();
        Self {
            start: position,
            current: position,
            modifiers,
            clicks,
            grid_size: settings.grid_size,
            snap_distance: settings.snap_distance,
            snap_mode: settings.snap_mode(),
            min_drag_distance: ctx.min_drag_distance(),
            handle_radius: ctx.handle_radius(),
            rotate_snap_step: settings.rotate_snap_step,
            dragging: false,
            hit_shape: None,
            handle: None,
            offset: Vec2::ZERO,
            angle: 0,
            point_snap: None,
        }
    }

    /// Record a new pointer position. Returns true once the drag threshold is passed.
    pub fn update(&mut self, position: Point, modifiers: KeyModifiers) -> bool {
        self.current = position;
        self.modifiers = modifiers;
        if !self.dragging && position.distance(self.start) > self.min_drag_distance {
            self.dragging = true;
        }
        self.dragging
    }

    /// Raw pointer displacement since mouse-down.
    pub fn displacement(&self) -> Vec2 {
        self.current - self.start
    }

    /// Rectangle spanned by the start and current positions.
    pub fn frame(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }

    /// Snap a free position: connection points first, then the grid.
    pub fn snap_position(
        &self,
        ctx: &dyn DisplayContext,
        position: Point,
        exclude: &HashSet<ShapeId>,
    ) -> (Point, Option<PointSnap>) {
        if self.snap_mode.snaps_to_points() {
            if let Some(found) = snap::nearest_point_snap(
                ctx.diagram(),
                position,
                self.snap_distance,
                Capabilities::CONNECT,
                exclude,
            ) {
                return (position + found.delta, Some(found));
            }
        }
        (self.snap_to_grid(position), None)
    }

    pub fn snap_to_grid(&self, position: Point) -> Point {
        if self.snap_mode.snaps_to_grid() {
            position + snap::nearest_grid_snap(position, self.grid_size, self.snap_distance)
        } else {
            position
        }
    }
}

/// Common surface of the tools.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn action(&self) -> ToolAction;

    /// Handle one input event. Returns true if the event was consumed.
    fn process_event(&mut self, ctx: &mut dyn DisplayContext, event: &InputEvent) -> bool;

    /// Abort the current gesture without touching the diagram.
    fn cancel(&mut self, ctx: &mut dyn DisplayContext);

    /// Shapes to draw on top of the diagram while a gesture runs.
    fn previews(&self) -> &[Shape];
}

pub(crate) fn invalidate_regions(ctx: &mut dyn DisplayContext, regions: impl IntoIterator<Item = Rect>) {
    for region in regions {
        ctx.invalidate_with_handles(region);
    }
}

/// The tool currently driving input.
#[derive(Debug)]
pub enum ActiveTool {
    Pointer(PointerTool),
    LinearCreation(LinearTool),
    PlanarCreation(PlanarTool),
}

impl ActiveTool {
    fn as_tool(&self) -> &dyn Tool {
        match self {
            ActiveTool::Pointer(t) => t,
            ActiveTool::LinearCreation(t) => t,
            ActiveTool::PlanarCreation(t) => t,
        }
    }

    fn as_tool_mut(&mut self) -> &mut dyn Tool {
        match self {
            ActiveTool::Pointer(t) => t,
            ActiveTool::LinearCreation(t) => t,
            ActiveTool::PlanarCreation(t) => t,
        }
    }
}

/// Owns the active tool and routes input to it.
#[derive(Debug)]
pub struct ToolManager {
    active: ActiveTool,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            active: ActiveTool::Pointer(PointerTool::new()),
        }
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> ToolKind {
        self.active.as_tool().kind()
    }

    pub fn action(&self) -> ToolAction {
        self.active.as_tool().action()
    }

    pub fn previews(&self) -> &[Shape] {
        self.active.as_tool().previews()
    }

    pub fn active(&self) -> &ActiveTool {
        &self.active
    }

    /// Switch tools, cancelling any gesture of the previous one.
    pub fn set_tool(&mut self, ctx: &mut dyn DisplayContext, tool: ActiveTool) {
        self.cancel(ctx);
        self.active = tool;
        log::debug!("Switched to {:?} tool", self.kind());
    }

    pub fn use_pointer(&mut self, ctx: &mut dyn DisplayContext) {
        self.set_tool(ctx, ActiveTool::Pointer(PointerTool::new()));
    }

    pub fn use_linear(&mut self, ctx: &mut dyn DisplayContext, template: Template) {
        self.set_tool(ctx, ActiveTool::LinearCreation(LinearTool::new(template)));
    }

    pub fn use_planar(&mut self, ctx: &mut dyn DisplayContext, template: Template) {
        self.set_tool(ctx, ActiveTool::PlanarCreation(PlanarTool::new(template)));
    }

    /// Route an event to the active tool. Escape and capture loss cancel.
    pub fn process_event(&mut self, ctx: &mut dyn DisplayContext, event: &InputEvent) -> bool {
        match event {
            InputEvent::CaptureLost
            | InputEvent::KeyDown {
                key: Key::Escape, ..
            } => {
                let busy = self.action() != ToolAction::None || !self.previews().is_empty();
                self.cancel(ctx);
                busy
            }
            _ => self.active.as_tool_mut().process_event(ctx, event),
        }
    }

    pub fn cancel(&mut self, ctx: &mut dyn DisplayContext) {
        self.active.as_tool_mut().cancel(ctx);
    }
}
