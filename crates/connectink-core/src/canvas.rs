//! Reference host: owns the diagram, history and view, and routes input to the tools.

use crate::camera::Camera;
use crate::command::{Command, CommandError};
use crate::config::EditorConfig;
use crate::context::{DisplayContext, Permission};
use crate::diagram::Diagram;
use crate::input::InputEvent;
use crate::selection::Selection;
use crate::shapes::ShapeId;
use crate::tools::{Template, ToolKind, ToolManager};
use kurbo::{Rect, Size};
use std::collections::{HashMap, HashSet};

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Permissions withheld by the host, globally or per shape.
#[derive(Debug, Clone, Default)]
pub struct SecurityPolicy {
    denied: HashSet<Permission>,
    denied_shapes: HashMap<ShapeId, HashSet<Permission>>,
}

impl SecurityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny `permission` everywhere.
    pub fn deny(&mut self, permission: Permission) {
        self.denied.insert(permission);
    }

    /// Deny `permission` for one shape.
    pub fn deny_for(&mut self, shape: ShapeId, permission: Permission) {
        self.denied_shapes.entry(shape).or_default().insert(permission);
    }

    /// Lift a global and all per-shape denials of `permission`.
    pub fn allow(&mut self, permission: Permission) {
        self.denied.remove(&permission);
        for denied in self.denied_shapes.values_mut() {
            denied.remove(&permission);
        }
    }

    pub fn is_granted(&self, permission: Permission, shapes: &[ShapeId]) -> bool {
        if self.denied.contains(&permission) {
            return false;
        }
        !shapes.iter().any(|id| {
            self.denied_shapes
                .get(id)
                .is_some_and(|denied| denied.contains(&permission))
        })
    }
}

/// Editing session state (not persisted).
#[derive(Debug)]
pub struct Canvas {
    pub diagram: Diagram,
    pub camera: Camera,
    pub selection: Selection,
    pub config: EditorConfig,
    pub security: SecurityPolicy,
    pub tools: ToolManager,
    /// Viewport size in screen pixels.
    pub viewport_size: Size,
    undo_stack: Vec<Diagram>,
    redo_stack: Vec<Diagram>,
    executed: Vec<Command>,
    invalidated: Vec<Rect>,
    caption_edit: Option<ShapeId>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a canvas with an empty diagram.
    pub fn new() -> Self {
        Self::with_diagram(Diagram::new())
    }

    pub fn with_diagram(diagram: Diagram) -> Self {
        Self {
            diagram,
            camera: Camera::new(),
            selection: Selection::new(),
            config: EditorConfig::default(),
            security: SecurityPolicy::new(),
            tools: ToolManager::new(),
            viewport_size: Size::new(800.0, 600.0),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            executed: Vec::new(),
            invalidated: Vec::new(),
            caption_edit: None,
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Feed one input event to the active tool.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let mut tools = std::mem::take(&mut self.tools);
        let consumed = tools.process_event(self, event);
        self.tools = tools;
        consumed
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.kind()
    }

    pub fn use_pointer(&mut self) {
        let mut tools = std::mem::take(&mut self.tools);
        tools.use_pointer(self);
        self.tools = tools;
    }

    pub fn use_linear(&mut self, template: Template) {
        let mut tools = std::mem::take(&mut self.tools);
        tools.use_linear(self, template);
        self.tools = tools;
    }

    pub fn use_planar(&mut self, template: Template) {
        let mut tools = std::mem::take(&mut self.tools);
        tools.use_planar(self, template);
        self.tools = tools;
    }

    /// Abort the active gesture.
    pub fn cancel(&mut self) {
        let mut tools = std::mem::take(&mut self.tools);
        tools.cancel(self);
        self.tools = tools;
    }

    /// Undo the last command.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.diagram, previous);
        self.redo_stack.push(current);
        self.selection.retain_existing(&self.diagram);
        self.invalidate_all();
        true
    }

    /// Redo the last undone command.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.diagram, next);
        self.undo_stack.push(current);
        self.selection.retain_existing(&self.diagram);
        self.invalidate_all();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Commands executed so far, oldest first.
    pub fn executed(&self) -> &[Command] {
        &self.executed
    }

    /// Drain the regions requested for repaint.
    pub fn take_invalidated(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.invalidated)
    }

    /// Shape whose caption is being edited.
    pub fn caption_edit(&self) -> Option<ShapeId> {
        self.caption_edit
    }

    pub fn end_caption_edit(&mut self) {
        self.caption_edit = None;
    }

    fn invalidate_all(&mut self) {
        let visible = self.camera.visible_rect(self.viewport_size);
        self.invalidated.push(visible);
    }
}

impl DisplayContext for Canvas {
    fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    fn selection(&self) -> &Selection {
        &self.selection
    }

    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn settings(&self) -> &EditorConfig {
        &self.config
    }

    fn zoom(&self) -> f64 {
        self.camera.zoom
    }

    fn is_granted(&self, permission: Permission, shapes: &[ShapeId]) -> bool {
        self.security.is_granted(permission, shapes)
    }

    fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        let snapshot = self.diagram.clone();
        if let Err(e) = command.apply(&mut self.diagram) {
            log::warn!("Command '{}' failed, restoring diagram: {e}", command.description());
            self.diagram = snapshot;
            return Err(e);
        }
        log::info!("Executed '{}'", command.description());
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        self.executed.push(command);
        Ok(())
    }

    fn invalidate(&mut self, region: Rect) {
        self.invalidated.push(region);
    }

    fn begin_caption_edit(&mut self, shape: ShapeId) {
        log::debug!("Editing caption of {shape}");
        self.caption_edit = Some(shape);
    }
}
