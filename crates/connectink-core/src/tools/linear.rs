//! Linear creation tool: draws connectors and glues their ends.

use super::{GestureContext, Template, Tool, ToolAction, ToolKind};
use crate::command::{Command, CommandEmitter};
use crate::connection::ConnectionInfo;
use crate::context::{DisplayContext, Permission};
use crate::diagram::ModelObject;
use crate::input::{InputEvent, Key, KeyModifiers, MouseButton};
use crate::shapes::{END_POINT, Polyline, START_POINT, Shape};
use crate::snap::PointSnap;
use kurbo::Point;
use std::collections::HashSet;

/// Progress of the connector being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearState {
    #[default]
    Idle,
    /// Button held, the end follows the pointer.
    Dragging,
    /// Button released after a click; each click adds a vertex.
    Placing,
}

#[derive(Debug)]
pub struct LinearTool {
    template: Template,
    state: LinearState,
    gesture: Option<GestureContext>,
    preview: Option<Shape>,
    model: Option<ModelObject>,
    start_snap: Option<PointSnap>,
    end_snap: Option<PointSnap>,
}

impl LinearTool {
    pub fn new(template: Template) -> Self {
        if !template.is_linear() {
            log::warn!("Template '{}' is not linear, drawing plain connectors", template.name);
        }
        Self {
            template,
            state: LinearState::Idle,
            gesture: None,
            preview: None,
            model: None,
            start_snap: None,
            end_snap: None,
        }
    }

    pub fn state(&self) -> LinearState {
        self.state
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    fn set_state(&mut self, state: LinearState) {
        if self.state != state {
            log::debug!("Linear tool: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn mouse_down(
        &mut self,
        ctx: &mut dyn DisplayContext,
        position: Point,
        modifiers: KeyModifiers,
        clicks: u32,
    ) -> bool {
        match self.state {
            LinearState::Idle => {
                if !ctx.is_granted(Permission::Insert, &[]) {
                    log::debug!("Inserting connectors denied");
                    return true;
                }
                let gesture = GestureContext::begin(ctx, position, modifiers, clicks);
                let (start, snap) = gesture.snap_position(ctx, position, &HashSet::new());
                let (mut line, model) = self.template.instantiate();
                match line.as_polyline_mut() {
                    Some(polyline) => polyline.reset_vertices(start, start),
                    None => line = Shape::Polyline(Polyline::new(start, start)),
                }
                ctx.invalidate_with_handles(line.bounds());
                self.preview = Some(line);
                self.model = model;
                self.start_snap = snap;
                self.end_snap = None;
                self.gesture = Some(gesture);
                self.set_state(LinearState::Dragging);
            }
            LinearState::Placing => {
                self.move_end(ctx, position, modifiers);
                if clicks >= 2 {
                    self.finish_line(ctx);
                } else {
                    self.add_vertex(ctx);
                }
            }
            LinearState::Dragging => {}
        }
        true
    }

    fn mouse_move(&mut self, ctx: &mut dyn DisplayContext, position: Point, modifiers: KeyModifiers) -> bool {
        if self.state == LinearState::Idle {
            return false;
        }
        self.move_end(ctx, position, modifiers);
        true
    }

    fn mouse_up(&mut self, ctx: &mut dyn DisplayContext, position: Point, modifiers: KeyModifiers) -> bool {
        if self.state != LinearState::Dragging {
            return self.state == LinearState::Placing;
        }
        self.move_end(ctx, position, modifiers);
        let min_length = self.gesture.as_ref().map_or(0.0, |g| g.min_drag_distance);
        let dragged = self.gesture.as_ref().is_some_and(|g| g.dragging);
        let length = self.line().map_or(0.0, Polyline::length);
        if dragged && length > min_length {
            self.finish_line(ctx);
        } else {
            self.set_state(LinearState::Placing);
        }
        true
    }

    fn line(&self) -> Option<&Polyline> {
        self.preview.as_ref().and_then(Shape::as_polyline)
    }

    /// Move the end point to the snapped pointer position.
    fn move_end(&mut self, ctx: &mut dyn DisplayContext, position: Point, modifiers: KeyModifiers) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        gesture.update(position, modifiers);
        let (end, snap) = gesture.snap_position(ctx, position, &HashSet::new());
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        let before = preview.bounds();
        if let Some(line) = preview.as_polyline_mut() {
            line.set_vertex(END_POINT, end);
        }
        let after = preview.bounds();
        self.end_snap = snap;
        log::trace!("Connector end at {end:?}");
        ctx.invalidate_with_handles(before);
        ctx.invalidate_with_handles(after);
    }

    fn add_vertex(&mut self, ctx: &mut dyn DisplayContext) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        if let Some(line) = preview.as_polyline_mut() {
            let end = line.end();
            let id = line.insert_vertex(end);
            log::debug!("Placed vertex {id}");
        }
        ctx.invalidate_with_handles(preview.bounds());
    }

    /// Insert the connector together with the connections of its ends.
    fn finish_line(&mut self, ctx: &mut dyn DisplayContext) {
        let min_length = self.gesture.as_ref().map_or(0.0, |g| g.min_drag_distance);
        let start_snap = self.start_snap.take();
        let end_snap = self.end_snap.take();
        let model = self.model.take();
        self.gesture = None;
        self.set_state(LinearState::Idle);
        let Some(mut shape) = self.preview.take() else {
            return;
        };
        ctx.invalidate_with_handles(shape.bounds());

        if let Some(line) = shape.as_polyline_mut() {
            drop_trailing_vertex(line, min_length);
            if line.length() <= min_length {
                log::debug!("Connector too short, discarded");
                return;
            }
        }

        let id = shape.id();
        let mut connects = Vec::new();
        if ctx.is_granted(Permission::Connect, &[]) {
            for (glue_point, snap) in [(START_POINT, start_snap), (END_POINT, end_snap)] {
                if let Some(found) = snap {
                    connects.push(ConnectionInfo::new(id, glue_point, found.target, found.target_point));
                }
            }
        }

        let mut emitter = CommandEmitter::new("Create connector");
        match model {
            Some(model) => emitter.push(Command::InsertShapeAndModel { shape, model }),
            None => emitter.push(Command::InsertShape { shape }),
        }
        emitter.extend(connects.into_iter().map(Command::Connect));
        if emitter.emit(ctx) {
            ctx.selection_mut().select(id);
            ctx.invalidate_shapes(&[id]);
        }
    }
}

/// A double click places a vertex on top of the end point; drop it.
fn drop_trailing_vertex(line: &mut Polyline, tolerance: f64) {
    let vertices = line.vertices();
    if vertices.len() <= 2 {
        return;
    }
    let last_inner = vertices[vertices.len() - 2];
    if last_inner.position.distance(line.end()) <= tolerance {
        line.remove_vertex(last_inner.id);
    }
}

impl Tool for LinearTool {
    fn kind(&self) -> ToolKind {
        ToolKind::LinearCreation
    }

    fn action(&self) -> ToolAction {
        match self.state {
            LinearState::Idle => ToolAction::None,
            LinearState::Dragging | LinearState::Placing => ToolAction::MoveHandle,
        }
    }

    fn process_event(&mut self, ctx: &mut dyn DisplayContext, event: &InputEvent) -> bool {
        match *event {
            InputEvent::MouseDown {
                position,
                button: MouseButton::Left,
                modifiers,
                clicks,
            } => self.mouse_down(ctx, position, modifiers, clicks),
            InputEvent::MouseMove { position, modifiers } => self.mouse_move(ctx, position, modifiers),
            InputEvent::MouseUp {
                position,
                button: MouseButton::Left,
                modifiers,
            } => self.mouse_up(ctx, position, modifiers),
            InputEvent::KeyDown { key: Key::Enter, .. } if self.state != LinearState::Idle => {
                self.finish_line(ctx);
                true
            }
            InputEvent::KeyDown { key: Key::Escape, .. } | InputEvent::CaptureLost => {
                let busy = self.state != LinearState::Idle;
                self.cancel(ctx);
                busy
            }
            _ => false,
        }
    }

    fn cancel(&mut self, ctx: &mut dyn DisplayContext) {
        if self.state == LinearState::Idle && self.preview.is_none() {
            return;
        }
        if let Some(preview) = self.preview.take() {
            ctx.invalidate_with_handles(preview.bounds());
        }
        log::debug!("Connector creation cancelled");
        self.gesture = None;
        self.model = None;
        self.start_snap = None;
        self.end_snap = None;
        self.set_state(LinearState::Idle);
    }

    fn previews(&self) -> &[Shape] {
        self.preview.as_slice()
    }
}
