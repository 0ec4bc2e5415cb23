//! Pointer tool: selection, moving, resizing, rotating and caption editing.

use super::{GestureContext, Tool, ToolAction, ToolKind, invalidate_regions};
use crate::command::{Command, CommandEmitter};
use crate::connection::{self, expand_selection};
use crate::context::{DisplayContext, Permission};
use crate::diagram::Diagram;
use crate::input::{InputEvent, Key, KeyModifiers, MouseButton, ResizeModifiers};
use crate::preview::PreviewManager;
use crate::selection;
use crate::shapes::{Capabilities, ControlPointId, END_POINT, START_POINT, Shape, ShapeId, normalize_angle};
use crate::snap::{self, PointSnap};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;

/// Quick rotation step in tenths of a degree.
const QUARTER_TURN: i32 = 900;

/// Capabilities that make a control point draggable.
const HANDLE_CAPABILITIES: Capabilities = Capabilities::RESIZE
    .union(Capabilities::ROTATE)
    .union(Capabilities::GLUE);

fn is_zero(offset: Vec2) -> bool {
    offset.hypot2() < f64::EPSILON
}

/// The selection tool.
#[derive(Debug, Default)]
pub struct PointerTool {
    action: ToolAction,
    gesture: Option<GestureContext>,
    previews: PreviewManager,
    /// Last drawn rubber-band frame.
    frame: Option<Rect>,
}

impl PointerTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> Option<&GestureContext> {
        self.gesture.as_ref()
    }

    /// Rubber-band frame while selecting with a frame.
    pub fn selection_frame(&self) -> Option<Rect> {
        self.frame
    }

    pub fn preview_manager(&self) -> &PreviewManager {
        &self.previews
    }

    fn set_action(&mut self, action: ToolAction) {
        if self.action != action {
            log::debug!("Pointer: {:?} -> {:?}", self.action, action);
            self.action = action;
        }
    }

    fn mouse_down(
        &mut self,
        ctx: &mut dyn DisplayContext,
        position: Point,
        modifiers: KeyModifiers,
        clicks: u32,
    ) -> bool {
        if self.gesture.is_some() {
            return true;
        }
        let mut gesture = GestureContext::begin(ctx, position, modifiers, clicks);
        gesture.handle = selection::handle_at(
            ctx.diagram(),
            ctx.selection(),
            position,
            gesture.handle_radius,
            HANDLE_CAPABILITIES,
        );

        // Any rotate-capable point qualifies, not only the rotate handle.
        if clicks >= 2 && self.quick_rotate(ctx, &gesture) {
            return true;
        }

        let mut action = ToolAction::Select;
        if gesture.handle.is_none() {
            if let Some(shape) = caption_hit(ctx, position) {
                gesture.hit_shape = Some(shape);
                action = ToolAction::EditCaption;
            } else {
                gesture.hit_shape = ctx
                    .diagram()
                    .shapes_at_point(position, gesture.handle_radius / 2.0)
                    .first()
                    .copied();
            }
        }
        self.gesture = Some(gesture);
        self.set_action(action);
        true
    }

    /// Rotate the selection by quarter turns on a multi-click on a rotate handle.
    fn quick_rotate(&mut self, ctx: &mut dyn DisplayContext, gesture: &GestureContext) -> bool {
        if !ctx.settings().quick_rotate {
            return false;
        }
        let Some((owner, point)) = gesture.handle else {
            return false;
        };
        let rotatable = ctx
            .diagram()
            .find_shape(owner)
            .is_some_and(|shape| shape.has_control_point_capability(point, Capabilities::ROTATE));
        if !rotatable {
            return false;
        }
        let shapes = ctx.selection().ids().to_vec();
        if !ctx.is_granted(Permission::Layout, &shapes) {
            log::debug!("Quick rotate denied");
            return true;
        }
        let turns = i32::try_from(gesture.clicks.saturating_sub(1)).unwrap_or(0);
        let mut emitter = CommandEmitter::new("Rotate shapes");
        emitter.push(Command::RotateShapes {
            shapes: shapes.clone(),
            angle: QUARTER_TURN * turns,
        });
        ctx.invalidate_shapes(&shapes);
        emitter.emit(ctx);
        ctx.invalidate_shapes(&shapes);
        true
    }

    fn mouse_move(&mut self, ctx: &mut dyn DisplayContext, position: Point, modifiers: KeyModifiers) -> bool {
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        if !gesture.update(position, modifiers) {
            return true;
        }
        match self.action {
            ToolAction::Select => self.begin_drag(ctx),
            ToolAction::EditCaption => self.begin_move(ctx),
            _ => {}
        }
        self.update_drag(ctx);
        true
    }

    /// Decide what a drag starting in `Select` does.
    fn begin_drag(&mut self, ctx: &mut dyn DisplayContext) {
        let Some((handle, hit_shape, control)) = self
            .gesture
            .as_ref()
            .map(|g| (g.handle, g.hit_shape, g.modifiers.control()))
        else {
            return;
        };

        if let Some((owner, point)) = handle {
            let rotates = ctx
                .diagram()
                .find_shape(owner)
                .is_some_and(|shape| shape.has_control_point_capability(point, Capabilities::ROTATE));
            if rotates {
                self.begin_rotate(ctx);
            } else {
                self.begin_move_handle(ctx, point);
            }
            return;
        }

        match hit_shape {
            Some(id) => {
                if !ctx.selection().contains(id) {
                    let before = ctx.selection().ids().to_vec();
                    if control {
                        ctx.selection_mut().add(id);
                    } else {
                        ctx.selection_mut().select(id);
                    }
                    ctx.invalidate_shapes(&before);
                    ctx.invalidate_shapes(&[id]);
                }
                self.begin_move(ctx);
            }
            None => self.set_action(ToolAction::SelectWithFrame),
        }
    }

    /// Previews for the selection and everything glued to it.
    fn create_previews(&mut self, ctx: &dyn DisplayContext, shapes: &[ShapeId]) {
        self.previews.create_previews(ctx.diagram(), shapes);
        self.previews.connect_preview_graph(ctx.diagram());
    }

    fn begin_move(&mut self, ctx: &mut dyn DisplayContext) {
        let shapes = ctx.selection().ids().to_vec();
        if shapes.is_empty() || !ctx.is_granted(Permission::Layout, &shapes) {
            log::debug!("Moving {} shapes denied", shapes.len());
            self.set_action(ToolAction::None);
            return;
        }
        self.create_previews(ctx, &shapes);
        self.set_action(ToolAction::MoveShape);
    }

    fn begin_move_handle(&mut self, ctx: &mut dyn DisplayContext, point: ControlPointId) {
        let shapes = ctx.selection().ids().to_vec();
        if !ctx.is_granted(Permission::Layout, &shapes) {
            log::debug!("Moving control point {point} denied");
            self.set_action(ToolAction::None);
            return;
        }
        if !handle_move_allowed(ctx.diagram(), &shapes, point) {
            log::debug!("Control point {point} cannot be moved for this selection");
            self.set_action(ToolAction::None);
            return;
        }
        self.create_previews(ctx, &shapes);
        self.set_action(ToolAction::MoveHandle);
    }

    fn begin_rotate(&mut self, ctx: &mut dyn DisplayContext) {
        let shapes = ctx.selection().ids().to_vec();
        if !ctx.is_granted(Permission::Layout, &shapes) {
            log::debug!("Rotating {} shapes denied", shapes.len());
            self.set_action(ToolAction::None);
            return;
        }
        if !share_shape_type(ctx.diagram(), &shapes) {
            log::debug!("Shapes of different types cannot be rotated together");
            self.set_action(ToolAction::None);
            return;
        }
        self.create_previews(ctx, &shapes);
        self.set_action(ToolAction::Rotate);
    }

    fn update_drag(&mut self, ctx: &mut dyn DisplayContext) {
        match self.action {
            ToolAction::MoveShape => self.update_move(ctx),
            ToolAction::MoveHandle => self.update_handle(ctx),
            ToolAction::Rotate => self.update_rotate(ctx),
            ToolAction::SelectWithFrame => self.update_frame(ctx),
            _ => {}
        }
    }

    fn update_move(&mut self, ctx: &mut dyn DisplayContext) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        let (offset, point_snap) = move_snap(ctx.diagram(), ctx.selection().ids(), gesture);
        gesture.offset = offset;
        gesture.point_snap = point_snap;
        let dirty = self
            .previews
            .update(ctx.diagram(), |_, preview| preview.move_by(offset));
        log::trace!("Move previews by {offset:?}");
        invalidate_regions(ctx, dirty);
    }

    fn update_handle(&mut self, ctx: &mut dyn DisplayContext) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        let Some((owner, point)) = gesture.handle else {
            return;
        };
        let diagram = ctx.diagram();
        let Some(shape) = diagram.find_shape(owner) else {
            return;
        };
        let displacement = gesture.displacement();
        let mut point_snap = None;
        if gesture.snap_mode.snaps_to_points() && shape.has_control_point_capability(point, Capabilities::GLUE) {
            point_snap = snap::nearest_control_point_snap(
                diagram,
                shape,
                point,
                displacement,
                gesture.snap_distance,
                Capabilities::CONNECT,
                &HashSet::new(),
            )
            .filter(|found| !diagram.is_related(owner, found.target));
        }
        let offset = match (point_snap, shape.control_point_position(point)) {
            (Some(found), _) => displacement + found.delta,
            (None, Some(origin)) => gesture.snap_to_grid(origin + displacement) - origin,
            (None, None) => displacement,
        };
        gesture.offset = offset;
        gesture.point_snap = point_snap;

        let modifiers = ResizeModifiers::from(gesture.modifiers);
        let dirty = self.previews.update(diagram, |_, preview| {
            preview.move_control_point_by(point, offset, modifiers);
        });
        log::trace!("Move control point {point} by {offset:?}");
        invalidate_regions(ctx, dirty);
    }

    fn update_rotate(&mut self, ctx: &mut dyn DisplayContext) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        let Some(pivot) = gesture
            .handle
            .and_then(|(owner, _)| ctx.diagram().find_shape(owner))
            .map(Shape::center)
        else {
            return;
        };
        let mut angle = rotation_between(pivot, gesture.start, gesture.current);
        if gesture.modifiers.shift() {
            angle = snap::snap_angle(angle, gesture.rotate_snap_step);
        }
        gesture.angle = normalize_angle(angle);
        let dirty = self.previews.update(ctx.diagram(), |_, preview| {
            let center = preview.center();
            preview.rotate_by(angle, center);
        });
        log::trace!("Rotate previews by {angle}");
        invalidate_regions(ctx, dirty);
    }

    fn update_frame(&mut self, ctx: &mut dyn DisplayContext) {
        let Some(gesture) = self.gesture.as_ref() else {
            return;
        };
        let frame = gesture.frame();
        if let Some(previous) = self.frame.replace(frame) {
            ctx.invalidate(previous);
        }
        ctx.invalidate(frame);
    }

    fn mouse_up(&mut self, ctx: &mut dyn DisplayContext, position: Point, modifiers: KeyModifiers) -> bool {
        if self.gesture.is_none() {
            return false;
        }
        self.mouse_move(ctx, position, modifiers);
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        match self.action {
            ToolAction::Select => click_select(ctx, &gesture),
            ToolAction::SelectWithFrame => frame_select(ctx, &gesture),
            ToolAction::EditCaption => edit_caption(ctx, &gesture),
            ToolAction::MoveShape => self.commit_move(ctx, &gesture),
            ToolAction::MoveHandle => self.commit_handle(ctx, &gesture),
            ToolAction::Rotate => self.commit_rotate(ctx, &gesture),
            ToolAction::None => {}
        }
        self.finish(ctx);
        true
    }

    fn commit_move(&mut self, ctx: &mut dyn DisplayContext, gesture: &GestureContext) {
        if is_zero(gesture.displacement()) || is_zero(gesture.offset) {
            return;
        }
        let shapes = ctx.selection().ids().to_vec();
        let main = Command::MoveShapes {
            shapes: shapes.clone(),
            delta: gesture.offset,
        };
        self.emit_with_connections(ctx, "Move shapes", &shapes, gesture.snap_distance, vec![main]);
    }

    fn commit_handle(&mut self, ctx: &mut dyn DisplayContext, gesture: &GestureContext) {
        let Some((_, point)) = gesture.handle else {
            return;
        };
        if is_zero(gesture.displacement()) || is_zero(gesture.offset) {
            return;
        }
        let shapes = ctx.selection().ids().to_vec();
        let modifiers = ResizeModifiers::from(gesture.modifiers);
        let moves = shapes
            .iter()
            .map(|&shape| Command::MoveControlPoint {
                shape,
                point,
                delta: gesture.offset,
                modifiers,
            })
            .collect();
        self.emit_with_connections(ctx, "Move control point", &shapes, gesture.snap_distance, moves);
    }

    fn commit_rotate(&mut self, ctx: &mut dyn DisplayContext, gesture: &GestureContext) {
        if is_zero(gesture.displacement()) || gesture.angle == 0 {
            return;
        }
        let shapes = ctx.selection().ids().to_vec();
        let main = Command::RotateShapes {
            shapes: shapes.clone(),
            angle: gesture.angle,
        };
        self.emit_with_connections(ctx, "Rotate shapes", &shapes, gesture.snap_distance, vec![main]);
    }

    /// Emit `main` wrapped by the disconnects and connects the previews imply.
    ///
    /// Glue points leaving their target are disconnected first, then `main`
    /// runs, then free glue points resting on connection points are connected.
    fn emit_with_connections(
        &self,
        ctx: &mut dyn DisplayContext,
        description: &str,
        shapes: &[ShapeId],
        snap_distance: f64,
        main: Vec<Command>,
    ) {
        let disconnected =
            connection::reconcile_before_commit(ctx.diagram(), &self.previews, shapes, snap_distance);
        let connected = if ctx.is_granted(Permission::Connect, shapes) {
            connection::reconcile_after_commit(ctx.diagram(), &self.previews, shapes, snap_distance, &disconnected)
        } else {
            log::debug!("Connecting denied, glue points stay free");
            Vec::new()
        };
        let mut emitter = CommandEmitter::new(description);
        emitter.extend(disconnected.into_iter().map(Command::Disconnect));
        emitter.extend(main);
        emitter.extend(connected.into_iter().map(Command::Connect));
        emitter.emit(ctx);
    }

    fn key_down(&mut self, ctx: &mut dyn DisplayContext, key: Key, modifiers: KeyModifiers) -> bool {
        if let Some(gesture) = self.gesture.as_mut() {
            let pressed = KeyModifiers::from_keys([key]);
            if pressed.is_empty() {
                return false;
            }
            gesture.modifiers = modifiers | pressed;
            if gesture.dragging {
                self.update_drag(ctx);
            }
            return true;
        }
        let direction = match key {
            Key::ArrowLeft => Vec2::new(-1.0, 0.0),
            Key::ArrowRight => Vec2::new(1.0, 0.0),
            Key::ArrowUp => Vec2::new(0.0, -1.0),
            Key::ArrowDown => Vec2::new(0.0, 1.0),
            _ => return false,
        };
        self.nudge(ctx, direction, modifiers.alt())
    }

    /// Releasing a modifier mid-drag re-derives the previews without it.
    fn key_up(&mut self, ctx: &mut dyn DisplayContext, key: Key, modifiers: KeyModifiers) -> bool {
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        let released = KeyModifiers::from_keys([key]);
        if released.is_empty() {
            return false;
        }
        gesture.modifiers = modifiers.without(released);
        if gesture.dragging {
            self.update_drag(ctx);
        }
        true
    }

    /// Move the selection one grid step, or the fine nudge distance.
    fn nudge(&mut self, ctx: &mut dyn DisplayContext, direction: Vec2, fine: bool) -> bool {
        let shapes = ctx.selection().ids().to_vec();
        if shapes.is_empty() {
            return false;
        }
        if !ctx.is_granted(Permission::Layout, &shapes) {
            log::debug!("Nudge denied");
            return true;
        }
        let settings = ctx.settings();
        let step = if fine {
            settings.nudge_distance
        } else {
            settings.grid_size
        };
        let delta = direction * step;
        let snap_distance = settings.snap_distance;

        self.create_previews(ctx, &shapes);
        let dirty = self
            .previews
            .update(ctx.diagram(), |_, preview| preview.move_by(delta));
        invalidate_regions(ctx, dirty);
        let main = Command::MoveShapes {
            shapes: shapes.clone(),
            delta,
        };
        self.emit_with_connections(ctx, "Nudge shapes", &shapes, snap_distance, vec![main]);
        self.finish(ctx);
        true
    }

    /// Drop previews and gesture state.
    fn finish(&mut self, ctx: &mut dyn DisplayContext) {
        let regions = self.previews.clear_previews();
        invalidate_regions(ctx, regions);
        if let Some(frame) = self.frame.take() {
            ctx.invalidate(frame);
        }
        self.gesture = None;
        self.set_action(ToolAction::None);
    }
}

impl Tool for PointerTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pointer
    }

    fn action(&self) -> ToolAction {
        self.action
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
            InputEvent::KeyDown { key, modifiers } => self.key_down(ctx, key, modifiers),
            InputEvent::KeyUp { key, modifiers } => self.key_up(ctx, key, modifiers),
            InputEvent::CaptureLost => {
                let busy = self.gesture.is_some();
                self.cancel(ctx);
                busy
            }
            _ => false,
        }
    }

    fn cancel(&mut self, ctx: &mut dyn DisplayContext) {
        if self.gesture.is_none() && self.previews.is_empty() {
            return;
        }
        log::debug!("Pointer gesture {:?} cancelled", self.action);
        self.finish(ctx);
    }

    fn previews(&self) -> &[Shape] {
        self.previews.previews()
    }
}

/// Selected shape whose caption lies under `position`, topmost first.
fn caption_hit(ctx: &dyn DisplayContext, position: Point) -> Option<ShapeId> {
    ctx.selection().ids().iter().rev().copied().find(|id| {
        ctx.diagram()
            .find_shape(*id)
            .is_some_and(|shape| shape.caption_contains(position))
    })
}

/// Whether `point` may be dragged on every shape of `shapes` at once.
fn handle_move_allowed(diagram: &Diagram, shapes: &[ShapeId], point: ControlPointId) -> bool {
    let Some(first) = shapes.first().and_then(|id| diagram.find_shape(*id)) else {
        return false;
    };
    if shapes.len() == 1 {
        return first.has_control_point_capability(point, Capabilities::RESIZE | Capabilities::GLUE);
    }
    if first.is_linear() && point != START_POINT && point != END_POINT {
        return false;
    }
    let movable = Capabilities::RESIZE | Capabilities::GLUE;
    share_shape_type(diagram, shapes)
        && shapes.iter().all(|id| {
            diagram
                .find_shape(*id)
                .is_some_and(|shape| shape.has_control_point_capability(point, movable))
        })
}

/// Whether every shape of `shapes` has the same type.
fn share_shape_type(diagram: &Diagram, shapes: &[ShapeId]) -> bool {
    let Some(first) = shapes.first().and_then(|id| diagram.find_shape(*id)) else {
        return false;
    };
    let shape_type = first.shape_type();
    shapes
        .iter()
        .all(|id| diagram.find_shape(*id).is_some_and(|shape| shape.shape_type() == shape_type))
}

/// Snapped displacement for moving `selection`.
///
/// A glue point reaching a connection point wins over the grid, which
/// snaps the top-left corner of the selection bounds.
fn move_snap(diagram: &Diagram, selection: &[ShapeId], gesture: &GestureContext) -> (Vec2, Option<PointSnap>) {
    let displacement = gesture.displacement();
    let moved = expand_selection(diagram, selection);

    if gesture.snap_mode.snaps_to_points() {
        let exclude: HashSet<ShapeId> = moved.iter().copied().collect();
        let mut best: Option<PointSnap> = None;
        for shape in moved.iter().filter_map(|id| diagram.find_shape(*id)) {
            for point in shape.control_point_ids(Capabilities::GLUE) {
                let Some(found) = snap::nearest_control_point_snap(
                    diagram,
                    shape,
                    point,
                    displacement,
                    gesture.snap_distance,
                    Capabilities::CONNECT,
                    &exclude,
                ) else {
                    continue;
                };
                if best.is_none_or(|b| found.distance < b.distance) {
                    best = Some(found);
                }
            }
        }
        if let Some(found) = best {
            return (displacement + found.delta, Some(found));
        }
    }

    let bounds = selection
        .iter()
        .filter_map(|id| diagram.find_shape(*id))
        .map(Shape::bounds)
        .reduce(|acc, b| acc.union(b));
    match bounds {
        Some(bounds) => {
            let corner = bounds.origin() + displacement;
            (gesture.snap_to_grid(corner) - bounds.origin(), None)
        }
        None => (displacement, None),
    }
}

/// Angle swept from `from` to `to` around `pivot`, in tenths of a degree.
fn rotation_between(pivot: Point, from: Point, to: Point) -> i32 {
    let swept = (to - pivot).atan2() - (from - pivot).atan2();
    (swept.to_degrees() * 10.0).round() as i32
}

fn click_select(ctx: &mut dyn DisplayContext, gesture: &GestureContext) {
    // Clicking a handle keeps the selection so a double click can follow.
    if gesture.handle.is_some() {
        return;
    }
    let before = ctx.selection().ids().to_vec();
    let modifiers = gesture.modifiers;
    let selection = ctx.selection_mut();
    match gesture.hit_shape {
        Some(id) if modifiers.control() => {
            selection.toggle(id);
        }
        Some(id) if modifiers.shift() => {
            selection.add(id);
        }
        Some(id) => selection.select(id),
        None if modifiers.control() || modifiers.shift() => {}
        None => selection.clear(),
    }
    let after = ctx.selection().ids().to_vec();
    if before != after {
        log::debug!("Selection: {} shapes", after.len());
        ctx.invalidate_shapes(&before);
        ctx.invalidate_shapes(&after);
    }
}

fn frame_select(ctx: &mut dyn DisplayContext, gesture: &GestureContext) {
    let found = ctx.diagram().shapes_in_rect(gesture.frame());
    let before = ctx.selection().ids().to_vec();
    if gesture.modifiers.control() || gesture.modifiers.shift() {
        for id in found {
            ctx.selection_mut().add(id);
        }
    } else {
        ctx.selection_mut().set(found);
    }
    let after = ctx.selection().ids().to_vec();
    log::debug!("Frame selected {} shapes", after.len());
    ctx.invalidate_shapes(&before);
    ctx.invalidate_shapes(&after);
}

fn edit_caption(ctx: &mut dyn DisplayContext, gesture: &GestureContext) {
    let Some(shape) = gesture.hit_shape else {
        return;
    };
    if ctx.is_granted(Permission::ModifyData, &[shape]) {
        log::debug!("Editing caption of {shape}");
        ctx.begin_caption_edit(shape);
    } else {
        log::debug!("Caption editing of {shape} denied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::shapes::{Polyline, Rectangle};

    fn canvas_with_box() -> (Canvas, ShapeId) {
        let mut canvas = Canvas::new();
        let id = canvas
            .diagram
            .add_shape(Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0)));
        (canvas, id)
    }

    fn send(tool: &mut PointerTool, canvas: &mut Canvas, event: InputEvent) -> bool {
        tool.process_event(canvas, &event)
    }

    #[test]
    fn test_click_selects_and_empty_click_clears() {
        let (mut canvas, id) = canvas_with_box();
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(50.0, 50.0)));
        assert_eq!(tool.action(), ToolAction::Select);
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(50.0, 50.0)));
        assert_eq!(canvas.selection.ids(), &[id]);
        assert_eq!(tool.action(), ToolAction::None);

        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(300.0, 300.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(300.0, 300.0)));
        assert!(canvas.selection.is_empty());
    }

    #[test]
    fn test_small_motion_stays_a_click() {
        let (mut canvas, _) = canvas_with_box();
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(50.0, 50.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(52.0, 51.0)));
        assert_eq!(tool.action(), ToolAction::Select);
        assert!(tool.previews().is_empty());
    }

    #[test]
    fn test_drag_moves_with_grid_snap() {
        let (mut canvas, id) = canvas_with_box();
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(50.0, 50.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(90.0, 50.0)));
        assert_eq!(tool.action(), ToolAction::MoveShape);
        assert_eq!(tool.previews().len(), 1);
        // The original stays put while dragging.
        assert_eq!(canvas.diagram.find_shape(id).unwrap().bounds().x0, 0.0);

        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(92.0, 51.0)));
        // Top-left corner (42, 1) snaps to (40, 0).
        let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
        assert!((bounds.x0 - 40.0).abs() < 1e-9);
        assert!(bounds.y0.abs() < 1e-9);
        assert!(tool.previews().is_empty());
        assert_eq!(canvas.executed().len(), 1);
    }

    #[test]
    fn test_drag_on_empty_space_selects_with_frame() {
        let (mut canvas, id) = canvas_with_box();
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(-10.0, -10.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(150.0, 150.0)));
        assert_eq!(tool.action(), ToolAction::SelectWithFrame);
        assert!(tool.selection_frame().is_some());
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(150.0, 150.0)));
        assert_eq!(canvas.selection.ids(), &[id]);
        assert!(tool.selection_frame().is_none());
    }

    #[test]
    fn test_resize_handle_drag() {
        let (mut canvas, id) = canvas_with_box();
        canvas.selection.select(id);
        let mut tool = PointerTool::new();
        // Bottom-right corner.
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(100.0, 100.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(140.0, 120.0)));
        assert_eq!(tool.action(), ToolAction::MoveHandle);
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(140.0, 120.0)));
        let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
        assert!((bounds.width() - 140.0).abs() < 1e-9);
        assert!((bounds.height() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_selection_refuses_handle_move() {
        let (mut canvas, id) = canvas_with_box();
        let line = canvas.diagram.add_shape(Shape::Polyline(Polyline::new(
            Point::new(200.0, 0.0),
            Point::new(300.0, 0.0),
        )));
        canvas.selection.set([id, line]);
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(100.0, 100.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(140.0, 120.0)));
        assert_eq!(tool.action(), ToolAction::None);
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(140.0, 120.0)));
        assert!(canvas.executed().is_empty());
        assert_eq!(canvas.selection.ids(), &[id, line]);
    }

    #[test]
    fn test_denied_layout_degrades_gesture() {
        let (mut canvas, id) = canvas_with_box();
        canvas.security.deny(Permission::Layout);
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(50.0, 50.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(90.0, 50.0)));
        assert_eq!(tool.action(), ToolAction::None);
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(90.0, 50.0)));
        assert_eq!(canvas.diagram.find_shape(id).unwrap().bounds().x0, 0.0);
        assert!(canvas.executed().is_empty());
    }

    #[test]
    fn test_rotate_handle_drag_with_shift_snaps() {
        let (mut canvas, id) = canvas_with_box();
        canvas.selection.select(id);
        let mut tool = PointerTool::new();
        // The rotate handle sits above the top edge.
        let handle = canvas
            .diagram
            .find_shape(id)
            .unwrap()
            .control_point_position(ControlPointId(10))
            .unwrap();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(handle));
        // Just short of a quarter turn clockwise around (50, 50).
        let target = Point::new(130.0, 45.0);
        send(
            &mut tool,
            &mut canvas,
            InputEvent::mouse_move(target).with_modifiers(KeyModifiers::SHIFT),
        );
        assert_eq!(tool.action(), ToolAction::Rotate);
        send(
            &mut tool,
            &mut canvas,
            InputEvent::mouse_up(target).with_modifiers(KeyModifiers::SHIFT),
        );
        assert_eq!(canvas.diagram.find_shape(id).unwrap().angle(), 900);
    }

    #[test]
    fn test_mixed_selection_refuses_rotate() {
        let (mut canvas, id) = canvas_with_box();
        let line = canvas.diagram.add_shape(Shape::Polyline(Polyline::new(
            Point::new(200.0, 0.0),
            Point::new(300.0, 0.0),
        )));
        canvas.selection.set([id, line]);
        let handle = canvas
            .diagram
            .find_shape(id)
            .unwrap()
            .control_point_position(ControlPointId(10))
            .unwrap();
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(handle));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(130.0, 45.0)));
        assert_eq!(tool.action(), ToolAction::None);
        assert!(tool.previews().is_empty());
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(130.0, 45.0)));
        assert!(canvas.executed().is_empty());
        assert_eq!(canvas.diagram.find_shape(id).unwrap().angle(), 0);
    }

    #[test]
    fn test_drag_back_to_start_keeps_off_grid_shape() {
        let mut canvas = Canvas::new();
        let id = canvas
            .diagram
            .add_shape(Shape::Rectangle(Rectangle::new(Point::new(3.0, 3.0), 100.0, 100.0)));
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(50.0, 50.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(90.0, 50.0)));
        assert_eq!(tool.action(), ToolAction::MoveShape);
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(50.0, 50.0)));

        assert!(canvas.executed().is_empty());
        assert_eq!(
            canvas.diagram.find_shape(id).unwrap().bounds(),
            Rect::new(3.0, 3.0, 103.0, 103.0)
        );
    }

    #[test]
    fn test_released_shift_stops_keeping_aspect() {
        let (mut canvas, id) = canvas_with_box();
        canvas.selection.select(id);
        let mut tool = PointerTool::new();
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(100.0, 100.0)));
        send(
            &mut tool,
            &mut canvas,
            InputEvent::mouse_move(Point::new(160.0, 120.0)).with_modifiers(KeyModifiers::SHIFT),
        );
        assert_eq!(tool.action(), ToolAction::MoveHandle);
        let kept = tool.previews()[0].bounds();
        assert!((kept.width() - kept.height()).abs() < 1e-9);

        assert!(send(&mut tool, &mut canvas, InputEvent::key_up(Key::Shift)));
        assert_eq!(tool.previews()[0].bounds(), Rect::new(0.0, 0.0, 160.0, 120.0));

        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(200.0, 120.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(200.0, 120.0)));
        assert_eq!(
            canvas.diagram.find_shape(id).unwrap().bounds(),
            Rect::new(0.0, 0.0, 200.0, 120.0)
        );
    }

    #[test]
    fn test_cancel_restores_nothing_and_is_idempotent() {
        let (mut canvas, id) = canvas_with_box();
        let mut tool = PointerTool::new();
        tool.cancel(&mut canvas);
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(50.0, 50.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(90.0, 90.0)));
        assert!(!tool.previews().is_empty());
        assert!(send(&mut tool, &mut canvas, InputEvent::CaptureLost));
        assert!(tool.previews().is_empty());
        assert_eq!(tool.action(), ToolAction::None);
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(90.0, 90.0)));
        assert_eq!(canvas.diagram.find_shape(id).unwrap().bounds().x0, 0.0);
        assert!(canvas.executed().is_empty());
    }

    #[test]
    fn test_arrow_keys_nudge() {
        let (mut canvas, id) = canvas_with_box();
        canvas.selection.select(id);
        let mut tool = PointerTool::new();
        assert!(send(&mut tool, &mut canvas, InputEvent::key_down(Key::ArrowRight)));
        assert!(send(
            &mut tool,
            &mut canvas,
            InputEvent::key_down(Key::ArrowDown).with_modifiers(KeyModifiers::ALT)
        ));
        let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
        assert!((bounds.x0 - 20.0).abs() < 1e-9);
        assert!((bounds.y0 - 1.0).abs() < 1e-9);
        assert!(tool.previews().is_empty());
    }

    #[test]
    fn test_rotation_between() {
        let pivot = Point::new(0.0, 0.0);
        assert_eq!(rotation_between(pivot, Point::new(10.0, 0.0), Point::new(0.0, 10.0)), 900);
        assert_eq!(rotation_between(pivot, Point::new(10.0, 0.0), Point::new(10.0, 0.0)), 0);
    }
}
