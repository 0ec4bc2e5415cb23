//! Planar creation tool: stamps boxes and other framed shapes.

use super::{GestureContext, Template, Tool, ToolAction, ToolKind};
use crate::command::{Command, CommandEmitter};
use crate::context::{DisplayContext, Permission};
use crate::diagram::ModelObject;
use crate::input::{InputEvent, KeyModifiers, MouseButton};
use crate::shapes::{Frame, MIN_FRAME_SIZE, Shape};
use kurbo::{Point, Rect, Size};

#[derive(Debug)]
pub struct PlanarTool {
    template: Template,
    gesture: Option<GestureContext>,
    anchor: Point,
    preview: Option<Shape>,
    model: Option<ModelObject>,
}

impl PlanarTool {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            gesture: None,
            anchor: Point::ZERO,
            preview: None,
            model: None,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
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
        if !ctx.is_granted(Permission::Insert, &[]) {
            log::debug!("Inserting shapes denied");
            return true;
        }
        let gesture = GestureContext::begin(ctx, position, modifiers, clicks);
        self.anchor = gesture.snap_to_grid(position);
        self.gesture = Some(gesture);
        true
    }

    fn mouse_move(&mut self, ctx: &mut dyn DisplayContext, position: Point, modifiers: KeyModifiers) -> bool {
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        if !gesture.update(position, modifiers) {
            return true;
        }
        let corner = gesture.snap_to_grid(position);
        let keep_aspect = gesture.modifiers.shift();
        let rect = sized_rect(self.anchor, corner, keep_aspect.then(|| self.template.shape.bounds().size()));

        if self.preview.is_none() {
            let (shape, model) = self.template.instantiate();
            self.preview = Some(shape);
            self.model = model;
        }
        let Some(preview) = self.preview.as_mut() else {
            return true;
        };
        let before = preview.bounds();
        place_in(preview, rect);
        let after = preview.bounds();
        ctx.invalidate_with_handles(before);
        ctx.invalidate_with_handles(after);
        true
    }

    fn mouse_up(&mut self, ctx: &mut dyn DisplayContext, position: Point, modifiers: KeyModifiers) -> bool {
        if self.gesture.is_none() {
            return false;
        }
        self.mouse_move(ctx, position, modifiers);
        let Some(gesture) = self.gesture.take() else {
            return true;
        };

        let (shape, model) = match self.preview.take() {
            Some(shape) if gesture.dragging => (shape, self.model.take()),
            stale => {
                if let Some(shape) = stale {
                    ctx.invalidate_with_handles(shape.bounds());
                }
                // A click drops the template centered on the cursor.
                let (mut shape, model) = self.template.instantiate();
                shape.move_by(self.anchor - shape.center());
                (shape, model)
            }
        };
        self.model = None;
        self.insert(ctx, shape, model);
        true
    }

    fn insert(&mut self, ctx: &mut dyn DisplayContext, shape: Shape, model: Option<ModelObject>) {
        let id = shape.id();
        let mut emitter = CommandEmitter::new("Insert shape");
        match model {
            Some(model) => emitter.push(Command::InsertShapeAndModel { shape, model }),
            None => emitter.push(Command::InsertShape { shape }),
        }
        if emitter.emit(ctx) {
            log::debug!("Inserted '{}' as {id}", self.template.name);
            ctx.selection_mut().select(id);
            ctx.invalidate_shapes(&[id]);
        }
    }
}

/// Rectangle spanned from `anchor` to `corner`, optionally forced to `aspect`.
fn sized_rect(anchor: Point, corner: Point, aspect: Option<Size>) -> Rect {
    let mut width = corner.x - anchor.x;
    let mut height = corner.y - anchor.y;
    if let Some(aspect) = aspect.filter(|a| a.width > 0.0 && a.height > 0.0) {
        let scale = (width.abs() / aspect.width).max(height.abs() / aspect.height);
        width = aspect.width * scale * width.signum();
        height = aspect.height * scale * height.signum();
    }
    Rect::from_points(anchor, anchor + (width, height))
}

/// Fit `shape` into `rect`. Shapes without a frame are only moved.
fn place_in(shape: &mut Shape, rect: Rect) {
    if let Some(frame) = shape.frame_mut() {
        let angle = frame.angle;
        *frame = Frame::new(
            rect.center(),
            rect.width().max(MIN_FRAME_SIZE),
            rect.height().max(MIN_FRAME_SIZE),
        );
        frame.angle = angle;
    } else {
        let delta = rect.center() - shape.center();
        shape.move_by(delta);
    }
}

impl Tool for PlanarTool {
    fn kind(&self) -> ToolKind {
        ToolKind::PlanarCreation
    }

    fn action(&self) -> ToolAction {
        if self.preview.is_some() {
            ToolAction::MoveHandle
        } else {
            ToolAction::None
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
            InputEvent::CaptureLost => {
                let busy = self.gesture.is_some();
                self.cancel(ctx);
                busy
            }
            _ => false,
        }
    }

    fn cancel(&mut self, ctx: &mut dyn DisplayContext) {
        if let Some(preview) = self.preview.take() {
            ctx.invalidate_with_handles(preview.bounds());
        }
        if self.gesture.take().is_some() {
            log::debug!("Shape creation cancelled");
        }
        self.model = None;
    }

    fn previews(&self) -> &[Shape] {
        self.preview.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::input::Key;

    fn send(tool: &mut PlanarTool, canvas: &mut Canvas, event: InputEvent) -> bool {
        tool.process_event(canvas, &event)
    }

    #[test]
    fn test_click_inserts_template_at_cursor() {
        let mut canvas = Canvas::new();
        let mut tool = PlanarTool::new(Template::rectangle());
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(201.0, 99.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(201.0, 99.0)));

        let id = canvas.selection.ids()[0];
        let shape = canvas.diagram.find_shape(id).unwrap();
        assert_eq!(shape.center(), Point::new(200.0, 100.0));
        assert_eq!(shape.bounds().size(), Size::new(100.0, 60.0));
        assert_eq!(canvas.executed().len(), 1);
    }

    #[test]
    fn test_drag_sizes_the_shape() {
        let mut canvas = Canvas::new();
        let mut tool = PlanarTool::new(Template::rectangle());
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(0.0, 0.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(100.0, 100.0)));
        assert_eq!(tool.previews().len(), 1);
        assert!(canvas.diagram.is_empty());
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(161.0, 79.0)));

        let id = canvas.selection.ids()[0];
        let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 160.0, 80.0));
        assert!(tool.previews().is_empty());
    }

    #[test]
    fn test_drag_upwards_and_with_aspect() {
        let mut canvas = Canvas::new();
        let mut tool = PlanarTool::new(Template::rectangle());
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(200.0, 200.0)));
        send(
            &mut tool,
            &mut canvas,
            InputEvent::mouse_up(Point::new(100.0, 180.0)).with_modifiers(KeyModifiers::SHIFT),
        );
        let id = canvas.selection.ids()[0];
        let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(100.0, 140.0, 200.0, 200.0));
    }

    #[test]
    fn test_cancel_and_denied_insert() {
        let mut canvas = Canvas::new();
        let mut tool = PlanarTool::new(Template::rectangle());
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(0.0, 0.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_move(Point::new(100.0, 100.0)));
        assert!(send(&mut tool, &mut canvas, InputEvent::CaptureLost));
        assert!(tool.previews().is_empty());
        assert!(!send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(100.0, 100.0))));
        assert!(canvas.diagram.is_empty());
        assert!(!send(&mut tool, &mut canvas, InputEvent::key_down(Key::Enter)));

        canvas.security.deny(Permission::Insert);
        send(&mut tool, &mut canvas, InputEvent::mouse_down(Point::new(0.0, 0.0)));
        send(&mut tool, &mut canvas, InputEvent::mouse_up(Point::new(100.0, 100.0)));
        assert!(canvas.diagram.is_empty());
    }

    #[test]
    fn test_sized_rect_keeps_aspect() {
        let rect = sized_rect(
            Point::new(0.0, 0.0),
            Point::new(50.0, 10.0),
            Some(Size::new(2.0, 1.0)),
        );
        assert_eq!(rect, Rect::new(0.0, 0.0, 50.0, 25.0));
    }
}
