//! Integration tests: pointer and creation tools driven through a canvas.

use connectink_core::shapes::{ControlPointId, Rectangle, Shape, ShapeId};
use connectink_core::{Canvas, Command, InputEvent, Key, KeyModifiers, Permission, Template, ToolAction, ToolKind};
use kurbo::{Point, Rect};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn add_box(canvas: &mut Canvas, x: f64, y: f64) -> ShapeId {
    canvas
        .diagram
        .add_shape(Shape::Rectangle(Rectangle::new(Point::new(x, y), 100.0, 100.0)))
}

fn drag(canvas: &mut Canvas, from: Point, via: Point, to: Point) {
    canvas.handle_event(&InputEvent::mouse_down(from));
    canvas.handle_event(&InputEvent::mouse_move(via));
    canvas.handle_event(&InputEvent::mouse_up(to));
}

#[test]
fn previews_live_only_during_the_gesture() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 0.0, 0.0);

    canvas.handle_event(&InputEvent::mouse_down(Point::new(50.0, 50.0)));
    canvas.handle_event(&InputEvent::mouse_move(Point::new(90.0, 50.0)));
    assert_eq!(canvas.tools.action(), ToolAction::MoveShape);
    assert_eq!(canvas.tools.previews().len(), 1);
    assert_eq!(canvas.tools.previews()[0].bounds().x0, 40.0);
    // The diagram itself is untouched until the commit.
    assert_eq!(canvas.diagram.find_shape(id).unwrap().bounds().x0, 0.0);

    canvas.handle_event(&InputEvent::mouse_up(Point::new(90.0, 50.0)));
    assert!(canvas.tools.previews().is_empty());
    assert_eq!(canvas.tools.action(), ToolAction::None);
    assert!(!canvas.take_invalidated().is_empty());
}

#[test]
fn drag_snaps_to_grid() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 0.0, 0.0);

    drag(&mut canvas, Point::new(50.0, 50.0), Point::new(70.0, 50.0), Point::new(92.0, 51.0));

    let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
    assert_eq!(bounds, Rect::new(40.0, 0.0, 140.0, 100.0));
    assert_eq!(canvas.executed().len(), 1);
    assert!(matches!(canvas.executed()[0], Command::MoveShapes { .. }));
}

#[test]
fn drag_back_to_start_emits_nothing() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 0.0, 0.0);

    drag(&mut canvas, Point::new(50.0, 50.0), Point::new(70.0, 50.0), Point::new(51.0, 50.0));

    assert!(canvas.executed().is_empty());
    assert!(!canvas.can_undo());
    assert_eq!(canvas.diagram.find_shape(id).unwrap().bounds().x0, 0.0);
}

#[test]
fn control_click_toggles_membership() {
    init();
    let mut canvas = Canvas::new();
    let a = add_box(&mut canvas, 0.0, 0.0);
    let b = add_box(&mut canvas, 200.0, 0.0);
    canvas.selection.set([a, b]);

    let click = Point::new(50.0, 50.0);
    canvas.handle_event(&InputEvent::mouse_down(click).with_modifiers(KeyModifiers::CONTROL));
    canvas.handle_event(&InputEvent::mouse_up(click).with_modifiers(KeyModifiers::CONTROL));
    assert_eq!(canvas.selection.ids(), &[b]);

    canvas.handle_event(&InputEvent::mouse_down(click).with_modifiers(KeyModifiers::CONTROL));
    canvas.handle_event(&InputEvent::mouse_up(click).with_modifiers(KeyModifiers::CONTROL));
    assert_eq!(canvas.selection.ids(), &[b, a]);
}

#[test]
fn four_quick_rotations_return_to_start() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 0.0, 0.0);
    canvas.selection.select(id);

    for _ in 0..4 {
        let handle = canvas
            .diagram
            .find_shape(id)
            .and_then(|shape| shape.control_point_position(ControlPointId(10)))
            .unwrap();
        canvas.handle_event(&InputEvent::mouse_down(handle));
        canvas.handle_event(&InputEvent::mouse_up(handle));
        canvas.handle_event(&InputEvent::mouse_down(handle).with_clicks(2));
        canvas.handle_event(&InputEvent::mouse_up(handle));
    }

    assert_eq!(canvas.executed().len(), 4);
    let shape = canvas.diagram.find_shape(id).unwrap();
    assert_eq!(shape.angle(), 0);
    assert_eq!(shape.center(), Point::new(50.0, 50.0));
}

#[test]
fn escape_cancels_a_running_drag() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 0.0, 0.0);

    canvas.handle_event(&InputEvent::mouse_down(Point::new(50.0, 50.0)));
    canvas.handle_event(&InputEvent::mouse_move(Point::new(150.0, 50.0)));
    assert!(canvas.handle_event(&InputEvent::key_down(Key::Escape)));
    assert!(canvas.tools.previews().is_empty());
    // Nothing left to cancel.
    assert!(!canvas.handle_event(&InputEvent::CaptureLost));

    canvas.handle_event(&InputEvent::mouse_up(Point::new(150.0, 50.0)));
    assert_eq!(canvas.diagram.find_shape(id).unwrap().bounds().x0, 0.0);
    assert!(canvas.executed().is_empty());
}

#[test]
fn denied_layout_leaves_diagram_alone() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 0.0, 0.0);
    canvas.security.deny_for(id, Permission::Layout);

    drag(&mut canvas, Point::new(50.0, 50.0), Point::new(90.0, 50.0), Point::new(90.0, 50.0));
    assert!(canvas.executed().is_empty());

    canvas.handle_event(&InputEvent::key_down(Key::ArrowRight));
    assert!(canvas.executed().is_empty());
    assert_eq!(canvas.diagram.find_shape(id).unwrap().bounds().x0, 0.0);
}

#[test]
fn click_on_selected_caption_starts_editing() {
    init();
    let mut canvas = Canvas::new();
    let id = canvas.diagram.add_shape(Shape::Rectangle(
        Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0).with_caption("Server"),
    ));
    canvas.selection.select(id);

    let caption = canvas.diagram.find_shape(id).unwrap().caption_bounds().unwrap().center();
    canvas.handle_event(&InputEvent::mouse_down(caption));
    canvas.handle_event(&InputEvent::mouse_up(caption));
    assert_eq!(canvas.caption_edit(), Some(id));

    canvas.end_caption_edit();
    canvas.security.deny(Permission::ModifyData);
    canvas.handle_event(&InputEvent::mouse_down(caption));
    canvas.handle_event(&InputEvent::mouse_up(caption));
    assert_eq!(canvas.caption_edit(), None);
}

#[test]
fn planar_tool_inserts_and_undoes() {
    init();
    let mut canvas = Canvas::new();
    canvas.use_planar(Template::rectangle());
    assert_eq!(canvas.tool(), ToolKind::PlanarCreation);

    canvas.handle_event(&InputEvent::mouse_down(Point::new(100.0, 100.0)));
    canvas.handle_event(&InputEvent::mouse_up(Point::new(100.0, 100.0)));
    assert_eq!(canvas.diagram.len(), 1);
    let id = canvas.selection.ids()[0];
    assert_eq!(canvas.diagram.find_shape(id).unwrap().center(), Point::new(100.0, 100.0));

    assert!(canvas.undo());
    assert!(canvas.diagram.is_empty());
    assert!(canvas.selection.is_empty());
    assert!(canvas.redo());
    assert!(canvas.diagram.contains(id));
}

#[test]
fn drag_back_to_start_keeps_off_grid_box() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 3.0, 3.0);

    drag(&mut canvas, Point::new(50.0, 50.0), Point::new(90.0, 50.0), Point::new(50.0, 50.0));

    assert!(canvas.executed().is_empty());
    assert!(!canvas.can_undo());
    let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
    assert_eq!(bounds, Rect::new(3.0, 3.0, 103.0, 103.0));
}

#[test]
fn released_control_stops_mirrored_resize() {
    init();
    let mut canvas = Canvas::new();
    let id = add_box(&mut canvas, 0.0, 0.0);
    canvas.selection.select(id);

    canvas.handle_event(&InputEvent::mouse_down(Point::new(100.0, 100.0)));
    canvas.handle_event(
        &InputEvent::mouse_move(Point::new(140.0, 120.0)).with_modifiers(KeyModifiers::CONTROL),
    );
    assert_eq!(canvas.tools.previews()[0].bounds(), Rect::new(-40.0, -20.0, 140.0, 120.0));

    assert!(canvas.handle_event(&InputEvent::key_up(Key::Control)));
    assert_eq!(canvas.tools.previews()[0].bounds(), Rect::new(0.0, 0.0, 140.0, 120.0));

    canvas.handle_event(&InputEvent::mouse_up(Point::new(140.0, 120.0)));
    let bounds = canvas.diagram.find_shape(id).unwrap().bounds();
    assert_eq!(bounds, Rect::new(0.0, 0.0, 140.0, 120.0));
    assert_eq!(canvas.executed().len(), 1);
}
