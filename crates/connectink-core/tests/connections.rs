//! Integration tests: glue points, connection reconciliation and undo.

use connectink_core::shapes::{ControlPointId, END_POINT, Polyline, Rectangle, START_POINT, Shape, ShapeId};
use connectink_core::{Canvas, Command, ConnectionInfo, DisplayContext, InputEvent, Permission, Template};
use kurbo::Point;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Box at the origin with a connector glued to its right edge.
fn glued_scene() -> (Canvas, ShapeId, ShapeId) {
    let mut canvas = Canvas::new();
    let rect = canvas
        .diagram
        .add_shape(Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0)));
    let line = canvas.diagram.add_shape(Shape::Polyline(Polyline::new(
        Point::new(100.0, 50.0),
        Point::new(200.0, 50.0),
    )));
    canvas
        .execute(Command::Connect(ConnectionInfo::new(
            line,
            START_POINT,
            rect,
            ControlPointId(5),
        )))
        .unwrap();
    (canvas, rect, line)
}

fn drag(canvas: &mut Canvas, from: Point, to: Point) {
    canvas.handle_event(&InputEvent::mouse_down(from));
    canvas.handle_event(&InputEvent::mouse_move(to));
    canvas.handle_event(&InputEvent::mouse_up(to));
}

fn point_of(canvas: &Canvas, shape: ShapeId, point: ControlPointId) -> Point {
    canvas
        .diagram
        .find_shape(shape)
        .and_then(|s| s.control_point_position(point))
        .unwrap()
}

#[test]
fn moving_the_target_drags_the_connector_end() {
    init();
    let (mut canvas, rect, line) = glued_scene();
    canvas.selection.select(rect);

    drag(&mut canvas, Point::new(50.0, 50.0), Point::new(50.0, 110.0));

    assert_eq!(point_of(&canvas, line, START_POINT), Point::new(100.0, 110.0));
    assert_eq!(point_of(&canvas, line, END_POINT), Point::new(200.0, 50.0));
    assert_eq!(canvas.diagram.connection_infos(line, START_POINT).len(), 1);
}

#[test]
fn moving_both_ends_keeps_the_connection() {
    init();
    let (mut canvas, rect, line) = glued_scene();
    canvas.selection.set([rect, line]);

    drag(&mut canvas, Point::new(50.0, 50.0), Point::new(70.0, 50.0));

    assert_eq!(canvas.executed().len(), 2);
    assert!(matches!(canvas.executed()[1], Command::MoveShapes { .. }));
    let infos = canvas.diagram.connection_infos(line, START_POINT);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].target, rect);
    assert_eq!(point_of(&canvas, line, START_POINT), Point::new(120.0, 50.0));
}

#[test]
fn dragging_the_connector_away_disconnects() {
    init();
    let (mut canvas, _, line) = glued_scene();
    canvas.selection.select(line);

    drag(&mut canvas, Point::new(150.0, 50.0), Point::new(150.0, 150.0));

    assert!(canvas.diagram.connection_infos(line, START_POINT).is_empty());
    assert_eq!(point_of(&canvas, line, START_POINT), Point::new(100.0, 150.0));
    match canvas.executed().last() {
        Some(Command::Aggregate { commands, .. }) => {
            assert!(matches!(commands[0], Command::Disconnect(_)));
            assert!(matches!(commands[1], Command::MoveShapes { .. }));
        }
        other => panic!("expected an aggregate, got {other:?}"),
    }
}

#[test]
fn disconnect_and_move_undo_as_one_step() {
    init();
    let (mut canvas, rect, line) = glued_scene();
    canvas.selection.select(line);
    drag(&mut canvas, Point::new(150.0, 50.0), Point::new(150.0, 150.0));

    assert!(canvas.undo());
    let infos = canvas.diagram.connection_infos(line, START_POINT);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].target, rect);
    assert_eq!(point_of(&canvas, line, START_POINT), Point::new(100.0, 50.0));
}

#[test]
fn dragging_a_free_end_onto_a_box_connects() {
    init();
    let (mut canvas, _, line) = glued_scene();
    let other = canvas
        .diagram
        .add_shape(Shape::Rectangle(Rectangle::new(Point::new(300.0, 0.0), 100.0, 100.0)));
    canvas.selection.select(line);

    drag(&mut canvas, Point::new(200.0, 50.0), Point::new(297.0, 52.0));

    assert_eq!(point_of(&canvas, line, END_POINT), Point::new(300.0, 50.0));
    let infos = canvas.diagram.connection_infos(line, END_POINT);
    assert_eq!(infos.len(), 1);
    assert_eq!((infos[0].target, infos[0].target_point), (other, ControlPointId(4)));
    // The other end stays glued.
    assert_eq!(canvas.diagram.connection_infos(line, START_POINT).len(), 1);
}

#[test]
fn denied_connect_leaves_glue_points_free() {
    init();
    let (mut canvas, _, line) = glued_scene();
    canvas
        .diagram
        .add_shape(Shape::Rectangle(Rectangle::new(Point::new(300.0, 0.0), 100.0, 100.0)));
    canvas.security.deny(Permission::Connect);
    canvas.selection.select(line);

    drag(&mut canvas, Point::new(200.0, 50.0), Point::new(297.0, 52.0));

    assert_eq!(point_of(&canvas, line, END_POINT), Point::new(300.0, 50.0));
    assert!(canvas.diagram.connection_infos(line, END_POINT).is_empty());
}

#[test]
fn drawn_connector_follows_its_targets() {
    init();
    let mut canvas = Canvas::new();
    let a = canvas
        .diagram
        .add_shape(Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0)));
    let b = canvas
        .diagram
        .add_shape(Shape::Rectangle(Rectangle::new(Point::new(300.0, 0.0), 100.0, 100.0)));

    canvas.use_linear(Template::connector());
    canvas.handle_event(&InputEvent::mouse_down(Point::new(102.0, 51.0)));
    canvas.handle_event(&InputEvent::mouse_move(Point::new(200.0, 50.0)));
    canvas.handle_event(&InputEvent::mouse_up(Point::new(298.0, 48.0)));
    let line = canvas.selection.ids()[0];
    assert_eq!(canvas.diagram.connections_to(a).len(), 1);
    assert_eq!(canvas.diagram.connections_to(b).len(), 1);

    canvas.use_pointer();
    canvas.selection.select(b);
    drag(&mut canvas, Point::new(350.0, 50.0), Point::new(350.0, 150.0));

    assert_eq!(point_of(&canvas, line, START_POINT), Point::new(100.0, 50.0));
    assert_eq!(point_of(&canvas, line, END_POINT), Point::new(300.0, 150.0));
}

#[test]
fn small_drag_within_snap_distance_keeps_the_glue() {
    init();
    let (mut canvas, rect, line) = glued_scene();
    canvas.config.snap_to_grid = false;
    canvas.config.snap_to_points = false;
    canvas.selection.select(line);

    drag(&mut canvas, Point::new(150.0, 50.0), Point::new(154.5, 50.0));

    assert!(matches!(canvas.executed().last(), Some(Command::MoveShapes { .. })));
    let infos = canvas.diagram.connection_infos(line, START_POINT);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].target, rect);
    // The glued end is pulled back onto its target, the free end moved.
    assert_eq!(point_of(&canvas, line, START_POINT), Point::new(100.0, 50.0));
    assert_eq!(point_of(&canvas, line, END_POINT), Point::new(204.5, 50.0));
}

#[test]
fn spur_on_a_chained_connector_previews_the_chain() {
    init();
    let (mut canvas, rect, line) = glued_scene();
    let spur = canvas.diagram.add_shape(Shape::Polyline(Polyline::new(
        Point::new(150.0, 50.0),
        Point::new(150.0, 150.0),
    )));
    canvas
        .execute(Command::Connect(ConnectionInfo::new(
            spur,
            START_POINT,
            line,
            ControlPointId::REFERENCE,
        )))
        .unwrap();
    canvas.selection.select(spur);

    canvas.handle_event(&InputEvent::mouse_down(Point::new(150.0, 120.0)));
    canvas.handle_event(&InputEvent::mouse_move(Point::new(150.0, 124.5)));
    // The spur and the connector it hangs on are both drawn as previews.
    assert_eq!(canvas.tools.previews().len(), 2);
    canvas.handle_event(&InputEvent::mouse_up(Point::new(150.0, 124.5)));

    assert!(matches!(canvas.executed().last(), Some(Command::MoveShapes { .. })));
    assert_eq!(canvas.diagram.connection_infos(spur, START_POINT)[0].target, line);
    assert_eq!(canvas.diagram.connection_infos(line, START_POINT)[0].target, rect);
    assert_eq!(point_of(&canvas, line, START_POINT), Point::new(100.0, 50.0));
    assert_eq!(point_of(&canvas, line, END_POINT), Point::new(200.0, 50.0));
}
