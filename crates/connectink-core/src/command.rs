//! Undoable commands and the emitter that bundles a gesture's effects.

use crate::connection::{ConnectionError, ConnectionInfo};
use crate::context::DisplayContext;
use crate::diagram::{Diagram, ModelObject};
use crate::input::ResizeModifiers;
use crate::shapes::{ControlPointId, Shape, ShapeId, normalize_angle};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while executing a command.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("Control point {point} of shape {shape} cannot be moved")]
    ControlPointNotMovable { shape: ShapeId, point: ControlPointId },
    #[error("Shape already exists: {0}")]
    DuplicateShape(ShapeId),
    #[error("Connection failed: {0}")]
    Connection(#[from] ConnectionError),
}

/// A host-executed, undoable change to the diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    MoveShapes {
        shapes: Vec<ShapeId>,
        delta: Vec2,
    },
    /// Moves one control point; also used for glue points.
    MoveControlPoint {
        shape: ShapeId,
        point: ControlPointId,
        delta: Vec2,
        modifiers: ResizeModifiers,
    },
    /// Rotates each shape around its own center, in tenths of a degree.
    RotateShapes {
        shapes: Vec<ShapeId>,
        angle: i32,
    },
    Connect(ConnectionInfo),
    Disconnect(ConnectionInfo),
    InsertShape {
        shape: Shape,
    },
    InsertShapeAndModel {
        shape: Shape,
        model: ModelObject,
    },
    /// Several commands executed and undone as one.
    Aggregate {
        description: String,
        commands: Vec<Command>,
    },
}

fn is_zero(delta: Vec2) -> bool {
    delta.x.abs() < f64::EPSILON && delta.y.abs() < f64::EPSILON
}

impl Command {
    pub fn description(&self) -> &str {
        match self {
            Command::MoveShapes { .. } => "Move shapes",
            Command::MoveControlPoint { .. } => "Move control point",
            Command::RotateShapes { .. } => "Rotate shapes",
            Command::Connect(_) => "Connect",
            Command::Disconnect(_) => "Disconnect",
            Command::InsertShape { .. } => "Insert shape",
            Command::InsertShapeAndModel { .. } => "Insert shape and model",
            Command::Aggregate { description, .. } => description,
        }
    }

    /// True for commands that would not change anything.
    pub fn is_noop(&self) -> bool {
        match self {
            Command::MoveShapes { shapes, delta } => shapes.is_empty() || is_zero(*delta),
            Command::MoveControlPoint { delta, .. } => is_zero(*delta),
            Command::RotateShapes { shapes, angle } => shapes.is_empty() || normalize_angle(*angle) == 0,
            Command::Aggregate { commands, .. } => commands.iter().all(Command::is_noop),
            _ => false,
        }
    }

    /// Execute against `diagram`.
    ///
    /// On error the diagram may be partially modified; hosts restore their
    /// snapshot.
    pub fn apply(&self, diagram: &mut Diagram) -> Result<(), CommandError> {
        match self {
            Command::MoveShapes { shapes, delta } => {
                for &id in shapes {
                    diagram
                        .find_shape_mut(id)
                        .ok_or(CommandError::ShapeNotFound(id))?
                        .move_by(*delta);
                }
                diagram.reseat_glue_points(shapes);
                diagram.follow_connections(shapes);
            }
            Command::MoveControlPoint {
                shape,
                point,
                delta,
                modifiers,
            } => {
                let target = diagram
                    .find_shape_mut(*shape)
                    .ok_or(CommandError::ShapeNotFound(*shape))?;
                if !target.move_control_point_by(*point, *delta, *modifiers) {
                    return Err(CommandError::ControlPointNotMovable {
                        shape: *shape,
                        point: *point,
                    });
                }
                diagram.reseat_glue_points(&[*shape]);
                diagram.follow_connections(&[*shape]);
            }
            Command::RotateShapes { shapes, angle } => {
                for &id in shapes {
                    let shape = diagram
                        .find_shape_mut(id)
                        .ok_or(CommandError::ShapeNotFound(id))?;
                    let pivot = shape.center();
                    shape.rotate_by(*angle, pivot);
                }
                diagram.reseat_glue_points(shapes);
                diagram.follow_connections(shapes);
            }
            Command::Connect(info) => {
                diagram.connect(info.clone())?;
                diagram.reseat_glue_points(&[info.owner]);
                diagram.follow_connections(&[info.owner]);
            }
            Command::Disconnect(info) => {
                diagram.disconnect(info.owner, info.glue_point);
            }
            Command::InsertShape { shape } => {
                insert(diagram, shape)?;
            }
            Command::InsertShapeAndModel { shape, model } => {
                insert(diagram, shape)?;
                diagram.attach_model(shape.id(), model.clone());
            }
            Command::Aggregate { commands, .. } => {
                for command in commands {
                    command.apply(diagram)?;
                }
            }
        }
        Ok(())
    }
}

fn insert(diagram: &mut Diagram, shape: &Shape) -> Result<(), CommandError> {
    if diagram.contains(shape.id()) {
        return Err(CommandError::DuplicateShape(shape.id()));
    }
    diagram.add_shape(shape.clone());
    Ok(())
}

/// Collects the effects of one gesture into a single command.
#[derive(Debug, Default)]
pub struct CommandEmitter {
    description: String,
    commands: Vec<Command>,
}

impl CommandEmitter {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            commands: Vec::new(),
        }
    }

    /// Queue a command. Commands without effect are dropped.
    pub fn push(&mut self, command: Command) {
        if command.is_noop() {
            log::trace!("Dropping no-op command: {}", command.description());
            return;
        }
        self.commands.push(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.push(command);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// The queued commands as one command: nothing, the single command, or an aggregate.
    pub fn finish(mut self) -> Option<Command> {
        match self.commands.len() {
            0 => None,
            1 => self.commands.pop(),
            _ => Some(Command::Aggregate {
                description: self.description,
                commands: self.commands,
            }),
        }
    }

    /// Hand the result to the host. Returns true if a command executed.
    pub fn emit(self, ctx: &mut dyn DisplayContext) -> bool {
        let Some(command) = self.finish() else {
            return false;
        };
        let description = command.description().to_string();
        match ctx.execute(command) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to execute '{description}': {e}");
                false
            }
        }
    }
}
