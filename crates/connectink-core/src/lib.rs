//! ConnectInk Core Library
//!
//! Interactive shape manipulation for connected diagrams: tools that turn
//! pointer and key input into undoable commands, with live previews,
//! glue-point connections and snapping.

pub mod camera;
pub mod canvas;
pub mod command;
pub mod config;
pub mod connection;
pub mod context;
pub mod diagram;
pub mod input;
pub mod preview;
pub mod selection;
pub mod shapes;
pub mod snap;
pub mod tools;

pub use camera::Camera;
pub use canvas::{Canvas, SecurityPolicy};
pub use command::{Command, CommandEmitter, CommandError};
pub use config::{ConfigError, EditorConfig};
pub use connection::{ConnectionError, ConnectionInfo, ConnectionTable};
pub use context::{DisplayContext, Permission};
pub use diagram::{Diagram, ModelObject};
pub use input::{InputEvent, Key, KeyModifiers, MouseButton, ResizeModifiers};
pub use preview::PreviewManager;
pub use selection::Selection;
pub use snap::{GRID_SIZE, PointSnap, SnapMode};
pub use tools::{Template, Tool, ToolAction, ToolKind, ToolManager};
