//! Input events delivered to the tools, plus modifier bitsets.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keys the tools react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Control,
    Shift,
    Alt,
    Character(char),
}

/// Modifier keys held during an event.
///
/// Built by OR-ing the individual modifiers, so several can be held at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyModifiers(u8);

impl KeyModifiers {
    pub const NONE: Self = Self(0);
    pub const CONTROL: Self = Self(1);
    pub const SHIFT: Self = Self(1 << 1);
    pub const ALT: Self = Self(1 << 2);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// These modifiers with `released` lifted.
    pub const fn without(self, released: Self) -> Self {
        Self(self.0 & !released.0)
    }

    pub fn control(self) -> bool {
        self.contains(Self::CONTROL)
    }

    pub fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    pub fn alt(self) -> bool {
        self.contains(Self::ALT)
    }

    /// Accumulate the modifiers of every modifier key in `keys`.
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        keys.into_iter().fold(Self::NONE, |acc, key| match key {
            Key::Control => acc | Self::CONTROL,
            Key::Shift => acc | Self::SHIFT,
            Key::Alt => acc | Self::ALT,
            _ => acc,
        })
    }
}

impl BitOr for KeyModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeyModifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// How a resize treats the shape's geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResizeModifiers(u8);

impl ResizeModifiers {
    pub const NONE: Self = Self(0);
    /// Keep the width/height ratio.
    pub const MAINTAIN_ASPECT: Self = Self(1);
    /// Grow symmetrically around the center.
    pub const MIRRORED_RESIZE: Self = Self(1 << 1);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ResizeModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<KeyModifiers> for ResizeModifiers {
    fn from(keys: KeyModifiers) -> Self {
        let mut modifiers = Self::NONE;
        if keys.shift() {
            modifiers = modifiers | Self::MAINTAIN_ASPECT;
        }
        if keys.control() {
            modifiers = modifiers | Self::MIRRORED_RESIZE;
        }
        modifiers
    }
}

/// An input event in diagram coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    MouseDown {
        position: Point,
        button: MouseButton,
        modifiers: KeyModifiers,
        /// 1 for a single click, 2 for a double click, and so on.
        clicks: u32,
    },
    MouseMove {
        position: Point,
        modifiers: KeyModifiers,
    },
    MouseUp {
        position: Point,
        button: MouseButton,
        modifiers: KeyModifiers,
    },
    KeyDown {
        key: Key,
        modifiers: KeyModifiers,
    },
    KeyUp {
        key: Key,
        modifiers: KeyModifiers,
    },
    /// The host lost the mouse capture mid-gesture.
    CaptureLost,
}

impl InputEvent {
    pub fn mouse_down(position: Point) -> Self {
        Self::MouseDown {
            position,
            button: MouseButton::Left,
            modifiers: KeyModifiers::NONE,
            clicks: 1,
        }
    }

    pub fn mouse_move(position: Point) -> Self {
        Self::MouseMove {
            position,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn mouse_up(position: Point) -> Self {
        Self::MouseUp {
            position,
            button: MouseButton::Left,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn key_down(key: Key) -> Self {
        Self::KeyDown {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn key_up(key: Key) -> Self {
        Self::KeyUp {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Same event with `modifiers` held. Events without modifiers are returned unchanged.
    pub fn with_modifiers(mut self, held: KeyModifiers) -> Self {
        match &mut self {
            Self::MouseDown { modifiers, .. }
            | Self::MouseMove { modifiers, .. }
            | Self::MouseUp { modifiers, .. }
            | Self::KeyDown { modifiers, .. }
            | Self::KeyUp { modifiers, .. } => *modifiers = held,
            Self::CaptureLost => {}
        }
        self
    }

    /// Same event with the given click count. Only affects mouse-down.
    pub fn with_clicks(mut self, count: u32) -> Self {
        if let Self::MouseDown { clicks, .. } = &mut self {
            *clicks = count;
        }
        self
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            Self::MouseDown { position, .. }
            | Self::MouseMove { position, .. }
            | Self::MouseUp { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Multi-click detection constants.
const MULTI_CLICK_TIME: Duration = Duration::from_millis(500);
const MULTI_CLICK_DISTANCE: f64 = 5.0;

/// Counts consecutive clicks for hosts that only receive raw presses.
#[derive(Debug, Clone, Default)]
pub struct ClickCounter {
    last_click: Option<(Instant, Point)>,
    count: u32,
}

impl ClickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a left-button press and return its click count.
    pub fn register(&mut self, position: Point, now: Instant) -> u32 {
        let continues = self.last_click.is_some_and(|(time, last)| {
            now.saturating_duration_since(time) < MULTI_CLICK_TIME
                && position.distance(last) < MULTI_CLICK_DISTANCE
        });
        self.count = if continues { self.count + 1 } else { 1 };
        self.last_click = Some((now, position));
        self.count
    }

    pub fn reset(&mut self) {
        self.last_click = None;
        self.count = 0;
    }
}
