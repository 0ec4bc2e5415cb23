//! Control point identifiers and capabilities.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Identifier of a control point, unique per shape type.
///
/// Values `<= 0` are sentinels and never name a real point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControlPointId(pub i32);

impl ControlPointId {
    /// The shape's reference point; as a connection target it means "anywhere on the body".
    pub const REFERENCE: Self = Self(0);
    pub const NONE: Self = Self(-1);
    pub const ANY: Self = Self(-2);
    pub const FIRST_VERTEX: Self = Self(-3);
    pub const LAST_VERTEX: Self = Self(-4);

    /// True for ids that name an actual point on a shape.
    pub fn is_real(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ControlPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::REFERENCE => write!(f, "reference"),
            Self::NONE => write!(f, "none"),
            Self::ANY => write!(f, "any"),
            Self::FIRST_VERTEX => write!(f, "first vertex"),
            Self::LAST_VERTEX => write!(f, "last vertex"),
            Self(id) => write!(f, "#{id}"),
        }
    }
}

/// Bitset of what a control point can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const RESIZE: Self = Self(1);
    pub const ROTATE: Self = Self(1 << 1);
    pub const GLUE: Self = Self(1 << 2);
    pub const CONNECT: Self = Self(1 << 3);
    pub const REFERENCE: Self = Self(1 << 4);
    pub const ALL: Self = Self(0b1_1111);

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A control point of a shape in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub id: ControlPointId,
    pub position: Point,
    pub capabilities: Capabilities,
}

impl ControlPoint {
    pub fn new(id: i32, position: Point, capabilities: Capabilities) -> Self {
        Self {
            id: ControlPointId(id),
            position,
            capabilities,
        }
    }
}

/// Position expressed in a shape's own frame, so it survives moves,
/// resizes and rotations of that shape.
///
/// Planar shapes use fractions of width/height relative to the center.
/// Polylines use `a = segment index + parameter along that segment`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativePosition {
    pub a: f64,
    pub b: f64,
}

impl RelativePosition {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }
}
