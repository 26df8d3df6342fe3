use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the eight compass headings a beam travels along or a piece faces.
///
/// Headings are numbered counter-clockwise starting at east, matching the
/// `dir` values stored in level files. Rows grow downward, so north steps
/// toward a smaller `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    /// Heading `0`, step `(1, 0)`.
    East,
    /// Heading `1`, step `(1, -1)`.
    NorthEast,
    /// Heading `2`, step `(0, -1)`.
    North,
    /// Heading `3`, step `(-1, -1)`.
    NorthWest,
    /// Heading `4`, step `(-1, 0)`.
    West,
    /// Heading `5`, step `(-1, 1)`.
    SouthWest,
    /// Heading `6`, step `(0, 1)`.
    South,
    /// Heading `7`, step `(1, 1)`.
    SouthEast,
}

impl Direction {
    /// Every heading in ascending index order.
    pub const ALL: [Self; 8] = [
        Self::East,
        Self::NorthEast,
        Self::North,
        Self::NorthWest,
        Self::West,
        Self::SouthWest,
        Self::South,
        Self::SouthEast,
    ];

    /// Numeric index of the heading on the compass wheel.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Looks up the heading stored under `index`, if it names one.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::East),
            1 => Some(Self::NorthEast),
            2 => Some(Self::North),
            3 => Some(Self::NorthWest),
            4 => Some(Self::West),
            5 => Some(Self::SouthWest),
            6 => Some(Self::South),
            7 => Some(Self::SouthEast),
            _ => None,
        }
    }

    const fn wrapping(value: i32) -> Self {
        match value.rem_euclid(8) {
            0 => Self::East,
            1 => Self::NorthEast,
            2 => Self::North,
            3 => Self::NorthWest,
            4 => Self::West,
            5 => Self::SouthWest,
            6 => Self::South,
            _ => Self::SouthEast,
        }
    }

    /// Unit grid step `(dx, dy)` taken when moving along the heading.
    #[must_use]
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::NorthEast => (1, -1),
            Self::North => (0, -1),
            Self::NorthWest => (-1, -1),
            Self::West => (-1, 0),
            Self::SouthWest => (-1, 1),
            Self::South => (0, 1),
            Self::SouthEast => (1, 1),
        }
    }

    /// Inverse of [`Direction::vector`].
    ///
    /// Only the eight unit steps map to a heading; any other pair yields `None`.
    #[must_use]
    pub const fn from_vector(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (1, 0) => Some(Self::East),
            (1, -1) => Some(Self::NorthEast),
            (0, -1) => Some(Self::North),
            (-1, -1) => Some(Self::NorthWest),
            (-1, 0) => Some(Self::West),
            (-1, 1) => Some(Self::SouthWest),
            (0, 1) => Some(Self::South),
            (1, 1) => Some(Self::SouthEast),
            _ => None,
        }
    }

    /// Turns the heading by `steps` eighths of a revolution (positive is
    /// counter-clockwise). Rotating by eight returns the same heading.
    #[must_use]
    pub const fn rotate(self, steps: i32) -> Self {
        Self::wrapping(self.index() as i32 + steps)
    }

    /// Reports whether the heading is axis aligned.
    #[must_use]
    pub const fn is_cardinal(self) -> bool {
        self.index() % 2 == 0
    }

    /// Heading after bouncing off a mirror of the provided orientation.
    ///
    /// A `/` mirror maps `(dx, dy)` to `(-dy, -dx)` and a `\` mirror maps it to
    /// `(dy, dx)`. On the index wheel these are `2 - d` and `6 - d`.
    #[must_use]
    pub const fn reflect(self, mirror: MirrorKind) -> Self {
        match mirror {
            MirrorKind::Slash => Self::wrapping(2 - self.index() as i32),
            MirrorKind::Backslash => Self::wrapping(6 - self.index() as i32),
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction.index()
    }
}

impl TryFrom<u8> for Direction {
    type Error = InvalidDirection;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or(InvalidDirection(value))
    }
}

/// Raised when a numeric heading falls outside `0..=7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("direction {0} is outside the eight-heading range 0..=7")]
pub struct InvalidDirection(pub u8);

/// Orientation of a mirror surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MirrorKind {
    /// Surface running from bottom-left to top-right.
    Slash,
    /// Surface running from top-left to bottom-right.
    Backslash,
}

impl MirrorKind {
    /// Orientation implied by a mirror piece's facing: even headings are `/`,
    /// odd headings are `\`.
    #[must_use]
    pub const fn from_facing(facing: Direction) -> Self {
        if facing.index() % 2 == 0 {
            Self::Slash
        } else {
            Self::Backslash
        }
    }
}
