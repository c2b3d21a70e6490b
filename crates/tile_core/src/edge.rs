//! Edge types and per-side edge assignments.
//!
//! Every tile has four sides. Each side either carries an edge type or is
//! unassigned. Two tiles may sit next to each other only when the sides
//! facing each other carry the same edge type; asymmetrical edge types also
//! require the two sides to be mirrored (exactly one of them reversed).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid directions, in the order used for every `[T; 4]` edge tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in tuple order: north, east, south, west.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Index into a `[T; 4]` edge tuple.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Inverse of [`Direction::index`], wrapping modulo 4.
    #[inline]
    pub fn from_index(index: usize) -> Direction {
        Direction::ALL[index % 4]
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Direction::from_index(self.index() + 2)
    }

    /// The direction reached after turning clockwise by `quarter_turns`.
    #[inline]
    pub fn rotated(self, quarter_turns: usize) -> Direction {
        Direction::from_index(self.index() + quarter_turns)
    }

    /// Grid offset `(dx, dy)`. North is `+y`.
    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}

/// A named edge-compatibility class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePrototype {
    /// Unique identifier within a catalog.
    pub id: String,
    /// Display color. Opaque to the core.
    #[serde(default)]
    pub color: String,
    /// Symmetrical edges ignore the `reversed` flag when matching.
    #[serde(default = "default_symmetrical")]
    pub symmetrical: bool,
}

fn default_symmetrical() -> bool {
    true
}

impl EdgePrototype {
    pub fn new(id: impl Into<String>, color: impl Into<String>, symmetrical: bool) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
            symmetrical,
        }
    }

    pub fn symmetrical(id: impl Into<String>) -> Self {
        Self::new(id, "", true)
    }

    pub fn asymmetrical(id: impl Into<String>) -> Self {
        Self::new(id, "", false)
    }
}

/// The edge type assigned to one side of a tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeAssignment {
    /// `None` leaves the side unassigned.
    #[serde(default, rename = "type_id")]
    pub edge_type: Option<String>,
    /// Orientation of an asymmetrical edge along the tile perimeter.
    #[serde(default)]
    pub reversed: bool,
}

impl EdgeAssignment {
    pub fn unassigned() -> Self {
        Self::default()
    }

    pub fn typed(edge_type: impl Into<String>) -> Self {
        Self {
            edge_type: Some(edge_type.into()),
            reversed: false,
        }
    }

    pub fn reversed(edge_type: impl Into<String>) -> Self {
        Self {
            edge_type: Some(edge_type.into()),
            reversed: true,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.edge_type.is_some()
    }

    /// Whether this side may border `other`.
    ///
    /// `symmetrical` looks up the symmetry flag of an edge type id; ids it
    /// does not know never match.
    pub fn matches<F>(&self, other: &EdgeAssignment, symmetrical: F) -> bool
    where
        F: Fn(&str) -> Option<bool>,
    {
        match (&self.edge_type, &other.edge_type) {
            (Some(a), Some(b)) if a == b => match symmetrical(a) {
                Some(true) => true,
                Some(false) => self.reversed != other.reversed,
                None => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for EdgeAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.edge_type {
            Some(id) if self.reversed => write!(f, "{}'", id),
            Some(id) => f.write_str(id),
            None => f.write_str("<unassigned>"),
        }
    }
}
