use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod agent;
pub mod map;
pub mod render;
pub mod search;
pub mod world;

pub use agent::{Agent, AgentError};
pub use map::Grid;
pub use search::{InvalidPath, NoPath, Path, Pathfinder, find_path};
pub use world::{MapError, World, WorldError};

/// A (row, col) cell identifier.
///
/// Coordinates carry no bounds of their own: a neighbor of an edge cell is a
/// perfectly valid `Coordinate` that the [`World`] will report as out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub const fn new(row: i32, col: i32) -> Self {
        Coordinate { row, col }
    }

    /// Returns the four cardinal neighbors in the order up, down, left, right.
    ///
    /// Search relies on this order to break ties between equal-length paths.
    /// Neighbors follow [`Coordinate::step`], so they wrap at the `i32` extremes.
    pub fn neighbors4(self) -> [Coordinate; 4] {
        Direction::ALL.map(|direction| self.step(direction))
    }

    /// Returns the coordinate one cell away in `direction`.
    ///
    /// Wraps at the `i32` extremes. A world's extent fits in `i32`, so a
    /// wrapped neighbor is always out of bounds, same as its source.
    #[inline]
    pub fn step(self, direction: Direction) -> Coordinate {
        let (d_row, d_col) = direction.offset();
        Coordinate {
            row: self.row.wrapping_add(d_row),
            col: self.col.wrapping_add(d_col),
        }
    }

    /// Returns the coordinate one cell away in `direction`, or `None` when it
    /// cannot be represented.
    #[inline]
    pub fn checked_step(self, direction: Direction) -> Option<Coordinate> {
        let (d_row, d_col) = direction.offset();
        Some(Coordinate {
            row: self.row.checked_add(d_row)?,
            col: self.col.checked_add(d_col)?,
        })
    }

    /// Returns manhattan distance between two coordinates, saturating at `u32::MAX`.
    pub fn manhattan(self, other: Coordinate) -> u32 {
        self.row
            .abs_diff(other.row)
            .saturating_add(self.col.abs_diff(other.col))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((row, col): (i32, i32)) -> Self {
        Coordinate { row, col }
    }
}

/// One of the four cardinal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions, in neighbor emission order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The (row, col) delta of this direction. Rows grow downwards.
    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Converts a move between two adjacent coordinates into a direction.
    ///
    /// Returns `None` if `to` is not one of the four neighbors of `from`.
    pub fn between(from: Coordinate, to: Coordinate) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| from.checked_step(*direction) == Some(to))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a direction token is not one of `up`, `down`, `left`, `right`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown direction '{0}', expected one of up, down, left, right")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Direction::ALL
            .into_iter()
            .find(|direction| direction.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| ParseDirectionError(token.to_string()))
    }
}
