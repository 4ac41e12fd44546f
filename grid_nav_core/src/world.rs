use std::{collections::HashSet, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// Glyphs understood by the map format and produced by [`crate::render`].
pub const OPEN: char = '.';
pub const WALL: char = '#';
pub const START: char = 'S';
pub const GOAL: char = 'G';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("World extent must be non-zero, got {rows}x{cols}")]
    EmptyExtent { rows: usize, cols: usize },
    #[error("World extent {rows}x{cols} is too large")]
    TooLarge { rows: usize, cols: usize },
}

/// Errors raised while reading a world from its text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Map is empty.")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown map glyph '{glyph}' at ({row},{col}).")]
    UnknownGlyph { glyph: char, row: usize, col: usize },
    #[error("Multiple start positions ('S') found.")]
    DuplicateStart,
    #[error("Multiple goal positions ('G') found.")]
    DuplicateGoal,
    #[error(transparent)]
    World(#[from] WorldError),
}

/// A fixed-extent grid with a mutable set of walls and advisory endpoints.
///
/// `start` and `goal` are for callers; the search takes its endpoints as
/// arguments and never reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorldData")]
pub struct World {
    rows: usize,
    cols: usize,
    walls: HashSet<Coordinate>,
    start: Option<Coordinate>,
    goal: Option<Coordinate>,
}

/// Serialized form of a [`World`], checked by [`World::new`] on the way in.
#[derive(Deserialize)]
struct WorldData {
    rows: usize,
    cols: usize,
    #[serde(default)]
    walls: HashSet<Coordinate>,
    #[serde(default)]
    start: Option<Coordinate>,
    #[serde(default)]
    goal: Option<Coordinate>,
}

impl TryFrom<WorldData> for World {
    type Error = WorldError;

    fn try_from(data: WorldData) -> Result<Self, Self::Error> {
        let mut world = World::new(data.rows, data.cols)?;
        world.walls = data.walls;
        world.start = data.start;
        world.goal = data.goal;
        Ok(world)
    }
}

impl World {
    /// Largest number of cells a world may hold.
    pub const MAX_CELLS: usize = i32::MAX as usize;

    /// Creates an open world with no walls and no endpoints.
    ///
    /// Each extent must be non-zero and fit in `i32`, and the cell count may
    /// not exceed [`World::MAX_CELLS`].
    pub fn new(rows: usize, cols: usize) -> Result<Self, WorldError> {
        if rows == 0 || cols == 0 {
            return Err(WorldError::EmptyExtent { rows, cols });
        }
        let fits = i32::try_from(rows).is_ok()
            && i32::try_from(cols).is_ok()
            && rows.checked_mul(cols).is_some_and(|cells| cells <= Self::MAX_CELLS);
        if !fits {
            return Err(WorldError::TooLarge { rows, cols });
        }
        Ok(World {
            rows,
            cols,
            walls: HashSet::new(),
            start: None,
            goal: None,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.start
    }

    pub fn goal(&self) -> Option<Coordinate> {
        self.goal
    }

    pub fn set_start(&mut self, start: impl Into<Option<Coordinate>>) {
        self.start = start.into();
    }

    pub fn set_goal(&mut self, goal: impl Into<Option<Coordinate>>) {
        self.goal = goal.into();
    }

    /// Checks if the coordinate is inside the grid.
    #[inline]
    pub fn in_bounds(&self, c: Coordinate) -> bool {
        c.row >= 0 && (c.row as usize) < self.rows && c.col >= 0 && (c.col as usize) < self.cols
    }

    /// Checks that the coordinate is not a wall.
    ///
    /// This says nothing about bounds: an out-of-range coordinate without a
    /// wall is still passable. Movement legality is [`World::is_open`].
    #[inline]
    pub fn passable(&self, c: Coordinate) -> bool {
        !self.walls.contains(&c)
    }

    /// In bounds and passable: the rule both search and agents move by.
    #[inline]
    pub fn is_open(&self, c: Coordinate) -> bool {
        self.in_bounds(c) && self.passable(c)
    }

    pub fn is_goal(&self, c: Coordinate) -> bool {
        self.goal == Some(c)
    }

    pub fn is_wall(&self, c: Coordinate) -> bool {
        self.walls.contains(&c)
    }

    /// Blocks `c`. Placing a wall twice, or outside the grid, is allowed.
    pub fn place_wall(&mut self, c: Coordinate) {
        self.walls.insert(c);
    }

    /// Clears `c`. Removing a wall that isn't there is a no-op.
    pub fn remove_wall(&mut self, c: Coordinate) {
        self.walls.remove(&c);
    }

    pub fn walls(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.walls.iter().copied()
    }

    pub fn blocked(&self) -> &HashSet<Coordinate> {
        &self.walls
    }

    /// Iterates every in-bounds coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Coordinate> + use<> {
        // `new` guarantees both extents fit in i32.
        let (rows, cols) = (self.rows as i32, self.cols as i32);
        (0..rows).flat_map(move |row| (0..cols).map(move |col| Coordinate::new(row, col)))
    }

    /// Number of in-bounds cells that are not walls.
    pub fn open_cells(&self) -> usize {
        let blocked_inside = self.walls.iter().filter(|c| self.in_bounds(**c)).count();
        self.rows * self.cols - blocked_inside
    }

    /// Randomly walls off in-bounds cells with probability `density`,
    /// leaving `start` and `goal` clear. Returns how many walls were added.
    pub fn scatter_walls<R: Rng + ?Sized>(&mut self, rng: &mut R, density: f64) -> usize {
        // NaN would make `random_bool` panic; treat it as no walls.
        let density = if density.is_nan() {
            0.0
        } else {
            density.clamp(0.0, 1.0)
        };
        let mut placed = 0;
        for c in self.cells() {
            if Some(c) == self.start || Some(c) == self.goal || self.walls.contains(&c) {
                continue;
            }
            if rng.random_bool(density) {
                self.walls.insert(c);
                placed += 1;
            }
        }
        placed
    }
}

/// Loads a world from its text form: one line per row, one glyph per cell.
///
/// `.` is open floor, `#` a wall, `S` the start and `G` the goal. Leading and
/// trailing blank lines are ignored, as is surrounding whitespace per line.
impl FromStr for World {
    type Err = MapError;

    fn from_str(map_string: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = map_string
            .trim()
            .lines()
            .map(str::trim)
            .collect();
        if lines.iter().all(|line| line.is_empty()) {
            return Err(MapError::Empty);
        }

        let cols = lines[0].chars().count();
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(MapError::Ragged {
                    row,
                    expected: cols,
                    found,
                });
            }
        }

        let mut world = World::new(lines.len(), cols)?;
        for (row, line) in lines.iter().enumerate() {
            for (col, glyph) in line.chars().enumerate() {
                let c = Coordinate::new(row as i32, col as i32);
                match glyph {
                    OPEN => {}
                    WALL => world.place_wall(c),
                    START => {
                        if world.start.replace(c).is_some() {
                            return Err(MapError::DuplicateStart);
                        }
                    }
                    GOAL => {
                        if world.goal.replace(c).is_some() {
                            return Err(MapError::DuplicateGoal);
                        }
                    }
                    glyph => return Err(MapError::UnknownGlyph { glyph, row, col }),
                }
            }
        }
        Ok(world)
    }
}
