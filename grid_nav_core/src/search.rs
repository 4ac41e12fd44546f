//! Breadth-first shortest paths over a [`World`].
//!
//! Every in-bounds, passable coordinate is a node; edges join it to its four
//! cardinal neighbors that are themselves open. All edges cost 1, so the first
//! time the goal leaves the frontier its path is a shortest one. Among several
//! shortest paths the one found is fixed by the up/down/left/right neighbor
//! order together with FIFO expansion.

use std::{collections::VecDeque, fmt};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Coordinate, Direction, map::Grid, world::World};

/// Why [`Pathfinder::find_path`] produced no path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NoPath {
    /// Start was out of bounds or walled; nothing was searched.
    #[error("Start {0} is out of bounds or blocked")]
    InvalidStart(Coordinate),
    /// Goal was out of bounds or walled; nothing was searched.
    #[error("Goal {0} is out of bounds or blocked")]
    InvalidGoal(Coordinate),
    /// The frontier emptied without ever reaching the goal.
    #[error("Goal is unreachable from start")]
    Unreachable,
}

/// An ordered, step-legal sequence of coordinates from start to goal inclusive.
///
/// Never empty. A path whose start equals its goal has one coordinate and
/// zero steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct Path(Vec<Coordinate>);

/// Coordinates that are empty or contain a non-cardinal jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Coordinates do not form a non-empty sequence of single cardinal steps")]
pub struct InvalidPath;

impl TryFrom<Vec<Coordinate>> for Path {
    type Error = InvalidPath;

    fn try_from(coords: Vec<Coordinate>) -> Result<Self, Self::Error> {
        Path::from_coordinates(coords).ok_or(InvalidPath)
    }
}

impl From<Path> for Vec<Coordinate> {
    fn from(path: Path) -> Self {
        path.0
    }
}

impl Path {
    /// Builds a path from coordinates, checking that it is non-empty and that
    /// each consecutive pair is a single cardinal step.
    pub fn from_coordinates(coords: Vec<Coordinate>) -> Option<Path> {
        if coords.is_empty() {
            return None;
        }
        let adjacent = coords
            .windows(2)
            .all(|pair| Direction::between(pair[0], pair[1]).is_some());
        adjacent.then_some(Path(coords))
    }

    pub fn start(&self) -> Coordinate {
        self.0[0]
    }

    pub fn goal(&self) -> Coordinate {
        self.0[self.0.len() - 1]
    }

    /// Number of coordinates, endpoints included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a path holds at least its start.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of moves, i.e. edges, along the path.
    pub fn steps(&self) -> usize {
        self.0.len() - 1
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        self.0.contains(&c)
    }

    pub fn iter(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Coordinate> {
        self.0
    }

    /// The moves that walk this path from its start.
    pub fn directions(&self) -> Vec<Direction> {
        self.0
            .windows(2)
            .filter_map(|pair| Direction::between(pair[0], pair[1]))
            .collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Predecessor link for a discovered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Visit {
    #[default]
    Unseen,
    Root,
    From(Coordinate),
}

/// Reusable breadth-first path finder.
///
/// Holds its frontier and predecessor arena between calls so repeated searches
/// over same-sized worlds don't reallocate. The world is borrowed per call and
/// never modified.
#[derive(Debug)]
pub struct Pathfinder {
    came_from: Grid<Visit>,
    frontier: VecDeque<Coordinate>,
    expanded: usize,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pathfinder {
    pub fn new() -> Self {
        Pathfinder {
            came_from: Grid::new(0, 0),
            frontier: VecDeque::new(),
            expanded: 0,
        }
    }

    /// Nodes dequeued by the most recent [`find_path`](Self::find_path) call.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Finds a shortest path from `start` to `goal`.
    ///
    /// Both endpoints must be in bounds and passable, otherwise the call
    /// returns immediately with zero nodes expanded. Each reachable node is
    /// enqueued at most once, so expansions never exceed the open cell count.
    pub fn find_path(
        &mut self,
        world: &World,
        start: Coordinate,
        goal: Coordinate,
    ) -> Result<Path, NoPath> {
        self.expanded = 0;
        if !world.is_open(start) {
            debug!(%start, "search rejected: start not open");
            return Err(NoPath::InvalidStart(start));
        }
        if !world.is_open(goal) {
            debug!(%goal, "search rejected: goal not open");
            return Err(NoPath::InvalidGoal(goal));
        }

        self.prepare(world);
        self.came_from[start] = Visit::Root;
        self.frontier.push_back(start);

        while let Some(current) = self.frontier.pop_front() {
            self.expanded += 1;

            if current == goal {
                let path = self.reconstruct(goal);
                debug!(
                    %start,
                    %goal,
                    steps = path.steps(),
                    expanded = self.expanded,
                    "path found"
                );
                return Ok(path);
            }

            for neighbor in current.neighbors4() {
                if !world.is_open(neighbor) {
                    continue;
                }
                // Marking on enqueue keeps every node in the frontier at most once.
                let visit = &mut self.came_from[neighbor];
                if *visit == Visit::Unseen {
                    *visit = Visit::From(current);
                    self.frontier.push_back(neighbor);
                }
            }
        }

        debug!(%start, %goal, expanded = self.expanded, "no path");
        Err(NoPath::Unreachable)
    }

    fn prepare(&mut self, world: &World) {
        self.frontier.clear();
        if self.came_from.rows() == world.rows() && self.came_from.cols() == world.cols() {
            self.came_from.fill(Visit::Unseen);
        } else {
            self.came_from = Grid::new(world.rows(), world.cols());
        }
    }

    fn reconstruct(&self, goal: Coordinate) -> Path {
        let mut coords = vec![goal];
        let mut current = goal;
        while let Some(&Visit::From(previous)) = self.came_from.get(current) {
            coords.push(previous);
            current = previous;
        }
        coords.reverse();
        Path(coords)
    }
}

/// One-shot search with a fresh [`Pathfinder`].
pub fn find_path(world: &World, start: Coordinate, goal: Coordinate) -> Result<Path, NoPath> {
    Pathfinder::new().find_path(world, start, goal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(rows: usize, cols: usize) -> World {
        World::new(rows, cols).unwrap()
    }

    #[test]
    fn straight_corridor() {
        let world = open(1, 4);
        let mut finder = Pathfinder::new();
        let path = finder
            .find_path(&world, Coordinate::new(0, 0), Coordinate::new(0, 3))
            .unwrap();
        assert_eq!(path.steps(), 3);
        assert_eq!(path.directions(), vec![Direction::Right; 3]);
        assert_eq!(finder.expanded(), 4);
        assert_eq!(path.to_string(), "(0,0) -> (0,1) -> (0,2) -> (0,3)");
    }

    #[test]
    fn start_equal_to_goal_is_a_single_cell_path() {
        let world = open(3, 3);
        let mut finder = Pathfinder::new();
        let c = Coordinate::new(1, 1);
        let path = finder.find_path(&world, c, c).unwrap();
        assert_eq!(path.as_slice(), &[c]);
        assert_eq!(path.steps(), 0);
        assert_eq!(finder.expanded(), 1);
    }

    #[test]
    fn invalid_endpoints_expand_nothing() {
        let mut world = open(3, 3);
        world.place_wall(Coordinate::new(2, 2));
        let mut finder = Pathfinder::new();

        // Leave a non-zero count behind first to see it reset.
        finder
            .find_path(&world, Coordinate::new(0, 0), Coordinate::new(1, 1))
            .unwrap();
        assert!(finder.expanded() > 0);

        assert_eq!(
            finder.find_path(&world, Coordinate::new(-1, 0), Coordinate::new(1, 1)),
            Err(NoPath::InvalidStart(Coordinate::new(-1, 0)))
        );
        assert_eq!(finder.expanded(), 0);
        assert_eq!(
            finder.find_path(&world, Coordinate::new(0, 0), Coordinate::new(2, 2)),
            Err(NoPath::InvalidGoal(Coordinate::new(2, 2)))
        );
        assert_eq!(finder.expanded(), 0);
    }

    #[test]
    fn ties_follow_neighbor_order() {
        // From (1,1) to (0,0) both up-then-left and left-then-up are shortest;
        // up is emitted first, so (0,1) is discovered first and wins.
        let world = open(2, 2);
        let path = find_path(&world, Coordinate::new(1, 1), Coordinate::new(0, 0)).unwrap();
        assert_eq!(path.directions(), vec![Direction::Up, Direction::Left]);
    }

    #[test]
    fn finder_is_reusable_across_world_sizes() {
        let mut finder = Pathfinder::new();
        let small = open(2, 2);
        let large = open(4, 6);
        let a = finder
            .find_path(&small, Coordinate::new(0, 0), Coordinate::new(1, 1))
            .unwrap();
        let b = finder
            .find_path(&large, Coordinate::new(0, 0), Coordinate::new(3, 5))
            .unwrap();
        let c = finder
            .find_path(&large, Coordinate::new(3, 5), Coordinate::new(0, 0))
            .unwrap();
        assert_eq!(a.steps(), 2);
        assert_eq!(b.steps(), 8);
        assert_eq!(c.steps(), 8);
    }

    #[test]
    fn walled_off_goal_is_unreachable() {
        let mut world = open(3, 3);
        let goal = Coordinate::new(2, 2);
        world.place_wall(Coordinate::new(1, 2));
        world.place_wall(Coordinate::new(2, 1));
        let mut finder = Pathfinder::new();
        assert_eq!(
            finder.find_path(&world, Coordinate::new(0, 0), goal),
            Err(NoPath::Unreachable)
        );
        assert_eq!(finder.expanded(), world.open_cells() - 1);
    }

    #[test]
    fn path_construction_checks_adjacency() {
        assert_eq!(Path::from_coordinates(vec![]), None);
        assert!(
            Path::from_coordinates(vec![Coordinate::new(0, 0), Coordinate::new(1, 1)]).is_none()
        );
        let path =
            Path::from_coordinates(vec![Coordinate::new(0, 0), Coordinate::new(1, 0)]).unwrap();
        assert_eq!(path.start(), Coordinate::new(0, 0));
        assert_eq!(path.goal(), Coordinate::new(1, 0));
    }
}
