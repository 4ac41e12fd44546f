use tracing::trace;

use crate::{Coordinate, Direction, search::Path, world::World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("No start position given and the world has none")]
    NoStart,
    #[error("Cannot place agent at {0}: out of bounds or inside a wall")]
    Blocked(Coordinate),
}

/// A walker that moves one cardinal cell at a time through a borrowed [`World`].
///
/// Moves obey the same rule the search uses: the destination must be in bounds
/// and passable. A rejected move leaves the agent where it was. Reaching the
/// goal is not tracked here; callers check [`World::is_goal`].
#[derive(Debug, Clone)]
pub struct Agent<'w> {
    world: &'w World,
    at: Coordinate,
}

impl<'w> Agent<'w> {
    /// Places an agent at `start`, or at the world's start if none is given.
    pub fn new(world: &'w World, start: Option<Coordinate>) -> Result<Self, AgentError> {
        let at = start.or(world.start()).ok_or(AgentError::NoStart)?;
        if !world.is_open(at) {
            return Err(AgentError::Blocked(at));
        }
        Ok(Agent { world, at })
    }

    pub fn at(&self) -> Coordinate {
        self.at
    }

    pub fn world(&self) -> &'w World {
        self.world
    }

    /// Whether the agent currently stands on the world's goal.
    pub fn at_goal(&self) -> bool {
        self.world.is_goal(self.at)
    }

    pub fn can_move_to(&self, c: Coordinate) -> bool {
        self.world.in_bounds(c) && self.world.passable(c)
    }

    /// Moves one cell in `direction`. Returns `false`, without moving, when the
    /// destination is out of bounds, walled, or past the `i32` range.
    pub fn step(&mut self, direction: Direction) -> bool {
        match self.at.checked_step(direction) {
            Some(target) if self.can_move_to(target) => {
                self.at = target;
                true
            }
            _ => {
                trace!(from = %self.at, %direction, "step rejected");
                false
            }
        }
    }

    /// Teleports to `c` with no legality check.
    pub fn reset(&mut self, c: Coordinate) {
        self.at = c;
    }

    /// Walks `path` from the agent's current position, stopping at the first
    /// move that is rejected or that doesn't start where the agent stands.
    ///
    /// Returns the number of successful steps.
    pub fn follow(&mut self, path: &Path) -> usize {
        let mut taken = 0;
        for pair in path.as_slice().windows(2) {
            if pair[0] != self.at {
                break;
            }
            let Some(direction) = Direction::between(pair[0], pair[1]) else {
                break;
            };
            if !self.step(direction) {
                break;
            }
            taken += 1;
        }
        taken
    }
}
