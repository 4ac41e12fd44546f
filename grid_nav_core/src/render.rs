//! Plain-text drawing of a [`World`].

use crate::{
    Coordinate,
    map::Grid,
    search::Path,
    world::{GOAL, OPEN, START, WALL, World},
};

pub const AGENT: char = 'A';
pub const PATH: char = '*';

/// Picks the glyph for one cell.
///
/// Precedence, highest first: agent, start, goal, path, wall, empty.
pub fn glyph_at(
    world: &World,
    c: Coordinate,
    path: Option<&Path>,
    agent: Option<Coordinate>,
) -> char {
    if agent == Some(c) {
        AGENT
    } else if world.start() == Some(c) {
        START
    } else if world.is_goal(c) {
        GOAL
    } else if path.is_some_and(|p| p.contains(c)) {
        PATH
    } else if world.is_wall(c) {
        WALL
    } else {
        OPEN
    }
}

/// Builds the glyph buffer for the whole world.
pub fn glyphs(world: &World, path: Option<&Path>, agent: Option<Coordinate>) -> Grid<char> {
    let mut buffer = Grid::filled(world.rows(), world.cols(), OPEN);
    for c in world.cells() {
        buffer[c] = glyph_at(world, c, path, agent);
    }
    buffer
}

/// Draws the world inside a `+---+` border, one line per row.
pub fn render(world: &World, path: Option<&Path>, agent: Option<Coordinate>) -> String {
    let border = format!("+{}+", "-".repeat(world.cols()));
    let mut out = String::with_capacity((world.cols() + 3) * (world.rows() + 2));
    out.push_str(&border);
    out.push('\n');
    for row in glyphs(world, path, agent).row_slices() {
        out.push('|');
        out.extend(row.iter());
        out.push_str("|\n");
    }
    out.push_str(&border);
    out.push('\n');
    out
}
