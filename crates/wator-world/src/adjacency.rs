//! Toroidal four-neighbour adjacency.

use wator_core::{Direction, Position};

/// The four wrapped neighbours of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub north: Position,
    pub south: Position,
    pub east: Position,
    pub west: Position,
}

impl Neighbors {
    pub fn get(&self, direction: Direction) -> Position {
        match direction {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        Direction::all().into_iter().map(move |d| self.get(d))
    }
}

/// Neighbours of `pos` on a `width` x `height` torus. `pos` must be in bounds.
pub fn neighbors(pos: Position, width: usize, height: usize) -> Neighbors {
    let step = |direction: Direction| {
        let (dx, dy) = direction.to_delta();
        pos.add(dx, dy).wrap(width as i32, height as i32)
    };
    Neighbors {
        north: step(Direction::North),
        south: step(Direction::South),
        east: step(Direction::East),
        west: step(Direction::West),
    }
}
