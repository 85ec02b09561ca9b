//! 2D toroidal ocean grid.

use crate::adjacency::{self, Neighbors};
use crate::creature::Creature;
use rand::seq::index;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::ops::Range;
use wator_core::{Error, Population, Position, Result, Species, WatorConfig};

/// Contents of one grid cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Creature),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn creature(&self) -> Option<&Creature> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(creature) => Some(creature),
        }
    }

    pub fn species(&self) -> Option<Species> {
        self.creature().map(|c| c.species)
    }
}

/// A `width` x `height` toroidal array of cells, stored row by row so whole
/// rows can be lent out to workers.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![Cell::Empty; width]; height],
        }
    }

    /// Create an empty grid sized by the configuration and scatter the initial
    /// fish and sharks over distinct random cells.
    pub fn from_config(config: &WatorConfig, rng: &mut ChaCha8Rng) -> Result<Self> {
        config.validate_population()?;

        let mut grid = Self::new(config.width as usize, config.height as usize);
        let fish = config.initial_fish as usize;
        let sharks = config.initial_sharks as usize;
        let fish_breed_age = config.fish_breed_age as u32;
        let shark_breed_age = config.shark_breed_age as u32;

        let cells = index::sample(rng, config.capacity(), fish + sharks);
        for (n, cell) in cells.into_iter().enumerate() {
            let pos = grid.index_to_pos(cell);
            // Staggered ages keep the population from breeding in lock-step.
            let creature = if n < fish {
                Creature::fish(rng.gen_range(0..fish_breed_age), 0)
            } else {
                Creature::shark(
                    rng.gen_range(0..shark_breed_age),
                    config.shark_starve_threshold,
                    0,
                )
            };
            grid.place(pos, creature)?;
        }

        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn check_bounds(&self, pos: Position) -> Result<()> {
        if pos.in_bounds(self.width, self.height) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Get the cell at position
    pub fn occupant_at(&self, pos: Position) -> Result<&Cell> {
        self.check_bounds(pos)?;
        Ok(&self.rows[pos.y as usize][pos.x as usize])
    }

    /// Put a creature into an empty cell
    pub fn place(&mut self, pos: Position, creature: Creature) -> Result<()> {
        self.check_bounds(pos)?;
        let cell = &mut self.rows[pos.y as usize][pos.x as usize];
        if !cell.is_empty() {
            return Err(Error::CellOccupied { x: pos.x, y: pos.y });
        }
        *cell = Cell::Occupied(creature);
        Ok(())
    }

    /// Empty a cell, returning whatever lived there
    pub fn clear(&mut self, pos: Position) -> Result<Option<Creature>> {
        self.check_bounds(pos)?;
        let cell = std::mem::take(&mut self.rows[pos.y as usize][pos.x as usize]);
        Ok(cell.creature().copied())
    }

    /// Wrapped north/south/east/west neighbours of a position
    pub fn neighbors(&self, pos: Position) -> Neighbors {
        adjacency::neighbors(pos, self.width, self.height)
    }

    /// Get position from row-major index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = index % self.width;
        let y = index / self.width;
        Position::new(x as i32, y as i32)
    }

    /// Iterator over all cells with positions, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, cell)| (Position::new(x as i32, y as i32), cell))
        })
    }

    /// Iterator over occupied cells only
    pub fn creatures(&self) -> impl Iterator<Item = (Position, &Creature)> + '_ {
        self.iter()
            .filter_map(|(pos, cell)| cell.creature().map(|creature| (pos, creature)))
    }

    /// Count the creatures of each species currently on the grid
    pub fn census(&self) -> Population {
        self.creatures()
            .fold(Population::default(), |mut population, (_, creature)| {
                match creature.species {
                    Species::Fish => population.fish += 1,
                    Species::Shark => population.sharks += 1,
                }
                population
            })
    }

    /// Lend out the rows `start..start + len` together with one halo row on
    /// each side. A band covering the whole grid is lent without halo.
    pub fn take_region(&mut self, start: usize, len: usize) -> Region {
        let (first_row, count, owned) = if len >= self.height {
            (0, self.height, 0..self.height)
        } else {
            assert!(
                len + 2 <= self.height,
                "band of {} rows plus halo does not fit a grid of height {}",
                len,
                self.height
            );
            ((start + self.height - 1) % self.height, len + 2, 1..len + 1)
        };

        let rows = (0..count)
            .map(|i| std::mem::take(&mut self.rows[(first_row + i) % self.height]))
            .collect();

        Region {
            width: self.width,
            height: self.height,
            first_row,
            rows,
            owned,
        }
    }

    /// Return rows previously lent out with [`Grid::take_region`]
    pub fn restore_region(&mut self, region: Region) {
        for (i, row) in region.rows.into_iter().enumerate() {
            let y = (region.first_row + i) % self.height;
            let slot = &mut self.rows[y];
            if !slot.is_empty() || row.len() != self.width {
                panic!(
                    "{}",
                    Error::InternalConsistency(format!("row {} restored twice or truncated", y))
                );
            }
            *slot = row;
        }
    }
}

/// A window of whole rows lent out of a [`Grid`]. The region's owner may
/// update every cell in it, but only scans the creatures in its owned rows.
#[derive(Debug)]
pub struct Region {
    width: usize,
    height: usize,
    /// Grid row held at local index 0
    first_row: usize,
    rows: Vec<Vec<Cell>>,
    /// Local indices of the rows this region processes
    owned: Range<usize>,
}

impl Region {
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid rows (as y coordinates) that this region processes, in scan order
    pub fn owned_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.owned
            .clone()
            .map(move |local| (self.first_row + local) % self.height)
    }

    fn local(&self, pos: Position) -> (usize, usize) {
        let row = (pos.y as usize + self.height - self.first_row) % self.height;
        if row >= self.rows.len() {
            panic!(
                "{}",
                Error::InternalConsistency(format!(
                    "cell {} lies outside the region starting at row {}",
                    pos, self.first_row
                ))
            );
        }
        (row, pos.x as usize)
    }

    pub fn get(&self, pos: Position) -> &Cell {
        let (row, col) = self.local(pos);
        &self.rows[row][col]
    }

    /// Remove and return the contents of a cell, leaving it empty
    pub fn take(&mut self, pos: Position) -> Cell {
        let (row, col) = self.local(pos);
        std::mem::take(&mut self.rows[row][col])
    }

    /// Overwrite a cell with a creature. The cell must be empty.
    pub fn put(&mut self, pos: Position, creature: Creature) {
        let (row, col) = self.local(pos);
        let cell = &mut self.rows[row][col];
        if !cell.is_empty() {
            panic!(
                "{}",
                Error::InternalConsistency(format!("double occupancy at {}", pos))
            );
        }
        *cell = Cell::Occupied(creature);
    }

    pub fn neighbors(&self, pos: Position) -> Neighbors {
        adjacency::neighbors(pos, self.width, self.height)
    }
}
