//! Read-only views of the ocean handed to renderers.

use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use wator_core::{Population, Species};

/// One occupied cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureView {
    pub x: i32,
    pub y: i32,
    pub species: Species,
}

/// Owned copy of the grid contents at the end of a chronon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub chronon: u64,
    pub width: usize,
    pub height: usize,
    pub population: Population,
    pub creatures: Vec<CreatureView>,
}

impl Snapshot {
    pub fn capture(grid: &Grid, chronon: u64, population: Population) -> Self {
        let creatures = grid
            .creatures()
            .map(|(pos, creature)| CreatureView {
                x: pos.x,
                y: pos.y,
                species: creature.species,
            })
            .collect();

        Self {
            chronon,
            width: grid.width(),
            height: grid.height(),
            population,
            creatures,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CreatureView> + '_ {
        self.creatures.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;
    use wator_core::Position;

    #[test]
    fn test_capture_lists_occupied_cells() {
        let mut grid = Grid::new(4, 4);
        grid.place(Position::new(1, 0), Creature::fish(0, 0)).unwrap();
        grid.place(Position::new(3, 2), Creature::shark(0, 3, 0)).unwrap();

        let snapshot = Snapshot::capture(&grid, 7, grid.census());
        assert_eq!(snapshot.chronon, 7);
        assert_eq!(snapshot.population, Population::new(1, 1));
        assert_eq!(
            snapshot.iter().copied().collect::<Vec<_>>(),
            vec![
                CreatureView { x: 1, y: 0, species: Species::Fish },
                CreatureView { x: 3, y: 2, species: Species::Shark },
            ]
        );
    }

    #[test]
    fn test_snapshot_is_detached_from_grid() {
        let mut grid = Grid::new(2, 2);
        grid.place(Position::new(0, 0), Creature::fish(0, 0)).unwrap();
        let snapshot = Snapshot::capture(&grid, 0, grid.census());

        grid.clear(Position::new(0, 0)).unwrap();
        assert_eq!(snapshot.creatures.len(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let grid = Grid::new(2, 2);
        let snapshot = Snapshot::capture(&grid, 3, grid.census());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"chronon\":3"));
    }
}
