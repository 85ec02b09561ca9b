//! Per-chronon update rules for fish and sharks.

use crate::creature::Creature;
use crate::grid::{Cell, Grid, Region};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use wator_core::{Direction, Position, Species, WatorConfig};

/// Breeding and starvation parameters, taken from a validated configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub fish_breed_age: u32,
    pub shark_breed_age: u32,
    pub starve_threshold: i32,
}

impl Rules {
    pub fn from_config(config: &WatorConfig) -> Self {
        Self {
            fish_breed_age: config.fish_breed_age as u32,
            shark_breed_age: config.shark_breed_age as u32,
            starve_threshold: config.shark_starve_threshold,
        }
    }
}

/// Births and deaths during one chronon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChrononStats {
    pub fish_born: usize,
    pub sharks_born: usize,
    pub fish_eaten: usize,
    pub sharks_starved: usize,
}

impl AddAssign for ChrononStats {
    fn add_assign(&mut self, other: Self) {
        self.fish_born += other.fish_born;
        self.sharks_born += other.sharks_born;
        self.fish_eaten += other.fish_eaten;
        self.sharks_starved += other.sharks_starved;
    }
}

/// Run one chronon over the whole grid on the calling thread.
pub fn run_chronon(
    grid: &mut Grid,
    rules: &Rules,
    chronon: u64,
    rng: &mut ChaCha8Rng,
) -> ChrononStats {
    let height = grid.height();
    let mut region = grid.take_region(0, height);
    let stats = run_region(&mut region, rules, chronon, rng);
    grid.restore_region(region);
    stats
}

/// Update every creature in the region's owned rows that has not yet acted in
/// `chronon`, scanning row-major.
pub fn run_region(
    region: &mut Region,
    rules: &Rules,
    chronon: u64,
    rng: &mut ChaCha8Rng,
) -> ChrononStats {
    let mut stats = ChrononStats::default();
    let rows: Vec<usize> = region.owned_rows().collect();

    for y in rows {
        for x in 0..region.width() {
            let pos = Position::new(x as i32, y as i32);
            let mut creature = match region.get(pos) {
                Cell::Occupied(creature) if creature.is_pending(chronon) => *creature,
                _ => continue,
            };

            // Stamped before moving so a creature that lands in a row still
            // ahead of the scan is not updated twice.
            creature.tick(chronon);

            let mut directions = Direction::all();
            directions.shuffle(rng);

            match creature.species {
                Species::Fish => {
                    update_fish(region, rules, pos, creature, &directions, &mut stats)
                }
                Species::Shark => {
                    update_shark(region, rules, pos, creature, &directions, &mut stats)
                }
            }
        }
    }

    stats
}

fn find_neighbor(
    region: &Region,
    pos: Position,
    directions: &[Direction],
    wanted: impl Fn(&Cell) -> bool,
) -> Option<Position> {
    let neighbors = region.neighbors(pos);
    directions
        .iter()
        .map(|&d| neighbors.get(d))
        .find(|&target| wanted(region.get(target)))
}

fn update_fish(
    region: &mut Region,
    rules: &Rules,
    pos: Position,
    fish: Creature,
    directions: &[Direction],
    stats: &mut ChrononStats,
) {
    let chronon = fish.last_processed;
    let target = find_neighbor(region, pos, directions, Cell::is_empty);

    region.take(pos);
    if fish.is_breeding(rules.fish_breed_age) {
        region.put(pos, fish);
        if let Some(target) = target {
            region.put(target, Creature::fish(0, chronon));
            stats.fish_born += 1;
        }
    } else {
        region.put(target.unwrap_or(pos), fish);
    }
}

fn update_shark(
    region: &mut Region,
    rules: &Rules,
    pos: Position,
    mut shark: Creature,
    directions: &[Direction],
    stats: &mut ChrononStats,
) {
    let chronon = shark.last_processed;

    if !shark.hunger() {
        region.take(pos);
        stats.sharks_starved += 1;
        return;
    }

    let prey = find_neighbor(region, pos, directions, |cell| {
        cell.species() == Some(Species::Fish)
    });
    let target = match prey {
        Some(prey) => {
            region.take(prey);
            shark.health = rules.starve_threshold;
            stats.fish_eaten += 1;
            Some(prey)
        }
        None => find_neighbor(region, pos, directions, Cell::is_empty),
    };

    region.take(pos);
    match target {
        Some(target) => {
            region.put(target, shark);
            if shark.is_breeding(rules.shark_breed_age) {
                region.put(pos, Creature::shark(0, rules.starve_threshold, chronon));
                stats.sharks_born += 1;
            }
        }
        None => region.put(pos, shark),
    }
}
