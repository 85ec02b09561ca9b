//! Creature state.

use serde::{Deserialize, Serialize};
use wator_core::Species;

/// A single fish or shark. Owned by the grid cell it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub species: Species,
    pub age: u32,
    /// Remaining chronons before starvation. Always zero for fish.
    pub health: i32,
    /// Chronon in which this creature was last updated
    pub last_processed: u64,
}

impl Creature {
    pub fn fish(age: u32, chronon: u64) -> Self {
        Self {
            species: Species::Fish,
            age,
            health: 0,
            last_processed: chronon,
        }
    }

    pub fn shark(age: u32, health: i32, chronon: u64) -> Self {
        Self {
            species: Species::Shark,
            age,
            health,
            last_processed: chronon,
        }
    }

    pub fn is_fish(&self) -> bool {
        self.species == Species::Fish
    }

    pub fn is_shark(&self) -> bool {
        self.species == Species::Shark
    }

    /// Whether the creature still has to act in `chronon`
    pub fn is_pending(&self, chronon: u64) -> bool {
        self.last_processed != chronon
    }

    /// Stamp the creature as processed and age it by one chronon.
    pub fn tick(&mut self, chronon: u64) {
        self.last_processed = chronon;
        self.age += 1;
    }

    /// A shark loses one health per chronon; returns false once it has starved.
    pub fn hunger(&mut self) -> bool {
        self.health -= 1;
        self.health > 0
    }

    pub fn is_breeding(&self, breed_age: u32) -> bool {
        self.age % breed_age == 0
    }
}
