//! Simulation controller: owns the ocean and advances it chronon by chronon.

use crate::engine::{ChrononStats, Rules};
use crate::grid::Grid;
use crate::scheduler::Scheduler;
use crate::snapshot::Snapshot;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, instrument, Level};
use wator_core::{Error, Population, Result, Species, WatorConfig};

pub struct Simulation {
    rules: Rules,
    grid: Grid,
    scheduler: Scheduler,
    chronon: u64,
    population: Population,
    last_stats: ChrononStats,
    totals: ChrononStats,
    peak: Population,
}

impl Simulation {
    /// Validate the configuration and scatter the initial population.
    pub fn new(config: WatorConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::from_config(&config, &mut rng)?;
        Self::with_grid(config, grid)
    }

    /// Start from a hand-built grid. The configured initial counts are
    /// ignored; the population is whatever the grid holds.
    pub fn from_grid(config: WatorConfig, grid: Grid) -> Result<Self> {
        config.validate()?;

        if grid.width() != config.width as usize || grid.height() != config.height as usize {
            return Err(Error::Config(format!(
                "grid is {}x{} but the configuration asks for {}x{}",
                grid.width(),
                grid.height(),
                config.width,
                config.height
            )));
        }

        Self::with_grid(config, grid)
    }

    fn with_grid(config: WatorConfig, grid: Grid) -> Result<Self> {
        let scheduler = Scheduler::new(grid.height(), config.worker_count as usize, config.seed)?;
        let population = grid.census();

        info!(
            width = grid.width(),
            height = grid.height(),
            fish = population.fish,
            sharks = population.sharks,
            workers = config.worker_count,
            bands = scheduler.bands().len(),
            seed = config.seed,
            "Simulation initialized"
        );

        Ok(Self {
            rules: Rules::from_config(&config),
            grid,
            scheduler,
            chronon: 0,
            population,
            last_stats: ChrononStats::default(),
            totals: ChrononStats::default(),
            peak: population,
        })
    }

    /// Advance one chronon and return the new population.
    pub fn step(&mut self) -> Population {
        self.chronon += 1;
        let stats = self
            .scheduler
            .run_chronon(&mut self.grid, &self.rules, self.chronon);

        let before = self.population;
        self.population = Population {
            fish: before.fish + stats.fish_born - stats.fish_eaten,
            sharks: before.sharks + stats.sharks_born - stats.sharks_starved,
        };
        debug_assert_eq!(
            self.population,
            self.grid.census(),
            "population tally diverged from the grid"
        );

        self.last_stats = stats;
        self.totals += stats;
        self.peak.fish = self.peak.fish.max(self.population.fish);
        self.peak.sharks = self.peak.sharks.max(self.population.sharks);

        debug!(
            chronon = self.chronon,
            fish = self.population.fish,
            sharks = self.population.sharks,
            fish_born = stats.fish_born,
            sharks_born = stats.sharks_born,
            fish_eaten = stats.fish_eaten,
            sharks_starved = stats.sharks_starved,
            "Chronon complete"
        );

        if before.fish > 0 && self.population.fish == 0 {
            info!(chronon = self.chronon, species = %Species::Fish, "Species extinct");
        }
        if before.sharks > 0 && self.population.sharks == 0 {
            info!(chronon = self.chronon, species = %Species::Shark, "Species extinct");
        }

        self.population
    }

    /// Run `chronons` steps, logging population metrics every `log_interval`
    /// chronons (never when zero).
    #[instrument(skip(self), fields(start = self.chronon))]
    pub fn run(&mut self, chronons: u64, log_interval: u64) -> RunSummary {
        info!("Starting simulation for {} chronons", chronons);

        for _ in 0..chronons {
            self.step();

            if log_interval > 0 && self.chronon % log_interval == 0 {
                self.emit_population_metrics();
            }
        }

        let summary = self.summary(chronons);
        info!(
            event = "run_summary",
            chronons = summary.chronons,
            final_chronon = summary.final_chronon,
            fish = summary.population.fish,
            sharks = summary.population.sharks,
            peak_fish = summary.peak.fish,
            peak_sharks = summary.peak.sharks,
            total_fish_born = summary.totals.fish_born,
            total_sharks_born = summary.totals.sharks_born,
            total_fish_eaten = summary.totals.fish_eaten,
            total_sharks_starved = summary.totals.sharks_starved,
            "Simulation run complete"
        );
        summary
    }

    fn emit_population_metrics(&self) {
        info!(
            event = "population_metrics",
            chronon = self.chronon,
            fish = self.population.fish,
            sharks = self.population.sharks,
            fish_born = self.last_stats.fish_born,
            sharks_born = self.last_stats.sharks_born,
            fish_eaten = self.last_stats.fish_eaten,
            sharks_starved = self.last_stats.sharks_starved,
            "Population metrics snapshot"
        );

        event!(
            Level::INFO,
            gauge_name = "population_fish",
            gauge_value = self.population.fish,
            chronon = self.chronon,
            "Fish population gauge"
        );

        event!(
            Level::INFO,
            gauge_name = "population_sharks",
            gauge_value = self.population.sharks,
            chronon = self.chronon,
            "Shark population gauge"
        );
    }

    fn summary(&self, chronons: u64) -> RunSummary {
        RunSummary {
            chronons,
            final_chronon: self.chronon,
            population: self.population,
            peak: self.peak,
            totals: self.totals,
        }
    }

    /// Owned copy of every occupied cell for rendering
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.grid, self.chronon, self.population)
    }

    /// Audit the grid against the tallied population and per-creature
    /// invariants.
    pub fn check_consistency(&self) -> Result<()> {
        let census = self.grid.census();
        if census != self.population {
            return Err(Error::InternalConsistency(format!(
                "tally says {:?} but the grid holds {:?}",
                self.population, census
            )));
        }

        for (pos, creature) in self.grid.creatures() {
            if creature.last_processed != self.chronon {
                return Err(Error::InternalConsistency(format!(
                    "{} at {} was last processed in chronon {} but the clock reads {}",
                    creature.species, pos, creature.last_processed, self.chronon
                )));
            }
            if creature.is_shark()
                && (creature.health <= 0 || creature.health > self.rules.starve_threshold)
            {
                return Err(Error::InternalConsistency(format!(
                    "shark at {} has health {}",
                    pos, creature.health
                )));
            }
        }

        Ok(())
    }

    pub fn population(&self) -> Population {
        self.population
    }

    pub fn chronon(&self) -> u64 {
        self.chronon
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Births and deaths in the most recent chronon
    pub fn last_stats(&self) -> ChrononStats {
        self.last_stats
    }

    /// Births and deaths accumulated since construction
    pub fn totals(&self) -> ChrononStats {
        self.totals
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub chronons: u64,
    pub final_chronon: u64,
    pub population: Population,
    pub peak: Population,
    pub totals: ChrononStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;
    use proptest::prelude::*;
    use wator_core::Position;

    fn small_config() -> WatorConfig {
        WatorConfig {
            width: 24,
            height: 20,
            initial_fish: 150,
            initial_sharks: 30,
            fish_breed_age: 3,
            shark_breed_age: 8,
            shark_starve_threshold: 4,
            worker_count: 1,
            seed: 42,
        }
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.chronon(), 0);
        assert_eq!(sim.population(), Population::new(150, 30));
        assert!(sim.check_consistency().is_ok());
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = WatorConfig {
            shark_breed_age: 0,
            ..small_config()
        };
        assert!(matches!(Simulation::new(config), Err(Error::Config(_))));

        let config = WatorConfig {
            initial_fish: 480,
            ..small_config()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(Error::InsufficientSpace {
                requested: 510,
                capacity: 480
            })
        ));
    }

    #[test]
    fn test_from_grid_checks_dimensions() {
        let config = WatorConfig {
            width: 5,
            height: 5,
            ..small_config()
        };
        assert!(matches!(
            Simulation::from_grid(config, Grid::new(5, 6)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_step_keeps_invariants() {
        let mut sim = Simulation::new(small_config()).unwrap();
        for _ in 0..50 {
            let before = sim.population();
            let after = sim.step();
            let stats = sim.last_stats();

            assert_eq!(
                after.total(),
                before.total() + stats.fish_born + stats.sharks_born
                    - stats.fish_eaten
                    - stats.sharks_starved
            );
            sim.check_consistency().unwrap();
        }
        assert_eq!(sim.chronon(), 50);
    }

    #[test]
    fn test_lone_shark_starves() {
        let config = WatorConfig {
            width: 10,
            height: 10,
            initial_fish: 0,
            initial_sharks: 1,
            fish_breed_age: 3,
            shark_breed_age: 10,
            shark_starve_threshold: 3,
            worker_count: 1,
            seed: 0,
        };
        let mut grid = Grid::new(10, 10);
        grid.place(Position::new(5, 5), Creature::shark(0, 3, 0)).unwrap();
        let mut sim = Simulation::from_grid(config, grid).unwrap();

        let health = |sim: &Simulation| {
            sim.grid()
                .creatures()
                .map(|(_, c)| c.health)
                .next()
        };
        assert_eq!(health(&sim), Some(3));

        sim.step();
        assert_eq!(health(&sim), Some(2));
        sim.step();
        assert_eq!(health(&sim), Some(1));

        let population = sim.step();
        assert_eq!(population, Population::new(0, 0));
        assert_eq!(sim.last_stats().sharks_starved, 1);

        for _ in 0..5 {
            assert_eq!(sim.step().sharks, 0);
        }
    }

    #[test]
    fn test_saturated_fish_grid_is_frozen() {
        let config = WatorConfig {
            width: 3,
            height: 3,
            initial_fish: 9,
            initial_sharks: 0,
            fish_breed_age: 1,
            worker_count: 2,
            ..small_config()
        };
        let mut sim = Simulation::new(config).unwrap();

        for _ in 0..25 {
            assert_eq!(sim.step(), Population::new(9, 0));
        }
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.creatures.len(), 9);
        assert!(snapshot
            .iter()
            .all(|c| (0..3).contains(&c.x) && (0..3).contains(&c.y)));
    }

    #[test]
    fn test_empty_ocean_stays_empty() {
        let config = WatorConfig {
            initial_fish: 0,
            initial_sharks: 0,
            worker_count: 4,
            ..small_config()
        };
        let mut sim = Simulation::new(config).unwrap();
        for _ in 0..20 {
            assert_eq!(sim.step(), Population::new(0, 0));
        }
        assert_eq!(sim.totals(), ChrononStats::default());
    }

    #[test]
    fn test_worker_counts_agree() {
        let run = |workers: i32| {
            let config = WatorConfig {
                width: 40,
                height: 30,
                initial_fish: 300,
                initial_sharks: 40,
                worker_count: workers,
                seed: 1234,
                ..small_config()
            };
            let mut sim = Simulation::new(config).unwrap();
            let summary = sim.run(60, 0);
            (summary.population, sim.snapshot().creatures)
        };

        let (single, single_cells) = run(1);
        let (parallel, parallel_cells) = run(4);
        assert_eq!(single, parallel);
        assert_eq!(single_cells, parallel_cells);
    }

    #[test]
    fn test_run_summary() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let summary = sim.run(10, 5);
        assert_eq!(summary.chronons, 10);
        assert_eq!(summary.final_chronon, 10);
        assert_eq!(summary.population, sim.population());
        assert!(summary.peak.fish >= 150);
        assert!(summary.peak.sharks >= summary.population.sharks);
    }

    #[test]
    fn test_snapshot_matches_population() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.run(5, 0);
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.chronon, 5);
        let fish = snapshot.iter().filter(|c| c.species == Species::Fish).count();
        let sharks = snapshot.iter().filter(|c| c.species == Species::Shark).count();
        assert_eq!(Population::new(fish, sharks), sim.population());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_population_accounting_holds(
            seed in any::<u64>(),
            width in 1i32..16,
            height in 1i32..16,
            density in 0.0f64..1.0,
            shark_share in 0.0f64..1.0,
            fish_breed_age in 1i32..6,
            shark_breed_age in 1i32..10,
            starve in 1i32..6,
            workers in 1i32..5,
        ) {
            let capacity = (width * height) as f64;
            let total = (capacity * density) as i32;
            let sharks = (total as f64 * shark_share) as i32;
            let config = WatorConfig {
                width,
                height,
                initial_fish: total - sharks,
                initial_sharks: sharks,
                fish_breed_age,
                shark_breed_age,
                shark_starve_threshold: starve,
                worker_count: workers,
                seed,
            };
            let mut sim = Simulation::new(config).unwrap();

            for _ in 0..15 {
                let before = sim.population();
                let after = sim.step();
                let stats = sim.last_stats();
                prop_assert_eq!(
                    after.total() + stats.fish_eaten + stats.sharks_starved,
                    before.total() + stats.fish_born + stats.sharks_born
                );
                prop_assert!(after.total() <= (width * height) as usize);
                prop_assert!(sim.check_consistency().is_ok());
            }
        }
    }
}
