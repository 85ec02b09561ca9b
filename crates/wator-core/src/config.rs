//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Ocean and population parameters, fixed for the lifetime of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatorConfig {
    /// Width of the ocean grid
    pub width: i32,
    /// Height of the ocean grid
    pub height: i32,
    /// Fish placed at startup
    pub initial_fish: i32,
    /// Sharks placed at startup
    pub initial_sharks: i32,
    /// A fish breeds every time its age is a multiple of this
    pub fish_breed_age: i32,
    /// A shark breeds every time its age is a multiple of this
    pub shark_breed_age: i32,
    /// Health a shark starts with and is restored to after eating
    pub shark_starve_threshold: i32,
    /// Threads cooperating on one chronon
    pub worker_count: i32,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for WatorConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            initial_fish: 6000,
            initial_sharks: 600,
            fish_breed_age: 150,
            shark_breed_age: 150,
            shark_starve_threshold: 150,
            worker_count: 4,
            seed: 0,
        }
    }
}

impl WatorConfig {
    /// Number of cells in the ocean
    pub fn capacity(&self) -> usize {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        self.width as usize * self.height as usize
    }

    /// Requested starting population
    pub fn requested_population(&self) -> usize {
        self.initial_fish.max(0) as usize + self.initial_sharks.max(0) as usize
    }

    /// Reject parameters the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("fish_breed_age", self.fish_breed_age),
            ("shark_breed_age", self.shark_breed_age),
            ("shark_starve_threshold", self.shark_starve_threshold),
            ("worker_count", self.worker_count),
        ];
        for (name, value) in positive {
            if value <= 0 {
                return Err(Error::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("initial_fish", self.initial_fish),
            ("initial_sharks", self.initial_sharks),
        ];
        for (name, value) in non_negative {
            if value < 0 {
                return Err(Error::Config(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Validate and additionally check the starting population fits the grid.
    pub fn validate_population(&self) -> Result<()> {
        self.validate()?;

        let requested = self.requested_population();
        let capacity = self.capacity();
        if requested > capacity {
            return Err(Error::InsufficientSpace {
                requested,
                capacity,
            });
        }

        Ok(())
    }
}

/// Headless run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of chronons to simulate
    pub num_chronons: u64,
    /// Emit population metrics every this many chronons (0 disables)
    pub log_interval: u64,
    /// Ocean configuration
    pub world: WatorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_chronons: 1_000,
            log_interval: 100,
            world: WatorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a run configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&contents)?;
        info!(path = %path.display(), "Loaded run configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = WatorConfig::default();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 240);
        assert_eq!(config.fish_breed_age, 150);
        assert!(config.validate_population().is_ok());

        let run_config = RunConfig::default();
        assert_eq!(run_config.num_chronons, 1_000);
    }

    #[test]
    fn test_rejects_non_positive_parameters() {
        let config = WatorConfig {
            fish_breed_age: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = WatorConfig {
            shark_starve_threshold: -1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = WatorConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = WatorConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = WatorConfig {
            initial_sharks: -5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_overpopulation() {
        let config = WatorConfig {
            width: 3,
            height: 3,
            initial_fish: 9,
            initial_sharks: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.validate_population(),
            Err(Error::InsufficientSpace {
                requested: 10,
                capacity: 9
            })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "num_chronons": 50, "world": { "width": 16, "height": 8 } }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.num_chronons, 50);
        assert_eq!(config.log_interval, 100);
        assert_eq!(config.world.width, 16);
        assert_eq!(config.world.height, 8);
        assert_eq!(config.world.shark_breed_age, 150);
    }
}
