//! Runtime configuration, read from the environment over built-in defaults.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SchedulerError;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Genetic algorithm settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Per-cell probability of redrawing the occupant.
    pub mutation_rate: f64,
    /// Candidates carried unchanged into the next generation.
    pub elite_count: usize,
    /// Fixed seed for reproducible runs; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            elite_count: 2,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.population_size == 0 {
            return Err(SchedulerError::Config(
                "population size must be at least 1".to_string(),
            ));
        }
        // Without an elite the best fitness can fall between generations.
        if self.elite_count == 0 {
            return Err(SchedulerError::Config(
                "elite count must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(SchedulerError::Config(format!(
                "mutation rate {} is outside [0, 1]",
                self.mutation_rate
            )));
        }
        Ok(())
    }

    /// The random source for one run.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Process-level settings for the server binary.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// JSON file with `courses`, `rooms` and `users` to seed the store with.
    pub catalog_path: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            catalog_path: None,
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, SchedulerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SchedulerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(addr) = lookup("SCHEDULER_ADDR") {
            config.bind_addr = addr;
        }
        config.catalog_path = lookup("SCHEDULER_CATALOG").map(PathBuf::from);

        if let Some(size) = parse_var(&lookup, "SCHEDULER_POPULATION")? {
            config.engine.population_size = size;
        }
        if let Some(generations) = parse_var(&lookup, "SCHEDULER_GENERATIONS")? {
            config.engine.generations = generations;
        }
        if let Some(rate) = parse_var(&lookup, "SCHEDULER_MUTATION_RATE")? {
            config.engine.mutation_rate = rate;
        }
        config.engine.seed = parse_var(&lookup, "SCHEDULER_SEED")?;

        config.engine.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, SchedulerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SchedulerError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}
