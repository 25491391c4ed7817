//! The generation loop.
//!
//! `Init -> Evaluate -> Sort -> Elitism-Seed -> Breed -> (Evaluate ...) -> Terminate`
//!
//! Generations are sequential. Scoring and breeding within one generation run
//! on the rayon pool; collecting the results is the barrier before the next
//! step. Each child gets its own RNG seeded from the controller's RNG, so a
//! fixed seed gives the same run regardless of thread count.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::data::Snapshot;
use crate::error::SchedulerError;
use crate::genetic::fitness::{count_violations, evaluate};
use crate::genetic::operators::{crossover, mutate, select_parent};
use crate::genetic::population::initial_population;
use crate::timetable::Candidate;

/// One generation of the population. A loop step consumes it and returns the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub index: usize,
    pub candidates: Vec<Candidate>,
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    pub best: Candidate,
    pub violations: u32,
    /// Best fitness after each evaluation, including the final one.
    pub best_fitness_history: Vec<f64>,
    pub elapsed: Duration,
}

pub struct Evolution<'a> {
    snapshot: &'a Snapshot,
    config: &'a EngineConfig,
}

impl<'a> Evolution<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a EngineConfig) -> Self {
        Self { snapshot, config }
    }

    /// Runs exactly `config.generations` generations; there is no early exit,
    /// even once a perfect candidate shows up.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<EvolutionOutcome, SchedulerError> {
        let start_time = Instant::now();
        self.config.validate()?;
        info!(
            "Starting schedule generation: {} courses, {} rooms, {} instructors",
            self.snapshot.courses().len(),
            self.snapshot.rooms().len(),
            self.snapshot.instructors().len()
        );

        let mut generation = Generation {
            index: 0,
            candidates: initial_population(self.snapshot, self.config.population_size, rng)?,
        };
        let mut best_fitness_history = Vec::with_capacity(self.config.generations + 1);

        for _ in 0..self.config.generations {
            let ranked = self.rank(generation);
            let best = ranked.candidates.first().map_or(0.0, |c| c.fitness);
            debug!("Generation {}: best fitness {:.4}", ranked.index, best);
            best_fitness_history.push(best);
            generation = self.breed(&ranked, rng);
        }

        let ranked = self.rank(generation);
        let best = ranked
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| SchedulerError::Config("population is empty".to_string()))?;
        best_fitness_history.push(best.fitness);

        let violations = count_violations(&best.timetable, self.snapshot);
        let elapsed = start_time.elapsed();
        info!(
            "Finished {} generations in {:.2?}; best fitness {:.4}",
            self.config.generations, elapsed, best.fitness
        );

        Ok(EvolutionOutcome {
            best,
            violations,
            best_fitness_history,
            elapsed,
        })
    }

    /// Scores every candidate in parallel and sorts by fitness, best first.
    /// The sort is stable, so equal candidates keep their order.
    pub fn rank(&self, generation: Generation) -> Generation {
        let mut candidates: Vec<Candidate> = generation
            .candidates
            .into_par_iter()
            .map(|candidate| {
                let fitness = evaluate(&candidate.timetable, self.snapshot);
                Candidate {
                    timetable: candidate.timetable,
                    fitness,
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        Generation {
            index: generation.index,
            candidates,
        }
    }

    /// Builds the next generation from a ranked one: the elite are copied as
    /// they are, the rest come from selection, crossover and mutation.
    pub fn breed<R: Rng + ?Sized>(&self, ranked: &Generation, rng: &mut R) -> Generation {
        let size = self.config.population_size;
        let elite = self.config.elite_count.min(ranked.candidates.len()).min(size);

        let mut candidates: Vec<Candidate> = ranked.candidates[..elite].to_vec();
        let seeds: Vec<u64> = (elite..size).map(|_| rng.random()).collect();
        let children: Vec<Candidate> = seeds
            .into_par_iter()
            .filter_map(|seed| self.breed_child(&ranked.candidates, seed))
            .collect();
        candidates.extend(children);

        Generation {
            index: ranked.index + 1,
            candidates,
        }
    }

    fn breed_child(&self, parents: &[Candidate], seed: u64) -> Option<Candidate> {
        let mut rng = StdRng::seed_from_u64(seed);
        let first = select_parent(parents, &mut rng)?;
        let second = select_parent(parents, &mut rng)?;
        let child = crossover(first, second, &mut rng);
        Some(mutate(child, self.snapshot, self.config.mutation_rate, &mut rng))
    }
}
