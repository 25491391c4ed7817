//! Genetic search for an initial timetable.
//!
//! - [`population`]: random candidates over the grid
//! - [`fitness`]: violation counting and scoring
//! - [`operators`]: roulette-wheel selection, uniform crossover, per-cell mutation
//! - [`evolution`]: the generation loop with elitism

pub mod evolution;
pub mod fitness;
pub mod operators;
pub mod population;

use log::info;
use rand::Rng;

use crate::config::EngineConfig;
use crate::data::Snapshot;
use crate::error::SchedulerError;
use crate::timetable::Schedule;

pub use evolution::{Evolution, EvolutionOutcome, Generation};
pub use fitness::{count_violations, evaluate, fitness_from_violations};

/// Runs the genetic search and wraps the best candidate as an unsaved schedule.
pub fn generate_schedule<R: Rng + ?Sized>(
    snapshot: &Snapshot,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<(Schedule, EvolutionOutcome), SchedulerError> {
    let outcome = Evolution::new(snapshot, config).run(rng)?;
    info!(
        "Best schedule fitness: {:.4} ({} violations)",
        outcome.best.fitness, outcome.violations
    );

    let schedule = Schedule {
        id: None,
        courses: snapshot.courses().iter().map(|c| c.id).collect(),
        rooms: snapshot.rooms().iter().map(|r| r.id).collect(),
        timetable: outcome.best.timetable.clone(),
        fitness: outcome.best.fitness,
    };
    Ok((schedule, outcome))
}
