//! Selection, crossover and mutation.
//!
//! Every operator takes its random source explicitly so a fixed seed gives a
//! fixed result.

use log::warn;
use rand::Rng;

use crate::data::Snapshot;
use crate::genetic::population::random_assignment;
use crate::timetable::{Assignment, Candidate, Timetable};

/// Fitness-proportionate ("roulette wheel") parent selection.
///
/// Draws `r` in `[0, total fitness)` and walks the population in order,
/// subtracting each fitness until the remainder drops to zero or below. When
/// rounding keeps the remainder positive the last candidate is returned.
/// `None` only for an empty population.
pub fn select_parent<'a, R: Rng + ?Sized>(
    population: &'a [Candidate],
    rng: &mut R,
) -> Option<&'a Candidate> {
    let total: f64 = population.iter().map(|c| c.fitness).sum();
    let mut remainder = rng.random::<f64>() * total;
    for candidate in population {
        remainder -= candidate.fitness;
        if remainder <= 0.0 {
            return Some(candidate);
        }
    }
    population.last()
}

/// Uniform per-cell crossover: each cell comes from `first` with probability
/// 0.5, otherwise from `second`.
///
/// Parents must share the grid ordering. If they do not even have the same
/// length, the child is a copy of `first`.
pub fn crossover<R: Rng + ?Sized>(first: &Candidate, second: &Candidate, rng: &mut R) -> Candidate {
    if first.timetable.len() != second.timetable.len() {
        warn!(
            "Crossover parents differ in length ({} vs {}); copying the first parent",
            first.timetable.len(),
            second.timetable.len()
        );
        return Candidate::unscored(first.timetable.clone());
    }

    let timetable: Timetable = first
        .timetable
        .iter()
        .zip(second.timetable.iter())
        .map(|(a, b)| if rng.random_bool(0.5) { a.clone() } else { b.clone() })
        .collect();
    Candidate::unscored(timetable)
}

/// Redraws the course and room of each cell with probability `rate`. Day and
/// start time never change.
///
/// A candidate whose timetable does not cover the grid exactly once is handed
/// back untouched.
pub fn mutate<R: Rng + ?Sized>(
    candidate: Candidate,
    snapshot: &Snapshot,
    rate: f64,
    rng: &mut R,
) -> Candidate {
    if !candidate.timetable.is_well_formed() {
        warn!(
            "Skipping mutation of malformed candidate ({} assignments)",
            candidate.timetable.len()
        );
        return candidate;
    }

    let timetable: Timetable = candidate
        .timetable
        .into_assignments()
        .into_iter()
        .map(|assignment| {
            if rng.random::<f64>() >= rate {
                return assignment;
            }
            redraw(&assignment, snapshot, rng).unwrap_or(assignment)
        })
        .collect();
    Candidate::unscored(timetable)
}

fn redraw<R: Rng + ?Sized>(assignment: &Assignment, snapshot: &Snapshot, rng: &mut R) -> Option<Assignment> {
    let cell = assignment.cell()?;
    random_assignment(cell, snapshot, rng)
}
