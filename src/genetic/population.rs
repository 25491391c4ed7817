use log::debug;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::data::Snapshot;
use crate::error::SchedulerError;
use crate::grid::{self, GridCell};
use crate::timetable::{Assignment, Candidate, Placement, Timetable};

/// Binds `cell` to a uniformly drawn course and room.
///
/// Returns `None` only when the catalog has no courses or no rooms.
pub fn random_assignment<R: Rng + ?Sized>(
    cell: GridCell,
    snapshot: &Snapshot,
    rng: &mut R,
) -> Option<Assignment> {
    let course = snapshot.courses().choose(rng)?;
    let room = snapshot.rooms().choose(rng)?;
    Some(Assignment {
        course: Some(snapshot.course_ref(course)),
        room: Some(snapshot.room_ref(room)),
        placement: Placement::Scheduled(cell),
    })
}

/// One random timetable covering every grid cell.
pub fn random_timetable<R: Rng + ?Sized>(
    snapshot: &Snapshot,
    rng: &mut R,
) -> Result<Timetable, SchedulerError> {
    snapshot.ensure_catalog()?;
    grid::cells()
        .map(|cell| random_assignment(cell, snapshot, rng))
        .collect::<Option<Timetable>>()
        .ok_or(SchedulerError::EmptyCatalog {
            courses: snapshot.courses().len(),
            rooms: snapshot.rooms().len(),
        })
}

/// `size` unscored random candidates.
pub fn initial_population<R: Rng + ?Sized>(
    snapshot: &Snapshot,
    size: usize,
    rng: &mut R,
) -> Result<Vec<Candidate>, SchedulerError> {
    snapshot.ensure_catalog()?;
    debug!(
        "Seeding {} candidates from {} courses and {} rooms",
        size,
        snapshot.courses().len(),
        snapshot.rooms().len()
    );
    (0..size)
        .map(|_| random_timetable(snapshot, rng).map(Candidate::unscored))
        .collect()
}
