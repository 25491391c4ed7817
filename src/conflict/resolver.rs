//! Deterministic repair pass over detected conflicts.
//!
//! For each conflict only the second assignment of the pair moves:
//! 1. room conflicts first try another room at the same cell,
//! 2. then the instructor's available cells are tried in order,
//! 3. otherwise the assignment is parked as unscheduled with no room.
//!
//! The resolver mutates one schedule and holds no locks; the caller runs at
//! most one pass per schedule at a time.

use log::{debug, info, warn};
use serde::Serialize;

use crate::conflict::{Conflict, ConflictKind, Resolution};
use crate::data::{Room, Snapshot};
use crate::grid::GridCell;
use crate::notify::Notifier;
use crate::timetable::{Placement, Schedule, Timetable};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOutcome {
    pub schedule: Schedule,
    /// One entry per input conflict, in input order.
    pub resolutions: Vec<(Conflict, Resolution)>,
    /// Conflicts left unresolved; empty when every repair succeeded.
    pub residual: Vec<Conflict>,
}

pub struct ConflictResolver<'a> {
    snapshot: &'a Snapshot,
    notifier: &'a dyn Notifier,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(snapshot: &'a Snapshot, notifier: &'a dyn Notifier) -> Self {
        Self { snapshot, notifier }
    }

    /// Attempts a repair for every conflict. If anything is left unresolved the
    /// notifier is called once with the count. Persisting the returned
    /// schedule is up to the caller.
    pub fn resolve(&self, mut schedule: Schedule, conflicts: &[Conflict]) -> ResolveOutcome {
        let mut resolutions = Vec::with_capacity(conflicts.len());
        let mut residual = Vec::new();

        for conflict in conflicts {
            let resolution = self.resolve_one(&mut schedule.timetable, conflict);
            debug!("{} -> {:?}", conflict, resolution);
            if resolution == Resolution::Unresolved {
                residual.push(*conflict);
            }
            resolutions.push((*conflict, resolution));
        }

        if residual.is_empty() {
            info!("Resolved all {} conflicts", conflicts.len());
        } else {
            let message = format!(
                "There are {} unresolved conflicts in the schedule. Please review and resolve manually.",
                residual.len()
            );
            warn!("{}", message);
            self.notifier.notify(&message);
        }

        ResolveOutcome {
            schedule,
            resolutions,
            residual,
        }
    }

    fn resolve_one(&self, timetable: &mut Timetable, conflict: &Conflict) -> Resolution {
        let [first, second] = conflict.slots;
        let still_colliding = match (timetable.get(first), timetable.get(second)) {
            (Some(a), Some(b)) => {
                let collision = a.collides_with(b);
                match conflict.kind {
                    ConflictKind::Room => collision.room,
                    ConflictKind::Instructor => collision.instructor,
                }
            }
            _ => false,
        };
        if !still_colliding {
            return Resolution::Cleared;
        }

        // A different room cannot separate two sessions of the same instructor.
        if conflict.kind == ConflictKind::Room {
            if let Some(room) = self.find_room(timetable, second) {
                let room_ref = self.snapshot.room_ref(room);
                if let Some(assignment) = timetable.get_mut(second) {
                    assignment.room = Some(room_ref);
                }
                return Resolution::Room(room.id);
            }
        }

        if let Some(cell) = self.find_cell(timetable, second) {
            if let Some(assignment) = timetable.get_mut(second) {
                assignment.placement = Placement::Scheduled(cell);
            }
            return Resolution::Reschedule(cell);
        }

        if let Some(assignment) = timetable.get_mut(second) {
            assignment.placement = Placement::Unscheduled;
            assignment.room = None;
        }
        Resolution::Unresolved
    }

    /// First room, in catalog order, big enough for the course and free at the
    /// assignment's cell.
    fn find_room(&self, timetable: &Timetable, index: usize) -> Option<&'a Room> {
        let target = timetable.get(index)?;
        let cell = target.cell()?;
        let course = self.snapshot.course(target.course_id()?)?;

        self.snapshot
            .rooms()
            .iter()
            .filter(|room| room.capacity >= course.capacity)
            .filter(|room| target.room_id() != Some(room.id))
            .find(|room| {
                !timetable
                    .iter()
                    .enumerate()
                    .any(|(k, other)| k != index && other.blocks(cell, Some(room.id), None))
            })
    }

    /// First cell the instructor is available in where neither the room nor
    /// the instructor is already taken.
    fn find_cell(&self, timetable: &Timetable, index: usize) -> Option<GridCell> {
        let target = timetable.get(index)?;
        let instructor_id = target.instructor_id()?;
        let instructor = self.snapshot.instructor(instructor_id)?;
        let room_id = target.room_id();

        instructor.available_cells().into_iter().find(|&cell| {
            !timetable
                .iter()
                .enumerate()
                .any(|(k, other)| k != index && other.blocks(cell, room_id, Some(instructor_id)))
        })
    }
}
