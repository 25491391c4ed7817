use itertools::Itertools;
use log::debug;

use crate::conflict::{Conflict, ConflictKind};
use crate::timetable::Timetable;

/// Every room and instructor collision in `timetable`.
///
/// Pairs come out in `(i, j)` order with `i < j`; a pair hitting both rules
/// yields the room conflict first. Read-only, so repeated calls on the same
/// timetable return the same list.
pub fn detect_conflicts(timetable: &Timetable) -> Vec<Conflict> {
    let assignments = timetable.assignments();
    let conflicts: Vec<Conflict> = (0..assignments.len())
        .tuple_combinations::<(usize, usize)>()
        .flat_map(|(i, j)| {
            let collision = assignments[i].collides_with(&assignments[j]);
            let room = collision.room.then_some(Conflict {
                kind: ConflictKind::Room,
                slots: [i, j],
            });
            let instructor = collision.instructor.then_some(Conflict {
                kind: ConflictKind::Instructor,
                slots: [i, j],
            });
            room.into_iter().chain(instructor)
        })
        .collect();

    debug!(
        "Detected {} conflicts across {} assignments",
        conflicts.len(),
        assignments.len()
    );
    conflicts
}
