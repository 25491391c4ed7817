use itertools::Itertools;

use crate::data::Snapshot;
use crate::timetable::Timetable;

/// Penalty for a cell with no course bound.
pub const EMPTY_CELL_PENALTY: u32 = 10;

/// Counts constraint violations in `timetable`.
///
/// - each unordered pair sharing a cell and a room: +1
/// - each unordered pair sharing a cell and an instructor: +1 (independent of the room rule)
/// - each assignment whose room is smaller than its course needs: +1
/// - each assignment without a course: +[`EMPTY_CELL_PENALTY`]
pub fn count_violations(timetable: &Timetable, snapshot: &Snapshot) -> u32 {
    let assignments = timetable.assignments();

    let pair_violations: u32 = (0..assignments.len())
        .tuple_combinations::<(usize, usize)>()
        .map(|(i, j)| assignments[i].collides_with(&assignments[j]).count())
        .sum();

    let cell_violations: u32 = assignments
        .iter()
        .map(|assignment| {
            let Some(course_id) = assignment.course_id() else {
                return EMPTY_CELL_PENALTY;
            };
            let course = snapshot.course(course_id);
            let room = assignment.room_id().and_then(|id| snapshot.room(id));
            match (course, room) {
                (Some(course), Some(room)) if room.capacity < course.capacity => 1,
                _ => 0,
            }
        })
        .sum();

    pair_violations + cell_violations
}

pub fn fitness_from_violations(violations: u32) -> f64 {
    1.0 / (f64::from(violations) + 1.0)
}

/// Fitness in (0, 1]; exactly 1.0 only for a full, conflict-free timetable.
pub fn evaluate(timetable: &Timetable, snapshot: &Snapshot) -> f64 {
    fitness_from_violations(count_violations(timetable, snapshot))
}
