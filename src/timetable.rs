//! Assignments, timetables, candidates and persisted schedules.

use serde::{Deserialize, Serialize};

use crate::data::{CourseId, InstructorId, RoomId, ScheduleId};
use crate::grid::{self, CELL_COUNT, GridCell, TimeSlot};

/// The course's owning instructor. The id always comes from the course; the
/// name is only known when the instructor's user record was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstructorRef {
    pub id: InstructorId,
    #[serde(default)]
    pub name: Option<String>,
}

/// Course fields embedded in an assignment so scoring never needs a join.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CourseRef {
    pub id: CourseId,
    pub name: String,
    pub instructor: InstructorRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoomRef {
    pub id: RoomId,
    pub name: String,
}

/// Where an assignment sits on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Placement {
    Scheduled(GridCell),
    /// Left by the conflict resolver when no repair was possible.
    Unscheduled,
}

/// One grid cell bound to an optional course and room.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Assignment {
    pub course: Option<CourseRef>,
    pub room: Option<RoomRef>,
    pub placement: Placement,
}

/// Which collision rules fire for a pair of assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Collision {
    pub room: bool,
    pub instructor: bool,
}

impl Collision {
    pub fn any(&self) -> bool {
        self.room || self.instructor
    }

    pub fn count(&self) -> u32 {
        u32::from(self.room) + u32::from(self.instructor)
    }
}

impl Assignment {
    /// An explicitly empty cell.
    pub fn empty(cell: GridCell) -> Self {
        Self {
            course: None,
            room: None,
            placement: Placement::Scheduled(cell),
        }
    }

    pub fn cell(&self) -> Option<GridCell> {
        match self.placement {
            Placement::Scheduled(cell) => Some(cell),
            Placement::Unscheduled => None,
        }
    }

    pub fn end_time(&self) -> Option<TimeSlot> {
        self.cell().map(|c| c.end_time())
    }

    pub fn course_id(&self) -> Option<CourseId> {
        self.course.as_ref().map(|c| c.id)
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.room.as_ref().map(|r| r.id)
    }

    pub fn instructor_id(&self) -> Option<InstructorId> {
        self.course.as_ref().map(|c| c.instructor.id)
    }

    /// Room and instructor rules for two assignments. Both need a course and a
    /// grid cell, and the cells must match; the two rules are independent.
    pub fn collides_with(&self, other: &Assignment) -> Collision {
        if self.course.is_none() || other.course.is_none() {
            return Collision::default();
        }
        match (self.cell(), other.cell()) {
            (Some(a), Some(b)) if a == b => {}
            _ => return Collision::default(),
        }

        let room = matches!((self.room_id(), other.room_id()), (Some(a), Some(b)) if a == b);
        let instructor = matches!(
            (self.instructor_id(), other.instructor_id()),
            (Some(a), Some(b)) if a == b
        );
        Collision { room, instructor }
    }

    /// Whether this assignment sits in `cell` and either uses `room` or is
    /// taught by `instructor`.
    pub fn blocks(&self, cell: GridCell, room: Option<RoomId>, instructor: Option<InstructorId>) -> bool {
        if self.cell() != Some(cell) {
            return false;
        }
        let same_room = room.is_some() && self.room_id() == room;
        let same_instructor = instructor.is_some() && self.instructor_id() == instructor;
        same_room || same_instructor
    }
}

/// An ordered list of assignments.
///
/// Candidates built by the engine hold exactly one assignment per grid cell, in
/// grid order. Persisted schedules may drift from that after repairs or edits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Timetable {
    assignments: Vec<Assignment>,
}

impl Timetable {
    pub fn new(assignments: Vec<Assignment>) -> Self {
        Self { assignments }
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn into_assignments(self) -> Vec<Assignment> {
        self.assignments
    }

    pub fn get(&self, index: usize) -> Option<&Assignment> {
        self.assignments.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Assignment> {
        self.assignments.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.assignments.iter()
    }

    /// True when there is exactly one assignment per grid cell, in grid order.
    pub fn is_well_formed(&self) -> bool {
        self.assignments.len() == CELL_COUNT
            && self
                .assignments
                .iter()
                .zip(grid::cells())
                .all(|(a, cell)| a.cell() == Some(cell))
    }

    /// A copy in grid order where every cell nobody occupies gets an explicit
    /// empty assignment. Unscheduled assignments are appended after the grid.
    pub fn filled(&self) -> Timetable {
        let mut by_cell: Vec<Vec<&Assignment>> = vec![Vec::new(); CELL_COUNT];
        let mut unscheduled = Vec::new();
        for assignment in &self.assignments {
            match assignment.cell() {
                Some(cell) => by_cell[cell.index()].push(assignment),
                None => unscheduled.push(assignment.clone()),
            }
        }

        let mut assignments = Vec::with_capacity(self.assignments.len().max(CELL_COUNT));
        for (cell, occupants) in grid::cells().zip(by_cell) {
            if occupants.is_empty() {
                assignments.push(Assignment::empty(cell));
            } else {
                assignments.extend(occupants.into_iter().cloned());
            }
        }
        assignments.extend(unscheduled);
        Timetable::new(assignments)
    }
}

impl FromIterator<Assignment> for Timetable {
    fn from_iter<I: IntoIterator<Item = Assignment>>(iter: I) -> Self {
        Timetable::new(iter.into_iter().collect())
    }
}

/// A population member: a timetable and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub timetable: Timetable,
    pub fitness: f64,
}

impl Candidate {
    /// A candidate that has not been scored yet.
    pub fn unscored(timetable: Timetable) -> Self {
        Self {
            timetable,
            fitness: 0.0,
        }
    }
}

/// The persisted artifact: best candidate of a run, possibly repaired or edited since.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub id: Option<ScheduleId>,
    pub courses: Vec<CourseId>,
    pub rooms: Vec<RoomId>,
    pub timetable: Timetable,
    pub fitness: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::grid::Day;

    pub fn cell(day: Day, label: &str) -> GridCell {
        GridCell::new(day, TimeSlot::parse(label).unwrap())
    }

    pub fn booked(cell: GridCell, course: CourseId, instructor: InstructorId, room: RoomId) -> Assignment {
        Assignment {
            course: Some(CourseRef {
                id: course,
                name: format!("Course {}", course),
                instructor: InstructorRef {
                    id: instructor,
                    name: Some(format!("Teacher {}", instructor)),
                },
            }),
            room: Some(RoomRef {
                id: room,
                name: format!("Room {}", room),
            }),
            placement: Placement::Scheduled(cell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::grid::Day;

    #[test]
    fn test_collision_rules_are_independent() {
        let at = cell(Day::Monday, "09:00");
        let a = booked(at, 1, 10, 100);

        assert_eq!(a.collides_with(&booked(at, 2, 11, 100)), Collision { room: true, instructor: false });
        assert_eq!(a.collides_with(&booked(at, 2, 10, 101)), Collision { room: false, instructor: true });
        assert_eq!(a.collides_with(&booked(at, 2, 10, 100)).count(), 2);

        let later = booked(cell(Day::Monday, "10:00"), 2, 10, 100);
        assert!(!a.collides_with(&later).any());
    }

    #[test]
    fn test_empty_and_unscheduled_never_collide() {
        let at = cell(Day::Friday, "12:00");
        let a = booked(at, 1, 10, 100);
        assert!(!a.collides_with(&Assignment::empty(at)).any());

        let mut parked = booked(at, 2, 10, 100);
        parked.placement = Placement::Unscheduled;
        parked.room = None;
        assert!(!a.collides_with(&parked).any());
    }

    #[test]
    fn test_well_formed_requires_grid_order() {
        let full: Timetable = grid::cells().map(Assignment::empty).collect();
        assert!(full.is_well_formed());

        let mut reversed: Vec<Assignment> = full.assignments().to_vec();
        reversed.reverse();
        assert!(!Timetable::new(reversed).is_well_formed());

        let short: Timetable = grid::cells().take(39).map(Assignment::empty).collect();
        assert!(!short.is_well_formed());
    }

    #[test]
    fn test_filled_backfills_missing_cells() {
        let mut parked = booked(cell(Day::Monday, "09:00"), 3, 10, 100);
        parked.placement = Placement::Unscheduled;
        let sparse = Timetable::new(vec![
            booked(cell(Day::Tuesday, "10:00"), 1, 10, 100),
            parked,
        ]);

        let filled = sparse.filled();
        assert_eq!(filled.len(), CELL_COUNT + 1);
        assert_eq!(filled.get(9).unwrap().course_id(), Some(1));
        assert!(filled.get(0).unwrap().course.is_none());
        assert_eq!(filled.get(CELL_COUNT).unwrap().placement, Placement::Unscheduled);
    }

    #[test]
    fn test_placement_serialization() {
        let json = serde_json::to_string(&Placement::Scheduled(cell(Day::Monday, "09:00"))).unwrap();
        assert_eq!(json, r#"{"status":"scheduled","day":"Monday","startTime":"09:00"}"#);
        let json = serde_json::to_string(&Placement::Unscheduled).unwrap();
        assert_eq!(json, r#"{"status":"unscheduled"}"#);
    }
}
