use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::error::SchedulerError;
use crate::grid::{Day, GridCell, TimeSlot};
use crate::store::ScheduleStore;
use crate::timetable::{CourseRef, InstructorRef, RoomRef};

// Type aliases for clarity
pub type RoomId = u32;
pub type CourseId = u32;
pub type UserId = u32;
pub type InstructorId = UserId;
pub type ScheduleId = u32;

/// Represents a physical room with a given capacity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
}

/// Represents a course to be scheduled.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub instructor_id: InstructorId,
    /// Length of one session in minutes.
    pub duration: u32,
    /// Seats the course needs.
    pub capacity: u32,
    #[serde(default)]
    pub preferred_time_slots: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        };
        f.write_str(name)
    }
}

/// A user of the system. Users with [`Role::Teacher`] are instructors.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    /// Weekly availability: day -> time-slot labels.
    #[serde(default)]
    pub availability: BTreeMap<Day, BTreeSet<String>>,
    /// Courses the user would like to teach or attend.
    #[serde(default)]
    pub preferences: Vec<CourseId>,
}

impl User {
    /// Grid cells this user can teach in, days in week order and slots in grid order.
    /// Labels that are not part of the grid are ignored.
    pub fn available_cells(&self) -> Vec<GridCell> {
        self.availability
            .iter()
            .flat_map(|(day, labels)| {
                labels
                    .iter()
                    .filter_map(|label| TimeSlot::parse(label))
                    .sorted()
                    .map(move |slot| GridCell::new(*day, slot))
            })
            .collect()
    }
}

/// Read-only view of the catalog for one engine invocation.
///
/// Entities live in arena-style vectors; lookups by id go through the index maps.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    courses: Vec<Course>,
    rooms: Vec<Room>,
    instructors: Vec<User>,
    course_index: HashMap<CourseId, usize>,
    room_index: HashMap<RoomId, usize>,
    instructor_index: HashMap<InstructorId, usize>,
}

impl Snapshot {
    /// Builds a snapshot. Only users with the teacher role are kept as instructors.
    pub fn new(courses: Vec<Course>, rooms: Vec<Room>, users: Vec<User>) -> Self {
        let instructors: Vec<User> = users
            .into_iter()
            .filter(|u| u.role == Role::Teacher)
            .collect();

        let course_index = courses.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
        let room_index = rooms.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
        let instructor_index = instructors
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id, i))
            .collect();

        Self {
            courses,
            rooms,
            instructors,
            course_index,
            room_index,
            instructor_index,
        }
    }

    /// Reads courses, rooms and teachers from the store once.
    pub fn load(store: &dyn ScheduleStore) -> Result<Self, SchedulerError> {
        let courses = store.list_courses()?;
        let rooms = store.list_rooms()?;
        let users = store.list_users(Some(Role::Teacher))?;
        Ok(Self::new(courses, rooms, users))
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn instructors(&self) -> &[User] {
        &self.instructors
    }

    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.course_index.get(&id).map(|&i| &self.courses[i])
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.room_index.get(&id).map(|&i| &self.rooms[i])
    }

    pub fn instructor(&self, id: InstructorId) -> Option<&User> {
        self.instructor_index.get(&id).map(|&i| &self.instructors[i])
    }

    /// Fails when there is nothing to build a timetable from.
    pub fn ensure_catalog(&self) -> Result<(), SchedulerError> {
        if self.courses.is_empty() || self.rooms.is_empty() {
            return Err(SchedulerError::EmptyCatalog {
                courses: self.courses.len(),
                rooms: self.rooms.len(),
            });
        }
        Ok(())
    }

    /// Denormalized course reference. The instructor id is always the
    /// course's own; the name is filled in when the teacher is loaded.
    pub fn course_ref(&self, course: &Course) -> CourseRef {
        CourseRef {
            id: course.id,
            name: course.name.clone(),
            instructor: InstructorRef {
                id: course.instructor_id,
                name: self.instructor(course.instructor_id).map(|u| u.name.clone()),
            },
        }
    }

    pub fn room_ref(&self, room: &Room) -> RoomRef {
        RoomRef {
            id: room.id,
            name: room.name.clone(),
        }
    }
}
