//! Persistence boundary.
//!
//! The engine only talks to [`ScheduleStore`]. [`InMemoryStore`] backs the
//! server binary and tests; a database-backed store would implement the same
//! trait.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::data::{Course, CourseId, Role, Room, RoomId, ScheduleId, User, UserId};
use crate::error::SchedulerError;
use crate::timetable::Schedule;

pub trait ScheduleStore: Send + Sync {
    fn list_courses(&self) -> Result<Vec<Course>, SchedulerError>;
    fn list_rooms(&self) -> Result<Vec<Room>, SchedulerError>;
    /// All users, or only those with `role`.
    fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, SchedulerError>;
    fn load_schedule(&self, id: ScheduleId) -> Result<Schedule, SchedulerError>;
    /// The most recently created schedule, if any.
    fn latest_schedule(&self) -> Result<Option<Schedule>, SchedulerError>;
    /// Inserts a schedule without an id (assigning one) or replaces an existing one.
    fn save_schedule(&self, schedule: Schedule) -> Result<Schedule, SchedulerError>;

    fn upsert_course(&self, course: Course) -> Result<Course, SchedulerError>;
    fn upsert_room(&self, room: Room) -> Result<Room, SchedulerError>;
    fn upsert_user(&self, user: User) -> Result<User, SchedulerError>;
}

/// Catalog file layout for seeding a store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Default)]
struct State {
    courses: BTreeMap<CourseId, Course>,
    rooms: BTreeMap<RoomId, Room>,
    users: BTreeMap<UserId, User>,
    schedules: BTreeMap<ScheduleId, Schedule>,
    next_schedule_id: ScheduleId,
}

/// Process-local store. Entities are returned in id order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        let state = State {
            courses: catalog.courses.into_iter().map(|c| (c.id, c)).collect(),
            rooms: catalog.rooms.into_iter().map(|r| (r.id, r)).collect(),
            users: catalog.users.into_iter().map(|u| (u.id, u)).collect(),
            ..State::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn from_catalog_file(path: &Path) -> Result<Self, SchedulerError> {
        let raw = fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&raw)?;
        info!(
            "Loaded catalog from {}: {} courses, {} rooms, {} users",
            path.display(),
            catalog.courses.len(),
            catalog.rooms.len(),
            catalog.users.len()
        );
        Ok(Self::from_catalog(catalog))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, SchedulerError> {
        self.state
            .read()
            .map_err(|_| SchedulerError::Store("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, SchedulerError> {
        self.state
            .write()
            .map_err(|_| SchedulerError::Store("store lock poisoned".to_string()))
    }
}

impl ScheduleStore for InMemoryStore {
    fn list_courses(&self) -> Result<Vec<Course>, SchedulerError> {
        Ok(self.read()?.courses.values().cloned().collect())
    }

    fn list_rooms(&self) -> Result<Vec<Room>, SchedulerError> {
        Ok(self.read()?.rooms.values().cloned().collect())
    }

    fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, SchedulerError> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    fn load_schedule(&self, id: ScheduleId) -> Result<Schedule, SchedulerError> {
        self.read()?
            .schedules
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::ScheduleNotFound(id))
    }

    fn latest_schedule(&self) -> Result<Option<Schedule>, SchedulerError> {
        Ok(self.read()?.schedules.values().next_back().cloned())
    }

    fn save_schedule(&self, mut schedule: Schedule) -> Result<Schedule, SchedulerError> {
        let mut state = self.write()?;
        let id = match schedule.id {
            Some(id) if state.schedules.contains_key(&id) => id,
            Some(id) => return Err(SchedulerError::ScheduleNotFound(id)),
            None => {
                state.next_schedule_id += 1;
                state.next_schedule_id
            }
        };
        schedule.id = Some(id);
        state.schedules.insert(id, schedule.clone());
        debug!("Saved schedule {}", id);
        Ok(schedule)
    }

    fn upsert_course(&self, course: Course) -> Result<Course, SchedulerError> {
        self.write()?.courses.insert(course.id, course.clone());
        Ok(course)
    }

    fn upsert_room(&self, room: Room) -> Result<Room, SchedulerError> {
        self.write()?.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    fn upsert_user(&self, user: User) -> Result<User, SchedulerError> {
        self.write()?.users.insert(user.id, user.clone());
        Ok(user)
    }
}
