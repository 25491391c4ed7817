//! Conflict detection and repair for persisted schedules.

pub mod detector;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::RoomId;
use crate::grid::GridCell;

pub use detector::detect_conflicts;
pub use resolver::{ConflictResolver, ResolveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Room,
    Instructor,
}

/// Two assignments that collide, by index into the timetable (`slots[0] < slots[1]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub slots: [usize; 2],
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ConflictKind::Room => "room",
            ConflictKind::Instructor => "instructor",
        };
        write!(f, "[{}] slots {} and {}", kind, self.slots[0], self.slots[1])
    }
}

/// What happened to one conflict during a repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Resolution {
    /// The second assignment moved to another room.
    Room(RoomId),
    /// The second assignment moved to another cell.
    Reschedule(GridCell),
    /// An earlier repair in the same pass already separated the pair.
    Cleared,
    /// No repair found; the second assignment is parked as unscheduled.
    Unresolved,
}
