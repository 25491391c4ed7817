//! The fixed weekly grid every timetable covers.
//!
//! Days and slot labels are shared with the display layer. Changing either
//! changes the shape of every persisted timetable, so bump [`GRID_VERSION`]
//! when they move.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const GRID_VERSION: u32 = 1;

/// A teaching day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

pub const DAYS: [Day; 5] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
];

pub const TIME_SLOTS: [&str; 8] = [
    "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00",
];

/// Number of cells in the grid, i.e. the length of a well-formed timetable.
pub const CELL_COUNT: usize = DAYS.len() * TIME_SLOTS.len();

impl Day {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A start-time label from [`TIME_SLOTS`], stored as its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Looks up a label such as `"09:00"`. Labels outside the grid yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        TIME_SLOTS
            .iter()
            .position(|slot| *slot == label)
            .map(|i| TimeSlot(i as u8))
    }

    pub fn label(self) -> &'static str {
        TIME_SLOTS[self.0 as usize]
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The following label, clamped at the last slot of the day.
    pub fn next_clamped(self) -> Self {
        TimeSlot((self.0 + 1).min(TIME_SLOTS.len() as u8 - 1))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        TimeSlot::parse(&label).ok_or_else(|| format!("'{}' is not a grid time slot", label))
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.label().to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One (day, start-time) coordinate of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub day: Day,
    pub start_time: TimeSlot,
}

impl GridCell {
    pub fn new(day: Day, start_time: TimeSlot) -> Self {
        Self { day, start_time }
    }

    pub fn end_time(&self) -> TimeSlot {
        self.start_time.next_clamped()
    }

    /// Position of this cell in grid order (day-major).
    pub fn index(&self) -> usize {
        self.day.index() * TIME_SLOTS.len() + self.start_time.index()
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.start_time)
    }
}

/// All grid cells in canonical order: Monday 09:00, Monday 10:00, ..., Friday 16:00.
pub fn cells() -> impl Iterator<Item = GridCell> {
    DAYS.into_iter().flat_map(|day| {
        (0..TIME_SLOTS.len()).map(move |i| GridCell::new(day, TimeSlot(i as u8)))
    })
}
