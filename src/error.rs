use thiserror::Error;

use crate::data::ScheduleId;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Nothing to build a timetable from; supply courses and rooms first.
    #[error("No courses or rooms available (courses: {courses}, rooms: {rooms})")]
    EmptyCatalog { courses: usize, rooms: usize },

    #[error("Schedule {0} not found")]
    ScheduleNotFound(ScheduleId),

    /// Passed through from the store untouched; the engine does not retry.
    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Catalog parse error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
