//! Course timetabling: genetic synthesis of a weekly timetable, followed by
//! conflict detection and a deterministic repair pass.

pub mod config;
pub mod conflict;
pub mod data;
pub mod error;
pub mod genetic;
pub mod grid;
pub mod notify;
pub mod server;
pub mod service;
pub mod store;
pub mod timetable;

pub use config::{AppConfig, EngineConfig};
pub use conflict::{Conflict, ConflictKind, ConflictResolver, ResolveOutcome, Resolution, detect_conflicts};
pub use data::{Course, Role, Room, Snapshot, User};
pub use error::SchedulerError;
pub use genetic::generate_schedule;
pub use service::{ManualEdit, Scheduler};
pub use timetable::{Assignment, Candidate, Placement, Schedule, Timetable};
