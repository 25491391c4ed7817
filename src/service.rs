//! Orchestration over the store: generate, inspect, repair and edit schedules.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::EngineConfig;
use crate::conflict::{Conflict, ConflictResolver, ResolveOutcome, detect_conflicts};
use crate::data::{RoomId, ScheduleId, Snapshot};
use crate::error::SchedulerError;
use crate::genetic::{self, evaluate};
use crate::grid::{Day, GridCell, TimeSlot};
use crate::notify::Notifier;
use crate::store::ScheduleStore;
use crate::timetable::{Placement, Schedule};

/// Summary of a generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub schedule: Schedule,
    pub violations: u32,
    pub best_fitness_history: Vec<f64>,
    pub elapsed_ms: u128,
}

/// A manual change to one assignment of a persisted schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ManualEdit {
    #[serde(rename_all = "camelCase")]
    ChangeRoom { slot: usize, room_id: RoomId },
    #[serde(rename_all = "camelCase")]
    Reschedule {
        slot: usize,
        day: Day,
        start_time: TimeSlot,
    },
}

pub struct Scheduler {
    store: Arc<dyn ScheduleStore>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
    // One repair or edit in flight per schedule id. Entries only live while a
    // call for that id holds or waits on them.
    schedule_locks: Mutex<HashMap<ScheduleId, Arc<Mutex<()>>>>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn ScheduleStore>, notifier: Arc<dyn Notifier>, config: EngineConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            schedule_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &dyn ScheduleStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads a snapshot, runs the genetic search and persists the best
    /// candidate. Nothing is saved when the catalog is empty.
    pub fn generate(&self, overrides: Option<EngineConfig>) -> Result<GenerationReport, SchedulerError> {
        let config = overrides.unwrap_or_else(|| self.config.clone());
        let snapshot = Snapshot::load(self.store.as_ref())?;
        let mut rng = config.rng();

        let (schedule, outcome) = genetic::generate_schedule(&snapshot, &config, &mut rng)?;
        let schedule = self.store.save_schedule(schedule)?;
        info!(
            "Saved schedule {:?} with fitness {:.4}",
            schedule.id, schedule.fitness
        );

        Ok(GenerationReport {
            schedule,
            violations: outcome.violations,
            best_fitness_history: outcome.best_fitness_history,
            elapsed_ms: outcome.elapsed.as_millis(),
        })
    }

    /// Read-only conflict report for a persisted schedule.
    pub fn conflicts(&self, id: ScheduleId) -> Result<Vec<Conflict>, SchedulerError> {
        let schedule = self.store.load_schedule(id)?;
        Ok(detect_conflicts(&schedule.timetable))
    }

    /// Detects and repairs conflicts, then saves the schedule with whatever
    /// repairs succeeded. Residual conflicts are reported, not raised.
    pub fn resolve(&self, id: ScheduleId) -> Result<ResolveOutcome, SchedulerError> {
        self.with_schedule_lock(id, || self.resolve_locked(id))
    }

    /// Applies a manual edit and saves the schedule.
    pub fn apply_edit(&self, id: ScheduleId, edit: ManualEdit) -> Result<Schedule, SchedulerError> {
        self.with_schedule_lock(id, || self.apply_edit_locked(id, edit))
    }

    fn resolve_locked(&self, id: ScheduleId) -> Result<ResolveOutcome, SchedulerError> {
        let snapshot = Snapshot::load(self.store.as_ref())?;
        let schedule = self.store.load_schedule(id)?;
        let conflicts = detect_conflicts(&schedule.timetable);
        if conflicts.is_empty() {
            return Ok(ResolveOutcome {
                schedule,
                resolutions: Vec::new(),
                residual: Vec::new(),
            });
        }

        let resolver = ConflictResolver::new(&snapshot, self.notifier.as_ref());
        let mut outcome = resolver.resolve(schedule, &conflicts);
        outcome.schedule.fitness = evaluate(&outcome.schedule.timetable, &snapshot);
        outcome.schedule = self.store.save_schedule(outcome.schedule)?;
        if !outcome.residual.is_empty() {
            warn!(
                "Schedule {} saved with {} residual conflicts",
                id,
                outcome.residual.len()
            );
        }
        Ok(outcome)
    }

    fn apply_edit_locked(&self, id: ScheduleId, edit: ManualEdit) -> Result<Schedule, SchedulerError> {
        let snapshot = Snapshot::load(self.store.as_ref())?;
        let mut schedule = self.store.load_schedule(id)?;

        match edit {
            ManualEdit::ChangeRoom { slot, room_id } => {
                let room = snapshot
                    .room(room_id)
                    .ok_or_else(|| SchedulerError::InvalidEdit(format!("unknown room {}", room_id)))?;
                let room_ref = snapshot.room_ref(room);
                let assignment = schedule
                    .timetable
                    .get_mut(slot)
                    .ok_or_else(|| SchedulerError::InvalidEdit(format!("no assignment at slot {}", slot)))?;
                if assignment.placement == Placement::Unscheduled {
                    return Err(SchedulerError::InvalidEdit(format!(
                        "assignment {} is unscheduled; reschedule it first",
                        slot
                    )));
                }
                assignment.room = Some(room_ref);
            }
            ManualEdit::Reschedule {
                slot,
                day,
                start_time,
            } => {
                let assignment = schedule
                    .timetable
                    .get_mut(slot)
                    .ok_or_else(|| SchedulerError::InvalidEdit(format!("no assignment at slot {}", slot)))?;
                assignment.placement = Placement::Scheduled(GridCell::new(day, start_time));
            }
        }

        schedule.fitness = evaluate(&schedule.timetable, &snapshot);
        self.store.save_schedule(schedule)
    }

    /// The newest schedule with every unoccupied grid cell filled in as empty.
    pub fn latest(&self) -> Result<Option<Schedule>, SchedulerError> {
        Ok(self.store.latest_schedule()?.map(|schedule| Schedule {
            timetable: schedule.timetable.filled(),
            ..schedule
        }))
    }

    /// Runs `f` while holding the lock for schedule `id`, then drops the
    /// lock table entry if no other call is waiting on it.
    fn with_schedule_lock<T, F>(&self, id: ScheduleId, f: F) -> Result<T, SchedulerError>
    where
        F: FnOnce() -> Result<T, SchedulerError>,
    {
        let lock = self.lock_for(id)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(SchedulerError::Store(format!("lock for schedule {} poisoned", id))),
        };
        self.release_lock(id, lock);
        result
    }

    fn lock_for(&self, id: ScheduleId) -> Result<Arc<Mutex<()>>, SchedulerError> {
        let mut locks = self.lock_table()?;
        Ok(Arc::clone(locks.entry(id).or_default()))
    }

    fn release_lock(&self, id: ScheduleId, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.lock_table() else {
            return;
        };
        // The table's copy plus ours: nobody else is holding or waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&id);
        }
    }

    fn lock_table(&self) -> Result<MutexGuard<'_, HashMap<ScheduleId, Arc<Mutex<()>>>>, SchedulerError> {
        self.schedule_locks
            .lock()
            .map_err(|_| SchedulerError::Store("schedule lock table poisoned".to_string()))
    }
}
