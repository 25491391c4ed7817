use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use timetable_solver::data::{Course, Role, Room, User};
use timetable_solver::grid::{Day, GridCell, TimeSlot};
use timetable_solver::notify::Notifier;
use timetable_solver::store::{InMemoryStore, ScheduleStore};
use timetable_solver::timetable::{CourseRef, InstructorRef, RoomRef};
use timetable_solver::{
    Assignment, ConflictKind, EngineConfig, ManualEdit, Placement, Resolution, Schedule,
    Scheduler, SchedulerError, Timetable, detect_conflicts,
};

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

fn course(id: u32, instructor_id: u32, capacity: u32) -> Course {
    Course {
        id,
        name: format!("Course {}", id),
        instructor_id,
        duration: 60,
        capacity,
        preferred_time_slots: BTreeSet::new(),
    }
}

fn room(id: u32, capacity: u32) -> Room {
    Room {
        id,
        name: format!("Room {}", id),
        capacity,
    }
}

fn teacher(id: u32, availability: &[(Day, &[&str])]) -> User {
    User {
        id,
        name: format!("Teacher {}", id),
        role: Role::Teacher,
        availability: availability
            .iter()
            .map(|(day, slots)| (*day, slots.iter().map(|s| s.to_string()).collect()))
            .collect::<BTreeMap<_, _>>(),
        preferences: Vec::new(),
    }
}

fn cell(day: Day, label: &str) -> GridCell {
    GridCell::new(day, TimeSlot::parse(label).unwrap())
}

fn booked(at: GridCell, course: u32, instructor: u32, room: u32) -> Assignment {
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
        placement: Placement::Scheduled(at),
    }
}

fn scheduler(store: Arc<InMemoryStore>, notifier: Arc<RecordingNotifier>) -> Scheduler {
    let config = EngineConfig {
        population_size: 20,
        generations: 10,
        seed: Some(2024),
        ..EngineConfig::default()
    };
    Scheduler::new(store, notifier, config)
}

#[test]
fn single_course_single_room_generates_perfect_schedule() {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_course(course(1, 1, 30)).unwrap();
    store.upsert_room(room(1, 50)).unwrap();
    store.upsert_user(teacher(1, &[])).unwrap();
    let scheduler = scheduler(store.clone(), Arc::default());

    let report = scheduler.generate(None).unwrap();

    let saved = store.load_schedule(report.schedule.id.unwrap()).unwrap();
    assert_eq!(saved.timetable.len(), 40);
    assert!(saved.timetable.is_well_formed());
    assert!(
        saved
            .timetable
            .iter()
            .all(|a| a.course_id() == Some(1) && a.room_id() == Some(1))
    );
    assert!(detect_conflicts(&saved.timetable).is_empty());
    assert_eq!(saved.fitness, 1.0);
    assert_eq!(report.violations, 0);
    assert_eq!(saved.courses, vec![1]);
    assert_eq!(saved.rooms, vec![1]);
}

#[test]
fn zero_rooms_fails_and_persists_nothing() {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_course(course(1, 1, 30)).unwrap();
    let scheduler = scheduler(store.clone(), Arc::default());

    let result = scheduler.generate(None);

    assert!(matches!(
        result,
        Err(SchedulerError::EmptyCatalog { courses: 1, rooms: 0 })
    ));
    assert!(store.latest_schedule().unwrap().is_none());
}

#[test]
fn generated_schedule_fitness_matches_violations() {
    let store = Arc::new(InMemoryStore::new());
    for (id, instructor, capacity) in [(1, 1, 30), (2, 1, 60), (3, 2, 20), (4, 3, 45)] {
        store.upsert_course(course(id, instructor, capacity)).unwrap();
    }
    for (id, capacity) in [(1, 50), (2, 25), (3, 70)] {
        store.upsert_room(room(id, capacity)).unwrap();
    }
    for id in 1..=3 {
        store.upsert_user(teacher(id, &[])).unwrap();
    }
    let scheduler = scheduler(store, Arc::default());

    let report = scheduler.generate(None).unwrap();

    assert_eq!(
        report.schedule.fitness,
        1.0 / (f64::from(report.violations) + 1.0)
    );
    assert_eq!(report.best_fitness_history.len(), 11);
    assert!(
        report
            .best_fitness_history
            .windows(2)
            .all(|w| w[1] >= w[0])
    );
}

#[test]
fn unresolvable_room_conflict_is_parked_saved_and_escalated() {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_course(course(1, 1, 30)).unwrap();
    store.upsert_course(course(2, 2, 30)).unwrap();
    store.upsert_room(room(1, 50)).unwrap();
    store.upsert_room(room(2, 10)).unwrap();
    store.upsert_user(teacher(1, &[])).unwrap();
    store.upsert_user(teacher(2, &[])).unwrap();

    let at = cell(Day::Monday, "09:00");
    let saved = store
        .save_schedule(Schedule {
            id: None,
            courses: vec![1, 2],
            rooms: vec![1, 2],
            timetable: Timetable::new(vec![booked(at, 1, 1, 1), booked(at, 2, 2, 1)]),
            fitness: 0.5,
        })
        .unwrap();
    let id = saved.id.unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler(store.clone(), notifier.clone());

    let conflicts = scheduler.conflicts(id).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::Room);
    assert_eq!(conflicts[0].slots, [0, 1]);

    let outcome = scheduler.resolve(id).unwrap();

    assert_eq!(outcome.residual, conflicts);
    assert_eq!(outcome.resolutions[0].1, Resolution::Unresolved);
    assert_eq!(notifier.messages.lock().unwrap().len(), 1);

    let persisted = store.load_schedule(id).unwrap();
    let parked = persisted.timetable.get(1).unwrap();
    assert_eq!(parked.placement, Placement::Unscheduled);
    assert!(parked.room.is_none());
    assert!(scheduler.conflicts(id).unwrap().is_empty());
}

#[test]
fn resolvable_conflicts_leave_no_residual_and_no_alert() {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_course(course(1, 1, 30)).unwrap();
    store.upsert_course(course(2, 1, 30)).unwrap();
    store.upsert_room(room(1, 50)).unwrap();
    store.upsert_room(room(2, 50)).unwrap();
    store
        .upsert_user(teacher(1, &[(Day::Monday, &["09:00"]), (Day::Thursday, &["14:00"])]))
        .unwrap();

    let at = cell(Day::Monday, "09:00");
    let id = store
        .save_schedule(Schedule {
            id: None,
            courses: vec![1, 2],
            rooms: vec![1, 2],
            timetable: Timetable::new(vec![booked(at, 1, 1, 1), booked(at, 2, 1, 1)]),
            fitness: 0.25,
        })
        .unwrap()
        .id
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler(store.clone(), notifier.clone());
    let outcome = scheduler.resolve(id).unwrap();

    assert!(outcome.residual.is_empty());
    assert!(notifier.messages.lock().unwrap().is_empty());
    let moved = store.load_schedule(id).unwrap().timetable.get(1).unwrap().clone();
    assert_eq!(moved.cell(), Some(cell(Day::Thursday, "14:00")));
    assert_eq!(moved.room_id(), Some(2));
    assert_eq!(outcome.schedule.fitness, 1.0);
}

#[test]
fn manual_edits_are_validated_and_saved() {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_course(course(1, 1, 30)).unwrap();
    store.upsert_room(room(1, 50)).unwrap();
    store.upsert_room(room(2, 50)).unwrap();
    store.upsert_user(teacher(1, &[])).unwrap();
    let scheduler = scheduler(store.clone(), Arc::default());
    let id = scheduler.generate(None).unwrap().schedule.id.unwrap();

    let edited = scheduler
        .apply_edit(id, ManualEdit::ChangeRoom { slot: 3, room_id: 2 })
        .unwrap();
    assert_eq!(edited.timetable.get(3).unwrap().room_id(), Some(2));

    let moved = scheduler
        .apply_edit(
            id,
            ManualEdit::Reschedule {
                slot: 3,
                day: Day::Friday,
                start_time: TimeSlot::parse("16:00").unwrap(),
            },
        )
        .unwrap();
    assert_eq!(
        moved.timetable.get(3).unwrap().cell(),
        Some(cell(Day::Friday, "16:00"))
    );
    assert_eq!(store.load_schedule(id).unwrap(), moved);

    let unknown_room = scheduler.apply_edit(id, ManualEdit::ChangeRoom { slot: 0, room_id: 99 });
    assert!(matches!(unknown_room, Err(SchedulerError::InvalidEdit(_))));
    let bad_slot = scheduler.apply_edit(id, ManualEdit::ChangeRoom { slot: 400, room_id: 1 });
    assert!(matches!(bad_slot, Err(SchedulerError::InvalidEdit(_))));
}

#[test]
fn latest_backfills_vacated_cells() {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_course(course(1, 1, 30)).unwrap();
    store.upsert_room(room(1, 50)).unwrap();
    store.upsert_user(teacher(1, &[])).unwrap();
    let scheduler = scheduler(store, Arc::default());
    let id = scheduler.generate(None).unwrap().schedule.id.unwrap();

    // Move Monday 09:00 onto Monday 10:00, vacating the first cell.
    scheduler
        .apply_edit(
            id,
            ManualEdit::Reschedule {
                slot: 0,
                day: Day::Monday,
                start_time: TimeSlot::parse("10:00").unwrap(),
            },
        )
        .unwrap();

    let latest = scheduler.latest().unwrap().unwrap();
    assert_eq!(latest.timetable.len(), 41);
    let first = latest.timetable.get(0).unwrap();
    assert!(first.course.is_none());
    assert_eq!(first.cell(), Some(cell(Day::Monday, "09:00")));
}

#[test]
fn manual_edit_json_shape() {
    let edit: ManualEdit = serde_json::from_str(
        r#"{"type": "reschedule", "slot": 2, "day": "Wednesday", "startTime": "11:00"}"#,
    )
    .unwrap();
    assert_eq!(
        edit,
        ManualEdit::Reschedule {
            slot: 2,
            day: Day::Wednesday,
            start_time: TimeSlot::parse("11:00").unwrap(),
        }
    );
    let edit: ManualEdit =
        serde_json::from_str(r#"{"type": "changeRoom", "slot": 1, "roomId": 4}"#).unwrap();
    assert_eq!(edit, ManualEdit::ChangeRoom { slot: 1, room_id: 4 });
}
