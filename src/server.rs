use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use std::sync::Arc;

use crate::config::{AppConfig, EngineConfig};
use crate::conflict::{Conflict, ResolveOutcome};
use crate::data::{Course, Role, Room, ScheduleId, User};
use crate::error::SchedulerError;
use crate::notify::LogNotifier;
use crate::service::{GenerationReport, ManualEdit, Scheduler};
use crate::store::{InMemoryStore, ScheduleStore};
use crate::timetable::Schedule;

type AppState = Arc<Scheduler>;

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        let status = match &self {
            SchedulerError::EmptyCatalog { .. }
            | SchedulerError::InvalidEdit(_)
            | SchedulerError::Config(_) => StatusCode::BAD_REQUEST,
            SchedulerError::ScheduleNotFound(_) => StatusCode::NOT_FOUND,
            SchedulerError::Store(_) | SchedulerError::Catalog(_) | SchedulerError::Io(_) => {
                error!("{}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

async fn list_courses(State(scheduler): State<AppState>) -> Result<Json<Vec<Course>>, SchedulerError> {
    Ok(Json(scheduler.store().list_courses()?))
}

async fn list_rooms(State(scheduler): State<AppState>) -> Result<Json<Vec<Room>>, SchedulerError> {
    Ok(Json(scheduler.store().list_rooms()?))
}

async fn list_instructors(State(scheduler): State<AppState>) -> Result<Json<Vec<User>>, SchedulerError> {
    Ok(Json(scheduler.store().list_users(Some(Role::Teacher))?))
}

async fn add_course(
    State(scheduler): State<AppState>,
    Json(course): Json<Course>,
) -> Result<(StatusCode, Json<Course>), SchedulerError> {
    Ok((StatusCode::CREATED, Json(scheduler.store().upsert_course(course)?)))
}

async fn add_room(
    State(scheduler): State<AppState>,
    Json(room): Json<Room>,
) -> Result<(StatusCode, Json<Room>), SchedulerError> {
    Ok((StatusCode::CREATED, Json(scheduler.store().upsert_room(room)?)))
}

async fn add_user(
    State(scheduler): State<AppState>,
    Json(user): Json<User>,
) -> Result<(StatusCode, Json<User>), SchedulerError> {
    Ok((StatusCode::CREATED, Json(scheduler.store().upsert_user(user)?)))
}

/// An empty body means "use the server's engine settings"; anything else must
/// parse as an [`EngineConfig`].
fn engine_overrides(body: &Bytes) -> Result<Option<EngineConfig>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match Json::<EngineConfig>::from_bytes(body) {
        Ok(Json(config)) => Ok(Some(config)),
        Err(rejection) => Err((StatusCode::BAD_REQUEST, rejection.body_text()).into_response()),
    }
}

/// Generation is CPU bound, so it runs off the async workers.
async fn generate_handler(
    State(scheduler): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<GenerationReport>), Response> {
    let overrides = engine_overrides(&body)?;
    let report = tokio::task::spawn_blocking(move || scheduler.generate(overrides))
        .await
        .map_err(|e| {
            error!("Schedule generation task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })?
        .map_err(IntoResponse::into_response)?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn latest_handler(State(scheduler): State<AppState>) -> Result<Json<Schedule>, Response> {
    match scheduler.latest().map_err(IntoResponse::into_response)? {
        Some(schedule) => Ok(Json(schedule)),
        None => Err((
            StatusCode::NOT_FOUND,
            "No schedules found. Please generate a schedule first.",
        )
            .into_response()),
    }
}

async fn conflicts_handler(
    State(scheduler): State<AppState>,
    Path(id): Path<ScheduleId>,
) -> Result<Json<Vec<Conflict>>, SchedulerError> {
    Ok(Json(scheduler.conflicts(id)?))
}

async fn resolve_handler(
    State(scheduler): State<AppState>,
    Path(id): Path<ScheduleId>,
) -> Result<Json<ResolveOutcome>, SchedulerError> {
    Ok(Json(scheduler.resolve(id)?))
}

async fn edit_handler(
    State(scheduler): State<AppState>,
    Path(id): Path<ScheduleId>,
    Json(edit): Json<ManualEdit>,
) -> Result<Json<Schedule>, SchedulerError> {
    Ok(Json(scheduler.apply_edit(id, edit)?))
}

pub fn router(scheduler: AppState) -> Router {
    Router::new()
        .route("/v1/courses", get(list_courses).post(add_course))
        .route("/v1/rooms", get(list_rooms).post(add_room))
        .route("/v1/users", post(add_user))
        .route("/v1/instructors", get(list_instructors))
        .route("/v1/schedule/generate", post(generate_handler))
        .route("/v1/schedule/latest", get(latest_handler))
        .route("/v1/schedule/:id/conflicts", get(conflicts_handler))
        .route("/v1/schedule/:id/resolve", post(resolve_handler))
        .route("/v1/schedule/:id/edit", post(edit_handler))
        .with_state(scheduler)
}

pub async fn run_server(config: AppConfig) -> Result<(), SchedulerError> {
    let store: Arc<dyn ScheduleStore> = match &config.catalog_path {
        Some(path) => Arc::new(InMemoryStore::from_catalog_file(path)?),
        None => Arc::new(InMemoryStore::new()),
    };
    let scheduler = Arc::new(Scheduler::new(store, Arc::new(LogNotifier), config.engine));
    let app = router(scheduler);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
