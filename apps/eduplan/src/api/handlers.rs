//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every user-scoped route resolves an [`Identity`] from the path once the
//! request has passed authentication, and hands it to the planner.

use super::{
    AppState,
    types::{
        CatalogListResponse, CatalogSummary, CourseQuery, HealthResponse, PeriodJson,
        PlanResponse, ProfileRequest, ProfileResponse, ProgressResponse, ScheduleRequest,
        ScheduleResponse, StatusRequest, SubjectsResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use eduplan_core::{
    AvailabilityEngine, CatalogSource, CourseId, Identity, Planner, PlannerError, Profile,
    StatusChange, SubjectId, UserId,
};

/// Resolve the caller. Requests reaching a handler have already passed
/// the API key check, so the path user is trusted.
fn identity(user_id: String) -> Identity {
    Identity::authenticated(UserId::new(user_id))
}

/// HTTP status for a planner error.
pub fn status_for(e: &PlannerError) -> StatusCode {
    match e {
        PlannerError::Unauthenticated => StatusCode::UNAUTHORIZED,
        PlannerError::SubjectNotFound(_)
        | PlannerError::CatalogNotFound(_)
        | PlannerError::UnknownCatalog(_) => StatusCode::NOT_FOUND,
        PlannerError::PrerequisitesNotMet { .. } => StatusCode::CONFLICT,
        PlannerError::InvalidStatus(_)
        | PlannerError::InvalidSchedule(_)
        | PlannerError::CourseRequired
        | PlannerError::InvalidProfile(_)
        | PlannerError::InvalidCatalog(_)
        | PlannerError::DuplicateSubject(_) => StatusCode::BAD_REQUEST,
        PlannerError::Config(_) | PlannerError::SerializationError(_) | PlannerError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Log a failed request at a level matching its status.
fn log_failure(operation: &str, e: &PlannerError) -> StatusCode {
    let status = status_for(e);
    if status.is_server_error() {
        tracing::error!(operation, error = %e, "request failed");
    } else {
        tracing::debug!(operation, error = %e, status = status.as_u16(), "request rejected");
    }
    status
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// CATALOG HANDLERS
// =============================================================================

/// List every known catalog.
pub async fn catalogs_handler(State(state): State<AppState>) -> impl IntoResponse {
    let planner = state.planner.read().await;
    let catalogs = planner
        .catalogs()
        .list_catalogs()
        .into_iter()
        .map(CatalogSummary::from)
        .collect();

    (StatusCode::OK, Json(CatalogListResponse { catalogs }))
}

/// Subjects of a course, grouped by period.
pub async fn subjects_handler(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
) -> impl IntoResponse {
    let planner = state.planner.read().await;
    let course_id = CourseId(course_id);
    let periods = AvailabilityEngine::group_by_period(planner.subjects_for_course(course_id))
        .into_iter()
        .map(PeriodJson::from)
        .collect();

    (StatusCode::OK, Json(SubjectsResponse { course_id, periods }))
}

// =============================================================================
// PROFILE HANDLERS
// =============================================================================

/// Course id of the profile's selected catalog, if it is still loaded.
fn selected_course(planner: &Planner, profile: Option<&Profile>) -> Option<CourseId> {
    let key = profile?.catalog.as_ref()?;
    planner
        .catalogs()
        .catalog_for_key(key)
        .map(|catalog| catalog.course_id())
}

/// Get a user's profile. A user without one gets `profile: null`.
pub async fn get_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let identity = identity(user_id);
    let planner = state.planner.read().await;

    match planner.profile(&identity) {
        Ok(profile) => {
            let course_id = selected_course(&planner, profile.as_ref());
            (
                StatusCode::OK,
                Json(ProfileResponse::success(profile, course_id)),
            )
        }
        Err(e) => (
            log_failure("get_profile", &e),
            Json(ProfileResponse::error(e.to_string())),
        ),
    }
}

/// Replace a user's profile.
pub async fn put_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ProfileRequest>,
) -> impl IntoResponse {
    let identity = identity(user_id);
    let mut planner = state.planner.write().await;

    let catalog = match (request.catalog, request.course_id) {
        (Some(key), _) => Some(key),
        (None, Some(course_id)) => match planner.catalogs().catalog_for_course(course_id) {
            Some(catalog) => Some(catalog.key().clone()),
            None => {
                let e = PlannerError::CatalogNotFound(course_id);
                return (
                    log_failure("put_profile", &e),
                    Json(ProfileResponse::error(e.to_string())),
                );
            }
        },
        (None, None) => None,
    };

    let profile = Profile {
        name: request.name,
        email: request.email,
        catalog,
    };
    match planner.set_profile(&identity, profile) {
        Ok(profile) => {
            tracing::info!(
                user = %identity.user_id,
                catalog = ?profile.catalog,
                "profile saved"
            );
            let course_id = selected_course(&planner, Some(&profile));
            (
                StatusCode::OK,
                Json(ProfileResponse::success(Some(profile), course_id)),
            )
        }
        Err(e) => (
            log_failure("put_profile", &e),
            Json(ProfileResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// PROGRESS HANDLERS
// =============================================================================

/// Get a user's recorded progress in one course.
pub async fn get_progress_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<CourseQuery>,
) -> impl IntoResponse {
    let identity = identity(user_id);
    let planner = state.planner.read().await;

    match planner.progress(&identity, query.course()) {
        Ok((course_id, progress)) => (
            StatusCode::OK,
            Json(ProgressResponse::success(identity.user_id, course_id, progress)),
        ),
        Err(e) => (
            log_failure("get_progress", &e),
            Json(ProgressResponse::from_error(&e)),
        ),
    }
}

/// Set (or remove) one subject's status.
pub async fn put_progress_handler(
    State(state): State<AppState>,
    Path((user_id, subject_id)): Path<(String, String)>,
    Json(request): Json<StatusRequest>,
) -> impl IntoResponse {
    let change = match request.to_change() {
        Ok(change) => change,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ProgressResponse::from_error(&e)),
            );
        }
    };

    change_status(state, user_id, subject_id, change, request.course_id).await
}

/// Remove one subject's status.
pub async fn delete_progress_handler(
    State(state): State<AppState>,
    Path((user_id, subject_id)): Path<(String, String)>,
    Query(query): Query<CourseQuery>,
) -> impl IntoResponse {
    change_status(state, user_id, subject_id, StatusChange::Remove, query.course()).await
}

async fn change_status(
    state: AppState,
    user_id: String,
    subject_id: String,
    change: StatusChange,
    course_id: Option<CourseId>,
) -> (StatusCode, Json<ProgressResponse>) {
    let identity = identity(user_id);
    let subject_id = SubjectId::new(subject_id);

    let mut planner = state.planner.write().await;
    match planner.change_status(&identity, &subject_id, change, course_id) {
        Ok((course_id, progress)) => {
            tracing::info!(
                user = %identity.user_id,
                course = %course_id,
                subject = %subject_id,
                ?change,
                "status changed"
            );
            (
                StatusCode::OK,
                Json(ProgressResponse::success(identity.user_id, course_id, progress)),
            )
        }
        Err(e) => (
            log_failure("change_status", &e),
            Json(ProgressResponse::from_error(&e)),
        ),
    }
}

// =============================================================================
// PLAN HANDLER
// =============================================================================

/// Compose a user's curriculum view for one course.
pub async fn plan_handler(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(String, u64)>,
) -> impl IntoResponse {
    plan(state, user_id, Some(CourseId(course_id))).await
}

/// Compose a user's curriculum view for the course in their profile.
pub async fn profile_plan_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    plan(state, user_id, None).await
}

async fn plan(
    state: AppState,
    user_id: String,
    course_id: Option<CourseId>,
) -> (StatusCode, Json<PlanResponse>) {
    let identity = identity(user_id);
    let planner = state.planner.read().await;

    match planner.plan(&identity, course_id) {
        Ok(plan) => (StatusCode::OK, Json(PlanResponse::success(plan))),
        Err(e) => (
            log_failure("plan", &e),
            Json(PlanResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// SCHEDULE HANDLERS
// =============================================================================

/// Get a user's weekly schedule.
pub async fn get_schedule_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let identity = identity(user_id);
    let planner = state.planner.read().await;

    match planner.schedule(&identity) {
        Ok(entries) => (StatusCode::OK, Json(ScheduleResponse::success(entries))),
        Err(e) => (
            log_failure("get_schedule", &e),
            Json(ScheduleResponse::error(e.to_string())),
        ),
    }
}

/// Write one schedule cell.
pub async fn put_schedule_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ScheduleRequest>,
) -> impl IntoResponse {
    let key = match request.to_key() {
        Ok(key) => key,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ScheduleResponse::error(e.to_string())),
            );
        }
    };

    let identity = identity(user_id);
    let mut planner = state.planner.write().await;
    match planner.set_schedule_entry(&identity, key, &request.subject) {
        Ok(entries) => (StatusCode::OK, Json(ScheduleResponse::success(entries))),
        Err(e) => (
            log_failure("put_schedule", &e),
            Json(ScheduleResponse::error(e.to_string())),
        ),
    }
}
