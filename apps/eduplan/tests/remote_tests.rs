//! Integration tests for the remote client against a local mock service.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use eduplan::remote::{ClientError, RegisterRequest, RemoteClient, UserUpdate};
use eduplan_core::{
    CatalogSource, CourseId, CurriculumView, EffectiveStatus, PlannerError, ProgressStatus,
    StatusChange, SubjectId, UserId, demo_registry,
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// MOCK SERVICE
// =============================================================================

#[derive(Default)]
struct Mock {
    valid_access: Option<String>,
    reject_all: bool,
    issued: u32,
    refreshes: u32,
    statuses: BTreeMap<u64, String>,
    users: BTreeMap<u64, Value>,
}

type Shared = Arc<Mutex<Mock>>;

fn token(user_id: u64, serial: u32) -> String {
    let payload = URL_SAFE_NO_PAD.encode(json!({ "user_id": user_id, "jti": serial }).to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
}

fn issue(mock: &mut Mock) -> String {
    mock.issued += 1;
    let access = token(7, mock.issued);
    mock.valid_access = Some(access.clone());
    access
}

fn authorized(mock: &Mock, headers: &HeaderMap) -> bool {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    !mock.reject_all && provided.is_some() && provided == mock.valid_access.as_deref()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "token invalid" }))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["username"] != "ana" || body["password"] != "pw" {
        return unauthorized();
    }
    let mut mock = state.lock().unwrap();
    let access = issue(&mut mock);
    Json(json!({ "access": access, "refresh": "refresh-1" })).into_response()
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["refresh"] != "refresh-1" {
        return unauthorized();
    }
    let mut mock = state.lock().unwrap();
    mock.refreshes += 1;
    let access = issue(&mut mock);
    Json(json!({ "access": access })).into_response()
}

async fn universities(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&state.lock().unwrap(), &headers) {
        return unauthorized();
    }
    Json(json!({ "detail": "paginated responses are not lists" })).into_response()
}

async fn courses(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&state.lock().unwrap(), &headers) {
        return unauthorized();
    }
    if query.get("universidade").is_some_and(|u| u != "2") {
        return Json(json!([])).into_response();
    }
    Json(json!([
        { "id": 3, "nome": "Direito", "universidade": { "id": 2, "nome": "Universidade Particular do Exemplo", "polo": "Caicó" } },
        { "id": "broken" }
    ]))
    .into_response()
}

async fn subjects(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&state.lock().unwrap(), &headers) {
        return unauthorized();
    }
    if query.get("curso").map(String::as_str) != Some("3") {
        return Json(json!([])).into_response();
    }
    Json(json!([
        { "id": 1, "nome": "Introdução ao Direito", "periodo": 1, "curso": 3, "pre_requisitos": [] },
        { "id": 2, "nome": "Teoria do Estado", "periodo": 1, "curso": 3, "pre_requisitos": null },
        { "id": 4, "nome": "Direito Constitucional I", "periodo": 2, "curso": 3, "pre_requisitos": [2] },
        { "id": 5, "nome": "Direito Civil I", "periodo": 2, "curso": 3, "preRequisitos": [1] },
        { "nome": "missing id and period" },
        { "id": 6, "nome": "Sem período", "periodo": 0, "curso": 3, "pre_requisitos": [] },
        { "id": 2, "nome": "Teoria do Estado (duplicada)", "periodo": 1, "curso": 3 }
    ]))
    .into_response()
}

async fn user_subjects(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mock = state.lock().unwrap();
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    let rows: Vec<Value> = mock
        .statuses
        .iter()
        .map(|(id, status)| json!({ "id": id * 10, "usuario": 7, "disciplina": id, "status": status }))
        .chain(std::iter::once(json!({ "disciplina": 99, "status": "unknown" })))
        .collect();
    Json(Value::Array(rows)).into_response()
}

async fn update_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut mock = state.lock().unwrap();
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    let id = body["disciplina"].as_u64().unwrap();
    let status = body["status"].as_str().unwrap().to_string();
    mock.statuses.insert(id, status.clone());
    Json(json!({ "id": id * 10, "usuario": 7, "disciplina": id, "status": status })).into_response()
}

async fn remove_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut mock = state.lock().unwrap();
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    let id = body["disciplina"].as_u64().unwrap();
    mock.statuses.remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut mock = state.lock().unwrap();
    let id = 100 + mock.users.len() as u64;
    let user = json!({
        "id": id,
        "name": body["name"],
        "email": body["email"],
        "university": body["university"],
        "city": body["city"],
        "course": body["course"],
    });
    mock.users.insert(id, user.clone());
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn get_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let mock = state.lock().unwrap();
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    match mock.users.get(&id) {
        Some(user) => Json(user.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" }))).into_response(),
    }
}

async fn patch_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut mock = state.lock().unwrap();
    if !authorized(&mock, &headers) {
        return unauthorized();
    }
    let Some(user) = mock.users.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let (Value::Object(user), Value::Object(changes)) = (user, body) {
        user.extend(changes);
    }
    Json(mock.users[&id].clone()).into_response()
}

async fn spawn_mock() -> (String, Shared) {
    let mut mock = Mock::default();
    mock.users.insert(
        7,
        json!({
            "id": 7, "name": "Ana", "email": "ana@example.test", "username": "ana",
            "university": 2, "city": "Caicó", "course": 3
        }),
    );
    let state: Shared = Arc::new(Mutex::new(mock));
    let router = Router::new()
        .route("/api/users/", post(register))
        .route("/api/users/{id}/", get(get_user).patch(patch_user))
        .route("/api/token/", post(login))
        .route("/api/token/refresh/", post(refresh))
        .route("/api/universidades/", get(universities))
        .route("/api/cursos/", get(courses))
        .route("/api/disciplinas/", get(subjects))
        .route("/api/usuario-disciplinas/", get(user_subjects))
        .route("/api/usuario-disciplinas/update-status/", patch(update_status))
        .route(
            "/api/usuario-disciplinas/remove-status/",
            axum::routing::delete(remove_status),
        )
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

async fn logged_in_client() -> (RemoteClient, Shared) {
    let (url, state) = spawn_mock().await;
    let mut client = RemoteClient::new(&url, Duration::from_secs(5)).unwrap();
    let user = client.login("ana", "pw").await.unwrap();
    assert_eq!(user, UserId::new("7"));
    (client, state)
}

// =============================================================================
// AUTH FLOW
// =============================================================================

#[tokio::test]
async fn test_login_reads_user_id_from_token() {
    let (client, _state) = logged_in_client().await;

    assert!(client.is_authenticated());
    assert_eq!(client.current_user().unwrap(), UserId::new("7"));
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let (url, _state) = spawn_mock().await;
    let mut client = RemoteClient::new(&url, Duration::from_secs(5)).unwrap();

    let err = client.login("ana", "wrong").await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_once() {
    let (mut client, state) = logged_in_client().await;
    // Invalidate the access token server-side.
    state.lock().unwrap().valid_access = None;

    let courses = client.courses().await.unwrap();

    assert_eq!(courses.len(), 1);
    assert_eq!(state.lock().unwrap().refreshes, 1);
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_failed_retry_clears_tokens() {
    let (mut client, state) = logged_in_client().await;
    state.lock().unwrap().reject_all = true;

    let err = client.courses().await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!client.is_authenticated());
    assert_eq!(state.lock().unwrap().refreshes, 1);
}

#[tokio::test]
async fn test_no_refresh_without_tokens() {
    let (mut client, state) = logged_in_client().await;
    client.logout();

    let err = client.courses().await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized));
    assert_eq!(state.lock().unwrap().refreshes, 0);
}

// =============================================================================
// LENIENT READS
// =============================================================================

#[tokio::test]
async fn test_non_array_list_is_empty() {
    let (mut client, _state) = logged_in_client().await;

    assert!(client.universities().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_catalog_is_normalized() {
    let (mut client, _state) = logged_in_client().await;

    let course = client.courses().await.unwrap().remove(0);
    let catalog = client.catalog(&course).await.unwrap();

    assert_eq!(catalog.key().campus, "Caicó");
    // The period-0 subject and the repeated id 2 are dropped.
    assert_eq!(catalog.len(), 4);
    assert!(!catalog.contains(&SubjectId::new("6")));
    assert_eq!(catalog.label_for(&SubjectId::new("2")), "Teoria do Estado");
    let civil = catalog.get(&SubjectId::new("5")).unwrap();
    assert!(civil.prerequisites.contains(&SubjectId::new("1")));
    assert!(
        catalog
            .get(&SubjectId::new("2"))
            .unwrap()
            .prerequisites
            .is_empty()
    );
}

// =============================================================================
// PROGRESS
// =============================================================================

#[tokio::test]
async fn test_status_round_trip_through_remote_names() {
    let (mut client, state) = logged_in_client().await;
    let user = client.current_user().unwrap();

    client
        .apply_change(&SubjectId::new("2"), StatusChange::Set(ProgressStatus::Completed))
        .await
        .unwrap();
    client
        .update_status(&SubjectId::new("4"), ProgressStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(
        state.lock().unwrap().statuses.get(&4).map(String::as_str),
        Some("em_andamento")
    );

    let progress = client.progress(&user).await.unwrap();
    assert_eq!(progress.len(), 2);
    assert_eq!(
        progress.status(&SubjectId::new("2")),
        Some(ProgressStatus::Completed)
    );

    let course = client.courses().await.unwrap().remove(0);
    let catalog = client.catalog(&course).await.unwrap();
    let view = CurriculumView::compose(&catalog, &progress);
    assert_eq!(
        view.subject(&SubjectId::new("4")).unwrap().status,
        EffectiveStatus::InProgress
    );

    client
        .apply_change(&SubjectId::new("4"), StatusChange::Remove)
        .await
        .unwrap();
    let progress = client.progress(&user).await.unwrap();
    assert_eq!(progress.status(&SubjectId::new("4")), None);
}

// =============================================================================
// USERS
// =============================================================================

#[tokio::test]
async fn test_current_account_and_profile() {
    let (mut client, _state) = logged_in_client().await;

    let account = client.current_account().await.unwrap();
    assert_eq!(account.id, 7);
    assert_eq!(account.username.as_deref(), Some("ana"));
    assert_eq!(account.course, 3);

    let course = client.course(CourseId(account.course)).await.unwrap();
    let profile = account.to_profile(Some(&course));
    assert_eq!(profile.name, "Ana");
    assert_eq!(profile.catalog.unwrap().course, "Direito");

    let registry = demo_registry().unwrap();
    let local = registry.catalog_for_course(CourseId(3)).unwrap();
    assert_eq!(course.catalog_key(), local.key().clone());
}

#[tokio::test]
async fn test_register_then_update_user() {
    let (mut client, state) = logged_in_client().await;

    let request = RegisterRequest {
        name: "Bia".to_string(),
        email: "bia@example.test".to_string(),
        password: "pw".to_string(),
        confirm_password: "pw".to_string(),
        university: 2,
        city: "Caicó".to_string(),
        course: 3,
    };
    let account = client.register(&request).await.unwrap();
    assert_eq!(account.name, "Bia");
    assert!(state.lock().unwrap().users.contains_key(&account.id));

    let update = UserUpdate {
        city: Some("Natal".to_string()),
        ..UserUpdate::default()
    };
    let updated = client
        .update_user(&UserId::new(account.id.to_string()), &update)
        .await
        .unwrap();
    assert_eq!(updated.city, "Natal");
    assert_eq!(updated.course, 3);
}

#[tokio::test]
async fn test_register_mismatched_passwords_never_reaches_service() {
    let (mut client, state) = logged_in_client().await;

    let request = RegisterRequest {
        name: "Bia".to_string(),
        email: "bia@example.test".to_string(),
        password: "pw".to_string(),
        confirm_password: "other".to_string(),
        university: 2,
        city: String::new(),
        course: 3,
    };
    let err = client.register(&request).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidRequest(_)));
    assert_eq!(state.lock().unwrap().users.len(), 1);
}

#[tokio::test]
async fn test_courses_filtered_by_university() {
    let (mut client, _state) = logged_in_client().await;

    assert_eq!(client.courses_of(2).await.unwrap().len(), 1);
    assert!(client.courses_of(9).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_remote_course_is_catalog_not_found() {
    let (mut client, _state) = logged_in_client().await;

    let err = client.course(CourseId(42)).await.unwrap_err();

    assert!(matches!(err, PlannerError::CatalogNotFound(CourseId(42))));
}
