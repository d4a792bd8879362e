//! # Remote Curriculum Client
//!
//! Client for the remote REST service used in API mode.
//!
//! The service issues a JWT pair on login. Every request carries the access
//! token; a 401 with a refresh token available triggers one refresh and one
//! retry. Any failure after that clears both tokens.
//!
//! Catalog and progress reads are lenient: a list endpoint that answers with
//! something other than a JSON array yields an empty list, and elements that
//! do not match the expected shape are skipped. A subject that parses but
//! fails validation is dropped from its catalog with a warning.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use eduplan_core::{
    Catalog, CatalogKey, CourseId, PlannerError, Profile, Progress, ProgressStatus, RawId,
    RawSubject, StatusChange, SubjectId, UserId,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from the remote client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Cannot reach the remote service.
    #[error("Cannot connect to remote service at {0}")]
    ConnectionFailed(String),

    /// 401 after the refresh attempt, or no credentials at all.
    #[error("Unauthorized: invalid or expired credentials")]
    Unauthorized,

    /// 429 Too Many Requests.
    #[error("Rate limited: too many requests")]
    RateLimited,

    /// Any other non-success status.
    #[error("Remote error ({0}): {1}")]
    Status(u16, String),

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The access token payload has no usable `user_id` claim.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The request was rejected before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ClientError> for PlannerError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Unauthorized | ClientError::InvalidToken(_) => {
                PlannerError::Unauthenticated
            }
            ClientError::ParseError(msg) => PlannerError::SerializationError(msg),
            ClientError::InvalidRequest(msg) => PlannerError::InvalidProfile(msg),
            other => PlannerError::IoError(other.to_string()),
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Status names used by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Concluida,
    EmAndamento,
    Pendente,
}

impl From<ProgressStatus> for RemoteStatus {
    fn from(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::Completed => Self::Concluida,
            ProgressStatus::InProgress => Self::EmAndamento,
            ProgressStatus::Planned => Self::Pendente,
        }
    }
}

impl From<RemoteStatus> for ProgressStatus {
    fn from(status: RemoteStatus) -> Self {
        match status {
            RemoteStatus::Concluida => Self::Completed,
            RemoteStatus::EmAndamento => Self::InProgress,
            RemoteStatus::Pendente => Self::Planned,
        }
    }
}

/// Token pair returned by `POST /api/token/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
struct RefreshedToken {
    access: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub id: u64,
    pub nome: String,
    pub polo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub nome: String,
    pub universidade: University,
}

impl Course {
    /// Catalog key for this course: (university name, campus, course name).
    #[must_use]
    pub fn catalog_key(&self) -> CatalogKey {
        CatalogKey::new(
            self.universidade.nome.clone(),
            self.universidade.polo.clone(),
            self.nome.clone(),
        )
    }
}

/// A user account on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    /// University id.
    pub university: u64,
    #[serde(default)]
    pub city: String,
    /// Course id.
    pub course: u64,
}

impl RemoteUser {
    /// Local profile for this account, with the catalog of `course` when
    /// it is the account's course.
    #[must_use]
    pub fn to_profile(&self, course: Option<&Course>) -> Profile {
        let profile = Profile::new(self.name.clone(), self.email.clone());
        match course {
            Some(course) if course.id == self.course => profile.with_catalog(course.catalog_key()),
            _ => profile,
        }
    }
}

/// Account creation payload for `POST /api/users/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    pub university: u64,
    pub city: String,
    pub course: u64,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::InvalidRequest("name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ClientError::InvalidRequest(format!(
                "invalid email '{}'",
                self.email
            )));
        }
        if self.password.is_empty() || self.password != self.confirm_password {
            return Err(ClientError::InvalidRequest(
                "passwords are empty or do not match".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial account update for `PATCH /api/users/{id}/`. Unset fields are
/// left untouched by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<u64>,
}

fn parse<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::ParseError(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct UserSubject {
    disciplina: RawId,
    status: RemoteStatus,
}

/// Read the `user_id` claim from a JWT access token.
///
/// Only the payload is decoded; the service verifies signatures.
pub fn user_id_from_token(token: &str) -> Result<UserId, ClientError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::InvalidToken("not a JWT".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
    let claims: Value =
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidToken(e.to_string()))?;

    match claims.get("user_id") {
        Some(Value::Number(n)) => Ok(UserId::new(n.to_string())),
        Some(Value::String(s)) if !s.is_empty() => Ok(UserId::new(s.clone())),
        _ => Err(ClientError::InvalidToken("missing user_id claim".to_string())),
    }
}

/// Decode a list response leniently.
fn lenient_list<T: DeserializeOwned>(endpoint: &str, body: Value) -> Vec<T> {
    let Value::Array(items) = body else {
        tracing::warn!(endpoint, "expected a JSON array, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "skipping malformed element");
                None
            }
        })
        .collect()
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the remote curriculum service.
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<TokenPair>,
}

impl RemoteClient {
    /// Create a client for `base_url` with a request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: None,
        })
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    /// The user id carried by the current access token.
    pub fn current_user(&self) -> Result<UserId, ClientError> {
        let tokens = self.tokens.as_ref().ok_or(ClientError::Unauthorized)?;
        user_id_from_token(&tokens.access)
    }

    pub fn logout(&mut self) {
        self.tokens = None;
    }

    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(tokens) = &self.tokens {
            req = req.bearer_auth(&tokens.access);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// Send a request, refreshing and retrying once on 401.
    async fn execute(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        tracing::debug!(%method, path, "remote request");
        let resp = self
            .send(self.request(method.clone(), path, body.as_ref()))
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED && self.refresh().await {
            tracing::debug!(path, "retrying after token refresh");
            let retry = self.send(self.request(method, path, body.as_ref())).await?;
            return self.handle_response(retry).await;
        }

        self.handle_response(resp).await
    }

    async fn handle_response(&mut self, resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if status.is_success() {
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            let text = resp
                .text()
                .await
                .map_err(|e| ClientError::ParseError(e.to_string()))?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| ClientError::ParseError(e.to_string()));
        }

        self.tokens = None;
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }
        let text = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %text, "remote request failed");
        Err(ClientError::Status(status.as_u16(), text))
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `false` when there is no refresh token or the exchange fails.
    async fn refresh(&mut self) -> bool {
        let Some(refresh) = self.tokens.as_ref().map(|t| t.refresh.clone()) else {
            return false;
        };

        let url = format!("{}/api/token/refresh/", self.base_url);
        let resp = match self
            .http
            .post(&url)
            .json(&json!({ "refresh": refresh }))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = resp.status().as_u16(), "token refresh rejected");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed");
                return false;
            }
        };

        match resp.json::<RefreshedToken>().await {
            Ok(token) => {
                if let Some(tokens) = self.tokens.as_mut() {
                    tokens.access = token.access;
                }
                tracing::info!("access token refreshed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "unreadable refresh response");
                false
            }
        }
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// Log in and return the user id from the issued access token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<UserId, ClientError> {
        self.tokens = None;
        let body = json!({ "username": username, "password": password });
        let value = self.execute(Method::POST, "/api/token/", Some(body)).await?;
        let tokens: TokenPair = parse(value)?;

        let user = user_id_from_token(&tokens.access)?;
        self.tokens = Some(tokens);
        tracing::info!(user = %user, "logged in to remote service");
        Ok(user)
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Create an account. No token is needed or issued.
    pub async fn register(&mut self, request: &RegisterRequest) -> Result<RemoteUser, ClientError> {
        request.validate()?;
        let body = serde_json::to_value(request).map_err(|e| ClientError::ParseError(e.to_string()))?;
        let user: RemoteUser = parse(self.execute(Method::POST, "/api/users/", Some(body)).await?)?;
        tracing::info!(user = user.id, "registered remote account");
        Ok(user)
    }

    pub async fn user(&mut self, id: &UserId) -> Result<RemoteUser, ClientError> {
        let path = format!("/api/users/{id}/");
        parse(self.execute(Method::GET, &path, None).await?)
    }

    /// The account behind the current access token.
    pub async fn current_account(&mut self) -> Result<RemoteUser, ClientError> {
        let id = self.current_user()?;
        self.user(&id).await
    }

    pub async fn update_user(
        &mut self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<RemoteUser, ClientError> {
        let path = format!("/api/users/{id}/");
        let body = serde_json::to_value(update).map_err(|e| ClientError::ParseError(e.to_string()))?;
        parse(self.execute(Method::PATCH, &path, Some(body)).await?)
    }

    // =========================================================================
    // CATALOG READS
    // =========================================================================

    pub async fn universities(&mut self) -> Result<Vec<University>, ClientError> {
        let body = self.execute(Method::GET, "/api/universidades/", None).await?;
        Ok(lenient_list("universidades", body))
    }

    pub async fn courses(&mut self) -> Result<Vec<Course>, ClientError> {
        let body = self.execute(Method::GET, "/api/cursos/", None).await?;
        Ok(lenient_list("cursos", body))
    }

    pub async fn courses_of(&mut self, university: u64) -> Result<Vec<Course>, ClientError> {
        let path = format!("/api/cursos/?universidade={university}");
        let body = self.execute(Method::GET, &path, None).await?;
        Ok(lenient_list("cursos", body))
    }

    /// The course with id `course_id`, if the service lists it.
    pub async fn course(&mut self, course_id: CourseId) -> Result<Course, PlannerError> {
        self.courses()
            .await?
            .into_iter()
            .find(|c| c.id == course_id.0)
            .ok_or(PlannerError::CatalogNotFound(course_id))
    }

    /// Raw subjects of a course, before validation.
    pub async fn subjects(&mut self, course_id: CourseId) -> Result<Vec<RawSubject>, ClientError> {
        let path = format!("/api/disciplinas/?curso={course_id}");
        let body = self.execute(Method::GET, &path, None).await?;
        Ok(lenient_list("disciplinas", body))
    }

    /// Fetch a course's subjects and validate them into a [`Catalog`].
    ///
    /// Invalid or duplicate subjects are logged and left out.
    pub async fn catalog(&mut self, course: &Course) -> Result<Catalog, PlannerError> {
        let course_id = CourseId(course.id);
        let raw = self.subjects(course_id).await?;
        let (catalog, rejected) = Catalog::lenient(course.catalog_key(), course_id, raw)?;
        for e in &rejected {
            tracing::warn!(course = %course_id, error = %e, "skipping invalid subject");
        }
        Ok(catalog)
    }

    // =========================================================================
    // PROGRESS
    // =========================================================================

    pub async fn progress(&mut self, user: &UserId) -> Result<Progress, ClientError> {
        let path = format!("/api/usuario-disciplinas/?usuario={user}");
        let body = self.execute(Method::GET, &path, None).await?;
        Ok(lenient_list::<UserSubject>("usuario-disciplinas", body)
            .into_iter()
            .map(|entry| {
                (
                    entry.disciplina.into_subject_id(),
                    ProgressStatus::from(entry.status),
                )
            })
            .collect())
    }

    pub async fn update_status(
        &mut self,
        subject: &SubjectId,
        status: ProgressStatus,
    ) -> Result<(), ClientError> {
        let body = json!({
            "disciplina": wire_id(subject),
            "status": RemoteStatus::from(status),
        });
        self.execute(
            Method::PATCH,
            "/api/usuario-disciplinas/update-status/",
            Some(body),
        )
        .await?;
        Ok(())
    }

    pub async fn remove_status(&mut self, subject: &SubjectId) -> Result<(), ClientError> {
        let body = json!({ "disciplina": wire_id(subject) });
        self.execute(
            Method::DELETE,
            "/api/usuario-disciplinas/remove-status/",
            Some(body),
        )
        .await?;
        Ok(())
    }

    pub async fn apply_change(
        &mut self,
        subject: &SubjectId,
        change: StatusChange,
    ) -> Result<(), ClientError> {
        match change {
            StatusChange::Set(status) => self.update_status(subject, status).await,
            StatusChange::Remove => self.remove_status(subject).await,
        }
    }
}

/// Subject ids are numeric on the remote side when they look numeric.
fn wire_id(subject: &SubjectId) -> Value {
    subject
        .as_str()
        .parse::<u64>()
        .map_or_else(|_| Value::from(subject.as_str()), Value::from)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn status_names_map_both_ways() {
        for status in ProgressStatus::ALL {
            assert_eq!(ProgressStatus::from(RemoteStatus::from(status)), status);
        }
        let parsed: RemoteStatus = serde_json::from_str("\"em_andamento\"").expect("parse");
        assert_eq!(ProgressStatus::from(parsed), ProgressStatus::InProgress);
        assert!(serde_json::from_str::<RemoteStatus>("\"done\"").is_err());
    }

    #[test]
    fn user_id_from_numeric_and_string_claims() {
        let numeric = token_with(r#"{"user_id": 42, "exp": 1}"#);
        assert_eq!(user_id_from_token(&numeric).expect("id"), UserId::new("42"));

        let text = token_with(r#"{"user_id": "abc"}"#);
        assert_eq!(user_id_from_token(&text).expect("id"), UserId::new("abc"));
    }

    #[test]
    fn bad_tokens_are_rejected() {
        assert!(user_id_from_token("no-dots").is_err());
        assert!(user_id_from_token(&token_with(r#"{"sub": 1}"#)).is_err());
        assert!(user_id_from_token("a.!!!.c").is_err());
    }

    #[test]
    fn lenient_list_skips_bad_elements() {
        let body = json!([
            {"id": 1, "nome": "UF", "polo": "Natal"},
            {"id": "x"},
            {"id": 2, "nome": "UP", "polo": "Caicó"},
        ]);
        let unis: Vec<University> = lenient_list("universidades", body);
        assert_eq!(unis.len(), 2);

        let empty: Vec<University> = lenient_list("universidades", json!({"detail": "nope"}));
        assert!(empty.is_empty());
    }

    #[test]
    fn register_request_is_checked_locally() {
        let mut request = RegisterRequest {
            name: "Ana".to_string(),
            email: "ana@example.test".to_string(),
            password: "pw".to_string(),
            confirm_password: "pw".to_string(),
            university: 1,
            city: "Natal".to_string(),
            course: 4,
        };
        assert!(request.validate().is_ok());
        let wire = serde_json::to_value(&request).expect("serialize");
        assert_eq!(wire["confirmPassword"], "pw");

        request.confirm_password = "other".to_string();
        assert!(matches!(request.validate(), Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn user_update_sends_only_set_fields() {
        let update = UserUpdate {
            course: Some(3),
            ..UserUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).expect("serialize"), json!({ "course": 3 }));
    }

    #[test]
    fn numeric_ids_go_out_as_numbers() {
        assert_eq!(wire_id(&SubjectId::new("7")), json!(7));
        assert_eq!(wire_id(&SubjectId::new("CALC1")), json!("CALC1"));
    }
}
