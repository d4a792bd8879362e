//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the planner:
//! - Identifiers (`SubjectId`, `UserId`, `CourseId`)
//! - Curriculum entries (`Subject`, `Period`)
//! - Progress and derived states (`ProgressStatus`, `StatusChange`,
//!   `Availability`, `EffectiveStatus`)
//! - Caller identity (`Identity`)
//! - Error types (`PlannerError`)
//!
//! ## Determinism Guarantees
//!
//! All collections in this module are ordered (`BTreeSet`/`BTreeMap`), so
//! every derived view is reproducible for the same input.

use crate::catalog::CatalogKey;
use crate::primitives::PERIOD_LABEL_SUFFIX;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque, stable identifier of a subject within one catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    /// Create a new subject identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a user, as supplied by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric course identifier used by the remote catalog service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct CourseId(pub u64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// PERIOD
// =============================================================================

/// The academic term a subject is conventionally taken in. Always >= 1
/// once a subject has passed catalog validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub u32);

impl Period {
    /// Get the raw period number.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Display label for the period, e.g. `1º Período`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}{}", self.0, PERIOD_LABEL_SUFFIX)
    }
}

// =============================================================================
// SUBJECT
// =============================================================================

/// One curriculum entry.
///
/// `prerequisites` may reference ids that are not present in the catalog;
/// such references are kept as-is and only ever used for membership tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub period: Period,
    #[serde(default)]
    pub prerequisites: BTreeSet<SubjectId>,
}

impl Subject {
    /// Create a subject without prerequisites.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, period: u32) -> Self {
        Self {
            id: SubjectId::new(id),
            name: name.into(),
            period: Period(period),
            prerequisites: BTreeSet::new(),
        }
    }

    /// Builder-style helper that sets the prerequisite ids.
    #[must_use]
    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(SubjectId::new).collect();
        self
    }
}

// =============================================================================
// PROGRESS STATUS
// =============================================================================

/// A user-assignable progress marking for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Completed,
    InProgress,
    Planned,
}

impl ProgressStatus {
    /// All statuses in precedence order.
    pub const ALL: [ProgressStatus; 3] = [Self::Completed, Self::InProgress, Self::Planned];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::InProgress => "in_progress",
            Self::Planned => "planned",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "completed" => Ok(Self::Completed),
            "in_progress" => Ok(Self::InProgress),
            "planned" => Ok(Self::Planned),
            other => Err(PlannerError::InvalidStatus(other.to_string())),
        }
    }
}

/// A requested mutation of one subject's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusChange {
    /// Overwrite the subject's status.
    Set(ProgressStatus),
    /// Clear the subject's status.
    Remove,
}

impl FromStr for StatusChange {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "remove" {
            Ok(Self::Remove)
        } else {
            s.parse().map(Self::Set)
        }
    }
}

impl From<ProgressStatus> for StatusChange {
    fn from(status: ProgressStatus) -> Self {
        Self::Set(status)
    }
}

// =============================================================================
// DERIVED STATES
// =============================================================================

/// Prerequisite gating result for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Locked,
}

/// The status shown to the user: availability overlaid with progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Locked,
    Completed,
    InProgress,
    Planned,
    Open,
}

impl EffectiveStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Completed => "completed",
            Self::InProgress => "in_progress",
            Self::Planned => "planned",
            Self::Open => "open",
        }
    }

    /// Whether the user may change the progress of a subject in this state.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::Locked)
    }
}

impl fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProgressStatus> for EffectiveStatus {
    fn from(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::Completed => Self::Completed,
            ProgressStatus::InProgress => Self::InProgress,
            ProgressStatus::Planned => Self::Planned,
        }
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// The caller as resolved by the identity collaborator.
///
/// Passed explicitly into every user-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub authenticated: bool,
}

impl Identity {
    /// An authenticated identity.
    #[must_use]
    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id,
            authenticated: true,
        }
    }

    /// An identity that has not been authenticated.
    #[must_use]
    pub fn anonymous(user_id: UserId) -> Self {
        Self {
            user_id,
            authenticated: false,
        }
    }

    /// Return the user id, or `Unauthenticated` if the identity is anonymous.
    pub fn require(&self) -> Result<&UserId, PlannerError> {
        if self.authenticated {
            Ok(&self.user_id)
        } else {
            Err(PlannerError::Unauthenticated)
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised at the planner's fallible boundaries.
///
/// The availability engine itself never returns these; they come from
/// catalog validation, gated writes, schedule input and storage.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// A catalog failed boundary validation.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Two subjects in one catalog share an id.
    #[error("Duplicate subject id: {0}")]
    DuplicateSubject(SubjectId),

    /// A subject id is not part of the catalog.
    #[error("Subject not found: {0}")]
    SubjectNotFound(SubjectId),

    /// No catalog matches the requested course.
    #[error("Catalog not found for course {0}")]
    CatalogNotFound(CourseId),

    /// No catalog matches a profile's (university, campus, course) selection.
    #[error("Catalog not found: {0}")]
    UnknownCatalog(CatalogKey),

    /// A status write targeted a subject whose prerequisites are unmet.
    #[error("Prerequisites not met for {subject}: missing {missing:?}")]
    PrerequisitesNotMet {
        subject: SubjectId,
        missing: Vec<SubjectId>,
    },

    /// Progress is per course: the caller named none and has no catalog
    /// selected in their profile.
    #[error("A course id is required: pass one or select a catalog in the profile")]
    CourseRequired,

    /// A profile field was rejected.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// A status name could not be parsed.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// A schedule day, slot or label was rejected.
    #[error("Invalid schedule entry: {0}")]
    InvalidSchedule(String),

    /// The operation requires an authenticated identity.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
