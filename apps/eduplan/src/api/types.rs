//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use eduplan_core::{
    Catalog, CatalogKey, CourseId, CurriculumView, Period, PeriodGroup, PlannerError, Profile,
    Progress, ScheduleKey, StatusChange, Subject, SubjectId, UserId, WeeklySchedule,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// CATALOG RESPONSES
// =============================================================================

/// One catalog in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub university: String,
    pub campus: String,
    pub course: String,
    pub course_id: CourseId,
    pub subject_count: usize,
}

impl From<&Catalog> for CatalogSummary {
    fn from(catalog: &Catalog) -> Self {
        let key = catalog.key();
        Self {
            university: key.university.clone(),
            campus: key.campus.clone(),
            course: key.course.clone(),
            course_id: catalog.course_id(),
            subject_count: catalog.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogListResponse {
    pub catalogs: Vec<CatalogSummary>,
}

/// Subjects of one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodJson {
    pub period: Period,
    pub label: String,
    pub subjects: Vec<Subject>,
}

impl From<PeriodGroup<'_>> for PeriodJson {
    fn from(group: PeriodGroup<'_>) -> Self {
        Self {
            period: group.period,
            label: group.label,
            subjects: group.subjects.into_iter().cloned().collect(),
        }
    }
}

/// Subjects of a course grouped by period. Unknown courses yield no periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectsResponse {
    pub course_id: CourseId,
    pub periods: Vec<PeriodJson>,
}

// =============================================================================
// PROGRESS REQUEST/RESPONSE
// =============================================================================

/// Optional `?course_id=` on progress routes. Absent means the course
/// selected in the user's profile.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CourseQuery {
    #[serde(default)]
    pub course_id: Option<u64>,
}

impl CourseQuery {
    #[must_use]
    pub fn course(&self) -> Option<CourseId> {
        self.course_id.map(CourseId)
    }
}

/// Status write request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    /// `completed`, `in_progress`, `planned`, or `remove`.
    pub status: String,
    /// Course the status belongs to; defaults to the profile's course.
    #[serde(default)]
    pub course_id: Option<CourseId>,
}

impl StatusRequest {
    pub fn to_change(&self) -> Result<StatusChange, PlannerError> {
        self.status.parse()
    }
}

/// Progress response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub user_id: Option<UserId>,
    pub course_id: Option<CourseId>,
    pub statuses: Option<Progress>,
    #[serde(default)]
    pub completed_ids: Vec<SubjectId>,
    /// Unmet prerequisites when a gated write is rejected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<SubjectId>,
    pub error: Option<String>,
}

impl ProgressResponse {
    pub fn success(user_id: UserId, course_id: CourseId, progress: Progress) -> Self {
        Self {
            success: true,
            user_id: Some(user_id),
            course_id: Some(course_id),
            completed_ids: progress.completed_ids().into_iter().collect(),
            statuses: Some(progress),
            missing: vec![],
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            user_id: None,
            course_id: None,
            statuses: None,
            completed_ids: vec![],
            missing: vec![],
            error: Some(msg.into()),
        }
    }

    /// Error response for a planner error, carrying missing ids if any.
    pub fn from_error(e: &PlannerError) -> Self {
        let mut response = Self::error(e.to_string());
        if let PlannerError::PrerequisitesNotMet { missing, .. } = e {
            response.missing.clone_from(missing);
        }
        response
    }
}

// =============================================================================
// PROFILE REQUEST/RESPONSE
// =============================================================================

/// Profile write. The catalog may be named by key or by course id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub catalog: Option<CatalogKey>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Option<Profile>,
    /// Course id of the selected catalog, when there is one.
    pub course_id: Option<CourseId>,
    pub error: Option<String>,
}

impl ProfileResponse {
    pub fn success(profile: Option<Profile>, course_id: Option<CourseId>) -> Self {
        Self {
            success: true,
            profile,
            course_id,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            profile: None,
            course_id: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// PLAN RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub success: bool,
    pub plan: Option<CurriculumView>,
    pub error: Option<String>,
}

impl PlanResponse {
    pub fn success(plan: CurriculumView) -> Self {
        Self {
            success: true,
            plan: Some(plan),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            plan: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SCHEDULE REQUEST/RESPONSE
// =============================================================================

/// Schedule cell write. An empty `subject` clears the cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub day: String,
    pub time: String,
    #[serde(default)]
    pub subject: String,
}

impl ScheduleRequest {
    pub fn to_key(&self) -> Result<ScheduleKey, PlannerError> {
        Ok(ScheduleKey::new(self.day.parse()?, self.time.parse()?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub entries: Option<WeeklySchedule>,
    pub error: Option<String>,
}

impl ScheduleResponse {
    pub fn success(entries: WeeklySchedule) -> Self {
        Self {
            success: true,
            entries: Some(entries),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            entries: None,
            error: Some(msg.into()),
        }
    }
}
