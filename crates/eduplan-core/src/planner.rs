//! # Planner Module
//!
//! The planner combines catalogs with a progress store and is the single
//! entry point used by the server and the CLI.
//!
//! ## Storage Backends
//!
//! - `InMemory`: uses [`MemoryStore`] (fast, volatile)
//! - `Persistent`: uses [`RedbStore`] for disk-backed ACID storage
//!
//! ## Identity
//!
//! Every user-scoped call takes an explicit [`Identity`]. Anonymous
//! identities are rejected before the store is touched.
//!
//! ## Course scope
//!
//! Progress is stored per (user, course). Subject ids are only unique
//! within one catalog, so completing subject `1` of one course says
//! nothing about subject `1` of another. Calls that take an optional
//! course fall back to the catalog selected in the user's [`Profile`].
//!
//! ## Prerequisite enforcement
//!
//! With enforcement off (the default) status writes are accepted for any
//! subject of the course. With enforcement on, `Set` is rejected for
//! subjects whose prerequisites are not completed in that course.

use crate::availability::AvailabilityEngine;
use crate::catalog::{Catalog, CatalogRegistry, CatalogSource};
use crate::profile::Profile;
use crate::progress::Progress;
use crate::schedule::{ScheduleKey, WeeklySchedule};
use crate::storage::RedbStore;
use crate::store::{MemoryStore, ProgressStore};
use crate::view::CurriculumView;
use crate::{
    CourseId, Identity, PlannerError, ProgressStatus, StatusChange, Subject, SubjectId, UserId,
};
use std::path::Path;

/// Storage backend for a [`Planner`].
#[derive(Debug)]
pub enum StoreBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl ProgressStore for StoreBackend {
    fn progress(&self, user: &UserId, course: CourseId) -> Result<Progress, PlannerError> {
        match self {
            Self::InMemory(store) => store.progress(user, course),
            Self::Persistent(store) => store.progress(user, course),
        }
    }

    fn set_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
        status: ProgressStatus,
    ) -> Result<(), PlannerError> {
        match self {
            Self::InMemory(store) => store.set_status(user, course, subject, status),
            Self::Persistent(store) => store.set_status(user, course, subject, status),
        }
    }

    fn remove_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
    ) -> Result<(), PlannerError> {
        match self {
            Self::InMemory(store) => store.remove_status(user, course, subject),
            Self::Persistent(store) => store.remove_status(user, course, subject),
        }
    }

    fn schedule(&self, user: &UserId) -> Result<WeeklySchedule, PlannerError> {
        match self {
            Self::InMemory(store) => store.schedule(user),
            Self::Persistent(store) => store.schedule(user),
        }
    }

    fn set_schedule_entry(
        &mut self,
        user: &UserId,
        key: ScheduleKey,
        label: &str,
    ) -> Result<(), PlannerError> {
        match self {
            Self::InMemory(store) => store.set_schedule_entry(user, key, label),
            Self::Persistent(store) => store.set_schedule_entry(user, key, label),
        }
    }

    fn profile(&self, user: &UserId) -> Result<Option<Profile>, PlannerError> {
        match self {
            Self::InMemory(store) => store.profile(user),
            Self::Persistent(store) => store.profile(user),
        }
    }

    fn set_profile(&mut self, user: &UserId, profile: &Profile) -> Result<(), PlannerError> {
        match self {
            Self::InMemory(store) => store.set_profile(user, profile),
            Self::Persistent(store) => store.set_profile(user, profile),
        }
    }
}

/// Catalogs plus per-user state.
#[derive(Debug)]
pub struct Planner {
    catalogs: CatalogRegistry,
    backend: StoreBackend,
    enforce_prerequisites: bool,
}

impl Planner {
    /// Create a planner with in-memory storage.
    #[must_use]
    pub fn new(catalogs: CatalogRegistry) -> Self {
        Self {
            catalogs,
            backend: StoreBackend::default(),
            enforce_prerequisites: false,
        }
    }

    /// Create a planner with persistent redb storage at `path`.
    pub fn with_redb(
        catalogs: CatalogRegistry,
        path: impl AsRef<Path>,
    ) -> Result<Self, PlannerError> {
        Ok(Self {
            catalogs,
            backend: StoreBackend::Persistent(RedbStore::open(path)?),
            enforce_prerequisites: false,
        })
    }

    /// Builder-style toggle for prerequisite enforcement.
    #[must_use]
    pub fn with_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_prerequisites = enforce;
        self
    }

    #[must_use]
    pub fn enforces_prerequisites(&self) -> bool {
        self.enforce_prerequisites
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StoreBackend::Persistent(_))
    }

    #[must_use]
    pub fn catalogs(&self) -> &CatalogRegistry {
        &self.catalogs
    }

    /// Subjects of a course; empty if the course is unknown.
    #[must_use]
    pub fn subjects_for_course(&self, course_id: CourseId) -> &[Subject] {
        self.catalogs.subjects_for_course(course_id)
    }

    fn catalog(&self, course_id: CourseId) -> Result<&Catalog, PlannerError> {
        self.catalogs
            .catalog_for_course(course_id)
            .ok_or(PlannerError::CatalogNotFound(course_id))
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    pub fn profile(&self, identity: &Identity) -> Result<Option<Profile>, PlannerError> {
        self.backend.profile(identity.require()?)
    }

    /// Replace the caller's profile.
    ///
    /// A selected catalog must name one of the loaded catalogs.
    pub fn set_profile(
        &mut self,
        identity: &Identity,
        profile: Profile,
    ) -> Result<Profile, PlannerError> {
        let user = identity.require()?.clone();
        let profile = profile.normalized()?;
        if let Some(key) = &profile.catalog {
            if self.catalogs.catalog_for_key(key).is_none() {
                return Err(PlannerError::UnknownCatalog(key.clone()));
            }
        }
        self.backend.set_profile(&user, &profile)?;
        Ok(profile)
    }

    /// The course an operation applies to: the explicit one, else the
    /// catalog selected in the caller's profile.
    pub fn resolve_course(
        &self,
        identity: &Identity,
        course_id: Option<CourseId>,
    ) -> Result<CourseId, PlannerError> {
        let user = identity.require()?;
        if let Some(course_id) = course_id {
            return Ok(course_id);
        }
        let key = self
            .backend
            .profile(user)?
            .and_then(|profile| profile.catalog)
            .ok_or(PlannerError::CourseRequired)?;
        self.catalogs
            .catalog_for_key(&key)
            .map(Catalog::course_id)
            .ok_or(PlannerError::UnknownCatalog(key))
    }

    // =========================================================================
    // PROGRESS
    // =========================================================================

    /// The caller's progress in one course.
    pub fn progress(
        &self,
        identity: &Identity,
        course_id: Option<CourseId>,
    ) -> Result<(CourseId, Progress), PlannerError> {
        let course_id = self.resolve_course(identity, course_id)?;
        let progress = self.backend.progress(identity.require()?, course_id)?;
        Ok((course_id, progress))
    }

    /// Apply a status change and return the course progress afterwards.
    ///
    /// The subject must exist in the course's catalog.
    pub fn change_status(
        &mut self,
        identity: &Identity,
        subject_id: &SubjectId,
        change: StatusChange,
        course_id: Option<CourseId>,
    ) -> Result<(CourseId, Progress), PlannerError> {
        let course_id = self.resolve_course(identity, course_id)?;
        let user = identity.require()?.clone();
        let catalog = self.catalog(course_id)?;

        if self.enforce_prerequisites {
            let current = self.backend.progress(&user, course_id)?;
            AvailabilityEngine::apply_status_change_checked(catalog, &current, subject_id, change)?;
        } else if !catalog.contains(subject_id) {
            return Err(PlannerError::SubjectNotFound(subject_id.clone()));
        }

        self.backend.apply_change(&user, course_id, subject_id, change)?;
        Ok((course_id, self.backend.progress(&user, course_id)?))
    }

    /// Compose the curriculum view of one course for the caller.
    pub fn plan(
        &self,
        identity: &Identity,
        course_id: Option<CourseId>,
    ) -> Result<CurriculumView, PlannerError> {
        let (course_id, progress) = self.progress(identity, course_id)?;
        Ok(CurriculumView::compose(self.catalog(course_id)?, &progress))
    }

    // =========================================================================
    // SCHEDULE
    // =========================================================================

    pub fn schedule(&self, identity: &Identity) -> Result<WeeklySchedule, PlannerError> {
        self.backend.schedule(identity.require()?)
    }

    /// Write one schedule cell and return the updated schedule.
    pub fn set_schedule_entry(
        &mut self,
        identity: &Identity,
        key: ScheduleKey,
        label: &str,
    ) -> Result<WeeklySchedule, PlannerError> {
        let user = identity.require()?.clone();
        self.backend.set_schedule_entry(&user, key, label)?;
        self.backend.schedule(&user)
    }
}

// =============================================================================
// TESTS
// =============================================================================
