//! # Progress Store
//!
//! Per-user persistence for progress records, weekly schedules and
//! profiles.
//!
//! Progress is scoped by course: subject ids are only unique within one
//! catalog, so each (user, course) pair has its own record.
//!
//! All fallible operations return `Result<T, PlannerError>` so the
//! in-memory and disk-backed stores can be used interchangeably.
//! Writes are last-write-wins per subject id.

use crate::profile::Profile;
use crate::progress::Progress;
use crate::schedule::{ScheduleKey, WeeklySchedule};
use crate::{CourseId, PlannerError, ProgressStatus, StatusChange, SubjectId, UserId};
use std::collections::BTreeMap;

// =============================================================================
// PROGRESSSTORE TRAIT
// =============================================================================

pub trait ProgressStore {
    /// Recorded progress of a user in one course. Unknown pairs are empty.
    fn progress(&self, user: &UserId, course: CourseId) -> Result<Progress, PlannerError>;

    /// Overwrite one subject's status.
    fn set_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
        status: ProgressStatus,
    ) -> Result<(), PlannerError>;

    /// Clear one subject's status. No-op if nothing is recorded.
    fn remove_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
    ) -> Result<(), PlannerError>;

    /// A user's weekly schedule. Unknown users have an empty schedule.
    fn schedule(&self, user: &UserId) -> Result<WeeklySchedule, PlannerError>;

    /// Write one schedule cell. A blank label clears it.
    fn set_schedule_entry(
        &mut self,
        user: &UserId,
        key: ScheduleKey,
        label: &str,
    ) -> Result<(), PlannerError>;

    /// A user's profile, if one was saved.
    fn profile(&self, user: &UserId) -> Result<Option<Profile>, PlannerError>;

    /// Replace a user's profile.
    fn set_profile(&mut self, user: &UserId, profile: &Profile) -> Result<(), PlannerError>;

    /// Apply a [`StatusChange`] by dispatching to the two mutation entry points.
    fn apply_change(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
        change: StatusChange,
    ) -> Result<(), PlannerError> {
        match change {
            StatusChange::Set(status) => self.set_status(user, course, subject, status),
            StatusChange::Remove => self.remove_status(user, course, subject),
        }
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile store. State is lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    progress: BTreeMap<(UserId, CourseId), Progress>,
    schedules: BTreeMap<UserId, WeeklySchedule>,
    profiles: BTreeMap<UserId, Profile>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (user, course) pairs with any recorded progress.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.progress.len()
    }
}

impl ProgressStore for MemoryStore {
    fn progress(&self, user: &UserId, course: CourseId) -> Result<Progress, PlannerError> {
        Ok(self
            .progress
            .get(&(user.clone(), course))
            .cloned()
            .unwrap_or_default())
    }

    fn set_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
        status: ProgressStatus,
    ) -> Result<(), PlannerError> {
        self.progress
            .entry((user.clone(), course))
            .or_default()
            .apply(subject, StatusChange::Set(status));
        Ok(())
    }

    fn remove_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
    ) -> Result<(), PlannerError> {
        let key = (user.clone(), course);
        if let Some(progress) = self.progress.get_mut(&key) {
            progress.apply(subject, StatusChange::Remove);
            if progress.is_empty() {
                self.progress.remove(&key);
            }
        }
        Ok(())
    }

    fn schedule(&self, user: &UserId) -> Result<WeeklySchedule, PlannerError> {
        Ok(self.schedules.get(user).cloned().unwrap_or_default())
    }

    fn set_schedule_entry(
        &mut self,
        user: &UserId,
        key: ScheduleKey,
        label: &str,
    ) -> Result<(), PlannerError> {
        let schedule = self.schedules.entry(user.clone()).or_default();
        let result = schedule.set_entry(key, label);
        if schedule.is_empty() {
            self.schedules.remove(user);
        }
        result
    }

    fn profile(&self, user: &UserId) -> Result<Option<Profile>, PlannerError> {
        Ok(self.profiles.get(user).cloned())
    }

    fn set_profile(&mut self, user: &UserId, profile: &Profile) -> Result<(), PlannerError> {
        self.profiles.insert(user.clone(), profile.clone());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
