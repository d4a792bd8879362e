//! # Curriculum View
//!
//! The fully derived, render-ready picture of one user's standing in one
//! catalog. Built by a full recompute on every call; nothing is cached.
//!
//! A locked subject never exposes its recorded progress and is never
//! editable, even when a status was recorded while it was open.

use crate::availability::AvailabilityEngine;
use crate::catalog::{Catalog, CatalogKey};
use crate::progress::Progress;
use crate::{Availability, CourseId, EffectiveStatus, Period, ProgressStatus, Subject, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One prerequisite edge as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteView {
    pub id: SubjectId,
    /// Subject name, or the raw id when the reference is dangling.
    pub label: String,
    pub satisfied: bool,
    /// Whether the id names a subject in this catalog.
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectView {
    pub id: SubjectId,
    pub name: String,
    pub period: Period,
    /// Prerequisite standing alone, before progress is overlaid.
    pub availability: Availability,
    pub status: EffectiveStatus,
    pub progress: Option<ProgressStatus>,
    pub editable: bool,
    pub prerequisites: Vec<PrerequisiteView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodView {
    pub period: Period,
    pub label: String,
    pub subjects: Vec<SubjectView>,
}

/// Counts of subjects per effective status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub planned: usize,
    pub open: usize,
    pub locked: usize,
}

impl StatusSummary {
    fn record(&mut self, status: EffectiveStatus) {
        self.total += 1;
        let slot = match status {
            EffectiveStatus::Locked => &mut self.locked,
            EffectiveStatus::Completed => &mut self.completed,
            EffectiveStatus::InProgress => &mut self.in_progress,
            EffectiveStatus::Planned => &mut self.planned,
            EffectiveStatus::Open => &mut self.open,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumView {
    pub catalog: CatalogKey,
    pub course_id: CourseId,
    pub periods: Vec<PeriodView>,
    pub summary: StatusSummary,
}

impl CurriculumView {
    /// Compose the view for `progress` over `catalog`.
    #[must_use]
    pub fn compose(catalog: &Catalog, progress: &Progress) -> Self {
        let completed = progress.completed_ids();
        let mut summary = StatusSummary::default();

        let periods = AvailabilityEngine::group_by_period(catalog.subjects())
            .into_iter()
            .map(|group| PeriodView {
                period: group.period,
                label: group.label,
                subjects: group
                    .subjects
                    .into_iter()
                    .map(|subject| {
                        let view = subject_view(catalog, subject, &completed, progress);
                        summary.record(view.status);
                        view
                    })
                    .collect(),
            })
            .collect();

        Self {
            catalog: catalog.key().clone(),
            course_id: catalog.course_id(),
            periods,
            summary,
        }
    }

    /// Find a subject in the view.
    #[must_use]
    pub fn subject(&self, id: &SubjectId) -> Option<&SubjectView> {
        self.periods
            .iter()
            .flat_map(|p| p.subjects.iter())
            .find(|s| &s.id == id)
    }
}

fn subject_view(
    catalog: &Catalog,
    subject: &Subject,
    completed: &BTreeSet<SubjectId>,
    progress: &Progress,
) -> SubjectView {
    let recorded = progress.status(&subject.id);
    let availability = AvailabilityEngine::availability(subject, completed);
    let status = AvailabilityEngine::classify(subject, completed, recorded);

    let prerequisites = subject
        .prerequisites
        .iter()
        .map(|p| PrerequisiteView {
            id: p.clone(),
            label: catalog.label_for(p),
            satisfied: completed.contains(p),
            resolved: catalog.contains(p),
        })
        .collect();

    SubjectView {
        id: subject.id.clone(),
        name: subject.name.clone(),
        period: subject.period,
        availability,
        status,
        progress: if status.is_editable() { recorded } else { None },
        editable: status.is_editable(),
        prerequisites,
    }
}

// =============================================================================
// TESTS
// =============================================================================
