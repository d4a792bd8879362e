//! # Availability Engine
//!
//! Prerequisite gating and status derivation for a curriculum.
//!
//! Every operation here is a pure function over borrowed input:
//! - No I/O, no shared state
//! - Total: malformed optional data has already been defaulted to empty
//!   at the catalog boundary, so nothing here can fail
//! - Full recompute: callers re-run `classify` over the whole catalog
//!   after each status change
//!
//! ## Effective status precedence
//!
//! | Order | Status | Condition |
//! |-------|--------|-----------|
//! | 1 | `locked` | some prerequisite is not completed |
//! | 2 | `completed` | recorded status is completed |
//! | 3 | `in_progress` | recorded status is in progress |
//! | 4 | `planned` | recorded status is planned |
//! | 5 | `open` | available, nothing recorded |

use crate::catalog::Catalog;
use crate::progress::Progress;
use crate::{
    Availability, EffectiveStatus, Period, PlannerError, ProgressStatus, StatusChange, Subject,
    SubjectId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Subjects of one period, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodGroup<'a> {
    pub period: Period,
    pub label: String,
    pub subjects: Vec<&'a Subject>,
}

/// The availability engine. Stateless; all operations are associated
/// functions.
pub struct AvailabilityEngine;

impl AvailabilityEngine {
    /// Group subjects by period.
    ///
    /// Groups come out in ascending period order regardless of input order.
    /// Within a group, input order is preserved.
    #[must_use]
    pub fn group_by_period<'a, I>(subjects: I) -> Vec<PeriodGroup<'a>>
    where
        I: IntoIterator<Item = &'a Subject>,
    {
        let mut groups: BTreeMap<Period, Vec<&'a Subject>> = BTreeMap::new();
        for subject in subjects {
            groups.entry(subject.period).or_default().push(subject);
        }

        groups
            .into_iter()
            .map(|(period, subjects)| PeriodGroup {
                period,
                label: period.label(),
                subjects,
            })
            .collect()
    }

    /// True iff every prerequisite of `subject` is in `completed_ids`.
    #[must_use]
    pub fn is_available(subject: &Subject, completed_ids: &BTreeSet<SubjectId>) -> bool {
        subject
            .prerequisites
            .iter()
            .all(|p| completed_ids.contains(p))
    }

    /// Availability as an enum.
    #[must_use]
    pub fn availability(subject: &Subject, completed_ids: &BTreeSet<SubjectId>) -> Availability {
        if Self::is_available(subject, completed_ids) {
            Availability::Available
        } else {
            Availability::Locked
        }
    }

    /// Prerequisites of `subject` that are not yet completed.
    #[must_use]
    pub fn missing_prerequisites(
        subject: &Subject,
        completed_ids: &BTreeSet<SubjectId>,
    ) -> Vec<SubjectId> {
        subject
            .prerequisites
            .difference(completed_ids)
            .cloned()
            .collect()
    }

    /// Derive the status shown for `subject`.
    #[must_use]
    pub fn classify(
        subject: &Subject,
        completed_ids: &BTreeSet<SubjectId>,
        progress_status: Option<ProgressStatus>,
    ) -> EffectiveStatus {
        match Self::availability(subject, completed_ids) {
            Availability::Locked => EffectiveStatus::Locked,
            Availability::Available => {
                progress_status.map_or(EffectiveStatus::Open, EffectiveStatus::from)
            }
        }
    }

    /// Return a copy of `current` with the change applied.
    ///
    /// Idempotent, and permissive: availability is not checked here.
    #[must_use]
    pub fn apply_status_change(
        current: &Progress,
        subject_id: &SubjectId,
        change: StatusChange,
    ) -> Progress {
        let mut next = current.clone();
        next.apply(subject_id, change);
        next
    }

    /// Like [`apply_status_change`](Self::apply_status_change), but rejects
    /// `Set` on a subject that is unknown or locked under `current`.
    ///
    /// `Remove` is always accepted for known subjects.
    pub fn apply_status_change_checked(
        catalog: &Catalog,
        current: &Progress,
        subject_id: &SubjectId,
        change: StatusChange,
    ) -> Result<Progress, PlannerError> {
        let subject = catalog
            .get(subject_id)
            .ok_or_else(|| PlannerError::SubjectNotFound(subject_id.clone()))?;

        if let StatusChange::Set(_) = change {
            let completed = current.completed_ids();
            let missing = Self::missing_prerequisites(subject, &completed);
            if !missing.is_empty() {
                return Err(PlannerError::PrerequisitesNotMet {
                    subject: subject_id.clone(),
                    missing,
                });
            }
        }

        Ok(Self::apply_status_change(current, subject_id, change))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogKey;
    use crate::CourseId;

    fn two_subject_catalog() -> Vec<Subject> {
        vec![
            Subject::new("1", "Cálculo I", 1),
            Subject::new("2", "Cálculo II", 2).with_prerequisites(["1"]),
        ]
    }

    fn id(s: &str) -> SubjectId {
        SubjectId::new(s)
    }

    #[test]
    fn empty_prerequisites_always_available() {
        let subject = Subject::new("1", "Intro", 1);
        assert!(AvailabilityEngine::is_available(&subject, &BTreeSet::new()));
    }

    #[test]
    fn dangling_prerequisite_is_only_a_membership_test() {
        let subject = Subject::new("5", "Advanced", 2).with_prerequisites(["404"]);
        assert!(!AvailabilityEngine::is_available(&subject, &BTreeSet::new()));
        assert!(AvailabilityEngine::is_available(
            &subject,
            &BTreeSet::from([id("404")])
        ));
    }

    #[test]
    fn initial_catalog_is_open_then_locked() {
        let subjects = two_subject_catalog();
        let progress = Progress::new();
        let completed = progress.completed_ids();

        let statuses: Vec<_> = subjects
            .iter()
            .map(|s| AvailabilityEngine::classify(s, &completed, progress.status(&s.id)))
            .collect();

        assert_eq!(statuses, vec![EffectiveStatus::Open, EffectiveStatus::Locked]);
    }

    #[test]
    fn completing_prerequisite_opens_dependent() {
        let subjects = two_subject_catalog();
        let progress = AvailabilityEngine::apply_status_change(
            &Progress::new(),
            &id("1"),
            StatusChange::Set(ProgressStatus::Completed),
        );
        assert_eq!(progress.status(&id("1")), Some(ProgressStatus::Completed));
        assert_eq!(progress.len(), 1);

        let completed = progress.completed_ids();
        let statuses: Vec<_> = subjects
            .iter()
            .map(|s| AvailabilityEngine::classify(s, &completed, progress.status(&s.id)))
            .collect();

        assert_eq!(
            statuses,
            vec![EffectiveStatus::Completed, EffectiveStatus::Open]
        );
    }

    #[test]
    fn locked_wins_over_recorded_status() {
        let subject = Subject::new("2", "Cálculo II", 2).with_prerequisites(["1"]);
        for status in ProgressStatus::ALL {
            assert_eq!(
                AvailabilityEngine::classify(&subject, &BTreeSet::new(), Some(status)),
                EffectiveStatus::Locked
            );
        }
    }

    #[test]
    fn recorded_statuses_map_through() {
        let subject = Subject::new("1", "Intro", 1);
        let none = BTreeSet::new();
        assert_eq!(
            AvailabilityEngine::classify(&subject, &none, Some(ProgressStatus::InProgress)),
            EffectiveStatus::InProgress
        );
        assert_eq!(
            AvailabilityEngine::classify(&subject, &none, Some(ProgressStatus::Planned)),
            EffectiveStatus::Planned
        );
    }

    #[test]
    fn group_by_period_orders_and_preserves_input_order() {
        let subjects = vec![
            Subject::new("a", "A", 2),
            Subject::new("b", "B", 1),
            Subject::new("c", "C", 1),
        ];

        let groups = AvailabilityEngine::group_by_period(&subjects);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].period, Period(1));
        assert_eq!(groups[0].label, "1º Período");
        let first: Vec<_> = groups[0].subjects.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(first, vec!["b", "c"]);
        assert_eq!(groups[1].period, Period(2));
        assert_eq!(groups[1].subjects.len(), 1);
    }

    #[test]
    fn group_by_period_empty_input() {
        let subjects = Vec::<Subject>::new();
        let groups = AvailabilityEngine::group_by_period(&subjects);
        assert!(groups.is_empty());
    }

    #[test]
    fn remove_after_set_clears_entry() {
        let start: Progress = [(id("1"), ProgressStatus::Completed)].into_iter().collect();
        let cleared = AvailabilityEngine::apply_status_change(&start, &id("1"), StatusChange::Remove);
        assert!(cleared.is_empty());
        // Input untouched.
        assert_eq!(start.len(), 1);
    }

    #[test]
    fn checked_change_rejects_locked_subject() {
        let catalog = Catalog::new(
            CatalogKey::new("Universidade", "Natal", "Computação"),
            CourseId(1),
            two_subject_catalog(),
        )
        .expect("valid catalog");

        let err = AvailabilityEngine::apply_status_change_checked(
            &catalog,
            &Progress::new(),
            &id("2"),
            StatusChange::Set(ProgressStatus::Planned),
        )
        .expect_err("locked");

        assert!(matches!(
            &err,
            PlannerError::PrerequisitesNotMet { subject, missing }
                if *subject == id("2") && *missing == vec![id("1")]
        ));
    }

    #[test]
    fn checked_change_allows_remove_and_unknown_is_error() {
        let catalog = Catalog::new(
            CatalogKey::new("Universidade", "Natal", "Computação"),
            CourseId(1),
            two_subject_catalog(),
        )
        .expect("valid catalog");
        let start: Progress = [(id("2"), ProgressStatus::Planned)].into_iter().collect();

        let cleared = AvailabilityEngine::apply_status_change_checked(
            &catalog,
            &start,
            &id("2"),
            StatusChange::Remove,
        )
        .expect("remove allowed");
        assert!(cleared.is_empty());

        assert!(matches!(
            AvailabilityEngine::apply_status_change_checked(
                &catalog,
                &start,
                &id("99"),
                StatusChange::Remove,
            ),
            Err(PlannerError::SubjectNotFound(_))
        ));
    }
}
