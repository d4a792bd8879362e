//! # Property-Based Tests
//!
//! Universal invariants of the availability engine, checked with proptest.

use eduplan_core::{
    AvailabilityEngine, CurriculumView, EffectiveStatus, Progress, ProgressStatus, StatusChange,
    Subject, SubjectId,
};
use eduplan_core::{Catalog, CatalogKey, CourseId};
use proptest::collection::{btree_map, btree_set, vec};
use proptest::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// STRATEGIES
// =============================================================================

fn subject_id() -> impl Strategy<Value = SubjectId> {
    (0u32..40).prop_map(|n| SubjectId::new(n.to_string()))
}

fn status() -> impl Strategy<Value = ProgressStatus> {
    prop_oneof![
        Just(ProgressStatus::Completed),
        Just(ProgressStatus::InProgress),
        Just(ProgressStatus::Planned),
    ]
}

fn progress() -> impl Strategy<Value = Progress> {
    btree_map(subject_id(), status(), 0..20).prop_map(|m| m.into_iter().collect())
}

fn subject() -> impl Strategy<Value = Subject> {
    (subject_id(), 1u32..10, btree_set(subject_id(), 0..5)).prop_map(|(id, period, prereqs)| {
        Subject {
            name: format!("Subject {id}"),
            id,
            period: eduplan_core::Period(period),
            prerequisites: prereqs,
        }
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Subjects without prerequisites are available under any progress.
    #[test]
    fn no_prerequisites_always_available(
        id in subject_id(),
        period in 1u32..10,
        completed in btree_set(subject_id(), 0..20),
    ) {
        let subject = Subject::new(id.as_str(), "Intro", period);
        prop_assert!(AvailabilityEngine::is_available(&subject, &completed));
    }

    /// Availability is exactly set containment.
    #[test]
    fn available_iff_prerequisites_subset(
        subject in subject(),
        completed in btree_set(subject_id(), 0..20),
    ) {
        prop_assert_eq!(
            AvailabilityEngine::is_available(&subject, &completed),
            subject.prerequisites.is_subset(&completed)
        );
    }

    /// Grouped output is ordered by period and loses nothing.
    #[test]
    fn group_by_period_is_ordered(subjects in vec(subject(), 0..30)) {
        let groups = AvailabilityEngine::group_by_period(&subjects);

        for pair in groups.windows(2) {
            prop_assert!(pair[0].period < pair[1].period);
        }
        let total: usize = groups.iter().map(|g| g.subjects.len()).sum();
        prop_assert_eq!(total, subjects.len());

        // Relative order within a period matches input order.
        for group in &groups {
            let expected: Vec<&Subject> =
                subjects.iter().filter(|s| s.period == group.period).collect();
            prop_assert_eq!(&group.subjects, &expected);
        }
    }

    /// Remove after set leaves the map as it was, minus the id.
    #[test]
    fn remove_after_set_drops_id(
        start in progress(),
        id in subject_id(),
        status in status(),
    ) {
        let set = AvailabilityEngine::apply_status_change(&start, &id, StatusChange::Set(status));
        let removed = AvailabilityEngine::apply_status_change(&set, &id, StatusChange::Remove);

        let expected = AvailabilityEngine::apply_status_change(&start, &id, StatusChange::Remove);
        prop_assert_eq!(removed.status(&id), None);
        prop_assert_eq!(removed, expected);
    }

    /// Applying the same change twice equals applying it once.
    #[test]
    fn apply_status_change_is_idempotent(
        start in progress(),
        id in subject_id(),
        status in status(),
        remove in any::<bool>(),
    ) {
        let change = if remove { StatusChange::Remove } else { StatusChange::Set(status) };
        let once = AvailabilityEngine::apply_status_change(&start, &id, change);
        let twice = AvailabilityEngine::apply_status_change(&once, &id, change);
        prop_assert_eq!(once, twice);
    }

    /// Unmet prerequisites always report locked.
    #[test]
    fn locked_takes_precedence(
        subject in subject(),
        completed in btree_set(subject_id(), 0..20),
        recorded in proptest::option::of(status()),
    ) {
        let classified = AvailabilityEngine::classify(&subject, &completed, recorded);
        if subject.prerequisites.is_subset(&completed) {
            prop_assert_ne!(classified, EffectiveStatus::Locked);
        } else {
            prop_assert_eq!(classified, EffectiveStatus::Locked);
        }
    }

    /// The completed set is always the projection of the status map.
    #[test]
    fn completed_ids_is_projection(progress in progress()) {
        let expected: BTreeSet<SubjectId> = progress
            .iter()
            .filter(|(_, s)| *s == ProgressStatus::Completed)
            .map(|(id, _)| id.clone())
            .collect();
        prop_assert_eq!(progress.completed_ids(), expected);
    }

    /// View summary counts add up to the catalog size.
    #[test]
    fn view_summary_is_consistent(subjects in vec(subject(), 0..30), progress in progress()) {
        let mut seen = BTreeSet::new();
        let unique: Vec<Subject> = subjects
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();
        let catalog = Catalog::new(CatalogKey::new("U", "C", "K"), CourseId(1), unique)
            .expect("generated catalogs are valid");

        let view = CurriculumView::compose(&catalog, &progress);
        let s = view.summary;
        prop_assert_eq!(s.total, catalog.len());
        prop_assert_eq!(s.completed + s.in_progress + s.planned + s.open + s.locked, s.total);
        prop_assert_eq!(view, CurriculumView::compose(&catalog, &progress));
    }
}
