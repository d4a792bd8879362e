//! # Curriculum Scenarios
//!
//! End-to-end walks through the bundled catalogs.
//!
//! ## Groups
//! - Engine: the reference two-subject scenarios
//! - Catalogs: grouping and labels of the bundled curricula
//! - Planner: a student's first terms, in memory and on disk

use eduplan_core::{
    AvailabilityEngine, CatalogKey, CatalogSource, CourseId, EffectiveStatus, Identity, Planner,
    Profile, Progress, ProgressStatus, StatusChange, Subject, SubjectId, UserId, demo_registry,
};

fn id(s: &str) -> SubjectId {
    SubjectId::new(s)
}

// =============================================================================
// ENGINE
// =============================================================================

mod engine {
    use super::*;

    fn catalog() -> Vec<Subject> {
        vec![
            Subject::new("1", "Cálculo I", 1),
            Subject::new("2", "Cálculo II", 2).with_prerequisites(["1"]),
        ]
    }

    fn classify_all(subjects: &[Subject], progress: &Progress) -> Vec<EffectiveStatus> {
        let completed = progress.completed_ids();
        subjects
            .iter()
            .map(|s| AvailabilityEngine::classify(s, &completed, progress.status(&s.id)))
            .collect()
    }

    #[test]
    fn fresh_student() {
        assert_eq!(
            classify_all(&catalog(), &Progress::new()),
            vec![EffectiveStatus::Open, EffectiveStatus::Locked]
        );
    }

    #[test]
    fn after_completing_first_subject() {
        let progress = AvailabilityEngine::apply_status_change(
            &Progress::new(),
            &id("1"),
            StatusChange::Set(ProgressStatus::Completed),
        );
        assert_eq!(
            serde_json::to_value(&progress).expect("serialize"),
            serde_json::json!({"1": "completed"})
        );
        assert_eq!(
            classify_all(&catalog(), &progress),
            vec![EffectiveStatus::Completed, EffectiveStatus::Open]
        );
    }

    #[test]
    fn remove_clears_completed() {
        let start: Progress = [(id("1"), ProgressStatus::Completed)].into_iter().collect();
        let cleared = AvailabilityEngine::apply_status_change(&start, &id("1"), StatusChange::Remove);
        assert!(cleared.is_empty());
    }
}

// =============================================================================
// CATALOGS
// =============================================================================

mod catalogs {
    use super::*;

    #[test]
    fn civil_engineering_groups_into_three_periods() {
        let registry = demo_registry().expect("demo");
        let catalog = registry
            .catalog_for_key(&CatalogKey::new(
                "Universidade Federal do Exemplo",
                "Natal",
                "Engenharia Civil",
            ))
            .expect("catalog");

        let groups = AvailabilityEngine::group_by_period(catalog.subjects());
        let shape: Vec<(String, usize)> = groups
            .iter()
            .map(|g| (g.label.clone(), g.subjects.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("1º Período".to_string(), 4),
                ("2º Período".to_string(), 4),
                ("3º Período".to_string(), 2),
            ]
        );
    }

    #[test]
    fn list_is_ordered_by_course_id() {
        let registry = demo_registry().expect("demo");
        let ids: Vec<u64> = registry.list_catalogs().iter().map(|c| c.course_id().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}

// =============================================================================
// PLANNER
// =============================================================================

mod planner {
    use super::*;

    const LAW: CourseId = CourseId(3);

    fn student() -> Identity {
        Identity::authenticated(UserId::new("11"))
    }

    fn walk_first_term(planner: &mut Planner) {
        for subject in ["1", "2", "3"] {
            planner
                .change_status(&student(), &id(subject), ProgressStatus::Completed.into(), Some(LAW))
                .expect("complete first term");
        }
    }

    #[test]
    fn first_term_unlocks_second() {
        let mut planner = Planner::new(demo_registry().expect("demo")).with_enforcement(true);
        walk_first_term(&mut planner);

        let view = planner.plan(&student(), Some(LAW)).expect("plan");
        let second: Vec<EffectiveStatus> = view.periods[1].subjects.iter().map(|s| s.status).collect();
        assert_eq!(second, vec![EffectiveStatus::Open; 3]);

        let third: Vec<EffectiveStatus> = view.periods[2].subjects.iter().map(|s| s.status).collect();
        assert_eq!(third, vec![EffectiveStatus::Locked; 2]);
        assert_eq!(view.summary.completed, 3);
    }

    #[test]
    fn un_completing_relocks_dependents() {
        let mut planner = Planner::new(demo_registry().expect("demo"));
        walk_first_term(&mut planner);
        planner
            .change_status(&student(), &id("4"), ProgressStatus::InProgress.into(), Some(LAW))
            .expect("start");

        planner
            .change_status(&student(), &id("2"), StatusChange::Remove, Some(LAW))
            .expect("remove");

        let view = planner.plan(&student(), Some(LAW)).expect("plan");
        let constitutional = view.subject(&id("4")).expect("subject 4");
        assert_eq!(constitutional.status, EffectiveStatus::Locked);
        assert_eq!(constitutional.progress, None);
        // The recorded status survives; only the view hides it.
        assert_eq!(
            planner
                .progress(&student(), Some(LAW))
                .expect("progress")
                .1
                .status(&id("4")),
            Some(ProgressStatus::InProgress)
        );
    }

    #[test]
    fn two_courses_keep_separate_progress() {
        let mut planner = Planner::new(demo_registry().expect("demo"));
        walk_first_term(&mut planner);

        let computing = planner.plan(&student(), Some(CourseId(4))).expect("plan");
        assert_eq!(computing.summary.completed, 0);
        let first: Vec<EffectiveStatus> =
            computing.periods[0].subjects.iter().map(|s| s.status).collect();
        assert_eq!(first, vec![EffectiveStatus::Open; 4]);
    }

    #[test]
    fn profile_selects_the_course_for_plain_requests() {
        let mut planner = Planner::new(demo_registry().expect("demo"));
        let key = planner
            .catalogs()
            .catalog_for_course(LAW)
            .expect("law catalog")
            .key()
            .clone();
        planner
            .set_profile(&student(), Profile::new("Student", "").with_catalog(key))
            .expect("profile");

        for subject in ["1", "2", "3"] {
            planner
                .change_status(&student(), &id(subject), ProgressStatus::Completed.into(), None)
                .expect("complete through profile");
        }

        assert_eq!(
            planner.plan(&student(), None).expect("plan"),
            planner.plan(&student(), Some(LAW)).expect("plan")
        );
        assert_eq!(planner.plan(&student(), None).expect("plan").summary.completed, 3);
    }
}
