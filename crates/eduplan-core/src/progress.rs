//! # Progress Records
//!
//! Per-user mapping from subject id to progress status.
//!
//! The set of completed subjects is a projection of this map and is
//! always computed on demand, never stored alongside it.

use crate::{ProgressStatus, StatusChange, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A user's recorded progress. Absent ids have no recorded status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress {
    statuses: BTreeMap<SubjectId, ProgressStatus>,
}

impl Progress {
    /// Create an empty progress record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded status for a subject, if any.
    #[must_use]
    pub fn status(&self, id: &SubjectId) -> Option<ProgressStatus> {
        self.statuses.get(id).copied()
    }

    /// Ids of every subject whose status is `completed`.
    #[must_use]
    pub fn completed_ids(&self) -> BTreeSet<SubjectId> {
        self.ids_with(ProgressStatus::Completed)
    }

    /// Ids of every subject with the given status.
    #[must_use]
    pub fn ids_with(&self, status: ProgressStatus) -> BTreeSet<SubjectId> {
        self.statuses
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Apply a change in place. Removing an absent id is a no-op.
    pub fn apply(&mut self, id: &SubjectId, change: StatusChange) {
        match change {
            StatusChange::Set(status) => {
                self.statuses.insert(id.clone(), status);
            }
            StatusChange::Remove => {
                self.statuses.remove(id);
            }
        }
    }

    /// Iterate over recorded statuses in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&SubjectId, ProgressStatus)> {
        self.statuses.iter().map(|(id, s)| (id, *s))
    }

    /// Number of subjects with a recorded status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Check if no status is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

impl FromIterator<(SubjectId, ProgressStatus)> for Progress {
    fn from_iter<T: IntoIterator<Item = (SubjectId, ProgressStatus)>>(iter: T) -> Self {
        Self {
            statuses: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SubjectId {
        SubjectId::new(s)
    }

    #[test]
    fn completed_ids_tracks_status_map() {
        let mut progress = Progress::new();
        progress.apply(&id("1"), StatusChange::Set(ProgressStatus::Completed));
        progress.apply(&id("2"), StatusChange::Set(ProgressStatus::Planned));

        assert_eq!(progress.completed_ids(), BTreeSet::from([id("1")]));

        progress.apply(&id("1"), StatusChange::Set(ProgressStatus::InProgress));
        assert!(progress.completed_ids().is_empty());
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut progress = Progress::new();
        progress.apply(&id("9"), StatusChange::Remove);
        assert!(progress.is_empty());
    }

    #[test]
    fn serializes_as_plain_map() {
        let progress: Progress = [(id("1"), ProgressStatus::Completed)].into_iter().collect();
        let json = serde_json::to_string(&progress).expect("serialize");
        assert_eq!(json, r#"{"1":"completed"}"#);
    }
}
