//! # Catalog Module
//!
//! Curriculum catalogs and their validation boundary.
//!
//! A catalog is the full set of subjects for one
//! (university, campus, course) combination. Subjects arrive from
//! loosely-typed sources (JSON files, the remote service) as [`RawSubject`]
//! and are validated exactly once, in [`Catalog::new`]. Past that point
//! every subject has a unique id, a positive period and a bounded name.
//!
//! Prerequisites pointing outside the catalog are kept. They never fail
//! validation; [`Catalog::dangling_prerequisites`] reports them.

use crate::primitives::{MAX_ID_LENGTH, MAX_NAME_LENGTH, MAX_PREREQUISITES, MAX_SUBJECTS_PER_CATALOG};
use crate::{CourseId, Period, PlannerError, Subject, SubjectId};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// CATALOG KEY
// =============================================================================

/// The (university, campus, course) triple a catalog is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogKey {
    pub university: String,
    pub campus: String,
    pub course: String,
}

impl CatalogKey {
    #[must_use]
    pub fn new(
        university: impl Into<String>,
        campus: impl Into<String>,
        course: impl Into<String>,
    ) -> Self {
        Self {
            university: university.into(),
            campus: campus.into(),
            course: course.into(),
        }
    }

    fn validate(&self) -> Result<(), PlannerError> {
        for (field, value) in [
            ("university", &self.university),
            ("campus", &self.campus),
            ("course", &self.course),
        ] {
            if value.trim().is_empty() {
                return Err(PlannerError::InvalidCatalog(format!("{field} is empty")));
            }
            if value.len() > MAX_NAME_LENGTH {
                return Err(PlannerError::InvalidCatalog(format!(
                    "{field} length {} exceeds maximum {}",
                    value.len(),
                    MAX_NAME_LENGTH
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.university, self.campus, self.course)
    }
}

// =============================================================================
// RAW (BOUNDARY) SHAPES
// =============================================================================

/// A subject id as it appears on the wire: a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    #[must_use]
    pub fn into_subject_id(self) -> SubjectId {
        match self {
            Self::Text(s) => SubjectId::new(s),
            Self::Number(n) => SubjectId::new(n.to_string()),
        }
    }
}

/// A prerequisite list that may be malformed. Anything other than an
/// array of ids is treated as empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawIdList {
    List(Vec<RawId>),
    Malformed(IgnoredAny),
}

impl RawIdList {
    fn into_ids(self) -> Option<Vec<SubjectId>> {
        match self {
            Self::List(ids) => Some(ids.into_iter().map(RawId::into_subject_id).collect()),
            Self::Malformed(_) => None,
        }
    }
}

/// A subject as delivered by a catalog source, before validation.
///
/// Accepts both the local field names and the remote service's
/// (`nome`, `periodo`, `pre_requisitos`, `preRequisitos`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSubject {
    pub id: RawId,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "periodo")]
    pub period: i64,
    #[serde(default, alias = "preRequisitos")]
    pub prerequisites: Option<RawIdList>,
    #[serde(default)]
    pub pre_requisitos: Option<RawIdList>,
}

impl RawSubject {
    /// Normalize into a [`Subject`].
    ///
    /// `pre_requisitos` wins when it is a proper list; otherwise
    /// `prerequisites` is used; otherwise the subject has none.
    pub fn into_subject(self) -> Result<Subject, PlannerError> {
        let id = self.id.into_subject_id();
        let period = u32::try_from(self.period)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| {
                PlannerError::InvalidCatalog(format!(
                    "subject {id} has invalid period {}",
                    self.period
                ))
            })?;

        let prerequisites = self
            .pre_requisitos
            .and_then(RawIdList::into_ids)
            .or_else(|| self.prerequisites.and_then(RawIdList::into_ids))
            .unwrap_or_default();

        Ok(Subject {
            id,
            name: self.name,
            period: Period(period),
            prerequisites: prerequisites.into_iter().collect(),
        })
    }
}

/// A serialized catalog: the key, the course id and its raw subjects.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDocument {
    pub university: String,
    pub campus: String,
    pub course: String,
    pub course_id: CourseId,
    #[serde(default)]
    pub subjects: Vec<RawSubject>,
}

impl CatalogDocument {
    /// Validate the document into a [`Catalog`].
    pub fn into_catalog(self) -> Result<Catalog, PlannerError> {
        let subjects = self
            .subjects
            .into_iter()
            .map(RawSubject::into_subject)
            .collect::<Result<Vec<_>, _>>()?;
        Catalog::new(
            CatalogKey::new(self.university, self.campus, self.course),
            self.course_id,
            subjects,
        )
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// A validated curriculum catalog. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    key: CatalogKey,
    course_id: CourseId,
    subjects: Vec<Subject>,
    index: BTreeMap<SubjectId, usize>,
}

impl Catalog {
    /// Build a catalog, validating every subject.
    pub fn new(
        key: CatalogKey,
        course_id: CourseId,
        subjects: Vec<Subject>,
    ) -> Result<Self, PlannerError> {
        key.validate()?;

        if subjects.len() > MAX_SUBJECTS_PER_CATALOG {
            return Err(PlannerError::InvalidCatalog(format!(
                "{} subjects exceeds maximum {}",
                subjects.len(),
                MAX_SUBJECTS_PER_CATALOG
            )));
        }

        let mut index = BTreeMap::new();
        for (position, subject) in subjects.iter().enumerate() {
            validate_subject(subject)?;
            if index.insert(subject.id.clone(), position).is_some() {
                return Err(PlannerError::DuplicateSubject(subject.id.clone()));
            }
        }

        Ok(Self {
            key,
            course_id,
            subjects,
            index,
        })
    }

    /// Build a catalog from raw subjects, skipping the ones that fail
    /// validation instead of failing the whole catalog.
    ///
    /// Returns the catalog and one error per skipped subject. Later
    /// duplicates of an id are skipped; the first occurrence is kept.
    pub fn lenient(
        key: CatalogKey,
        course_id: CourseId,
        raw: Vec<RawSubject>,
    ) -> Result<(Self, Vec<PlannerError>), PlannerError> {
        key.validate()?;

        if raw.len() > MAX_SUBJECTS_PER_CATALOG {
            return Err(PlannerError::InvalidCatalog(format!(
                "{} subjects exceeds maximum {}",
                raw.len(),
                MAX_SUBJECTS_PER_CATALOG
            )));
        }

        let mut subjects = Vec::with_capacity(raw.len());
        let mut index = BTreeMap::new();
        let mut rejected = Vec::new();

        for candidate in raw {
            let subject = match candidate
                .into_subject()
                .and_then(|s| validate_subject(&s).map(|()| s))
            {
                Ok(subject) => subject,
                Err(e) => {
                    rejected.push(e);
                    continue;
                }
            };
            if index.contains_key(&subject.id) {
                rejected.push(PlannerError::DuplicateSubject(subject.id));
                continue;
            }
            index.insert(subject.id.clone(), subjects.len());
            subjects.push(subject);
        }

        Ok((
            Self {
                key,
                course_id,
                subjects,
                index,
            },
            rejected,
        ))
    }

    /// An empty catalog for a key, used when a source has nothing to offer.
    #[must_use]
    pub fn empty(key: CatalogKey, course_id: CourseId) -> Self {
        Self {
            key,
            course_id,
            subjects: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &CatalogKey {
        &self.key
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    /// Subjects in catalog order.
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Look up a subject by id.
    #[must_use]
    pub fn get(&self, id: &SubjectId) -> Option<&Subject> {
        self.index.get(id).and_then(|&i| self.subjects.get(i))
    }

    #[must_use]
    pub fn contains(&self, id: &SubjectId) -> bool {
        self.index.contains_key(id)
    }

    /// Display label for a subject id: its name, or the raw id if the
    /// id is not part of this catalog.
    #[must_use]
    pub fn label_for(&self, id: &SubjectId) -> String {
        self.get(id)
            .map_or_else(|| id.as_str().to_string(), |s| s.name.clone())
    }

    /// Every `(subject, prerequisite)` pair whose prerequisite is not in
    /// this catalog.
    #[must_use]
    pub fn dangling_prerequisites(&self) -> Vec<(SubjectId, SubjectId)> {
        self.subjects
            .iter()
            .flat_map(|s| {
                s.prerequisites
                    .iter()
                    .filter(|p| !self.contains(p))
                    .map(|p| (s.id.clone(), p.clone()))
            })
            .collect()
    }

    /// Distinct periods present, ascending.
    #[must_use]
    pub fn periods(&self) -> BTreeSet<Period> {
        self.subjects.iter().map(|s| s.period).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

fn validate_subject(subject: &Subject) -> Result<(), PlannerError> {
    let id = subject.id.as_str();
    if id.trim().is_empty() || id.len() > MAX_ID_LENGTH {
        return Err(PlannerError::InvalidCatalog(format!(
            "subject id '{id}' is empty or longer than {MAX_ID_LENGTH} bytes"
        )));
    }
    if subject.period.value() == 0 {
        return Err(PlannerError::InvalidCatalog(format!(
            "subject {id} has period 0"
        )));
    }
    if subject.name.trim().is_empty() || subject.name.len() > MAX_NAME_LENGTH {
        return Err(PlannerError::InvalidCatalog(format!(
            "subject {id} name is empty or longer than {MAX_NAME_LENGTH} bytes"
        )));
    }
    if subject.prerequisites.len() > MAX_PREREQUISITES {
        return Err(PlannerError::InvalidCatalog(format!(
            "subject {id} has {} prerequisites, maximum is {MAX_PREREQUISITES}",
            subject.prerequisites.len()
        )));
    }
    Ok(())
}

// =============================================================================
// CATALOG SOURCE
// =============================================================================

/// Read access to catalogs.
///
/// "Not found" is `None`, never an error; callers that need subjects
/// use [`subjects_for_course`](Self::subjects_for_course), which coerces
/// a missing catalog to an empty slice.
pub trait CatalogSource {
    /// Catalog for a (university, campus, course) triple.
    fn catalog_for_key(&self, key: &CatalogKey) -> Option<&Catalog>;

    /// Catalog for a numeric course id.
    fn catalog_for_course(&self, course_id: CourseId) -> Option<&Catalog>;

    /// Every catalog, ordered by course id.
    fn list_catalogs(&self) -> Vec<&Catalog>;

    /// Subjects of a course, or nothing if the course is unknown.
    fn subjects_for_course(&self, course_id: CourseId) -> &[Subject] {
        self.catalog_for_course(course_id)
            .map_or(&[], Catalog::subjects)
    }
}

/// An in-memory set of catalogs keyed by course id.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    by_course: BTreeMap<CourseId, Catalog>,
}

impl CatalogRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog. Course ids and keys must both be unique.
    pub fn insert(&mut self, catalog: Catalog) -> Result<(), PlannerError> {
        if self.by_course.contains_key(&catalog.course_id()) {
            return Err(PlannerError::InvalidCatalog(format!(
                "course id {} registered twice",
                catalog.course_id()
            )));
        }
        if self.catalog_for_key(catalog.key()).is_some() {
            return Err(PlannerError::InvalidCatalog(format!(
                "catalog '{}' registered twice",
                catalog.key()
            )));
        }
        self.by_course.insert(catalog.course_id(), catalog);
        Ok(())
    }

    /// Build a registry from serialized documents.
    pub fn from_documents(documents: Vec<CatalogDocument>) -> Result<Self, PlannerError> {
        let mut registry = Self::new();
        for document in documents {
            registry.insert(document.into_catalog()?)?;
        }
        Ok(registry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_course.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_course.is_empty()
    }
}

impl CatalogSource for CatalogRegistry {
    fn catalog_for_key(&self, key: &CatalogKey) -> Option<&Catalog> {
        self.by_course.values().find(|c| c.key() == key)
    }

    fn catalog_for_course(&self, course_id: CourseId) -> Option<&Catalog> {
        self.by_course.get(&course_id)
    }

    fn list_catalogs(&self) -> Vec<&Catalog> {
        self.by_course.values().collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CatalogKey {
        CatalogKey::new("Universidade Federal do Exemplo", "Natal", "Computação")
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Catalog::new(
            key(),
            CourseId(1),
            vec![Subject::new("1", "A", 1), Subject::new("1", "B", 2)],
        );
        assert!(matches!(result, Err(PlannerError::DuplicateSubject(id)) if id.as_str() == "1"));
    }

    #[test]
    fn rejects_period_zero() {
        let result = Catalog::new(key(), CourseId(1), vec![Subject::new("1", "A", 0)]);
        assert!(matches!(result, Err(PlannerError::InvalidCatalog(_))));
    }

    #[test]
    fn rejects_blank_key() {
        let result = Catalog::new(CatalogKey::new("", "Natal", "Direito"), CourseId(1), vec![]);
        assert!(matches!(result, Err(PlannerError::InvalidCatalog(_))));
    }

    #[test]
    fn dangling_prerequisites_are_kept_and_reported() {
        let catalog = Catalog::new(
            key(),
            CourseId(1),
            vec![
                Subject::new("1", "Intro", 1),
                Subject::new("2", "Next", 2).with_prerequisites(["1", "77"]),
            ],
        )
        .expect("dangling references are valid");

        assert_eq!(
            catalog.dangling_prerequisites(),
            vec![(SubjectId::new("2"), SubjectId::new("77"))]
        );
        assert_eq!(catalog.label_for(&SubjectId::new("1")), "Intro");
        assert_eq!(catalog.label_for(&SubjectId::new("77")), "77");
    }

    #[test]
    fn raw_subject_accepts_remote_field_names() {
        let json = r#"{"id": 5, "nome": "Cálculo II", "periodo": 2, "curso": 3, "pre_requisitos": [2]}"#;
        let raw: RawSubject = serde_json::from_str(json).expect("parse");
        let subject = raw.into_subject().expect("valid");

        assert_eq!(subject.id.as_str(), "5");
        assert_eq!(subject.name, "Cálculo II");
        assert_eq!(subject.period, Period(2));
        assert!(subject.prerequisites.contains(&SubjectId::new("2")));
    }

    #[test]
    fn raw_subject_accepts_camel_case_alias() {
        let json = r#"{"id": "6", "nome": "Física II", "periodo": 2, "preRequisitos": ["3"]}"#;
        let subject = serde_json::from_str::<RawSubject>(json)
            .expect("parse")
            .into_subject()
            .expect("valid");
        assert_eq!(subject.prerequisites.len(), 1);
    }

    #[test]
    fn malformed_prerequisites_default_to_empty() {
        for json in [
            r#"{"id": "1", "name": "A", "period": 1}"#,
            r#"{"id": "1", "name": "A", "period": 1, "prerequisites": null}"#,
            r#"{"id": "1", "name": "A", "period": 1, "prerequisites": "2"}"#,
            r#"{"id": "1", "name": "A", "period": 1, "pre_requisitos": {"x": 1}}"#,
        ] {
            let subject = serde_json::from_str::<RawSubject>(json)
                .expect("parse")
                .into_subject()
                .expect("valid");
            assert!(subject.prerequisites.is_empty(), "input: {json}");
        }
    }

    #[test]
    fn malformed_snake_case_falls_back_to_camel_case() {
        let json = r#"{"id": "1", "name": "A", "period": 1, "pre_requisitos": null, "preRequisitos": ["9"]}"#;
        let subject = serde_json::from_str::<RawSubject>(json)
            .expect("parse")
            .into_subject()
            .expect("valid");
        assert!(subject.prerequisites.contains(&SubjectId::new("9")));
    }

    #[test]
    fn lenient_keeps_valid_subjects() {
        let raw: Vec<RawSubject> = serde_json::from_str(
            r#"[
                {"id": 1, "nome": "Cálculo I", "periodo": 1},
                {"id": 2, "nome": "Sem período", "periodo": 0},
                {"id": 3, "nome": "Cálculo II", "periodo": 2, "pre_requisitos": [1]},
                {"id": 1, "nome": "Repetida", "periodo": 3}
            ]"#,
        )
        .expect("parse");

        let (catalog, rejected) = Catalog::lenient(key(), CourseId(4), raw).expect("lenient");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.label_for(&SubjectId::new("1")), "Cálculo I");
        assert!(catalog.contains(&SubjectId::new("3")));
        assert!(!catalog.contains(&SubjectId::new("2")));
        assert_eq!(rejected.len(), 2);
        assert!(matches!(rejected[0], PlannerError::InvalidCatalog(_)));
        assert!(matches!(&rejected[1], PlannerError::DuplicateSubject(id) if id.as_str() == "1"));
    }

    #[test]
    fn lenient_still_rejects_blank_key() {
        let result = Catalog::lenient(CatalogKey::new("", "Natal", "Direito"), CourseId(1), vec![]);
        assert!(matches!(result, Err(PlannerError::InvalidCatalog(_))));
    }

    #[test]
    fn negative_period_is_rejected() {
        let json = r#"{"id": "1", "name": "A", "period": -1}"#;
        let raw: RawSubject = serde_json::from_str(json).expect("parse");
        assert!(raw.into_subject().is_err());
    }

    #[test]
    fn registry_lookup_and_not_found() {
        let mut registry = CatalogRegistry::new();
        registry
            .insert(Catalog::new(key(), CourseId(4), vec![Subject::new("1", "A", 1)]).expect("valid"))
            .expect("insert");

        assert!(registry.catalog_for_key(&key()).is_some());
        assert_eq!(registry.subjects_for_course(CourseId(4)).len(), 1);
        assert!(registry.subjects_for_course(CourseId(99)).is_empty());
        assert!(registry.insert(Catalog::empty(key(), CourseId(5))).is_err());
    }

    #[test]
    fn documents_build_registry() {
        let json = r#"[{
            "university": "U", "campus": "C", "course": "K", "course_id": 1,
            "subjects": [
                {"id": "1", "name": "A", "period": 1},
                {"id": "2", "name": "B", "period": 2, "prerequisites": ["1"]}
            ]
        }]"#;
        let docs: Vec<CatalogDocument> = serde_json::from_str(json).expect("parse");
        let registry = CatalogRegistry::from_documents(docs).expect("valid");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.subjects_for_course(CourseId(1)).len(), 2);
    }
}
