//! # eduplan-core
//!
//! The deterministic curriculum engine for EduPlan.
//!
//! Given a catalog of subjects (each with a period and a set of
//! prerequisite ids) and a user's recorded progress, this crate decides
//! which subjects are available, what status each one shows, and how the
//! curriculum is grouped for display.
//!
//! ## Architectural Constraints
//!
//! - Pure and synchronous: NO async, NO network
//! - Ordered collections only (`BTreeMap`/`BTreeSet`) for reproducible views
//! - Catalog input is validated once, in `Catalog::new`; the engine is total
//! - Identity is passed explicitly; there is no process-wide current user

// =============================================================================
// MODULES
// =============================================================================

pub mod availability;
pub mod catalog;
pub mod demo;
pub mod planner;
pub mod primitives;
pub mod profile;
pub mod progress;
pub mod schedule;
pub mod storage;
pub mod store;
pub mod types;
pub mod view;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Availability, CourseId, EffectiveStatus, Identity, Period, PlannerError, ProgressStatus,
    StatusChange, Subject, SubjectId, UserId,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use availability::{AvailabilityEngine, PeriodGroup};
pub use catalog::{
    Catalog, CatalogDocument, CatalogKey, CatalogRegistry, CatalogSource, RawId, RawSubject,
};
pub use demo::demo_registry;
pub use planner::{Planner, StoreBackend};
pub use profile::Profile;
pub use progress::Progress;
pub use schedule::{ScheduleKey, TimeSlot, Weekday, WeeklySchedule};
pub use storage::RedbStore;
pub use store::{MemoryStore, ProgressStore};
pub use view::{CurriculumView, PeriodView, PrerequisiteView, StatusSummary, SubjectView};
