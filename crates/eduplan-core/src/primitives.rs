//! # Planner Primitives
//!
//! Hardcoded runtime constants for the EduPlan core.
//!
//! These limits are applied once, at the catalog and schedule boundaries.
//! The availability engine itself is unbounded and total.

/// Suffix appended to a period number to build its display label.
pub const PERIOD_LABEL_SUFFIX: &str = "º Período";

// =============================================================================
// CATALOG LIMITS
// =============================================================================

/// Maximum number of subjects accepted in a single catalog.
///
/// Real curricula hold tens of entries; anything far beyond that is
/// treated as malformed input.
pub const MAX_SUBJECTS_PER_CATALOG: usize = 1000;

/// Maximum number of prerequisite ids on a single subject.
pub const MAX_PREREQUISITES: usize = 64;

/// Maximum length for subject and catalog-key names.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length for a subject identifier.
pub const MAX_ID_LENGTH: usize = 64;

// =============================================================================
// SCHEDULE LIMITS
// =============================================================================

/// First hour of the weekly grid (07:00).
pub const FIRST_SLOT_HOUR: u8 = 7;

/// Last hour of the weekly grid (22:00).
pub const LAST_SLOT_HOUR: u8 = 22;

/// Maximum length of a free-text schedule label.
pub const MAX_SCHEDULE_LABEL_LENGTH: usize = 128;

// =============================================================================
// STORAGE
// =============================================================================

/// Version of the value encoding used by the persistent store.
///
/// Increment this when making breaking changes to stored records.
pub const STORE_FORMAT_VERSION: u64 = 2;
