//! # User Profile
//!
//! Who the student is and which catalog they follow.
//!
//! The selected [`CatalogKey`] is what lets the planner answer "my plan"
//! without the caller naming a course on every request.

use crate::catalog::CatalogKey;
use crate::primitives::MAX_NAME_LENGTH;
use crate::PlannerError;
use serde::{Deserialize, Serialize};

/// A user's profile record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// The (university, campus, course) the user studies under.
    #[serde(default)]
    pub catalog: Option<CatalogKey>,
}

impl Profile {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            catalog: None,
        }
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: CatalogKey) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Trim text fields and check their bounds.
    ///
    /// The email may be empty; when present it must contain `@`.
    pub fn normalized(mut self) -> Result<Self, PlannerError> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();

        if self.name.is_empty() || self.name.len() > MAX_NAME_LENGTH {
            return Err(PlannerError::InvalidProfile(format!(
                "name is empty or longer than {MAX_NAME_LENGTH} bytes"
            )));
        }
        if self.email.len() > MAX_NAME_LENGTH
            || (!self.email.is_empty() && !self.email.contains('@'))
        {
            return Err(PlannerError::InvalidProfile(format!(
                "invalid email '{}'",
                self.email
            )));
        }
        Ok(self)
    }
}
