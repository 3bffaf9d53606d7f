use thiserror::Error;

use crate::model::ids::SchoolId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchoolError {
    #[error("school name cannot be empty")]
    EmptyName,
}

/// A partner school players register under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct School {
    id: SchoolId,
    name: String,
    region: Option<String>,
}

impl School {
    /// # Errors
    ///
    /// Returns `SchoolError::EmptyName` if the name is blank.
    pub fn new(
        id: SchoolId,
        name: impl Into<String>,
        region: Option<String>,
    ) -> Result<Self, SchoolError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(SchoolError::EmptyName);
        }
        let region = region
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty());
        Ok(Self {
            id,
            name: name.to_owned(),
            region,
        })
    }

    #[must_use]
    pub fn id(&self) -> SchoolId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    #[must_use]
    pub fn with_id(mut self, id: SchoolId) -> Self {
        self.id = id;
        self
    }
}
