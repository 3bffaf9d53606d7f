use std::sync::Arc;

use arena_core::model::{School, SchoolId};
use storage::repository::{NewSchoolRecord, SchoolRepository, StorageError};

use crate::error::SchoolServiceError;

/// Partner school records managed from the admin console.
#[derive(Clone)]
pub struct SchoolService {
    schools: Arc<dyn SchoolRepository>,
}

impl SchoolService {
    #[must_use]
    pub fn new(schools: Arc<dyn SchoolRepository>) -> Self {
        Self { schools }
    }

    /// # Errors
    ///
    /// Returns `SchoolServiceError::School` if the name is blank.
    pub async fn create_school(
        &self,
        name: &str,
        region: Option<String>,
    ) -> Result<School, SchoolServiceError> {
        let draft = School::new(SchoolId::new(0), name, region)?;
        let school = self
            .schools
            .insert_new_school(NewSchoolRecord::from_school(&draft))
            .await?;
        tracing::info!(school = %school.id(), name = school.name(), "school created");
        Ok(school)
    }

    /// # Errors
    ///
    /// Returns `SchoolServiceError::Storage` with `StorageError::NotFound` if the
    /// school does not exist.
    pub async fn update_school(
        &self,
        id: SchoolId,
        name: &str,
        region: Option<String>,
    ) -> Result<School, SchoolServiceError> {
        if self.schools.get_school(id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }
        let school = School::new(id, name, region)?;
        self.schools.upsert_school(&school).await?;
        Ok(school)
    }

    /// # Errors
    ///
    /// Returns `SchoolServiceError::Storage` if the school does not exist.
    pub async fn delete_school(&self, id: SchoolId) -> Result<(), SchoolServiceError> {
        self.schools.delete_school(id).await?;
        tracing::info!(school = %id, "school deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SchoolServiceError::Storage` if repository access fails.
    pub async fn get_school(&self, id: SchoolId) -> Result<Option<School>, SchoolServiceError> {
        Ok(self.schools.get_school(id).await?)
    }

    /// # Errors
    ///
    /// Returns `SchoolServiceError::Storage` if repository access fails.
    pub async fn list_schools(&self) -> Result<Vec<School>, SchoolServiceError> {
        Ok(self.schools.list_schools().await?)
    }
}
