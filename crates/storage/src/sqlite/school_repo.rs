use arena_core::model::{School, SchoolId};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_school_row, school_id_from_i64, ser};
use crate::repository::{NewSchoolRecord, SchoolRepository, StorageError};

#[async_trait::async_trait]
impl SchoolRepository for SqliteRepository {
    async fn insert_new_school(&self, school: NewSchoolRecord) -> Result<School, StorageError> {
        // Validate before touching the table.
        let draft = School::new(SchoolId::new(0), school.name, school.region).map_err(ser)?;

        let res = sqlx::query("INSERT INTO schools (name, region) VALUES (?1, ?2)")
            .bind(draft.name().to_owned())
            .bind(draft.region().map(ToOwned::to_owned))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(draft.with_id(school_id_from_i64(res.last_insert_rowid())?))
    }

    async fn upsert_school(&self, school: &School) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO schools (id, name, region)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                region = excluded.region
            ",
        )
        .bind(id_to_i64("school_id", school.id().value())?)
        .bind(school.name().to_owned())
        .bind(school.region().map(ToOwned::to_owned))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_school(&self, id: SchoolId) -> Result<Option<School>, StorageError> {
        let row = sqlx::query("SELECT id, name, region FROM schools WHERE id = ?1")
            .bind(id_to_i64("school_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_school_row).transpose()
    }

    async fn list_schools(&self) -> Result<Vec<School>, StorageError> {
        let rows = sqlx::query("SELECT id, name, region FROM schools ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_school_row).collect()
    }

    async fn delete_school(&self, id: SchoolId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM schools WHERE id = ?1")
            .bind(id_to_i64("school_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
