use arena_core::model::{AccessCode, AccessLevel, Chapter, ChapterId, ValidatedChapter};

use super::SqliteRepository;
use super::mapping::{chapter_id_from_i64, db_err, id_to_i64, map_chapter_row};
use crate::repository::{ChapterRepository, StorageError};

const CHAPTER_COLUMNS: &str = "id, name, description, difficulty, access_level, code, created_at";

#[async_trait::async_trait]
impl ChapterRepository for SqliteRepository {
    async fn insert_new_chapter(&self, chapter: ValidatedChapter) -> Result<Chapter, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO chapters (name, description, difficulty, access_level, code, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(chapter.name.clone())
        .bind(chapter.description.clone())
        .bind(chapter.difficulty.as_str())
        .bind(chapter.access_level.as_str())
        .bind(chapter.code.as_str().to_owned())
        .bind(chapter.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(chapter.assign_id(chapter_id_from_i64(res.last_insert_rowid())?))
    }

    async fn upsert_chapter(&self, chapter: &Chapter) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO chapters (id, name, description, difficulty, access_level, code, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                difficulty = excluded.difficulty,
                access_level = excluded.access_level,
                code = excluded.code
            ",
        )
        .bind(id_to_i64("chapter_id", chapter.id().value())?)
        .bind(chapter.name().to_owned())
        .bind(chapter.description().map(ToOwned::to_owned))
        .bind(chapter.difficulty().as_str())
        .bind(chapter.access_level().as_str())
        .bind(chapter.code().as_str().to_owned())
        .bind(chapter.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_chapter(&self, id: ChapterId) -> Result<Option<Chapter>, StorageError> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("chapter_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_chapter_row).transpose()
    }

    async fn get_chapter_by_code(
        &self,
        code: &AccessCode,
    ) -> Result<Option<Chapter>, StorageError> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE code = ?1");
        let row = sqlx::query(&sql)
            .bind(code.as_str().to_owned())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_chapter_row).transpose()
    }

    async fn list_chapters(&self) -> Result<Vec<Chapter>, StorageError> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_chapter_row).collect()
    }

    async fn list_chapters_by_access(
        &self,
        level: AccessLevel,
    ) -> Result<Vec<Chapter>, StorageError> {
        let sql =
            format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE access_level = ?1 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(level.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_chapter_row).collect()
    }

    async fn delete_chapter(&self, id: ChapterId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM chapters WHERE id = ?1")
            .bind(id_to_i64("chapter_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
