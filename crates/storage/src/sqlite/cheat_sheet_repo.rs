use arena_core::model::{ChapterId, CheatSheet, CheatSheetId};

use super::SqliteRepository;
use super::mapping::{cheat_sheet_id_from_i64, db_err, id_to_i64, map_cheat_sheet_row, ser};
use crate::repository::{CheatSheetRepository, NewCheatSheetRecord, StorageError};

#[async_trait::async_trait]
impl CheatSheetRepository for SqliteRepository {
    async fn insert_new_cheat_sheet(
        &self,
        sheet: NewCheatSheetRecord,
    ) -> Result<CheatSheet, StorageError> {
        let draft = CheatSheet::new(CheatSheetId::new(0), sheet.chapter_id, sheet.title, sheet.image)
            .map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO cheat_sheets (chapter_id, title, image)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_to_i64("chapter_id", draft.chapter_id().value())?)
        .bind(draft.title().map(ToOwned::to_owned))
        .bind(draft.image().as_str().to_owned())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(draft.with_id(cheat_sheet_id_from_i64(res.last_insert_rowid())?))
    }

    async fn upsert_cheat_sheet(&self, sheet: &CheatSheet) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO cheat_sheets (id, chapter_id, title, image)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                chapter_id = excluded.chapter_id,
                title = excluded.title,
                image = excluded.image
            ",
        )
        .bind(id_to_i64("cheat_sheet_id", sheet.id().value())?)
        .bind(id_to_i64("chapter_id", sheet.chapter_id().value())?)
        .bind(sheet.title().map(ToOwned::to_owned))
        .bind(sheet.image().as_str().to_owned())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_cheat_sheets(&self) -> Result<Vec<CheatSheet>, StorageError> {
        let rows =
            sqlx::query("SELECT id, chapter_id, title, image FROM cheat_sheets ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        rows.iter().map(map_cheat_sheet_row).collect()
    }

    async fn cheat_sheet_for_chapter(
        &self,
        chapter_id: ChapterId,
    ) -> Result<Option<CheatSheet>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, chapter_id, title, image
            FROM cheat_sheets
            WHERE chapter_id = ?1
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .bind(id_to_i64("chapter_id", chapter_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_cheat_sheet_row).transpose()
    }

    async fn delete_cheat_sheet(&self, id: CheatSheetId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM cheat_sheets WHERE id = ?1")
            .bind(id_to_i64("cheat_sheet_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
