use arena_core::model::{BattleRecord, BattleRecordId, UserId};

use super::SqliteRepository;
use super::mapping::{battle_record_id_from_i64, db_err, id_to_i64, map_battle_record_row};
use crate::repository::{BattleRecordRepository, BattleRecordRow, StorageError};

#[async_trait::async_trait]
impl BattleRecordRepository for SqliteRepository {
    async fn append_record(&self, record: &BattleRecord) -> Result<BattleRecordId, StorageError> {
        let chapter_id = record
            .chapter_id()
            .map(|c| id_to_i64("chapter_id", c.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            INSERT INTO battle_records (
                chapter_id, player, state, correct_count, total_questions, final_score, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(chapter_id)
        .bind(record.player().map(|p| p.to_string()))
        .bind(record.state().as_str())
        .bind(i64::from(record.correct_count()))
        .bind(i64::from(record.total_questions()))
        .bind(i64::from(record.final_score()))
        .bind(record.completed_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        battle_record_id_from_i64(res.last_insert_rowid())
    }

    async fn get_record(&self, id: BattleRecordId) -> Result<BattleRecord, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, chapter_id, player, state, correct_count, total_questions, final_score, completed_at
            FROM battle_records WHERE id = ?1
            ",
        )
        .bind(id_to_i64("battle_record_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(StorageError::NotFound)?;

        map_battle_record_row(&row).map(|(_, record)| record)
    }

    async fn list_records(
        &self,
        player: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<BattleRecordRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, chapter_id, player, state, correct_count, total_questions, final_score, completed_at
            FROM battle_records
            WHERE ?1 IS NULL OR player = ?1
            ORDER BY completed_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(player.map(|p| p.to_string()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| map_battle_record_row(row).map(|(id, record)| BattleRecordRow { id, record }))
            .collect()
    }
}
