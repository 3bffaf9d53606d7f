use arena_core::model::{ChapterId, Question, QuestionId, ValidatedQuestion};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_question_row, question_id_from_i64, ser};
use crate::repository::{QuestionRepository, StorageError};

fn options_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

fn index_to_i64(index: usize) -> Result<i64, StorageError> {
    i64::try_from(index).map_err(|_| StorageError::Serialization("correct_answer overflow".into()))
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_new_question(
        &self,
        question: ValidatedQuestion,
    ) -> Result<Question, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO questions (chapter_id, text, options, correct_answer, damage)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_to_i64("chapter_id", question.chapter_id.value())?)
        .bind(question.text.clone())
        .bind(options_json(&question.options)?)
        .bind(index_to_i64(question.correct_answer)?)
        .bind(i64::from(question.damage))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(question.assign_id(question_id_from_i64(res.last_insert_rowid())?))
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (id, chapter_id, text, options, correct_answer, damage)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                chapter_id = excluded.chapter_id,
                text = excluded.text,
                options = excluded.options,
                correct_answer = excluded.correct_answer,
                damage = excluded.damage
            ",
        )
        .bind(id_to_i64("question_id", question.id().value())?)
        .bind(id_to_i64("chapter_id", question.chapter_id().value())?)
        .bind(question.text().to_owned())
        .bind(options_json(question.options())?)
        .bind(index_to_i64(question.correct_answer())?)
        .bind(i64::from(question.damage()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, chapter_id, text, options, correct_answer, damage
            FROM questions WHERE id = ?1
            ",
        )
        .bind(id_to_i64("question_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn list_questions(
        &self,
        chapter_id: Option<ChapterId>,
    ) -> Result<Vec<Question>, StorageError> {
        let chapter = chapter_id
            .map(|c| id_to_i64("chapter_id", c.value()))
            .transpose()?;
        let rows = sqlx::query(
            r"
            SELECT id, chapter_id, text, options, correct_answer, damage
            FROM questions
            WHERE ?1 IS NULL OR chapter_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(chapter)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id_to_i64("question_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
