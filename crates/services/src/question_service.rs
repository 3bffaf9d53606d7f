use std::sync::Arc;

use arena_core::model::{ChapterId, Question, QuestionDraft, QuestionId};
use storage::repository::{QuestionRepository, StorageError};

use crate::error::QuestionServiceError;

/// Admin operations on chapter questions.
#[derive(Clone)]
pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Question` for validation failures and
    /// `QuestionServiceError::Storage` if the chapter is missing or persistence fails.
    pub async fn create_question(
        &self,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionServiceError> {
        let question = self.questions.insert_new_question(draft.validate()?).await?;
        tracing::info!(question = %question.id(), chapter = %question.chapter_id(), "question created");
        Ok(question)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` with `StorageError::NotFound` if the
    /// question does not exist.
    pub async fn update_question(
        &self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionServiceError> {
        if self.questions.get_question(id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }
        let question = draft.validate()?.assign_id(id);
        self.questions.upsert_question(&question).await?;
        tracing::info!(question = %id, "question updated");
        Ok(question)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if the question does not exist.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), QuestionServiceError> {
        self.questions.delete_question(id).await?;
        tracing::info!(question = %id, "question deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn get_question(
        &self,
        id: QuestionId,
    ) -> Result<Option<Question>, QuestionServiceError> {
        Ok(self.questions.get_question(id).await?)
    }

    /// Questions of one chapter in battle order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn list_for_chapter(
        &self,
        chapter_id: ChapterId,
    ) -> Result<Vec<Question>, QuestionServiceError> {
        Ok(self.questions.list_questions(Some(chapter_id)).await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn list_all(&self) -> Result<Vec<Question>, QuestionServiceError> {
        Ok(self.questions.list_questions(None).await?)
    }
}
