use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::battle::{BattleOutcome, BattleState};
use crate::model::ids::{ChapterId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BattleRecordError {
    #[error("only finished battles can be recorded")]
    NotFinished,

    #[error("correct count {correct} exceeds question count {total}")]
    CountMismatch { correct: u32, total: u32 },

    #[error("a battle must contain at least one question")]
    NoQuestions,
}

/// Persisted result of one completed battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleRecord {
    chapter_id: Option<ChapterId>,
    player: Option<UserId>,
    state: BattleState,
    correct_count: u32,
    total_questions: u32,
    final_score: u32,
    completed_at: DateTime<Utc>,
}

impl BattleRecord {
    /// Build a record from a terminal engine outcome.
    ///
    /// # Errors
    ///
    /// Returns `BattleRecordError` if the outcome is not terminal or inconsistent.
    pub fn from_outcome(
        chapter_id: Option<ChapterId>,
        player: Option<UserId>,
        outcome: &BattleOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, BattleRecordError> {
        Self::from_persisted(
            chapter_id,
            player,
            outcome.state,
            outcome.correct_count,
            outcome.total_questions,
            outcome.final_score,
            completed_at,
        )
    }

    /// # Errors
    ///
    /// Returns `BattleRecordError` if the stored values are inconsistent.
    pub fn from_persisted(
        chapter_id: Option<ChapterId>,
        player: Option<UserId>,
        state: BattleState,
        correct_count: u32,
        total_questions: u32,
        final_score: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, BattleRecordError> {
        if !state.is_terminal() {
            return Err(BattleRecordError::NotFinished);
        }
        if total_questions == 0 {
            return Err(BattleRecordError::NoQuestions);
        }
        if correct_count > total_questions {
            return Err(BattleRecordError::CountMismatch {
                correct: correct_count,
                total: total_questions,
            });
        }
        Ok(Self {
            chapter_id,
            player,
            state,
            correct_count,
            total_questions,
            final_score,
            completed_at,
        })
    }

    #[must_use]
    pub fn chapter_id(&self) -> Option<ChapterId> {
        self.chapter_id
    }

    #[must_use]
    pub fn player(&self) -> Option<UserId> {
        self.player
    }

    #[must_use]
    pub fn state(&self) -> BattleState {
        self.state
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn final_score(&self) -> u32 {
        self.final_score
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Detaches the result from a deleted chapter; the score is kept.
    #[must_use]
    pub fn without_chapter(mut self) -> Self {
        self.chapter_id = None;
        self
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        f64::from(self.correct_count) / f64::from(self.total_questions)
    }
}
