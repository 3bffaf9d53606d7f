use thiserror::Error;

use crate::model::ids::{ChapterId, QuestionId};

/// Informational damage value the admin console pre-fills for new questions.
pub const DEFAULT_QUESTION_DAMAGE: u32 = 25;

pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least {MIN_OPTIONS} options, got {0}")]
    TooFewOptions(usize),

    #[error("option {0} is empty")]
    EmptyOption(usize),

    #[error("correct answer index {index} is out of range for {options} options")]
    CorrectAnswerOutOfRange { index: usize, options: usize },
}

/// Unvalidated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub chapter_id: ChapterId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub damage: u32,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        chapter_id: ChapterId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Self {
        Self {
            chapter_id,
            text: text.into(),
            options,
            correct_answer,
            damage: DEFAULT_QUESTION_DAMAGE,
        }
    }

    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, fewer than two options are
    /// given, an option is blank, or the correct index does not point at an option.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions(self.options.len()));
        }
        let mut options = Vec::with_capacity(self.options.len());
        for (idx, option) in self.options.into_iter().enumerate() {
            let trimmed = option.trim();
            if trimmed.is_empty() {
                return Err(QuestionError::EmptyOption(idx));
            }
            options.push(trimmed.to_owned());
        }
        if self.correct_answer >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                options: options.len(),
            });
        }

        Ok(ValidatedQuestion {
            chapter_id: self.chapter_id,
            text: text.to_owned(),
            options,
            correct_answer: self.correct_answer,
            damage: self.damage,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub chapter_id: ChapterId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub damage: u32,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            chapter_id: self.chapter_id,
            text: self.text,
            options: self.options,
            correct_answer: self.correct_answer,
            damage: self.damage,
        }
    }
}

/// A multiple-choice question. Immutable once loaded into a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    chapter_id: ChapterId,
    text: String,
    options: Vec<String>,
    correct_answer: usize,
    damage: u32,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError` if the persisted data no longer validates.
    pub fn from_persisted(
        id: QuestionId,
        chapter_id: ChapterId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        damage: u32,
    ) -> Result<Self, QuestionError> {
        let draft = QuestionDraft {
            chapter_id,
            text: text.into(),
            options,
            correct_answer,
            damage,
        };
        Ok(draft.validate()?.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn chapter_id(&self) -> ChapterId {
        self.chapter_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn damage(&self) -> u32 {
        self.damage
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn validates_and_trims() {
        let q = QuestionDraft::new(
            ChapterId::new(1),
            "  What is the powerhouse of the cell? ",
            opts(&["Nucleus", " Mitochondria "]),
            1,
        )
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(9));

        assert_eq!(q.text(), "What is the powerhouse of the cell?");
        assert_eq!(q.options()[1], "Mitochondria");
        assert_eq!(q.damage(), DEFAULT_QUESTION_DAMAGE);
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
    }

    #[test]
    fn rejects_single_option() {
        let err = QuestionDraft::new(ChapterId::new(1), "Q", opts(&["only"]), 0)
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions(1));
    }

    #[test]
    fn rejects_blank_option() {
        let err = QuestionDraft::new(ChapterId::new(1), "Q", opts(&["a", " "]), 0)
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyOption(1));
    }

    #[test]
    fn rejects_correct_index_out_of_range() {
        let err = QuestionDraft::new(ChapterId::new(1), "Q", opts(&["a", "b"]), 2)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectAnswerOutOfRange {
                index: 2,
                options: 2
            }
        );
    }

    #[test]
    fn rejects_blank_text() {
        let err = QuestionDraft::new(ChapterId::new(1), "", opts(&["a", "b"]), 0)
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }
}
