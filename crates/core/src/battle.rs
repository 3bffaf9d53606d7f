use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::Question;

//
// ─── RULES ─────────────────────────────────────────────────────────────────────
//

/// Boss health at the start of every battle.
pub const MAX_BOSS_HP: f64 = 100.0;

/// Fraction of questions that must be answered correctly to win.
pub const WIN_ACCURACY: f64 = 0.8;

/// Experience awarded for each correct answer.
pub const SCORE_PER_HIT: u32 = 50;

/// Extra experience for each correct answer beyond the required minimum.
pub const OVERKILL_BONUS: u32 = 100;

/// Remaining health below this is treated as a dead boss.
const HP_EPSILON: f64 = 1e-9;

// WIN_ACCURACY expressed as a ratio so verdicts never depend on float rounding.
const WIN_NUMERATOR: u64 = 4;
const WIN_DENOMINATOR: u64 = 5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BattleError {
    #[error("a battle needs at least one question")]
    NoQuestions,

    #[error("too many questions for a single battle: {0}")]
    TooManyQuestions(usize),

    #[error("the battle is already over")]
    Finished,

    #[error("option {index} is out of range for a question with {options} options")]
    InvalidOption { index: usize, options: usize },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleState {
    Playing,
    Won,
    Lost,
}

impl BattleState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, BattleState::Playing)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BattleState::Playing => "playing",
            BattleState::Won => "won",
            BattleState::Lost => "lost",
        }
    }
}

impl fmt::Display for BattleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BattleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "playing" => Ok(BattleState::Playing),
            "won" => Ok(BattleState::Won),
            "lost" => Ok(BattleState::Lost),
            other => Err(format!("invalid battle state: {other}")),
        }
    }
}

/// Feedback for a single answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Submission {
    pub is_correct: bool,
    /// Index of the right option, so the caller can highlight it.
    pub correct_answer: usize,
    pub boss_hp_after: f64,
    pub question_index_after: usize,
    pub state: BattleState,
}

/// Final verdict, available once the last question has been answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleOutcome {
    pub state: BattleState,
    pub correct_count: u32,
    pub total_questions: u32,
    pub accuracy: f64,
    pub final_score: u32,
    pub overkill_bonus: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One play-through of a chapter's question set.
///
/// The boss health bar is cosmetic: the verdict is decided by accuracy after the
/// last answer, never by health reaching zero mid-battle.
///
/// # Examples
///
/// ```
/// # use arena_core::battle::{BattleSession, BattleState};
/// # use arena_core::model::{ChapterId, QuestionDraft, QuestionId};
/// let question = QuestionDraft::new(ChapterId::new(1), "2 + 2?", vec!["3".into(), "4".into()], 1)
///     .validate()
///     .unwrap()
///     .assign_id(QuestionId::new(1));
/// let mut battle = BattleSession::new(vec![question]).unwrap();
/// let hit = battle.submit_answer(1).unwrap();
/// assert!(hit.is_correct);
/// assert_eq!(hit.state, BattleState::Won);
/// assert_eq!(battle.boss_hp(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BattleSession {
    questions: Vec<Question>,
    current: usize,
    answered: usize,
    boss_hp: f64,
    damage_per_hit: f64,
    correct_count: u32,
    score: u32,
    state: BattleState,
    overkill_bonus: u32,
}

impl BattleSession {
    /// # Errors
    ///
    /// Returns `BattleError::NoQuestions` for an empty question set; callers should
    /// present an "unavailable" screen instead of a battle.
    pub fn new(questions: Vec<Question>) -> Result<Self, BattleError> {
        if questions.is_empty() {
            return Err(BattleError::NoQuestions);
        }
        let total = u32::try_from(questions.len())
            .map_err(|_| BattleError::TooManyQuestions(questions.len()))?;

        Ok(Self {
            questions,
            current: 0,
            answered: 0,
            boss_hp: MAX_BOSS_HP,
            damage_per_hit: MAX_BOSS_HP / (f64::from(total) * WIN_ACCURACY),
            correct_count: 0,
            score: 0,
            state: BattleState::Playing,
            overkill_bonus: 0,
        })
    }

    /// Fresh session over the same questions. Nothing carries over.
    #[must_use]
    pub fn restart(&self) -> Self {
        Self {
            questions: self.questions.clone(),
            current: 0,
            answered: 0,
            boss_hp: MAX_BOSS_HP,
            damage_per_hit: self.damage_per_hit,
            correct_count: 0,
            score: 0,
            state: BattleState::Playing,
            overkill_bonus: 0,
        }
    }

    /// Answer the current question and advance.
    ///
    /// # Errors
    ///
    /// Returns `BattleError::Finished` once the battle is decided and
    /// `BattleError::InvalidOption` for an index outside the current options.
    /// Neither mutates the session.
    pub fn submit_answer(&mut self, option: usize) -> Result<Submission, BattleError> {
        if self.state.is_terminal() {
            return Err(BattleError::Finished);
        }
        let question = &self.questions[self.current];
        if option >= question.options().len() {
            return Err(BattleError::InvalidOption {
                index: option,
                options: question.options().len(),
            });
        }

        let is_correct = question.is_correct(option);
        let correct_answer = question.correct_answer();
        if is_correct {
            self.correct_count += 1;
            self.score = self.score.saturating_add(SCORE_PER_HIT);
            self.boss_hp = (self.boss_hp - self.damage_per_hit).max(0.0);
            if self.boss_hp < HP_EPSILON {
                self.boss_hp = 0.0;
            }
        }
        self.answered += 1;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
        } else {
            self.finish();
        }

        Ok(Submission {
            is_correct,
            correct_answer,
            boss_hp_after: self.boss_hp,
            question_index_after: self.current,
            state: self.state,
        })
    }

    fn finish(&mut self) {
        let correct = u64::from(self.correct_count);
        let total = self.total_questions_u64();
        if correct * WIN_DENOMINATOR >= total * WIN_NUMERATOR {
            self.state = BattleState::Won;
            if correct * WIN_DENOMINATOR > total * WIN_NUMERATOR {
                let extra = self.correct_count.saturating_sub(self.required_correct());
                self.overkill_bonus = extra.saturating_mul(OVERKILL_BONUS);
                self.score = self.score.saturating_add(self.overkill_bonus);
            }
        } else {
            self.state = BattleState::Lost;
        }
    }

    fn total_questions_u64(&self) -> u64 {
        u64::from(self.total_questions())
    }

    /// Correct answers needed to win: `ceil(N * 0.8)`.
    #[must_use]
    pub fn required_correct(&self) -> u32 {
        let total = self.total_questions_u64();
        let required = (total * WIN_NUMERATOR).div_ceil(WIN_DENOMINATOR);
        u32::try_from(required).unwrap_or(u32::MAX)
    }

    /// Health removed per correct answer: `100 / (N * 0.8)`.
    #[must_use]
    pub fn damage_per_hit(&self) -> f64 {
        self.damage_per_hit
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        if !self.state.is_terminal() {
            return None;
        }
        Some(BattleOutcome {
            state: self.state,
            correct_count: self.correct_count,
            total_questions: self.total_questions(),
            accuracy: self.accuracy(),
            final_score: self.score,
            overkill_bonus: self.overkill_bonus,
        })
    }

    /// Ratio of correct answers to the full question count.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        f64::from(self.correct_count) / f64::from(self.total_questions())
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.state.is_terminal() {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn boss_hp(&self) -> f64 {
        self.boss_hp
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn state(&self) -> BattleState {
        self.state
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        // Bounded by the check in `new`.
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn progress(&self) -> BattleProgress {
        BattleProgress {
            total: self.questions.len(),
            answered: self.answered,
            remaining: self.questions.len() - self.answered,
            is_complete: self.is_over(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
