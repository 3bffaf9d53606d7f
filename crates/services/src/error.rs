//! Shared error types for the services crate.

use thiserror::Error;

use arena_core::battle::BattleError;
use arena_core::model::{
    AccessCode, BattleRecordError, ChapterError, CheatSheetError, QuestionError, SchoolError,
    SchoolId, UserError,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ChapterService` mutations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChapterServiceError {
    #[error("access code {0} is already used by another chapter")]
    CodeTaken(AccessCode),
    #[error("could not find a free access code after {0} attempts")]
    CodeSpaceExhausted(usize),
    #[error(transparent)]
    Chapter(#[from] ChapterError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a code cannot open a battle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChapterAccessError {
    #[error("no chapter uses code {0:?}")]
    Unknown(String),
    #[error("chapter {0} is still a draft")]
    Draft(AccessCode),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SchoolService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchoolServiceError {
    #[error(transparent)]
    School(#[from] SchoolError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CheatSheetService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheatSheetServiceError {
    #[error(transparent)]
    CheatSheet(#[from] CheatSheetError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("school {0} does not exist")]
    UnknownSchool(SchoolId),
    #[error("account has no profile")]
    MissingProfile,
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `BattleService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BattleServiceError {
    #[error("this battle has no questions yet")]
    NoQuestions,
    #[error("battle is not finished")]
    NotFinished,
    #[error(transparent)]
    Access(#[from] ChapterAccessError),
    #[error(transparent)]
    Battle(#[from] BattleError),
    #[error(transparent)]
    Record(#[from] BattleRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
