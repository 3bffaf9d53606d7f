use thiserror::Error;

use crate::battle::BattleError;
use crate::model::{
    BattleRecordError, ChapterError, CheatSheetError, QuestionError, SchoolError, UserError,
};

/// Umbrella for every domain validation failure in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Chapter(#[from] ChapterError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    School(#[from] SchoolError),
    #[error(transparent)]
    CheatSheet(#[from] CheatSheetError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Battle(#[from] BattleError),
    #[error(transparent)]
    BattleRecord(#[from] BattleRecordError),
}
