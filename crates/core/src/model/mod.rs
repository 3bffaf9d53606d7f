mod battle_record;
mod chapter;
mod cheat_sheet;
mod ids;
mod question;
mod school;
mod user;

pub use ids::{
    BattleRecordId, ChapterId, CheatSheetId, ParseIdError, QuestionId, SchoolId, UserId,
};

pub use battle_record::{BattleRecord, BattleRecordError};
pub use chapter::{
    AccessCode, AccessLevel, Chapter, ChapterDraft, ChapterError, Difficulty, ValidatedChapter,
};
pub use cheat_sheet::{CheatSheet, CheatSheetError};
pub use question::{
    DEFAULT_QUESTION_DAMAGE, MIN_OPTIONS, Question, QuestionDraft, QuestionError,
    ValidatedQuestion,
};
pub use school::{School, SchoolError};
pub use user::{AuthState, UserError, UserProfile, normalize_email};
