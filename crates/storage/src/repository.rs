use arena_core::model::{
    AccessCode, AccessLevel, BattleRecord, BattleRecordId, Chapter, ChapterId, CheatSheet,
    CheatSheetId, Question, QuestionId, School, SchoolId, UserId, UserProfile, ValidatedChapter,
    ValidatedQuestion,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use crate::memory::InMemoryRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("invalid credentials")]
    Unauthorized,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Insert shape for a school; the id is assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchoolRecord {
    pub name: String,
    pub region: Option<String>,
}

impl NewSchoolRecord {
    #[must_use]
    pub fn from_school(school: &School) -> Self {
        Self {
            name: school.name().to_owned(),
            region: school.region().map(str::to_owned),
        }
    }
}

/// Insert shape for a cheat sheet; the id is assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheatSheetRecord {
    pub chapter_id: ChapterId,
    pub title: Option<String>,
    pub image: String,
}

impl NewCheatSheetRecord {
    #[must_use]
    pub fn from_cheat_sheet(sheet: &CheatSheet) -> Self {
        Self {
            chapter_id: sheet.chapter_id(),
            title: sheet.title().map(str::to_owned),
            image: sheet.image().to_string(),
        }
    }
}

/// A persisted battle record with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleRecordRow {
    pub id: BattleRecordId,
    pub record: BattleRecord,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    /// Persist a new chapter and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the access code is already taken.
    async fn insert_new_chapter(&self, chapter: ValidatedChapter) -> Result<Chapter, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another chapter already uses the code.
    async fn upsert_chapter(&self, chapter: &Chapter) -> Result<(), StorageError>;

    async fn get_chapter(&self, id: ChapterId) -> Result<Option<Chapter>, StorageError>;

    async fn get_chapter_by_code(
        &self,
        code: &AccessCode,
    ) -> Result<Option<Chapter>, StorageError>;

    /// All chapters ordered by id.
    async fn list_chapters(&self) -> Result<Vec<Chapter>, StorageError>;

    async fn list_chapters_by_access(
        &self,
        level: AccessLevel,
    ) -> Result<Vec<Chapter>, StorageError>;

    /// Removes the chapter with its questions and cheat sheets. Stored battle
    /// results are kept with their chapter reference cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the chapter does not exist.
    async fn delete_chapter(&self, id: ChapterId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the chapter does not exist.
    async fn insert_new_question(
        &self,
        question: ValidatedQuestion,
    ) -> Result<Question, StorageError>;

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Questions in insertion order, optionally limited to one chapter.
    async fn list_questions(
        &self,
        chapter_id: Option<ChapterId>,
    ) -> Result<Vec<Question>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    async fn insert_new_school(&self, school: NewSchoolRecord) -> Result<School, StorageError>;

    async fn upsert_school(&self, school: &School) -> Result<(), StorageError>;

    async fn get_school(&self, id: SchoolId) -> Result<Option<School>, StorageError>;

    async fn list_schools(&self) -> Result<Vec<School>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the school does not exist.
    async fn delete_school(&self, id: SchoolId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait CheatSheetRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the chapter does not exist.
    async fn insert_new_cheat_sheet(
        &self,
        sheet: NewCheatSheetRecord,
    ) -> Result<CheatSheet, StorageError>;

    async fn upsert_cheat_sheet(&self, sheet: &CheatSheet) -> Result<(), StorageError>;

    async fn list_cheat_sheets(&self) -> Result<Vec<CheatSheet>, StorageError>;

    /// First cheat sheet stored for the chapter, if any.
    async fn cheat_sheet_for_chapter(
        &self,
        chapter_id: ChapterId,
    ) -> Result<Option<CheatSheet>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the cheat sheet does not exist.
    async fn delete_cheat_sheet(&self, id: CheatSheetId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;

    async fn get_profile(&self, uid: UserId) -> Result<Option<UserProfile>, StorageError>;

    /// All profiles ordered by creation time.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StorageError>;
}

#[async_trait]
pub trait BattleRecordRepository: Send + Sync {
    async fn append_record(&self, record: &BattleRecord) -> Result<BattleRecordId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn get_record(&self, id: BattleRecordId) -> Result<BattleRecord, StorageError>;

    /// Newest first, optionally limited to one player.
    async fn list_records(
        &self,
        player: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<BattleRecordRow>, StorageError>;
}

/// Email/password accounts. Profiles live in `UserRepository`.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn create_account(&self, email: &str, password: &str) -> Result<UserId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Unauthorized` for an unknown email or wrong password.
    async fn verify(&self, email: &str, password: &str) -> Result<UserId, StorageError>;
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Every repository behind trait objects so backends can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub chapters: Arc<dyn ChapterRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub schools: Arc<dyn SchoolRepository>,
    pub cheat_sheets: Arc<dyn CheatSheetRepository>,
    pub users: Arc<dyn UserRepository>,
    pub battle_records: Arc<dyn BattleRecordRepository>,
    pub auth: Arc<dyn AuthBackend>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryRepository::new())
    }

    /// Shares one backend value across every repository handle.
    pub fn from_backend<R>(repo: R) -> Self
    where
        R: ChapterRepository
            + QuestionRepository
            + SchoolRepository
            + CheatSheetRepository
            + UserRepository
            + BattleRecordRepository
            + AuthBackend
            + Clone
            + 'static,
    {
        Self {
            chapters: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            schools: Arc::new(repo.clone()),
            cheat_sheets: Arc::new(repo.clone()),
            users: Arc::new(repo.clone()),
            battle_records: Arc::new(repo.clone()),
            auth: Arc::new(repo),
        }
    }
}
