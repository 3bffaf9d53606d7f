use std::sync::Arc;

use arena_core::model::{AccessCode, AccessLevel, Chapter, ChapterDraft, ChapterId};
use rand::Rng;
use storage::repository::{
    ChapterRepository, CheatSheetRepository, QuestionRepository, StorageError,
};

use crate::Clock;
use crate::error::{ChapterAccessError, ChapterServiceError};

/// Attempts at drawing a free access code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 8;

const CODE_SUFFIX_LEN: usize = 4;
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces the random part of a generated access code.
pub type SuffixSource = Arc<dyn Fn() -> String + Send + Sync>;

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..CODE_SUFFIX_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Looks up a chapter by a user-typed code and checks that it can be played.
///
/// # Errors
///
/// Returns `ChapterAccessError::Unknown` for malformed or unmatched codes and
/// `ChapterAccessError::Draft` for chapters that are not published.
pub(crate) async fn resolve_playable(
    chapters: &dyn ChapterRepository,
    raw: &str,
) -> Result<Chapter, ChapterAccessError> {
    let Ok(code) = AccessCode::parse(raw) else {
        return Err(ChapterAccessError::Unknown(raw.trim().to_owned()));
    };
    let chapter = chapters
        .get_chapter_by_code(&code)
        .await?
        .ok_or_else(|| ChapterAccessError::Unknown(code.to_string()))?;
    if !chapter.access_level().is_playable() {
        return Err(ChapterAccessError::Draft(code));
    }
    Ok(chapter)
}

/// Admin operations on chapters, including access code allocation.
#[derive(Clone)]
pub struct ChapterService {
    clock: Clock,
    chapters: Arc<dyn ChapterRepository>,
    questions: Arc<dyn QuestionRepository>,
    cheat_sheets: Arc<dyn CheatSheetRepository>,
    suffixes: SuffixSource,
}

impl ChapterService {
    #[must_use]
    pub fn new(
        clock: Clock,
        chapters: Arc<dyn ChapterRepository>,
        questions: Arc<dyn QuestionRepository>,
        cheat_sheets: Arc<dyn CheatSheetRepository>,
    ) -> Self {
        Self {
            clock,
            chapters,
            questions,
            cheat_sheets,
            suffixes: Arc::new(random_suffix),
        }
    }

    /// Replace the random code suffix generator.
    #[must_use]
    pub fn with_suffix_source(mut self, suffixes: SuffixSource) -> Self {
        self.suffixes = suffixes;
        self
    }

    /// Create a chapter. Without an explicit code one is generated from the name.
    ///
    /// # Errors
    ///
    /// Returns `ChapterServiceError::CodeTaken` if an explicit code is in use,
    /// `ChapterServiceError::CodeSpaceExhausted` if no generated code was free,
    /// `ChapterServiceError::Chapter` for validation failures and
    /// `ChapterServiceError::Storage` if persistence fails.
    pub async fn create_chapter(&self, draft: ChapterDraft) -> Result<Chapter, ChapterServiceError> {
        let now = self.clock.now();

        if let Some(raw) = draft.code.as_deref() {
            let code = AccessCode::parse(raw)?;
            let validated = draft.clone().validate(code.clone(), now)?;
            let chapter = self
                .chapters
                .insert_new_chapter(validated)
                .await
                .map_err(|e| code_conflict(e, &code))?;
            tracing::info!(chapter = %chapter.id(), code = %chapter.code(), "chapter created");
            return Ok(chapter);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = AccessCode::generate(&draft.name, &(self.suffixes)())?;
            let validated = draft.clone().validate(code.clone(), now)?;
            match self.chapters.insert_new_chapter(validated).await {
                Ok(chapter) => {
                    tracing::info!(chapter = %chapter.id(), code = %chapter.code(), "chapter created");
                    return Ok(chapter);
                }
                Err(StorageError::Conflict) => {
                    tracing::debug!(%code, attempt, "generated access code collided");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ChapterServiceError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    /// Replace a chapter's editable fields. A draft without a code keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `ChapterServiceError::Storage` with `StorageError::NotFound` if the
    /// chapter does not exist and `ChapterServiceError::CodeTaken` if the new code
    /// belongs to another chapter.
    pub async fn update_chapter(
        &self,
        id: ChapterId,
        draft: ChapterDraft,
    ) -> Result<Chapter, ChapterServiceError> {
        let existing = self
            .chapters
            .get_chapter(id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let code = match draft.code.as_deref() {
            Some(raw) => AccessCode::parse(raw)?,
            None => existing.code().clone(),
        };
        let chapter = draft
            .validate(code.clone(), existing.created_at())?
            .assign_id(id);
        self.chapters
            .upsert_chapter(&chapter)
            .await
            .map_err(|e| code_conflict(e, &code))?;
        tracing::info!(chapter = %id, "chapter updated");
        Ok(chapter)
    }

    /// Delete a chapter together with its questions and cheat sheets.
    ///
    /// # Errors
    ///
    /// Returns `ChapterServiceError::Storage` if the chapter does not exist or
    /// repository access fails.
    pub async fn delete_chapter(&self, id: ChapterId) -> Result<(), ChapterServiceError> {
        let questions = self.questions.list_questions(Some(id)).await?.len();
        let sheets = self
            .cheat_sheets
            .list_cheat_sheets()
            .await?
            .iter()
            .filter(|s| s.chapter_id() == id)
            .count();
        self.chapters.delete_chapter(id).await?;
        tracing::info!(chapter = %id, questions, sheets, "chapter deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ChapterServiceError::Storage` if repository access fails.
    pub async fn get_chapter(&self, id: ChapterId) -> Result<Option<Chapter>, ChapterServiceError> {
        Ok(self.chapters.get_chapter(id).await?)
    }

    /// Every chapter regardless of visibility, for the admin console.
    ///
    /// # Errors
    ///
    /// Returns `ChapterServiceError::Storage` if repository access fails.
    pub async fn list_chapters(&self) -> Result<Vec<Chapter>, ChapterServiceError> {
        Ok(self.chapters.list_chapters().await?)
    }

    /// Chapters shown in the player's chapter list.
    ///
    /// # Errors
    ///
    /// Returns `ChapterServiceError::Storage` if repository access fails.
    pub async fn list_public_chapters(&self) -> Result<Vec<Chapter>, ChapterServiceError> {
        Ok(self
            .chapters
            .list_chapters_by_access(AccessLevel::Public)
            .await?)
    }

    /// Resolve a typed or scanned code to a playable chapter.
    ///
    /// # Errors
    ///
    /// Returns `ChapterAccessError::Unknown` or `ChapterAccessError::Draft`.
    pub async fn resolve_code(&self, raw: &str) -> Result<Chapter, ChapterAccessError> {
        resolve_playable(self.chapters.as_ref(), raw).await
    }
}

fn code_conflict(err: StorageError, code: &AccessCode) -> ChapterServiceError {
    match err {
        StorageError::Conflict => ChapterServiceError::CodeTaken(code.clone()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arena_core::model::{ChapterError, Difficulty, QuestionDraft};
    use arena_core::time::fixed_clock;
    use std::sync::Mutex;
    use storage::repository::{NewCheatSheetRecord, Storage};

    fn service(storage: &Storage) -> ChapterService {
        ChapterService::new(
            fixed_clock(),
            Arc::clone(&storage.chapters),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.cheat_sheets),
        )
    }

    fn scripted(suffixes: &[&str]) -> SuffixSource {
        let queue = Mutex::new(
            suffixes
                .iter()
                .rev()
                .map(|s| (*s).to_owned())
                .collect::<Vec<_>>(),
        );
        Arc::new(move || queue.lock().unwrap().pop().unwrap_or_else(|| "ZZZZ".into()))
    }

    #[test]
    fn random_suffix_is_upper_alphanumeric() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), CODE_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn generated_code_uses_name_prefix() {
        let storage = Storage::in_memory();
        let chapters = service(&storage).with_suffix_source(scripted(&["7QX2"]));

        let chapter = chapters
            .create_chapter(ChapterDraft::named("biology 101"))
            .await
            .unwrap();
        assert_eq!(chapter.code().as_str(), "BIO-7QX2");
        assert_eq!(chapter.access_level(), AccessLevel::Public);
    }

    #[tokio::test]
    async fn generated_code_retries_on_collision() {
        let storage = Storage::in_memory();
        let chapters = service(&storage).with_suffix_source(scripted(&["AAAA", "AAAA", "BBBB"]));

        let first = chapters.create_chapter(ChapterDraft::named("Math")).await.unwrap();
        let second = chapters.create_chapter(ChapterDraft::named("Maths")).await.unwrap();
        assert_eq!(first.code().as_str(), "MAT-AAAA");
        assert_eq!(second.code().as_str(), "MAT-BBBB");
    }

    #[tokio::test]
    async fn generation_gives_up_eventually() {
        let storage = Storage::in_memory();
        let chapters = service(&storage).with_suffix_source(Arc::new(|| "SAME".into()));
        chapters.create_chapter(ChapterDraft::named("Art")).await.unwrap();

        let err = chapters
            .create_chapter(ChapterDraft::named("Art history"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterServiceError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS)));
    }

    #[tokio::test]
    async fn explicit_code_must_be_unique() {
        let storage = Storage::in_memory();
        let chapters = service(&storage);

        let mut draft = ChapterDraft::named("Chemistry");
        draft.code = Some("chem-01".into());
        let created = chapters.create_chapter(draft.clone()).await.unwrap();
        assert_eq!(created.code().as_str(), "CHEM-01");

        let err = chapters.create_chapter(draft).await.unwrap_err();
        assert!(matches!(err, ChapterServiceError::CodeTaken(code) if code.as_str() == "CHEM-01"));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let storage = Storage::in_memory();
        let err = service(&storage)
            .create_chapter(ChapterDraft::named("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterServiceError::Chapter(ChapterError::EmptyName)));
    }

    #[tokio::test]
    async fn update_keeps_code_and_creation_time() {
        let storage = Storage::in_memory();
        let chapters = service(&storage).with_suffix_source(scripted(&["0001"]));
        let created = chapters.create_chapter(ChapterDraft::named("Physics")).await.unwrap();

        let mut draft = ChapterDraft::named("Physics II");
        draft.difficulty = Difficulty::Hard;
        draft.access_level = AccessLevel::Private;
        let updated = chapters.update_chapter(created.id(), draft).await.unwrap();

        assert_eq!(updated.code(), created.code());
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(updated.difficulty(), Difficulty::Hard);
        assert!(chapters.list_public_chapters().await.unwrap().is_empty());
        assert_eq!(chapters.list_chapters().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_dependents() {
        let storage = Storage::in_memory();
        let chapters = service(&storage);
        let chapter = chapters.create_chapter(ChapterDraft::named("Cells")).await.unwrap();
        let question = QuestionDraft::new(chapter.id(), "Q", vec!["a".into(), "b".into()], 0)
            .validate()
            .unwrap();
        storage.questions.insert_new_question(question).await.unwrap();
        storage
            .cheat_sheets
            .insert_new_cheat_sheet(NewCheatSheetRecord {
                chapter_id: chapter.id(),
                title: None,
                image: "https://cdn.example.com/cells.png".into(),
            })
            .await
            .unwrap();

        chapters.delete_chapter(chapter.id()).await.unwrap();

        assert!(storage.questions.list_questions(None).await.unwrap().is_empty());
        assert!(storage.cheat_sheets.list_cheat_sheets().await.unwrap().is_empty());
        assert!(matches!(
            chapters.delete_chapter(chapter.id()).await.unwrap_err(),
            ChapterServiceError::Storage(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn resolve_code_checks_visibility() {
        let storage = Storage::in_memory();
        let chapters = service(&storage);

        let mut private = ChapterDraft::named("Secret");
        private.access_level = AccessLevel::Private;
        private.code = Some("SEC-0001".into());
        chapters.create_chapter(private).await.unwrap();

        let mut draft = ChapterDraft::named("Unfinished");
        draft.access_level = AccessLevel::Draft;
        draft.code = Some("UNF-0001".into());
        chapters.create_chapter(draft).await.unwrap();

        let found = chapters.resolve_code(" sec-0001 ").await.unwrap();
        assert_eq!(found.name(), "Secret");

        assert!(matches!(
            chapters.resolve_code("UNF-0001").await.unwrap_err(),
            ChapterAccessError::Draft(_)
        ));
        assert!(matches!(
            chapters.resolve_code("NOPE-0000").await.unwrap_err(),
            ChapterAccessError::Unknown(_)
        ));
        assert!(matches!(
            chapters.resolve_code("bad code!").await.unwrap_err(),
            ChapterAccessError::Unknown(_)
        ));
    }
}
