use arena_core::model::{
    AccessCode, AccessLevel, BattleRecord, BattleRecordId, Chapter, ChapterId, CheatSheet,
    CheatSheetId, Question, QuestionId, School, SchoolId, UserId, UserProfile, ValidatedChapter,
    ValidatedQuestion, normalize_email,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::{digests_match, hash_password};
use crate::repository::{
    AuthBackend, BattleRecordRepository, BattleRecordRow, ChapterRepository,
    CheatSheetRepository, NewCheatSheetRecord, NewSchoolRecord, QuestionRepository,
    SchoolRepository, StorageError, UserRepository,
};

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    chapters: BTreeMap<ChapterId, Chapter>,
    questions: BTreeMap<QuestionId, Question>,
    schools: BTreeMap<SchoolId, School>,
    cheat_sheets: BTreeMap<CheatSheetId, CheatSheet>,
    profiles: HashMap<UserId, UserProfile>,
    records: BTreeMap<BattleRecordId, BattleRecord>,
    // email -> (uid, password digest)
    accounts: HashMap<String, (UserId, String)>,
}

impl MemoryState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn code_taken_by_other(&self, code: &AccessCode, id: Option<ChapterId>) -> bool {
        self.chapters
            .values()
            .any(|c| c.code() == code && Some(c.id()) != id)
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ChapterRepository for InMemoryRepository {
    async fn insert_new_chapter(&self, chapter: ValidatedChapter) -> Result<Chapter, StorageError> {
        let mut guard = self.lock()?;
        if guard.code_taken_by_other(&chapter.code, None) {
            return Err(StorageError::Conflict);
        }
        let id = ChapterId::new(guard.allocate());
        let chapter = chapter.assign_id(id);
        guard.chapters.insert(id, chapter.clone());
        Ok(chapter)
    }

    async fn upsert_chapter(&self, chapter: &Chapter) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.code_taken_by_other(chapter.code(), Some(chapter.id())) {
            return Err(StorageError::Conflict);
        }
        guard.chapters.insert(chapter.id(), chapter.clone());
        Ok(())
    }

    async fn get_chapter(&self, id: ChapterId) -> Result<Option<Chapter>, StorageError> {
        Ok(self.lock()?.chapters.get(&id).cloned())
    }

    async fn get_chapter_by_code(
        &self,
        code: &AccessCode,
    ) -> Result<Option<Chapter>, StorageError> {
        Ok(self
            .lock()?
            .chapters
            .values()
            .find(|c| c.code() == code)
            .cloned())
    }

    async fn list_chapters(&self) -> Result<Vec<Chapter>, StorageError> {
        Ok(self.lock()?.chapters.values().cloned().collect())
    }

    async fn list_chapters_by_access(
        &self,
        level: AccessLevel,
    ) -> Result<Vec<Chapter>, StorageError> {
        Ok(self
            .lock()?
            .chapters
            .values()
            .filter(|c| c.access_level() == level)
            .cloned()
            .collect())
    }

    async fn delete_chapter(&self, id: ChapterId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.chapters.remove(&id).ok_or(StorageError::NotFound)?;
        // Same outcome as the SQLite foreign keys: content cascades, results stay.
        guard.questions.retain(|_, q| q.chapter_id() != id);
        guard.cheat_sheets.retain(|_, s| s.chapter_id() != id);
        for record in guard.records.values_mut() {
            if record.chapter_id() == Some(id) {
                *record = record.clone().without_chapter();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_new_question(
        &self,
        question: ValidatedQuestion,
    ) -> Result<Question, StorageError> {
        let mut guard = self.lock()?;
        if !guard.chapters.contains_key(&question.chapter_id) {
            return Err(StorageError::NotFound);
        }
        let id = QuestionId::new(guard.allocate());
        let question = question.assign_id(id);
        guard.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.chapters.contains_key(&question.chapter_id()) {
            return Err(StorageError::NotFound);
        }
        guard.questions.insert(question.id(), question.clone());
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        Ok(self.lock()?.questions.get(&id).cloned())
    }

    async fn list_questions(
        &self,
        chapter_id: Option<ChapterId>,
    ) -> Result<Vec<Question>, StorageError> {
        Ok(self
            .lock()?
            .questions
            .values()
            .filter(|q| chapter_id.is_none_or(|c| q.chapter_id() == c))
            .cloned()
            .collect())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        self.lock()?
            .questions
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl SchoolRepository for InMemoryRepository {
    async fn insert_new_school(&self, school: NewSchoolRecord) -> Result<School, StorageError> {
        let mut guard = self.lock()?;
        let id = SchoolId::new(guard.allocate());
        let school = School::new(id, school.name, school.region)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.schools.insert(id, school.clone());
        Ok(school)
    }

    async fn upsert_school(&self, school: &School) -> Result<(), StorageError> {
        self.lock()?.schools.insert(school.id(), school.clone());
        Ok(())
    }

    async fn get_school(&self, id: SchoolId) -> Result<Option<School>, StorageError> {
        Ok(self.lock()?.schools.get(&id).cloned())
    }

    async fn list_schools(&self) -> Result<Vec<School>, StorageError> {
        Ok(self.lock()?.schools.values().cloned().collect())
    }

    async fn delete_school(&self, id: SchoolId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.schools.remove(&id).ok_or(StorageError::NotFound)?;
        for profile in guard.profiles.values_mut() {
            if profile.school_id() == Some(id) {
                *profile = profile.clone().without_school();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CheatSheetRepository for InMemoryRepository {
    async fn insert_new_cheat_sheet(
        &self,
        sheet: NewCheatSheetRecord,
    ) -> Result<CheatSheet, StorageError> {
        let mut guard = self.lock()?;
        if !guard.chapters.contains_key(&sheet.chapter_id) {
            return Err(StorageError::NotFound);
        }
        let id = CheatSheetId::new(guard.allocate());
        let sheet = CheatSheet::new(id, sheet.chapter_id, sheet.title, sheet.image)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.cheat_sheets.insert(id, sheet.clone());
        Ok(sheet)
    }

    async fn upsert_cheat_sheet(&self, sheet: &CheatSheet) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.chapters.contains_key(&sheet.chapter_id()) {
            return Err(StorageError::NotFound);
        }
        guard.cheat_sheets.insert(sheet.id(), sheet.clone());
        Ok(())
    }

    async fn list_cheat_sheets(&self) -> Result<Vec<CheatSheet>, StorageError> {
        Ok(self.lock()?.cheat_sheets.values().cloned().collect())
    }

    async fn cheat_sheet_for_chapter(
        &self,
        chapter_id: ChapterId,
    ) -> Result<Option<CheatSheet>, StorageError> {
        Ok(self
            .lock()?
            .cheat_sheets
            .values()
            .find(|s| s.chapter_id() == chapter_id)
            .cloned())
    }

    async fn delete_cheat_sheet(&self, id: CheatSheetId) -> Result<(), StorageError> {
        self.lock()?
            .cheat_sheets
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.lock()?.profiles.insert(profile.uid(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, uid: UserId) -> Result<Option<UserProfile>, StorageError> {
        Ok(self.lock()?.profiles.get(&uid).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StorageError> {
        let mut profiles: Vec<_> = self.lock()?.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.email().cmp(b.email()))
        });
        Ok(profiles)
    }
}

#[async_trait]
impl BattleRecordRepository for InMemoryRepository {
    async fn append_record(&self, record: &BattleRecord) -> Result<BattleRecordId, StorageError> {
        let mut guard = self.lock()?;
        let id = BattleRecordId::new(guard.allocate());
        guard.records.insert(id, record.clone());
        Ok(id)
    }

    async fn get_record(&self, id: BattleRecordId) -> Result<BattleRecord, StorageError> {
        self.lock()?
            .records
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_records(
        &self,
        player: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<BattleRecordRow>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<_> = guard
            .records
            .iter()
            .filter(|(_, r)| player.is_none_or(|p| r.player() == Some(p)))
            .map(|(id, record)| BattleRecordRow {
                id: *id,
                record: record.clone(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.record
                .completed_at()
                .cmp(&a.record.completed_at())
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

#[async_trait]
impl AuthBackend for InMemoryRepository {
    async fn create_account(&self, email: &str, password: &str) -> Result<UserId, StorageError> {
        let email = normalize_email(email).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut guard = self.lock()?;
        if guard.accounts.contains_key(&email) {
            return Err(StorageError::Conflict);
        }
        let uid = UserId::generate();
        guard
            .accounts
            .insert(email, (uid, hash_password(uid, password)));
        Ok(uid)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<UserId, StorageError> {
        let email = normalize_email(email).map_err(|_| StorageError::Unauthorized)?;
        let guard = self.lock()?;
        let (uid, digest) = guard.accounts.get(&email).ok_or(StorageError::Unauthorized)?;
        if digests_match(digest, &hash_password(*uid, password)) {
            Ok(*uid)
        } else {
            Err(StorageError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::battle::BattleState;
    use arena_core::model::{ChapterDraft, QuestionDraft};
    use arena_core::time::fixed_now;

    async fn insert_chapter(repo: &InMemoryRepository, name: &str, code: &str) -> Chapter {
        let validated = ChapterDraft::named(name)
            .validate(AccessCode::parse(code).unwrap(), fixed_now())
            .unwrap();
        repo.insert_new_chapter(validated).await.unwrap()
    }

    fn question(chapter_id: ChapterId, text: &str) -> ValidatedQuestion {
        QuestionDraft::new(chapter_id, text, vec!["a".into(), "b".into()], 0)
            .validate()
            .unwrap()
    }

    #[tokio::test]
    async fn chapter_codes_are_unique() {
        let repo = InMemoryRepository::new();
        insert_chapter(&repo, "Cells", "CEL-0001").await;

        let dup = ChapterDraft::named("Cells again")
            .validate(AccessCode::parse("cel-0001").unwrap(), fixed_now())
            .unwrap();
        let err = repo.insert_new_chapter(dup).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn deleting_a_chapter_cascades() {
        let repo = InMemoryRepository::new();
        let cells = insert_chapter(&repo, "Cells", "CEL-0001").await;
        let planets = insert_chapter(&repo, "Planets", "PLA-0001").await;
        repo.insert_new_question(question(cells.id(), "Q1")).await.unwrap();
        repo.insert_new_question(question(planets.id(), "Q2")).await.unwrap();
        repo.insert_new_cheat_sheet(NewCheatSheetRecord {
            chapter_id: cells.id(),
            title: None,
            image: "https://cdn.example.com/cells.png".into(),
        })
        .await
        .unwrap();
        let record = BattleRecord::from_persisted(
            Some(cells.id()),
            None,
            BattleState::Won,
            1,
            1,
            50,
            fixed_now(),
        )
        .unwrap();
        let record_id = repo.append_record(&record).await.unwrap();

        repo.delete_chapter(cells.id()).await.unwrap();

        let kept = repo.get_record(record_id).await.unwrap();
        assert_eq!(kept.chapter_id(), None);
        assert_eq!(kept.final_score(), 50);
        let remaining = repo.list_questions(None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].chapter_id(), planets.id());
        assert!(repo.cheat_sheet_for_chapter(cells.id()).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_chapter(cells.id()).await.unwrap_err(),
            StorageError::NotFound
        ));
    }

    #[tokio::test]
    async fn question_requires_existing_chapter() {
        let repo = InMemoryRepository::new();
        let err = repo
            .insert_new_question(question(ChapterId::new(99), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn accounts_verify_passwords() {
        let repo = InMemoryRepository::new();
        let uid = repo.create_account("Alex@Thunder.id", "lightning").await.unwrap();

        assert_eq!(repo.verify("alex@thunder.id", "lightning").await.unwrap(), uid);
        assert!(matches!(
            repo.verify("alex@thunder.id", "wrong").await.unwrap_err(),
            StorageError::Unauthorized
        ));
        assert!(matches!(
            repo.create_account("alex@thunder.id", "other").await.unwrap_err(),
            StorageError::Conflict
        ));
    }

    #[tokio::test]
    async fn records_list_newest_first_and_filter_by_player() {
        let repo = InMemoryRepository::new();
        let alex = UserId::generate();
        let now = fixed_now();
        for (offset, player) in [(0, Some(alex)), (10, None), (20, Some(alex))] {
            let record = BattleRecord::from_persisted(
                None,
                player,
                BattleState::Won,
                4,
                4,
                200,
                now + chrono::Duration::minutes(offset),
            )
            .unwrap();
            repo.append_record(&record).await.unwrap();
        }

        let all = repo.list_records(None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].record.completed_at() > all[1].record.completed_at());

        let mine = repo.list_records(Some(alex), 1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].record.completed_at(), now + chrono::Duration::minutes(20));
    }

    #[tokio::test]
    async fn deleting_a_school_keeps_its_students() {
        let repo = InMemoryRepository::new();
        let school = repo
            .insert_new_school(NewSchoolRecord {
                name: "SMK Telkom Malang".into(),
                region: None,
            })
            .await
            .unwrap();
        let uid = UserId::generate();
        let profile = UserProfile::new(
            uid,
            "alex@thunder.id",
            "Alex Thunder",
            Some(school.id()),
            "SMK Telkom Malang",
            fixed_now(),
        )
        .unwrap();
        repo.upsert_profile(&profile).await.unwrap();

        repo.delete_school(school.id()).await.unwrap();

        let kept = repo.get_profile(uid).await.unwrap().unwrap();
        assert_eq!(kept.school_id(), None);
        assert_eq!(kept.school_name(), "SMK Telkom Malang");
    }
}
