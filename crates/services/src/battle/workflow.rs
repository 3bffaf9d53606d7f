use std::sync::Arc;
use std::time::Duration;

use arena_core::battle::BattleSession;
use arena_core::model::{BattleRecord, BattleRecordId, UserId};
use storage::repository::{
    BattleRecordRepository, BattleRecordRow, ChapterRepository, CheatSheetRepository,
    QuestionRepository,
};

use super::briefing::Briefing;
use super::run::{BattleAnswer, BattleRun};
use crate::Clock;
use crate::chapter_service::resolve_playable;
use crate::error::BattleServiceError;

/// Pause between an answer and the next question in interactive front ends.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1500);

/// Orchestrates briefing, battle start and persisted answering.
#[derive(Clone)]
pub struct BattleService {
    clock: Clock,
    chapters: Arc<dyn ChapterRepository>,
    questions: Arc<dyn QuestionRepository>,
    cheat_sheets: Arc<dyn CheatSheetRepository>,
    records: Arc<dyn BattleRecordRepository>,
    pacing: Duration,
}

impl BattleService {
    /// Builds a service with no pacing delay.
    #[must_use]
    pub fn new(
        clock: Clock,
        chapters: Arc<dyn ChapterRepository>,
        questions: Arc<dyn QuestionRepository>,
        cheat_sheets: Arc<dyn CheatSheetRepository>,
        records: Arc<dyn BattleRecordRepository>,
    ) -> Self {
        Self {
            clock,
            chapters,
            questions,
            cheat_sheets,
            records,
            pacing: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Load the briefing for a chapter code.
    ///
    /// # Errors
    ///
    /// Returns `BattleServiceError::Access` for unknown or draft codes.
    pub async fn briefing(&self, code: &str) -> Result<Briefing, BattleServiceError> {
        let chapter = resolve_playable(self.chapters.as_ref(), code).await?;
        let sheet = self.cheat_sheets.cheat_sheet_for_chapter(chapter.id()).await?;
        Ok(Briefing::new(chapter, sheet))
    }

    /// Start a battle over a chapter's questions.
    ///
    /// # Errors
    ///
    /// Returns `BattleServiceError::Access` for unknown or draft codes and
    /// `BattleServiceError::NoQuestions` when the chapter is empty.
    pub async fn start(&self, code: &str) -> Result<BattleRun, BattleServiceError> {
        let chapter = resolve_playable(self.chapters.as_ref(), code).await?;
        let questions = self.questions.list_questions(Some(chapter.id())).await?;
        if questions.is_empty() {
            tracing::warn!(chapter = %chapter.id(), "battle unavailable: no questions");
            return Err(BattleServiceError::NoQuestions);
        }
        tracing::info!(chapter = %chapter.id(), questions = questions.len(), "battle started");
        Ok(BattleRun::new(Some(chapter), BattleSession::new(questions)?))
    }

    /// Start a practice battle over every stored question.
    ///
    /// # Errors
    ///
    /// Returns `BattleServiceError::NoQuestions` when nothing is stored.
    pub async fn start_all(&self) -> Result<BattleRun, BattleServiceError> {
        let questions = self.questions.list_questions(None).await?;
        if questions.is_empty() {
            return Err(BattleServiceError::NoQuestions);
        }
        tracing::info!(questions = questions.len(), "practice battle started");
        Ok(BattleRun::new(None, BattleSession::new(questions)?))
    }

    /// Answer the current question, pace, and store the result once decided.
    ///
    /// # Errors
    ///
    /// Returns `BattleServiceError::Battle` for answers the engine rejects (the run
    /// is left untouched) and `BattleServiceError::Storage` if the result cannot
    /// be stored; `finalize` retries that.
    pub async fn answer(
        &self,
        run: &mut BattleRun,
        option: usize,
        player: Option<UserId>,
    ) -> Result<BattleAnswer, BattleServiceError> {
        let submission = run.session_mut().submit_answer(option).map_err(|e| {
            tracing::warn!(option, error = %e, "answer rejected");
            e
        })?;

        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }

        let record_id = if submission.state.is_terminal() {
            Some(self.finalize(run, player).await?)
        } else {
            None
        };

        Ok(BattleAnswer {
            submission,
            outcome: run.outcome(),
            record_id,
        })
    }

    /// Store the result of a decided run. Returns the existing id when already stored.
    ///
    /// # Errors
    ///
    /// Returns `BattleServiceError::NotFinished` for a run still in progress and
    /// `BattleServiceError::Storage` if persistence fails.
    pub async fn finalize(
        &self,
        run: &mut BattleRun,
        player: Option<UserId>,
    ) -> Result<BattleRecordId, BattleServiceError> {
        if let Some(id) = run.record_id() {
            return Ok(id);
        }
        let outcome = run.outcome().ok_or(BattleServiceError::NotFinished)?;
        let record = BattleRecord::from_outcome(run.chapter_id(), player, &outcome, self.clock.now())?;
        let id = self.records.append_record(&record).await?;
        run.set_record_id(id);

        tracing::info!(
            record = %id,
            state = %outcome.state,
            correct = outcome.correct_count,
            total = outcome.total_questions,
            score = outcome.final_score,
            "battle decided"
        );
        Ok(id)
    }

    /// Most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BattleServiceError::Storage` if repository access fails.
    pub async fn recent_results(
        &self,
        player: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<BattleRecordRow>, BattleServiceError> {
        Ok(self.records.list_records(player, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arena_core::battle::{BattleError, BattleState};
    use arena_core::model::{AccessCode, AccessLevel, ChapterDraft, ChapterId, QuestionDraft};
    use arena_core::time::{fixed_clock, fixed_now};
    use storage::repository::Storage;

    use crate::error::ChapterAccessError;

    fn service(storage: &Storage) -> BattleService {
        BattleService::new(
            fixed_clock(),
            Arc::clone(&storage.chapters),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.cheat_sheets),
            Arc::clone(&storage.battle_records),
        )
    }

    async fn chapter(storage: &Storage, code: &str, level: AccessLevel, questions: usize) -> ChapterId {
        let mut draft = ChapterDraft::named("Science");
        draft.access_level = level;
        let chapter = storage
            .chapters
            .insert_new_chapter(draft.validate(AccessCode::parse(code).unwrap(), fixed_now()).unwrap())
            .await
            .unwrap();
        for i in 0..questions {
            let q = QuestionDraft::new(
                chapter.id(),
                format!("Question {i}"),
                vec!["right".into(), "wrong".into()],
                0,
            )
            .validate()
            .unwrap();
            storage.questions.insert_new_question(q).await.unwrap();
        }
        chapter.id()
    }

    #[tokio::test]
    async fn winning_run_is_recorded_once() {
        let storage = Storage::in_memory();
        let battles = service(&storage);
        let chapter_id = chapter(&storage, "SCI-0001", AccessLevel::Public, 5).await;
        let player = UserId::generate();

        let mut run = battles.start("sci-0001").await.unwrap();
        assert_eq!(run.chapter_id(), Some(chapter_id));

        for _ in 0..4 {
            let answer = battles.answer(&mut run, 0, Some(player)).await.unwrap();
            assert!(answer.submission.is_correct);
            assert!(!answer.is_complete());
            assert_eq!(answer.record_id, None);
        }
        let last = battles.answer(&mut run, 0, Some(player)).await.unwrap();
        let outcome = last.outcome.unwrap();
        assert_eq!(outcome.state, BattleState::Won);
        assert_eq!(outcome.final_score, 350);

        let id = last.record_id.unwrap();
        assert_eq!(battles.finalize(&mut run, Some(player)).await.unwrap(), id);
        let rows = battles.recent_results(Some(player), 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.final_score(), 350);
        assert_eq!(rows[0].record.chapter_id(), Some(chapter_id));

        let err = battles.answer(&mut run, 0, Some(player)).await.unwrap_err();
        assert!(matches!(err, BattleServiceError::Battle(BattleError::Finished)));
        assert_eq!(battles.recent_results(None, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_option_leaves_run_untouched() {
        let storage = Storage::in_memory();
        let battles = service(&storage);
        chapter(&storage, "SCI-0002", AccessLevel::Private, 2).await;

        let mut run = battles.start("SCI-0002").await.unwrap();
        let err = battles.answer(&mut run, 5, None).await.unwrap_err();
        assert!(matches!(
            err,
            BattleServiceError::Battle(BattleError::InvalidOption { index: 5, options: 2 })
        ));
        assert_eq!(run.session().current_index(), 0);
        assert!(matches!(
            battles.finalize(&mut run, None).await.unwrap_err(),
            BattleServiceError::NotFinished
        ));
    }

    #[tokio::test]
    async fn empty_and_draft_chapters_cannot_start() {
        let storage = Storage::in_memory();
        let battles = service(&storage);
        chapter(&storage, "EMP-0001", AccessLevel::Public, 0).await;
        chapter(&storage, "DRA-0001", AccessLevel::Draft, 3).await;

        assert!(matches!(
            battles.start("EMP-0001").await.unwrap_err(),
            BattleServiceError::NoQuestions
        ));
        assert!(matches!(
            battles.start("DRA-0001").await.unwrap_err(),
            BattleServiceError::Access(ChapterAccessError::Draft(_))
        ));
        assert!(matches!(
            battles.briefing("XYZ-9999").await.unwrap_err(),
            BattleServiceError::Access(ChapterAccessError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn practice_run_covers_every_question() {
        let storage = Storage::in_memory();
        let battles = service(&storage);
        assert!(matches!(
            battles.start_all().await.unwrap_err(),
            BattleServiceError::NoQuestions
        ));

        chapter(&storage, "AAA-0001", AccessLevel::Public, 2).await;
        chapter(&storage, "BBB-0001", AccessLevel::Public, 3).await;
        let mut run = battles.start_all().await.unwrap();
        assert_eq!(run.session().total_questions(), 5);
        assert!(run.chapter().is_none());

        for option in [0, 1, 1, 1, 1] {
            battles.answer(&mut run, option, None).await.unwrap();
        }
        let outcome = run.outcome().unwrap();
        assert_eq!(outcome.state, BattleState::Lost);
        assert_eq!(outcome.final_score, 50);
        let stored = storage
            .battle_records
            .get_record(run.record_id().unwrap())
            .await
            .unwrap();
        assert_eq!(stored.chapter_id(), None);
        assert_eq!(stored.player(), None);
    }

    #[tokio::test]
    async fn restart_starts_a_new_result() {
        let storage = Storage::in_memory();
        let battles = service(&storage);
        chapter(&storage, "SCI-0003", AccessLevel::Public, 1).await;

        let mut run = battles.start("SCI-0003").await.unwrap();
        battles.answer(&mut run, 1, None).await.unwrap();
        let mut again = run.restart();
        assert!(again.record_id().is_none());
        assert_eq!(again.session().score(), 0);

        battles.answer(&mut again, 0, None).await.unwrap();
        assert_ne!(again.record_id(), run.record_id());
        assert_eq!(battles.recent_results(None, 10).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_delays_each_answer() {
        let storage = Storage::in_memory();
        let battles = service(&storage).with_pacing(DEFAULT_PACING);
        chapter(&storage, "SCI-0004", AccessLevel::Public, 2).await;
        let mut run = battles.start("SCI-0004").await.unwrap();

        let started = tokio::time::Instant::now();
        battles.answer(&mut run, 0, None).await.unwrap();
        assert!(started.elapsed() >= DEFAULT_PACING);
    }

    #[tokio::test]
    async fn briefing_includes_first_sheet() {
        let storage = Storage::in_memory();
        let battles = service(&storage);
        let chapter_id = chapter(&storage, "SCI-0005", AccessLevel::Public, 1).await;

        assert!(battles.briefing("SCI-0005").await.unwrap().should_skip());

        storage
            .cheat_sheets
            .insert_new_cheat_sheet(storage::repository::NewCheatSheetRecord {
                chapter_id,
                title: Some("Formulas".into()),
                image: "https://cdn.example.com/formulas.png".into(),
            })
            .await
            .unwrap();
        let briefing = battles.briefing("SCI-0005").await.unwrap();
        assert!(!briefing.should_skip());
        assert_eq!(briefing.chapter.id(), chapter_id);
    }
}
