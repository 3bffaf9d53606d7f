use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arena_core::battle::BattleState;
use arena_core::model::{
    BattleRecord, BattleRecordId, ChapterDraft, QuestionDraft, UserId,
};
use arena_core::time::fixed_now;
use async_trait::async_trait;
use services::{AppServices, BattleService, BattleServiceError, Clock, SignUp};
use storage::repository::{
    BattleRecordRepository, BattleRecordRow, InMemoryRepository, Storage, StorageError,
};

async fn seed_sample_chapter(app: &AppServices) -> String {
    let mut draft = ChapterDraft::named("General Science");
    draft.code = Some("SCI-2024".into());
    let chapter = app.chapters().create_chapter(draft).await.unwrap();

    let samples: [(&str, [&str; 4], usize); 4] = [
        (
            "What is the powerhouse of the cell?",
            ["Nucleus", "Mitochondria", "Ribosome", "Endoplasmic Reticulum"],
            1,
        ),
        (
            "Which planet is known as the Red Planet?",
            ["Venus", "Mars", "Jupiter", "Saturn"],
            1,
        ),
        ("What is the chemical symbol for Gold?", ["Au", "Ag", "Fe", "Cu"], 0),
        (
            "Who wrote 'Romeo and Juliet'?",
            ["Charles Dickens", "William Shakespeare", "Mark Twain", "Jane Austen"],
            1,
        ),
    ];
    for (text, options, correct) in samples {
        let options = options.iter().map(|o| (*o).to_owned()).collect();
        app.questions()
            .create_question(QuestionDraft::new(chapter.id(), text, options, correct))
            .await
            .unwrap();
    }
    chapter.code().to_string()
}

#[tokio::test]
async fn signed_in_player_wins_and_tops_the_board() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now()));
    let code = seed_sample_chapter(&app).await;
    let school = app
        .schools()
        .create_school("SMK Telkom Malang", Some("Jawa Timur".into()))
        .await
        .unwrap();

    let profile = app
        .auth()
        .sign_up(SignUp {
            email: "alex@thunder.id".into(),
            password: "lightning".into(),
            full_name: "Alex Thunder".into(),
            school_id: Some(school.id()),
        })
        .await
        .unwrap();
    let player = app.auth().current_user().map(|u| u.uid());
    assert_eq!(player, Some(profile.uid()));

    let briefing = app.battles().briefing(&code).await.unwrap();
    assert!(briefing.should_skip());

    let mut run = app.battles().start(&code).await.unwrap();
    let mut hp = Vec::new();
    for option in [1, 1, 0, 1] {
        let answer = app.battles().answer(&mut run, option, player).await.unwrap();
        assert!(answer.submission.is_correct);
        hp.push(answer.submission.boss_hp_after);
    }
    assert_eq!(hp, [68.75, 37.5, 6.25, 0.0]);

    let outcome = run.outcome().unwrap();
    assert_eq!(outcome.state, BattleState::Won);
    assert_eq!(outcome.final_score, 200);
    assert_eq!(outcome.overkill_bonus, 0);

    let students = app.leaderboard().students(5).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].full_name, "Alex Thunder");
    assert_eq!(students[0].total_score, 200);

    let schools = app.leaderboard().schools(5).await.unwrap();
    assert_eq!(schools[0].name, "SMK Telkom Malang");
    assert_eq!(schools[0].total_score, 200);
}

#[tokio::test]
async fn missing_the_last_question_loses() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now()));
    let code = seed_sample_chapter(&app).await;

    let mut run = app.battles().start(&code).await.unwrap();
    let mut last = None;
    for option in [1, 1, 0, 2] {
        last = Some(app.battles().answer(&mut run, option, None).await.unwrap());
    }
    let last = last.unwrap();
    assert!(!last.submission.is_correct);
    assert_eq!(last.submission.state, BattleState::Lost);
    assert_eq!(last.outcome.unwrap().final_score, 150);
    assert!(last.record_id.is_some());

    // Anonymous results are stored but not ranked.
    assert!(app.leaderboard().students(5).await.unwrap().is_empty());
    assert_eq!(
        app.battles().recent_results(None, 5).await.unwrap().len(),
        1
    );
}

/// Fails the first append, then delegates to memory.
#[derive(Clone)]
struct FlakyRecords {
    inner: InMemoryRepository,
    failed: Arc<AtomicBool>,
}

#[async_trait]
impl BattleRecordRepository for FlakyRecords {
    async fn append_record(&self, record: &BattleRecord) -> Result<BattleRecordId, StorageError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StorageError::Connection("database is locked".into()));
        }
        self.inner.append_record(record).await
    }

    async fn get_record(&self, id: BattleRecordId) -> Result<BattleRecord, StorageError> {
        self.inner.get_record(id).await
    }

    async fn list_records(
        &self,
        player: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<BattleRecordRow>, StorageError> {
        self.inner.list_records(player, limit).await
    }
}

#[tokio::test]
async fn failed_result_write_can_be_retried() {
    let repo = InMemoryRepository::new();
    let storage = Storage::from_backend(repo.clone());
    let app = AppServices::from_storage(&storage, Clock::fixed(fixed_now()), Default::default());
    let code = seed_sample_chapter(&app).await;

    let battles = BattleService::new(
        Clock::fixed(fixed_now()),
        Arc::clone(&storage.chapters),
        Arc::clone(&storage.questions),
        Arc::clone(&storage.cheat_sheets),
        Arc::new(FlakyRecords {
            inner: repo.clone(),
            failed: Arc::new(AtomicBool::new(false)),
        }),
    );

    let mut run = battles.start(&code).await.unwrap();
    for option in [1, 1, 0] {
        battles.answer(&mut run, option, None).await.unwrap();
    }
    let err = battles.answer(&mut run, 1, None).await.unwrap_err();
    assert!(matches!(err, BattleServiceError::Storage(StorageError::Connection(_))));
    assert!(run.is_over());
    assert!(run.record_id().is_none());

    let id = battles.finalize(&mut run, None).await.unwrap();
    assert_eq!(run.record_id(), Some(id));
    assert_eq!(repo.get_record(id).await.unwrap().final_score(), 200);
    assert_eq!(battles.finalize(&mut run, None).await.unwrap(), id);
}
