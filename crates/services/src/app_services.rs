use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::battle::BattleService;
use crate::chapter_service::ChapterService;
use crate::cheat_sheet_service::CheatSheetService;
use crate::error::AppServicesError;
use crate::leaderboard_service::LeaderboardService;
use crate::question_service::QuestionService;
use crate::school_service::SchoolService;

/// Assembles every app-facing service over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    chapters: Arc<ChapterService>,
    questions: Arc<QuestionService>,
    schools: Arc<SchoolService>,
    cheat_sheets: Arc<CheatSheetService>,
    auth: Arc<AuthService>,
    battles: Arc<BattleService>,
    leaderboard: Arc<LeaderboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        pacing: Duration,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, pacing))
    }

    /// Build services over in-memory storage with no pacing.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, Duration::ZERO)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, pacing: Duration) -> Self {
        let chapters = Arc::new(ChapterService::new(
            clock,
            Arc::clone(&storage.chapters),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.cheat_sheets),
        ));
        let questions = Arc::new(QuestionService::new(Arc::clone(&storage.questions)));
        let schools = Arc::new(SchoolService::new(Arc::clone(&storage.schools)));
        let cheat_sheets = Arc::new(CheatSheetService::new(Arc::clone(&storage.cheat_sheets)));
        let auth = Arc::new(AuthService::new(
            clock,
            Arc::clone(&storage.auth),
            Arc::clone(&storage.users),
            Arc::clone(&storage.schools),
        ));
        let battles = Arc::new(
            BattleService::new(
                clock,
                Arc::clone(&storage.chapters),
                Arc::clone(&storage.questions),
                Arc::clone(&storage.cheat_sheets),
                Arc::clone(&storage.battle_records),
            )
            .with_pacing(pacing),
        );
        let leaderboard = Arc::new(LeaderboardService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.schools),
            Arc::clone(&storage.battle_records),
        ));

        Self {
            chapters,
            questions,
            schools,
            cheat_sheets,
            auth,
            battles,
            leaderboard,
        }
    }

    #[must_use]
    pub fn chapters(&self) -> Arc<ChapterService> {
        Arc::clone(&self.chapters)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn schools(&self) -> Arc<SchoolService> {
        Arc::clone(&self.schools)
    }

    #[must_use]
    pub fn cheat_sheets(&self) -> Arc<CheatSheetService> {
        Arc::clone(&self.cheat_sheets)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn battles(&self) -> Arc<BattleService> {
        Arc::clone(&self.battles)
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }
}
