#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod battle;
pub mod chapter_service;
pub mod cheat_sheet_service;
pub mod error;
pub mod leaderboard_service;
pub mod question_service;
pub mod school_service;

pub use arena_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, SignUp};
pub use battle::{BattleAnswer, BattleRun, BattleService, Briefing};
pub use chapter_service::ChapterService;
pub use cheat_sheet_service::CheatSheetService;
pub use error::{
    AppServicesError, AuthError, BattleServiceError, ChapterAccessError, ChapterServiceError,
    CheatSheetServiceError, LeaderboardError, QuestionServiceError, SchoolServiceError,
};
pub use leaderboard_service::{LeaderboardService, SchoolStanding, StudentStanding};
pub use question_service::QuestionService;
pub use school_service::SchoolService;
