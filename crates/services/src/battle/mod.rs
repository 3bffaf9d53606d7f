mod briefing;
mod run;
mod workflow;

// Public API of the battle subsystem.
pub use crate::error::BattleServiceError;
pub use briefing::{BRIEFING_COUNTDOWN_SECS, Briefing};
pub use run::{BattleAnswer, BattleRun};
pub use workflow::{BattleService, DEFAULT_PACING};
