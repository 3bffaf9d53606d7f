use arena_core::model::{Chapter, CheatSheet};

/// Seconds the briefing screen waits before the battle starts on its own.
pub const BRIEFING_COUNTDOWN_SECS: u32 = 30;

/// What the player sees between unlocking a chapter and fighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Briefing {
    pub chapter: Chapter,
    pub cheat_sheet: Option<CheatSheet>,
    pub countdown_secs: u32,
}

impl Briefing {
    #[must_use]
    pub fn new(chapter: Chapter, cheat_sheet: Option<CheatSheet>) -> Self {
        Self {
            chapter,
            cheat_sheet,
            countdown_secs: BRIEFING_COUNTDOWN_SECS,
        }
    }

    /// Chapters without a study aid go straight to the battle.
    #[must_use]
    pub fn should_skip(&self) -> bool {
        self.cheat_sheet.is_none()
    }
}
