use arena_core::battle::{BattleOutcome, BattleSession, Submission};
use arena_core::model::{BattleRecordId, Chapter, ChapterId, Question};

/// A battle in progress together with where its result was stored.
#[derive(Debug, Clone)]
pub struct BattleRun {
    chapter: Option<Chapter>,
    session: BattleSession,
    record_id: Option<BattleRecordId>,
}

impl BattleRun {
    pub(crate) fn new(chapter: Option<Chapter>, session: BattleSession) -> Self {
        Self {
            chapter,
            session,
            record_id: None,
        }
    }

    /// `None` for an all-chapters practice run.
    #[must_use]
    pub fn chapter(&self) -> Option<&Chapter> {
        self.chapter.as_ref()
    }

    #[must_use]
    pub fn chapter_id(&self) -> Option<ChapterId> {
        self.chapter.as_ref().map(Chapter::id)
    }

    #[must_use]
    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut BattleSession {
        &mut self.session
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.session.is_over()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.session.outcome()
    }

    #[must_use]
    pub fn record_id(&self) -> Option<BattleRecordId> {
        self.record_id
    }

    pub(crate) fn set_record_id(&mut self, id: BattleRecordId) {
        self.record_id = Some(id);
    }

    /// Start over from the first question; the previous result stays stored.
    #[must_use]
    pub fn restart(&self) -> Self {
        Self::new(self.chapter.clone(), self.session.restart())
    }
}

/// Result of answering one question through the service.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleAnswer {
    pub submission: Submission,
    pub outcome: Option<BattleOutcome>,
    pub record_id: Option<BattleRecordId>,
}

impl BattleAnswer {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }
}
