use thiserror::Error;
use url::Url;

use crate::model::ids::{ChapterId, CheatSheetId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CheatSheetError {
    #[error("cheat sheet image reference cannot be empty")]
    EmptyImage,

    #[error("cheat sheet image reference is not a valid URL: {0}")]
    InvalidImage(String),
}

/// Study aid image shown during the pre-battle briefing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheatSheet {
    id: CheatSheetId,
    chapter_id: ChapterId,
    title: Option<String>,
    image: Url,
}

impl CheatSheet {
    /// Accepts `http(s)` links as well as inline `data:` URLs.
    ///
    /// # Errors
    ///
    /// Returns `CheatSheetError` if the image reference is blank or unparsable.
    pub fn new(
        id: CheatSheetId,
        chapter_id: ChapterId,
        title: Option<String>,
        image: impl AsRef<str>,
    ) -> Result<Self, CheatSheetError> {
        let raw = image.as_ref().trim();
        if raw.is_empty() {
            return Err(CheatSheetError::EmptyImage);
        }
        let image = Url::parse(raw).map_err(|e| CheatSheetError::InvalidImage(e.to_string()))?;
        let title = title.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty());
        Ok(Self {
            id,
            chapter_id,
            title,
            image,
        })
    }

    #[must_use]
    pub fn id(&self) -> CheatSheetId {
        self.id
    }

    #[must_use]
    pub fn chapter_id(&self) -> ChapterId {
        self.chapter_id
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn image(&self) -> &Url {
        &self.image
    }

    #[must_use]
    pub fn with_id(mut self, id: CheatSheetId) -> Self {
        self.id = id;
        self
    }
}
