use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ChapterId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChapterError {
    #[error("chapter name cannot be empty")]
    EmptyName,

    #[error("access code cannot be empty")]
    EmptyCode,

    #[error("access code contains invalid character {0:?}")]
    InvalidCodeCharacter(char),

    #[error("unknown access level: {0}")]
    UnknownAccessLevel(String),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── ACCESS LEVEL ──────────────────────────────────────────────────────────────
//

/// Visibility policy of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Listed on the landing page and reachable by code.
    #[default]
    Public,
    /// Reachable only by QR or access code.
    Private,
    /// Stored but not playable.
    Draft,
}

impl AccessLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Private => "private",
            AccessLevel::Draft => "draft",
        }
    }

    #[must_use]
    pub fn is_listed(self) -> bool {
        matches!(self, AccessLevel::Public)
    }

    #[must_use]
    pub fn is_playable(self) -> bool {
        !matches!(self, AccessLevel::Draft)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = ChapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(AccessLevel::Public),
            "private" => Ok(AccessLevel::Private),
            "draft" => Ok(AccessLevel::Draft),
            _ => Err(ChapterError::UnknownAccessLevel(s.to_owned())),
        }
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ChapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ChapterError::UnknownDifficulty(s.to_owned())),
        }
    }
}

//
// ─── ACCESS CODE ───────────────────────────────────────────────────────────────
//

/// Code a player scans or types to unlock a chapter, e.g. `BIO-7QX2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessCode(String);

impl AccessCode {
    /// Normalizes (trim + upper-case) and validates a code.
    ///
    /// # Errors
    ///
    /// Returns `ChapterError::EmptyCode` or `ChapterError::InvalidCodeCharacter`.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ChapterError> {
        let code = raw.as_ref().trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(ChapterError::EmptyCode);
        }
        if let Some(bad) = code
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(ChapterError::InvalidCodeCharacter(bad));
        }
        Ok(Self(code))
    }

    /// Builds a code from the chapter name and a random suffix.
    ///
    /// The prefix is the first three letters of the name, upper-cased, with any
    /// character outside `A-Z` replaced by `X` and short names padded with `X`.
    ///
    /// # Errors
    ///
    /// Returns `ChapterError` if the suffix is empty or not alphanumeric.
    pub fn generate(name: &str, suffix: &str) -> Result<Self, ChapterError> {
        let mut prefix: String = name
            .trim()
            .chars()
            .take(3)
            .map(|c| {
                let upper = c.to_ascii_uppercase();
                if upper.is_ascii_uppercase() { upper } else { 'X' }
            })
            .collect();
        while prefix.len() < 3 {
            prefix.push('X');
        }
        if suffix.trim().is_empty() {
            return Err(ChapterError::EmptyCode);
        }
        Self::parse(format!("{prefix}-{}", suffix.trim()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── CHAPTER ───────────────────────────────────────────────────────────────────
//

/// Unvalidated chapter input from the admin console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDraft {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub access_level: AccessLevel,
    pub code: Option<String>,
}

impl ChapterDraft {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            difficulty: Difficulty::default(),
            access_level: AccessLevel::default(),
            code: None,
        }
    }

    /// Validate the draft. `code` is the final access code chosen by the caller.
    ///
    /// # Errors
    ///
    /// Returns `ChapterError::EmptyName` if the name is blank.
    pub fn validate(
        self,
        code: AccessCode,
        now: DateTime<Utc>,
    ) -> Result<ValidatedChapter, ChapterError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ChapterError::EmptyName);
        }
        Ok(ValidatedChapter {
            name: name.to_owned(),
            description: normalize_optional(self.description),
            difficulty: self.difficulty,
            access_level: self.access_level,
            code,
            created_at: now,
        })
    }
}

/// A chapter that passed validation but has no storage id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedChapter {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub access_level: AccessLevel,
    pub code: AccessCode,
    pub created_at: DateTime<Utc>,
}

impl ValidatedChapter {
    #[must_use]
    pub fn assign_id(self, id: ChapterId) -> Chapter {
        Chapter {
            id,
            name: self.name,
            description: self.description,
            difficulty: self.difficulty,
            access_level: self.access_level,
            code: self.code,
            created_at: self.created_at,
        }
    }
}

/// A named content unit holding a question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    id: ChapterId,
    name: String,
    description: Option<String>,
    difficulty: Difficulty,
    access_level: AccessLevel,
    code: AccessCode,
    created_at: DateTime<Utc>,
}

impl Chapter {
    /// Rehydrate a chapter from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ChapterError::EmptyName` if the stored name is blank.
    pub fn from_persisted(
        id: ChapterId,
        name: impl Into<String>,
        description: Option<String>,
        difficulty: Difficulty,
        access_level: AccessLevel,
        code: AccessCode,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ChapterError> {
        let draft = ChapterDraft {
            name: name.into(),
            description,
            difficulty,
            access_level,
            code: None,
        };
        Ok(draft.validate(code, created_at)?.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> ChapterId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    #[must_use]
    pub fn code(&self) -> &AccessCode {
        &self.code
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
