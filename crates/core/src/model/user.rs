use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{SchoolId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("email address is invalid: {0}")]
    InvalidEmail(String),

    #[error("full name cannot be empty")]
    EmptyName,
}

/// Normalizes an email for lookups (trim + lower-case).
///
/// # Errors
///
/// Returns `UserError::InvalidEmail` unless the address has a local part and a domain.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(UserError::InvalidEmail(raw.to_owned())),
    }
}

/// Player profile stored alongside the auth account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    uid: UserId,
    email: String,
    full_name: String,
    school_id: Option<SchoolId>,
    school_name: String,
    created_at: DateTime<Utc>,
}

impl UserProfile {
    /// # Errors
    ///
    /// Returns `UserError` if the email or name are invalid.
    pub fn new(
        uid: UserId,
        email: &str,
        full_name: impl Into<String>,
        school_id: Option<SchoolId>,
        school_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let email = normalize_email(email)?;
        let full_name = full_name.into();
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(UserError::EmptyName);
        }
        let school_name: String = school_name.into();
        Ok(Self {
            uid,
            email,
            full_name: full_name.to_owned(),
            school_id,
            school_name: school_name.trim().to_owned(),
            created_at,
        })
    }

    #[must_use]
    pub fn uid(&self) -> UserId {
        self.uid
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn school_id(&self) -> Option<SchoolId> {
        self.school_id
    }

    #[must_use]
    pub fn school_name(&self) -> &str {
        &self.school_name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Drops the school reference and keeps the stored school name.
    #[must_use]
    pub fn without_school(mut self) -> Self {
        self.school_id = None;
        self
    }
}

/// Who is signed in, as seen by route guards and pages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// The auth backend has not reported yet.
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(UserProfile),
}

impl AuthState {
    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}
