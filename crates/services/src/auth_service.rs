use std::sync::Arc;

use arena_core::model::{AuthState, SchoolId, UserError, UserId, UserProfile, normalize_email};
use storage::auth::MIN_PASSWORD_LEN;
use storage::repository::{AuthBackend, SchoolRepository, StorageError, UserRepository};
use tokio::sync::watch;

use crate::Clock;
use crate::error::AuthError;

/// Input collected by the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub school_id: Option<SchoolId>,
}

/// Owns the signed-in user and publishes every change to subscribers.
///
/// Starts in `AuthState::Loading`; `restore`, `sign_in`, `sign_up` and `sign_out`
/// all settle it.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    auth: Arc<dyn AuthBackend>,
    users: Arc<dyn UserRepository>,
    schools: Arc<dyn SchoolRepository>,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        clock: Clock,
        auth: Arc<dyn AuthBackend>,
        users: Arc<dyn UserRepository>,
        schools: Arc<dyn SchoolRepository>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            clock,
            auth,
            users,
            schools,
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.borrow().user().cloned()
    }

    /// The single source of auth changes for pages and route guards.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Create credentials and a profile, then sign the new user in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword`, `AuthError::UnknownSchool`,
    /// `AuthError::EmailTaken` or `AuthError::User` for invalid input and
    /// `AuthError::Storage` if persistence fails.
    pub async fn sign_up(&self, form: SignUp) -> Result<UserProfile, AuthError> {
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        let email = normalize_email(&form.email)?;
        if form.full_name.trim().is_empty() {
            return Err(UserError::EmptyName.into());
        }
        let school_name = match form.school_id {
            Some(id) => self
                .schools
                .get_school(id)
                .await?
                .ok_or(AuthError::UnknownSchool(id))?
                .name()
                .to_owned(),
            None => String::new(),
        };

        let uid = self
            .auth
            .create_account(&email, &form.password)
            .await
            .map_err(|e| match e {
                StorageError::Conflict => AuthError::EmailTaken,
                other => other.into(),
            })?;
        let profile = UserProfile::new(
            uid,
            &email,
            form.full_name,
            form.school_id,
            school_name,
            self.clock.now(),
        )?;
        self.users.upsert_profile(&profile).await?;

        tracing::info!(user = %uid, "account created");
        self.state
            .send_replace(AuthState::Authenticated(profile.clone()));
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password and `AuthError::MissingProfile` if the account has no profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let uid = match self.auth.verify(email, password).await {
            Ok(uid) => uid,
            Err(StorageError::Unauthorized) => {
                tracing::warn!("sign-in rejected");
                self.settle_unauthenticated();
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };
        let Some(profile) = self.users.get_profile(uid).await? else {
            tracing::warn!(user = %uid, "signed-in account has no profile");
            self.settle_unauthenticated();
            return Err(AuthError::MissingProfile);
        };

        tracing::info!(user = %uid, "signed in");
        self.state
            .send_replace(AuthState::Authenticated(profile.clone()));
        Ok(profile)
    }

    pub fn sign_out(&self) {
        if let Some(user) = self.current_user() {
            tracing::info!(user = %user.uid(), "signed out");
        }
        self.state.send_replace(AuthState::Unauthenticated);
    }

    /// Settle the startup `Loading` state from a remembered user id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the profile lookup fails; the state then
    /// stays `Loading`.
    pub async fn restore(&self, uid: Option<UserId>) -> Result<AuthState, AuthError> {
        let next = match uid {
            Some(uid) => match self.users.get_profile(uid).await? {
                Some(profile) => AuthState::Authenticated(profile),
                None => AuthState::Unauthenticated,
            },
            None => AuthState::Unauthenticated,
        };
        self.state.send_replace(next.clone());
        Ok(next)
    }

    /// Every registered profile, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if repository access fails.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AuthError> {
        Ok(self.users.list_profiles().await?)
    }

    fn settle_unauthenticated(&self) {
        // A failed attempt never signs out an existing session.
        self.state.send_if_modified(|state| {
            if state.is_loading() {
                *state = AuthState::Unauthenticated;
                true
            } else {
                false
            }
        });
    }
}
