//! Admin session guard for front ends.
//!
//! The guard mirrors a single persisted session record and decides what an admin-only
//! view should do. Credentials are checked by an [`AdminAuthenticator`]; in this crate
//! that is the API itself, which verifies an argon2 hash and signs the session token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::local_store::{KeyValueStore, LocalStoreError, Stored, keys, load_json, save_json};

pub const LOGIN_PATH: &str = "/admin/login";
pub const DEFAULT_RETURN_PATH: &str = "/admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Absolute expiry in unix milliseconds.
    pub expires_at: i64,
    /// Signed bearer token for admin API calls.
    pub token: String,
}

impl AdminSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication failed: {0}")]
    Unavailable(String),

    #[error("Failed to save session: {0}")]
    Storage(#[from] LocalStoreError),
}

/// Trusted credential check. Returns a session whose token was issued server-side.
#[allow(async_fn_in_trait)]
pub trait AdminAuthenticator {
    async fn authenticate(&self, email: &str, password: &str) -> Result<AdminSession, LoginError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Unknown,
    /// A login request is in flight.
    Loading,
    Authenticated(AdminSession),
    Unauthenticated,
}

/// What an admin-only view should do right now.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteAccess<'a> {
    Wait,
    Redirect { to: &'static str, return_to: String },
    Render(&'a AdminSession),
}

pub struct AdminSessionGuard<S> {
    store: S,
    state: GuardState,
}

impl<S: KeyValueStore> AdminSessionGuard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: GuardState::Unknown,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn session(&self) -> Option<&AdminSession> {
        match &self.state {
            GuardState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Re-reads the persisted record. Call on mount and whenever storage changes elsewhere.
    pub fn refresh(&mut self) -> &GuardState {
        self.refresh_at(Utc::now())
    }

    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> &GuardState {
        self.state = match load_json::<AdminSession, _>(&self.store, keys::ADMIN_SESSION) {
            Stored::Missing => GuardState::Unauthenticated,
            Stored::Malformed => {
                self.discard_record();
                GuardState::Unauthenticated
            }
            Stored::Present(session) if session.is_expired_at(now) => {
                tracing::debug!(admin_id = %session.id, "admin session expired");
                self.discard_record();
                GuardState::Unauthenticated
            }
            Stored::Present(session) => GuardState::Authenticated(session),
        };
        &self.state
    }

    /// Storage-change hook; another client may have logged in or out.
    pub fn on_storage_changed(&mut self) -> &GuardState {
        self.refresh()
    }

    pub async fn login<A: AdminAuthenticator>(
        &mut self,
        authenticator: &A,
        email: &str,
        password: &str,
    ) -> Result<AdminSession, LoginError> {
        self.state = GuardState::Loading;
        let session = match authenticator.authenticate(email.trim(), password).await {
            Ok(session) => session,
            Err(err) => {
                self.state = GuardState::Unauthenticated;
                return Err(err);
            }
        };

        if let Err(err) = save_json(&self.store, keys::ADMIN_SESSION, &session) {
            self.state = GuardState::Unauthenticated;
            return Err(err.into());
        }

        self.state = GuardState::Authenticated(session.clone());
        Ok(session)
    }

    pub fn logout(&mut self) {
        self.discard_record();
        self.state = GuardState::Unauthenticated;
    }

    /// Access decision for a protected view at `requested`.
    pub fn access(&self, requested: &str) -> RouteAccess<'_> {
        match &self.state {
            GuardState::Unknown | GuardState::Loading => RouteAccess::Wait,
            GuardState::Unauthenticated => RouteAccess::Redirect {
                to: LOGIN_PATH,
                return_to: if requested.is_empty() {
                    DEFAULT_RETURN_PATH.to_string()
                } else {
                    requested.to_string()
                },
            },
            GuardState::Authenticated(session) => RouteAccess::Render(session),
        }
    }

    fn discard_record(&self) {
        if let Err(err) = self.store.remove(keys::ADMIN_SESSION) {
            tracing::warn!(error = %err, "failed to clear admin session");
        }
    }
}
