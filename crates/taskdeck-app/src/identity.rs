//! Current-user session: mock sign-in, persistence and profile edits.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use taskdeck_core::{Clock, ProfilePatch, Provider, Session, SystemClock};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::async_store::AsyncKeyValueStore;
use crate::config::IdentityConfig;
use crate::telemetry::{NoopTelemetry, TelemetrySink};

/// Default storage key of the session.
pub const DEFAULT_SESSION_KEY: &str = "user";

/// Message shown after a failed sign-in.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";
/// Message shown after a failed profile edit.
pub const PROFILE_FAILED_MESSAGE: &str = "Failed to update profile. Please try again.";

const BREADCRUMB_CATEGORY: &str = "auth";

/// Errors returned by identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{provider} sign-in failed: {reason}")]
    LoginFailed { provider: Provider, reason: String },
    #[error("no user logged in")]
    NoActiveSession,
}

/// External authentication collaborator.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Authenticate with `provider` and return a fresh session.
    ///
    /// # Errors
    /// Returns [`IdentityError::LoginFailed`] when the provider rejects the attempt.
    async fn authenticate(&self, provider: Provider) -> Result<Session, IdentityError>;
}

/// Provider that accepts every attempt after a simulated round-trip.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    config: IdentityConfig,
}

impl MockIdentityProvider {
    /// Create a provider using the configured latencies and account details.
    #[must_use]
    pub const fn new(config: IdentityConfig) -> Self {
        Self { config }
    }
}

impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(&self, provider: Provider) -> Result<Session, IdentityError> {
        let delay = self.config.delay_for(provider);
        debug!(%provider, ?delay, "Simulating sign-in");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(Session::issue(
            provider,
            self.config.display_name.clone(),
            self.config.email.clone(),
        ))
    }
}

/// Owner of the current session.
pub struct IdentityStore<S, P> {
    store: S,
    provider: P,
    key: String,
    clock: Arc<dyn Clock>,
    telemetry: Arc<dyn TelemetrySink>,
    session: Option<Session>,
    error: Option<String>,
}

impl<S, P> IdentityStore<S, P> {
    /// Create a signed-out store persisting under [`DEFAULT_SESSION_KEY`].
    pub fn new(store: S, provider: P) -> Self {
        Self {
            store,
            provider,
            key: DEFAULT_SESSION_KEY.to_owned(),
            clock: Arc::new(SystemClock),
            telemetry: Arc::new(NoopTelemetry),
            session: None,
            error: None,
        }
    }

    /// Persist under a different key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Report session changes to `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Current session, if signed in.
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns true while a session exists.
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// User-facing message of the last failed operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Forget the last error message.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn set_session(&mut self, session: Option<Session>) {
        self.telemetry.set_user(session.as_ref());
        self.session = session;
    }
}

impl<S, P> IdentityStore<S, P>
where
    S: AsyncKeyValueStore,
    P: IdentityProvider,
{
    /// Restore the persisted session. Missing or unreadable sessions are ignored.
    pub async fn load_session(&mut self) {
        match self.read_session().await {
            Ok(Some(session)) => {
                info!(user = %session.id, provider = %session.provider, "Restored session");
                self.set_session(Some(session));
            }
            Ok(None) => debug!(key = %self.key, "No stored session"),
            Err(err) => error!(key = %self.key, error = %format!("{err:#}"), "Error loading user"),
        }
    }

    /// Sign in through the identity provider and persist the new session.
    ///
    /// # Errors
    /// Returns [`IdentityError::LoginFailed`] when authentication fails. The
    /// previous session, if any, is kept.
    pub async fn login(&mut self, provider: Provider) -> Result<Session, IdentityError> {
        self.error = None;
        match self.provider.authenticate(provider).await {
            Ok(session) => {
                info!(user = %session.id, %provider, "Signed in");
                self.telemetry.add_breadcrumb(
                    "User signed in",
                    BREADCRUMB_CATEGORY,
                    &json!({ "provider": provider }),
                );
                self.set_session(Some(session.clone()));
                self.save_session(&session).await;
                Ok(session)
            }
            Err(err) => {
                warn!(%provider, error = %err, "Sign-in failed");
                self.telemetry
                    .log_error(&err, &json!({ "operation": "login", "provider": provider }));
                self.error = Some(LOGIN_FAILED_MESSAGE.to_owned());
                Err(err)
            }
        }
    }

    /// Drop the session from memory and durable storage.
    pub async fn logout(&mut self) {
        if let Err(err) = self
            .store
            .remove(&self.key)
            .await
            .map_err(Into::<anyhow::Error>::into)
        {
            error!(key = %self.key, error = %format!("{err:#}"), "Error during logout");
        }
        if self.session.is_some() {
            info!("Signed out");
            self.telemetry
                .add_breadcrumb("User signed out", BREADCRUMB_CATEGORY, &json!({}));
        }
        self.error = None;
        self.set_session(None);
    }

    /// Merge `patch` into the current session, stamp it and persist.
    ///
    /// # Errors
    /// Returns [`IdentityError::NoActiveSession`] when nobody is signed in.
    pub async fn update_profile(&mut self, patch: ProfilePatch) -> Result<Session, IdentityError> {
        self.error = None;
        let Some(mut session) = self.session.clone() else {
            warn!("Profile update without a session");
            self.error = Some(PROFILE_FAILED_MESSAGE.to_owned());
            return Err(IdentityError::NoActiveSession);
        };

        session.apply(patch, self.clock.now());
        self.telemetry.add_breadcrumb(
            "Profile updated",
            BREADCRUMB_CATEGORY,
            &json!({ "user": session.id }),
        );
        self.set_session(Some(session.clone()));
        self.save_session(&session).await;
        Ok(session)
    }

    async fn read_session(&self) -> Result<Option<Session>> {
        let Some(raw) = self
            .store
            .get(&self.key)
            .await
            .map_err(Into::<anyhow::Error>::into)?
        else {
            return Ok(None);
        };
        let session = serde_json::from_str(&raw).context("Failed to parse stored session")?;
        Ok(Some(session))
    }

    async fn save_session(&self, session: &Session) {
        let result = match serde_json::to_string(session) {
            Ok(payload) => self
                .store
                .set(&self.key, payload)
                .await
                .map_err(Into::<anyhow::Error>::into),
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(()) => debug!(key = %self.key, "Saved session"),
            Err(err) => error!(key = %self.key, error = %format!("{err:#}"), "Error saving user"),
        }
    }
}
