//! Port for the hosted authentication service.
//!
//! Auth events (sign-in, sign-out, token refresh) are delivered through a
//! `tokio::sync::watch` channel. The channel keeps only the latest value,
//! which is exactly the queue discipline the application wants: superseded
//! sessions are never observed, and consumers apply changes on their own
//! scheduling turn instead of inside the gateway's notification path.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::session::{AuthSession, LoginCredentials, Registration};

/// Errors surfaced by auth-gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Email or password did not match an account.
    #[error("auth credentials were rejected: {message}")]
    Credentials { message: String },
    /// The auth service could not be reached.
    #[error("auth transport failed: {message}")]
    Transport { message: String },
    /// The auth service refused the request.
    #[error("auth request was rejected: {message}")]
    Rejected { message: String },
    /// The response payload could not be interpreted.
    #[error("auth payload failed to decode: {message}")]
    Decode { message: String },
}

impl AuthError {
    /// Helper for credential mismatches.
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Helper for connectivity failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for refused requests.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Helper for undecodable payloads.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Authentication port driven by the application context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Session currently held by the gateway, if any.
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError>;

    /// Authenticate with email and password.
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<AuthSession, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Create a new account with attached signup metadata.
    ///
    /// Returns `None` when the service defers the session, for example
    /// until the address is confirmed.
    async fn sign_up(&self, registration: &Registration)
    -> Result<Option<AuthSession>, AuthError>;

    /// Subscribe to auth events.
    ///
    /// The receiver always observes the latest session state; intermediate
    /// states replaced before a read are skipped.
    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>>;
}

/// Fixture implementation for testing without a live auth service.
///
/// Holds no accounts: sign-in fails, sign-up defers, and sign-out clears
/// the broadcast slot. Tests push sessions directly with
/// [`FixtureAuthGateway::push`].
#[derive(Debug)]
pub struct FixtureAuthGateway {
    sender: watch::Sender<Option<AuthSession>>,
}

impl FixtureAuthGateway {
    /// Create a fixture gateway with no active session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sender: watch::Sender::new(None),
        }
    }

    /// Broadcast a session state to every subscriber.
    pub fn push(&self, session: Option<AuthSession>) {
        self.sender.send_replace(session);
    }
}

impl Default for FixtureAuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for FixtureAuthGateway {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        Ok(self.sender.borrow().clone())
    }

    async fn sign_in(&self, _credentials: &LoginCredentials) -> Result<AuthSession, AuthError> {
        Err(AuthError::credentials("fixture gateway holds no accounts"))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sender.send_replace(None);
        Ok(())
    }

    async fn sign_up(
        &self,
        _registration: &Registration,
    ) -> Result<Option<AuthSession>, AuthError> {
        Ok(None)
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.sender.subscribe()
    }
}
