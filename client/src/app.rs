//! Application context tying identity resolution to the data layer.
//!
//! Owns the auth gateway, the resolver, the directory, and the resolved
//! user. Auth events arrive through a single-slot watch channel and are
//! applied on the owner's scheduling turn via [`App::pump`] or
//! [`App::run`], never inside the gateway's notification path.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::config::Config;
use crate::domain::OpResult;
use crate::domain::directory::Directory;
use crate::domain::error::Error;
use crate::domain::ports::{AuthError, AuthGateway, TableStore};
use crate::domain::resolver::IdentityResolver;
use crate::domain::session::{AuthSession, LoginCredentials, Registration, SessionUser};

/// Explicit application context; no global state.
pub struct App<S, A> {
    gateway: Arc<A>,
    resolver: IdentityResolver<S>,
    directory: Directory<S>,
    user: Option<SessionUser>,
    receiver: watch::Receiver<Option<AuthSession>>,
}

impl<S, A> App<S, A> {
    /// Currently resolved user, if a session is active.
    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Read access to the loaded collections.
    #[must_use]
    pub const fn directory(&self) -> &Directory<S> {
        &self.directory
    }

    /// Mutable access for collection mutations.
    pub fn directory_mut(&mut self) -> &mut Directory<S> {
        &mut self.directory
    }

    /// Whether a collection reload is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.directory.is_loading()
    }
}

impl<S, A> App<S, A>
where
    S: TableStore,
    A: AuthGateway,
{
    /// Build a context over the given store and auth gateway.
    ///
    /// Subscribes to auth events immediately so no change between
    /// construction and the first pump is lost.
    pub fn new(store: Arc<S>, gateway: Arc<A>, config: &Config) -> Self {
        let receiver = gateway.subscribe();
        Self {
            gateway,
            resolver: IdentityResolver::new(Arc::clone(&store), config),
            directory: Directory::new(store),
            user: None,
            receiver,
        }
    }

    /// Restore the persisted session, if any, and load the directory.
    ///
    /// A failed session read is logged and treated as signed out; startup
    /// itself never fails.
    pub async fn bootstrap(&mut self) {
        let session = match self.gateway.current_session().await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "session restore failed; starting signed out");
                None
            }
        };
        self.apply(session.as_ref()).await;
    }

    /// Authenticate with email and password.
    ///
    /// The session opened by a successful sign-in arrives through the auth
    /// event channel and is applied on the next [`App::pump`].
    pub async fn login(&self, credentials: &LoginCredentials) -> OpResult<()> {
        self.gateway
            .sign_in(credentials)
            .await
            .map_err(map_auth_error)?;
        Ok(())
    }

    /// End the active session. The signed-out state is applied on the
    /// next [`App::pump`].
    pub async fn logout(&self) -> OpResult<()> {
        self.gateway.sign_out().await.map_err(map_auth_error)
    }

    /// Create an account with the registration's profile metadata attached.
    ///
    /// Returns whether the service opened a session immediately. `false`
    /// means the session was deferred, typically until the address is
    /// confirmed, and no auth event arrives until that happens.
    pub async fn register(&self, registration: &Registration) -> OpResult<bool> {
        let session = self
            .gateway
            .sign_up(registration)
            .await
            .map_err(map_auth_error)?;
        Ok(session.is_some())
    }

    /// Apply the latest pending identity change, if any.
    ///
    /// Returns whether a change was applied. The watch channel keeps only
    /// the newest session, so states superseded before the pump runs are
    /// never observed.
    pub async fn pump(&mut self) -> bool {
        if !self.receiver.has_changed().unwrap_or(false) {
            return false;
        }
        let session = self.receiver.borrow_and_update().clone();
        self.apply(session.as_ref()).await;
        true
    }

    /// Apply identity changes until the gateway closes its event channel.
    pub async fn run(&mut self) {
        while self.receiver.changed().await.is_ok() {
            let session = self.receiver.borrow_and_update().clone();
            self.apply(session.as_ref()).await;
        }
    }

    async fn apply(&mut self, session: Option<&AuthSession>) {
        let user = self.resolver.resolve(session).await;
        self.directory.reload(user.as_ref()).await;
        self.user = user;
    }
}

fn map_auth_error(error: AuthError) -> Error {
    match error {
        AuthError::Credentials { message } => Error::unauthorized(message),
        AuthError::Transport { message } => Error::unavailable(message),
        AuthError::Rejected { message } => Error::invalid_request(message),
        AuthError::Decode { message } => Error::internal(message),
    }
}
