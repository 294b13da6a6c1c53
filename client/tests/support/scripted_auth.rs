//! Auth gateway double over a scripted account list.
//!
//! Sign-in succeeds for accounts registered with
//! [`ScriptedAuthGateway::allow`], sign-up auto-confirms and opens a
//! session immediately, and every change broadcasts on the watch channel.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;
use uuid::Uuid;

use client::domain::ports::{AuthError, AuthGateway};
use client::domain::{AuthSession, AuthUser, LoginCredentials, Registration};

struct ScriptedAccount {
    id: Uuid,
    password: String,
    metadata: Map<String, Value>,
}

pub struct ScriptedAuthGateway {
    accounts: Mutex<HashMap<String, ScriptedAccount>>,
    sender: watch::Sender<Option<AuthSession>>,
}

impl ScriptedAuthGateway {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            sender: watch::Sender::new(None),
        }
    }

    /// Register an account the gateway will accept, returning its id.
    pub fn allow(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut guard = self.accounts.lock().expect("accounts poisoned");
        guard.insert(
            email.to_owned(),
            ScriptedAccount {
                id,
                password: password.to_owned(),
                metadata: Map::new(),
            },
        );
        id
    }

    fn session_for(account: &ScriptedAccount, email: &str) -> AuthSession {
        AuthSession {
            user: AuthUser {
                id: account.id,
                email: email.to_owned(),
                metadata: account.metadata.clone(),
            },
            access_token: format!("token-{}", account.id),
        }
    }
}

impl Default for ScriptedAuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for ScriptedAuthGateway {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        Ok(self.sender.borrow().clone())
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<AuthSession, AuthError> {
        let guard = self.accounts.lock().expect("accounts poisoned");
        let session = guard
            .get(credentials.email())
            .filter(|account| account.password == credentials.password())
            .map(|account| Self::session_for(account, credentials.email()))
            .ok_or_else(|| AuthError::credentials("invalid login credentials"))?;

        self.sender.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sender.send_replace(None);
        Ok(())
    }

    async fn sign_up(
        &self,
        registration: &Registration,
    ) -> Result<Option<AuthSession>, AuthError> {
        let mut guard = self.accounts.lock().expect("accounts poisoned");
        if guard.contains_key(&registration.email) {
            return Err(AuthError::rejected("account already registered"));
        }

        let account = ScriptedAccount {
            id: Uuid::new_v4(),
            password: registration.password.to_string(),
            metadata: registration.metadata(),
        };
        let session = Self::session_for(&account, &registration.email);
        guard.insert(registration.email.clone(), account);
        self.sender.send_replace(Some(session.clone()));
        Ok(Some(session))
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.sender.subscribe()
    }
}
