//! Reqwest-backed auth gateway adapter.
//!
//! Owns transport details only: request serialisation, HTTP error mapping,
//! and JSON decoding into domain sessions. The current session lives in a
//! watch slot whose receiver side is handed to subscribers, so every
//! sign-in, sign-out, and sign-up broadcast goes through one channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::warn;

use super::dto::{SessionDto, SignupResponseDto};
use crate::domain::ports::{AuthError, AuthGateway};
use crate::domain::session::{AuthSession, LoginCredentials, Registration};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Auth gateway adapter speaking the GoTrue HTTP surface.
pub struct GotrueGateway {
    client: Client,
    base: Url,
    api_key: String,
    sender: watch::Sender<Option<AuthSession>>,
}

impl GotrueGateway {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        base: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            api_key: api_key.into(),
            sender: watch::Sender::new(None),
        })
    }

    fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }
}

#[async_trait]
impl AuthGateway for GotrueGateway {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        Ok(self.sender.borrow().clone())
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.api_key.as_str())
            .json(&json!({
                "email": credentials.email(),
                "password": credentials.password(),
            }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_token_status(status, body.as_ref()));
        }

        let session = parse_session(body.as_ref())?;
        self.sender.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self
            .sender
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone());
        // The local session is cleared first; the signed-out state must
        // hold even when the revoke call cannot reach the service.
        self.sender.send_replace(None);
        let Some(token) = token else {
            return Ok(());
        };

        let result = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", self.api_key.as_str())
            .bearer_auth(token)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(status = %response.status(), "token revoke refused; local session cleared");
            }
            Err(error) => {
                warn!(error = %error, "token revoke unreachable; local session cleared");
            }
        }
        Ok(())
    }

    async fn sign_up(
        &self,
        registration: &Registration,
    ) -> Result<Option<AuthSession>, AuthError> {
        let response = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", self.api_key.as_str())
            .json(&json!({
                "email": registration.email,
                "password": registration.password.as_str(),
                "data": registration.metadata(),
            }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_signup_status(status, body.as_ref()));
        }

        let session = parse_signup(body.as_ref())?;
        if let Some(session) = &session {
            self.sender.send_replace(Some(session.clone()));
        }
        Ok(session)
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.sender.subscribe()
    }
}

fn parse_session(body: &[u8]) -> Result<AuthSession, AuthError> {
    let decoded: SessionDto = serde_json::from_slice(body)
        .map_err(|error| AuthError::decode(format!("invalid session payload: {error}")))?;
    Ok(decoded.into_domain())
}

fn parse_signup(body: &[u8]) -> Result<Option<AuthSession>, AuthError> {
    let decoded: SignupResponseDto = serde_json::from_slice(body)
        .map_err(|error| AuthError::decode(format!("invalid signup payload: {error}")))?;
    Ok(match decoded {
        SignupResponseDto::Session(session) => Some(session.into_domain()),
        SignupResponseDto::Deferred(_) => None,
    })
}

fn map_transport_error(error: reqwest::Error) -> AuthError {
    AuthError::transport(error.to_string())
}

fn map_token_status(status: StatusCode, body: &[u8]) -> AuthError {
    let message = error_message(status, body);
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AuthError::credentials(message)
        }
        _ if status.is_client_error() => AuthError::rejected(message),
        _ => AuthError::transport(message),
    }
}

fn map_signup_status(status: StatusCode, body: &[u8]) -> AuthError {
    let message = error_message(status, body);
    if status.is_client_error() {
        AuthError::rejected(message)
    } else {
        AuthError::transport(message)
    }
}

/// Service errors carry their detail under `msg` (current releases) or
/// `error_description` (older grant errors).
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body).ok().and_then(|payload| {
        ["msg", "error_description", "message"]
            .into_iter()
            .find_map(|key| payload.get(key).and_then(Value::as_str).map(str::to_owned))
    });
    match detail {
        Some(detail) => format!("status {}: {detail}", status.as_u16()),
        None => format!("status {}", status.as_u16()),
    }
}
