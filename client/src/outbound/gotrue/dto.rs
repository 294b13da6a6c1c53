//! DTOs for decoding GoTrue JSON responses.
//!
//! The adapter decodes into these transport DTOs first, then maps into
//! domain session types in one pass.

use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::session::{AuthSession, AuthUser};

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    pub(super) access_token: String,
    pub(super) user: UserDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) id: Uuid,
    #[serde(default)]
    pub(super) email: String,
    #[serde(default)]
    pub(super) user_metadata: Map<String, Value>,
}

/// Signup responses come in two shapes: a full session when the service
/// opens one immediately, or a bare user record when the session is
/// deferred until the address is confirmed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignupResponseDto {
    Session(SessionDto),
    Deferred(UserDto),
}

impl SessionDto {
    pub(super) fn into_domain(self) -> AuthSession {
        AuthSession {
            user: self.user.into_domain(),
            access_token: self.access_token,
        }
    }
}

impl UserDto {
    fn into_domain(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email,
            metadata: self.user_metadata,
        }
    }
}
