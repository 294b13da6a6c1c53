//! Session and identity primitives.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before they reach the auth gateway.

use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::member::{Member, Role};

/// Auth identity carried inside a session.
///
/// `metadata` holds the wire-convention signup metadata attached when the
/// account was created; the resolver falls back to it when no profile row
/// exists yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub metadata: Map<String, Value>,
}

/// Authenticated session issued by the hosted auth service.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
}

/// Resolved application user.
///
/// Combines the auth identity with the profile row (when one exists) and
/// the effective role. An authenticated session always resolves to a user
/// with an unambiguous role.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub profile: Option<Member>,
}

impl SessionUser {
    /// Whether the resolved role grants management access.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email lacks the `@` separator.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain an @ separator"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by the auth gateway.
///
/// ## Invariants
/// - `email` is trimmed and must contain an `@` separator.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ada@org.com", "secret").unwrap();
/// assert_eq!(creds.email(), "ada@org.com");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if !normalized.contains('@') {
            return Err(LoginValidationError::InvalidEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email address suitable for account lookups.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Signup payload for creating a new member account.
///
/// The profile fields travel as signup metadata so the resolver can fall
/// back to them before the profile row materializes. The role is always
/// `student`; administrator access is never granted at signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: Zeroizing<String>,
    pub student_id: String,
    pub course: String,
    pub year: String,
}

impl Registration {
    /// Wire-convention metadata attached to the signup request.
    #[must_use]
    pub fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("name".to_owned(), Value::String(self.name.clone()));
        metadata.insert(
            "student_id".to_owned(),
            Value::String(self.student_id.clone()),
        );
        metadata.insert("course".to_owned(), Value::String(self.course.clone()));
        metadata.insert("year".to_owned(), Value::String(self.year.clone()));
        metadata.insert(
            "role".to_owned(),
            Value::String(Role::Student.as_str().to_owned()),
        );
        metadata
    }
}
