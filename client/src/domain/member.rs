//! Member profile record and its patch companion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role attached to a member profile.
///
/// # Examples
///
/// ```
/// # use client::domain::Role;
/// assert_eq!(Role::default(), Role::Student);
/// assert_eq!(Role::Admin.as_str(), "admin");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Organization administrator with management access.
    Admin,
    /// Regular organization member.
    #[default]
    Student,
}

impl Role {
    /// Returns the wire string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member profile as held by the data layer.
///
/// The profile row shares its id with the auth identity it belongs to.
/// Optional fields mirror columns the backend leaves null until a member
/// completes their details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub membership_paid: bool,
    #[serde(default)]
    pub membership_expiry: Option<NaiveDate>,
}

/// Partial update for a member profile.
///
/// Absent fields are skipped during serialization so the backend only
/// touches the columns the caller set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_expiry: Option<NaiveDate>,
}
