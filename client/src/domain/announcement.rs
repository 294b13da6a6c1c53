//! Announcement record and its draft/patch companions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Announcement published to the whole organization.
///
/// `created_at` doubles as the display date; there is no separate
/// publication timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Input payload for creating an announcement.
///
/// The author is filled in by the caller from the resolved user; the
/// backend assigns id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub author: String,
}

/// Partial update for an announcement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}
