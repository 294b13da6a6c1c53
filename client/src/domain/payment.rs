//! Membership payment record, its wire row, and draft/patch companions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settlement state of a membership payment.
///
/// `Overdue` exists on the wire and renders in listings, but no operation
/// in this layer transitions a payment into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment settled.
    Paid,
    /// Payment requested but not settled.
    #[default]
    Pending,
    /// Payment past its due date.
    Overdue,
}

impl PaymentStatus {
    /// Returns the wire string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile fields embedded in a payment row via the join relation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Wire shape of a payment row, including the joined profile relation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRow {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profile: Option<PaymentProfile>,
}

/// Membership payment enriched for display.
///
/// `date` and the denormalized student fields are derived from the row at
/// read time and are never written back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub amount: f64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub date: DateTime<Utc>,
    pub student_name: String,
    pub student_id: String,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        let PaymentRow {
            id,
            user_id,
            amount,
            status,
            transaction_id,
            created_at,
            profile,
        } = row;
        let (student_name, student_id) = profile.map_or_else(
            || (None, None),
            |profile| (profile.name, profile.student_id),
        );
        Self {
            id,
            user_id,
            amount,
            status,
            transaction_id,
            created_at,
            date: created_at,
            student_name: student_name.unwrap_or_else(|| "Unknown".to_owned()),
            student_id: student_id.unwrap_or_else(|| "N/A".to_owned()),
        }
    }
}

/// Input payload for recording a payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub user_id: Option<Uuid>,
    pub amount: f64,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Partial update for a payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}
