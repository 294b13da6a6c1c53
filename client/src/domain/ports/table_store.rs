//! Port for the hosted table backend.
//!
//! The [`TableStore`] trait is the structured-query surface the data layer
//! drives. Rows cross the port in the wire convention: snake_case JSON
//! objects. Key-case translation and typed decoding happen on the domain
//! side, so adapters only move JSON.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Row as it crosses the port: a wire-convention JSON object.
pub type WireRow = Map<String, Value>;

/// Tables exposed by the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Member profiles keyed by auth identity.
    Profiles,
    /// Organization-wide announcements.
    Announcements,
    /// Scheduled organization events.
    Events,
    /// Membership payments.
    Payments,
}

impl Table {
    /// Returns the wire table name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Announcements => "announcements",
            Self::Events => "events",
            Self::Payments => "payments",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

/// Structured select over a single table.
///
/// Supports the shapes the data layer needs: an optional equality filter,
/// an optional ordering, and an optional embedded relation selector.
///
/// # Examples
/// ```
/// use client::domain::ports::{Order, SelectQuery};
///
/// let query = SelectQuery::all()
///     .order_by("created_at", Order::Descending)
///     .filter_eq("user_id", "42");
/// assert!(query.filter().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectQuery {
    filter: Option<(String, String)>,
    order: Option<(String, Order)>,
    embed: Option<String>,
}

impl SelectQuery {
    /// Select every row of the table.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep only rows whose `column` equals `value`.
    #[must_use]
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some((column.into(), value.into()));
        self
    }

    /// Order the result by `column` in the given direction.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order = Some((column.into(), order));
        self
    }

    /// Request an embedded relation alongside every row.
    ///
    /// The selector uses the backend's relation syntax, for example
    /// `profile:profiles(name,student_id)`.
    #[must_use]
    pub fn embed(mut self, selector: impl Into<String>) -> Self {
        self.embed = Some(selector.into());
        self
    }

    /// Equality filter, when set.
    #[must_use]
    pub fn filter(&self) -> Option<(&str, &str)> {
        self.filter
            .as_ref()
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }

    /// Ordering, when set.
    #[must_use]
    pub fn order(&self) -> Option<(&str, Order)> {
        self.order
            .as_ref()
            .map(|(column, order)| (column.as_str(), *order))
    }

    /// Embedded relation selector, when set.
    #[must_use]
    pub fn embedded(&self) -> Option<&str> {
        self.embed.as_deref()
    }
}

/// Representation requested back from a write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Returning {
    /// The bare written row.
    #[default]
    Row,
    /// The written row plus an embedded relation selector.
    WithEmbed(String),
}

/// Errors surfaced by table-store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("table store transport failed: {message}")]
    Transport { message: String },
    /// The request ran past the adapter's deadline.
    #[error("table store request timed out: {message}")]
    Timeout { message: String },
    /// The session is missing, expired, or not permitted.
    #[error("table store rejected the credentials: {message}")]
    Unauthorized { message: String },
    /// The backend rejected the request shape or payload.
    #[error("table store rejected the request: {message}")]
    InvalidRequest { message: String },
    /// The targeted row does not exist.
    #[error("table store row not found: {message}")]
    NotFound { message: String },
    /// The response payload could not be interpreted.
    #[error("table store payload failed to decode: {message}")]
    Decode { message: String },
}

impl StoreError {
    /// Helper for connectivity failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for deadline overruns.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Helper for authentication and permission failures.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Helper for malformed requests.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Helper for missing rows.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
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

/// Structured-query port over the hosted tables.
///
/// A zero-row [`TableStore::find_by_id`] is `Ok(None)`, not an error:
/// freshly created identities legitimately race their profile row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch rows matching the query.
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<WireRow>, StoreError>;

    /// Fetch a single row by id.
    async fn find_by_id(&self, table: Table, id: Uuid) -> Result<Option<WireRow>, StoreError>;

    /// Insert a row and return the stored representation.
    async fn insert(
        &self,
        table: Table,
        row: WireRow,
        returning: Returning,
    ) -> Result<WireRow, StoreError>;

    /// Update the row with the given id and return the stored representation.
    ///
    /// Updating an id that does not exist fails with
    /// [`StoreError::NotFound`].
    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: WireRow,
        returning: Returning,
    ) -> Result<WireRow, StoreError>;

    /// Delete the row with the given id.
    ///
    /// Deleting an id that does not exist is a successful no-op.
    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError>;
}

/// Fixture implementation for testing without a live backend.
///
/// Lookups return no rows, writes echo their payload back, and deletes
/// succeed. Use it in unit tests where store behaviour is not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTableStore;

#[async_trait]
impl TableStore for FixtureTableStore {
    async fn select(
        &self,
        _table: Table,
        _query: SelectQuery,
    ) -> Result<Vec<WireRow>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_by_id(
        &self,
        _table: Table,
        _id: Uuid,
    ) -> Result<Option<WireRow>, StoreError> {
        Ok(None)
    }

    async fn insert(
        &self,
        _table: Table,
        row: WireRow,
        _returning: Returning,
    ) -> Result<WireRow, StoreError> {
        Ok(row)
    }

    async fn update(
        &self,
        _table: Table,
        id: Uuid,
        mut changes: WireRow,
        _returning: Returning,
    ) -> Result<WireRow, StoreError> {
        changes
            .entry("id".to_owned())
            .or_insert_with(|| Value::String(id.to_string()));
        Ok(changes)
    }

    async fn delete(&self, _table: Table, _id: Uuid) -> Result<(), StoreError> {
        Ok(())
    }
}
