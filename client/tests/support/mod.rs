//! Shared helper utilities for client integration tests.
//!
//! Integration tests compile as separate crates under `client/tests/`, so
//! the in-memory table store double lives here. Suites that need the
//! scripted auth gateway mount `support/scripted_auth.rs` explicitly.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use client::domain::ports::{
    Order, Returning, SelectQuery, StoreError, Table, TableStore, WireRow,
};

/// Install a test-friendly tracing subscriber once per process.
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Convert a `json!` object literal into a wire row.
///
/// # Panics
///
/// Panics when the value is not a JSON object.
pub fn object(value: Value) -> WireRow {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// In-memory table store mirroring the hosted backend's write semantics.
///
/// Inserts fill `id` and `created_at` when absent, updates merge changes
/// into the stored row and fail with `NotFound` for absent ids, deletes of
/// absent ids succeed, and payment reads honour the profile embed.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<Table, Vec<WireRow>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing the insert defaults.
    pub fn seed(&self, table: Table, row: WireRow) {
        let mut guard = self.tables.lock().expect("store poisoned");
        guard.entry(table).or_default().push(row);
    }

    /// Number of rows currently held for `table`.
    pub fn row_count(&self, table: Table) -> usize {
        let guard = self.tables.lock().expect("store poisoned");
        guard.get(&table).map_or(0, Vec::len)
    }

    fn embedded_profile(tables: &HashMap<Table, Vec<WireRow>>, row: &WireRow) -> Value {
        let Some(user_id) = row.get("user_id") else {
            return Value::Null;
        };
        tables
            .get(&Table::Profiles)
            .and_then(|rows| rows.iter().find(|p| p.get("id") == Some(user_id)))
            .map_or(Value::Null, |profile| {
                json!({
                    "name": profile.get("name").cloned().unwrap_or(Value::Null),
                    "student_id": profile.get("student_id").cloned().unwrap_or(Value::Null),
                })
            })
    }

    fn representation(
        tables: &HashMap<Table, Vec<WireRow>>,
        row: &WireRow,
        returning: &Returning,
    ) -> WireRow {
        let mut representation = row.clone();
        if matches!(returning, Returning::WithEmbed(_)) {
            let profile = Self::embedded_profile(tables, row);
            representation.insert("profile".to_owned(), profile);
        }
        representation
    }
}

fn sort_key(row: &WireRow, column: &str) -> String {
    row.get(column).map(Value::to_string).unwrap_or_default()
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<WireRow>, StoreError> {
        let guard = self.tables.lock().expect("store poisoned");
        let mut rows: Vec<WireRow> = guard.get(&table).cloned().unwrap_or_default();

        if let Some((column, value)) = query.filter() {
            rows.retain(|row| {
                row.get(column)
                    .and_then(Value::as_str)
                    .is_some_and(|held| held == value)
            });
        }
        if let Some((column, order)) = query.order() {
            rows.sort_by(|a, b| sort_key(a, column).cmp(&sort_key(b, column)));
            if order == Order::Descending {
                rows.reverse();
            }
        }
        if query.embedded().is_some() {
            for row in &mut rows {
                let profile = Self::embedded_profile(&guard, row);
                row.insert("profile".to_owned(), profile);
            }
        }
        Ok(rows)
    }

    async fn find_by_id(&self, table: Table, id: Uuid) -> Result<Option<WireRow>, StoreError> {
        let guard = self.tables.lock().expect("store poisoned");
        let row = guard
            .get(&table)
            .and_then(|rows| rows.iter().find(|row| row.get("id") == Some(&json!(id))))
            .cloned();
        Ok(row)
    }

    async fn insert(
        &self,
        table: Table,
        mut row: WireRow,
        returning: Returning,
    ) -> Result<WireRow, StoreError> {
        row.entry("id".to_owned())
            .or_insert_with(|| json!(Uuid::new_v4()));
        row.entry("created_at".to_owned())
            .or_insert_with(|| json!(Utc::now()));

        let mut guard = self.tables.lock().expect("store poisoned");
        guard.entry(table).or_default().push(row.clone());
        Ok(Self::representation(&guard, &row, &returning))
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: WireRow,
        returning: Returning,
    ) -> Result<WireRow, StoreError> {
        let mut guard = self.tables.lock().expect("store poisoned");
        let Some(row) = guard
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row.get("id") == Some(&json!(id))))
        else {
            return Err(StoreError::not_found(format!(
                "no {table} row matched id {id}"
            )));
        };

        row.extend(changes);
        let updated = row.clone();
        Ok(Self::representation(&guard, &updated, &returning))
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError> {
        let mut guard = self.tables.lock().expect("store poisoned");
        if let Some(rows) = guard.get_mut(&table) {
            rows.retain(|row| row.get("id") != Some(&json!(id)));
        }
        Ok(())
    }
}

