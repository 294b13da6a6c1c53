//! Reqwest-backed table store adapter.
//!
//! This adapter owns transport details only: query-string rendering, auth
//! headers, timeout and HTTP error mapping, and JSON decoding into wire
//! rows. Key-case translation happens on the domain side.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ports::{
    Order, Returning, SelectQuery, StoreError, Table, TableStore, WireRow,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Table store adapter speaking the PostgREST query dialect.
///
/// Requests always carry the project `apikey` header; the bearer token
/// tracks the active session and is attached when present, so reads and
/// writes run under the signed-in user's row-level permissions.
pub struct PostgrestStore {
    client: Client,
    base: Url,
    api_key: String,
    bearer: RwLock<Option<String>>,
}

impl PostgrestStore {
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
            bearer: RwLock::new(None),
        })
    }

    /// Attach or clear the bearer token sent with every request.
    ///
    /// Wire this to the auth gateway's event channel so the store follows
    /// the active session.
    pub async fn set_bearer(&self, token: Option<String>) {
        *self.bearer.write().await = token;
    }

    fn table_url(&self, table: Table) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(table.as_str());
        }
        url
    }

    async fn request(&self, method: Method, table: Table) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.table_url(table))
            .header("apikey", self.api_key.as_str());
        if let Some(token) = self.bearer.read().await.as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

#[async_trait]
impl TableStore for PostgrestStore {
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<WireRow>, StoreError> {
        let response = self
            .request(Method::GET, table)
            .await
            .query(&select_pairs(&query))
            .send()
            .await
            .map_err(map_transport_error)?;
        read_rows(response).await
    }

    async fn find_by_id(&self, table: Table, id: Uuid) -> Result<Option<WireRow>, StoreError> {
        let response = self
            .request(Method::GET, table)
            .await
            .query(&[
                ("select".to_owned(), "*".to_owned()),
                ("id".to_owned(), format!("eq.{id}")),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;
        let rows = read_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(
        &self,
        table: Table,
        row: WireRow,
        returning: Returning,
    ) -> Result<WireRow, StoreError> {
        let response = self
            .request(Method::POST, table)
            .await
            .query(&[("select".to_owned(), returning_columns(&returning))])
            .header("Prefer", "return=representation")
            .json(&Value::Object(row))
            .send()
            .await
            .map_err(map_transport_error)?;
        let rows = read_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::decode("insert returned no representation"))
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: WireRow,
        returning: Returning,
    ) -> Result<WireRow, StoreError> {
        let response = self
            .request(Method::PATCH, table)
            .await
            .query(&[
                ("select".to_owned(), returning_columns(&returning)),
                ("id".to_owned(), format!("eq.{id}")),
            ])
            .header("Prefer", "return=representation")
            .json(&Value::Object(changes))
            .send()
            .await
            .map_err(map_transport_error)?;
        let rows = read_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(format!("no {table} row matched id {id}")))
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, table)
            .await
            .query(&[("id".to_owned(), format!("eq.{id}"))])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}

fn select_pairs(query: &SelectQuery) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_owned(), select_columns(query.embedded()))];
    if let Some((column, value)) = query.filter() {
        pairs.push((column.to_owned(), format!("eq.{value}")));
    }
    if let Some((column, order)) = query.order() {
        pairs.push(("order".to_owned(), format!("{column}.{}", order_keyword(order))));
    }
    pairs
}

fn select_columns(embed: Option<&str>) -> String {
    match embed {
        Some(selector) => format!("*,{selector}"),
        None => "*".to_owned(),
    }
}

fn returning_columns(returning: &Returning) -> String {
    match returning {
        Returning::Row => "*".to_owned(),
        Returning::WithEmbed(selector) => format!("*,{selector}"),
    }
}

const fn order_keyword(order: Order) -> &'static str {
    match order {
        Order::Ascending => "asc",
        Order::Descending => "desc",
    }
}

async fn read_rows(response: Response) -> Result<Vec<WireRow>, StoreError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    parse_rows(body.as_ref())
}

fn parse_rows(body: &[u8]) -> Result<Vec<WireRow>, StoreError> {
    let decoded: Value = serde_json::from_slice(body)
        .map_err(|error| StoreError::decode(format!("invalid JSON payload: {error}")))?;
    let Value::Array(items) = decoded else {
        return Err(StoreError::decode("response was not a row array"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            _ => Err(StoreError::decode("row was not a JSON object")),
        })
        .collect()
}

fn map_transport_error(error: reqwest::Error) -> StoreError {
    if error.is_timeout() {
        StoreError::timeout(error.to_string())
    } else {
        StoreError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> StoreError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::unauthorized(message),
        StatusCode::NOT_FOUND => StoreError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StoreError::timeout(message),
        StatusCode::TOO_MANY_REQUESTS => StoreError::transport(message),
        _ if status.is_client_error() => StoreError::invalid_request(message),
        _ => StoreError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
