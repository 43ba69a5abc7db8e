use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reelfill_config::{ApiCredential, ColumnMap, RetryPolicy};
use reqwest::{Client, Method, RequestBuilder, header};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::sync::RowUpdate;

use super::{
    MovieStore, NotionError,
    properties::{encode_cover, encode_value},
    row::{MovieRow, QueryResponse},
};

const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
}

/// Delay before retry number `retry` (1-based): the server's `Retry-After`
/// when given, else the policy backoff, never more than `max_delay`.
fn backoff_delay(
    policy: &RetryPolicy,
    retry: u32,
    err: &NotionError,
) -> Duration {
    err.retry_after()
        .unwrap_or_else(|| policy.delay_for(retry))
        .min(policy.max_delay)
}

/// Runs `send` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` attempts have been made.
async fn send_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    page_id: &str,
    mut send: F,
) -> Result<T, NotionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotionError>>,
{
    let mut retry = 0u32;
    loop {
        match send().await {
            Ok(value) => return Ok(value),
            Err(err)
                if err.is_retryable() && retry + 1 < policy.max_attempts =>
            {
                retry += 1;
                let delay = backoff_delay(policy, retry, &err);
                warn!(
                    page_id,
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "page update rejected, backing off"
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Walks result pages from `fetch`, keeping rows accepted by `keep` until
/// `limit` rows are kept (0 = unlimited).
async fn walk_pages<F, Fut, K>(
    columns: &ColumnMap,
    limit: usize,
    keep: K,
    mut fetch: F,
) -> Result<Vec<MovieRow>, NotionError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<QueryResponse, NotionError>>,
    K: Fn(&MovieRow) -> bool,
{
    let mut rows = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let response = fetch(cursor.take()).await?;
        pages += 1;

        for page in &response.results {
            let row = MovieRow::from_page(page, columns);
            if !keep(&row) {
                continue;
            }
            rows.push(row);
            if limit > 0 && rows.len() >= limit {
                debug!(pages, rows = rows.len(), "row limit reached");
                return Ok(rows);
            }
        }

        match response.next_cursor {
            Some(next) if response.has_more => cursor = Some(next),
            _ => break,
        }
    }

    debug!(pages, rows = rows.len(), "query exhausted");
    Ok(rows)
}

async fn execute<T>(request: RequestBuilder) -> Result<T, NotionError>
where
    T: DeserializeOwned,
{
    let response = request.send().await?;
    let status = response.status();
    let retry_after = retry_after(response.headers());
    let bytes = response.bytes().await?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let body: ApiErrorBody =
        serde_json::from_slice(&bytes).unwrap_or_default();
    let message = body
        .message
        .unwrap_or_else(|| format!("request failed with status {status}"));
    Err(NotionError::Api {
        status: status.as_u16(),
        code: body.code.unwrap_or_else(|| "unknown".into()),
        message,
        retry_after,
    })
}

/// Server-side filter for rows whose join-key column is set.
pub fn review_url_filter(columns: &ColumnMap) -> Value {
    json!({
        "property": columns.review_url,
        columns.review_url_kind.filter_key(): { "is_not_empty": true },
    })
}

/// Server-side filter for rows edited at or after `since`.
pub fn edited_since_filter(since: DateTime<Utc>) -> Value {
    json!({
        "timestamp": "last_edited_time",
        "last_edited_time": {
            "on_or_after": since.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
    })
}

/// Body for a page update: encoded property changes plus the cover.
pub fn update_body(
    row: &MovieRow,
    columns: &ColumnMap,
    update: &RowUpdate,
) -> Value {
    let mut properties = Map::new();
    for change in &update.changes {
        let Some(kind) = row.column_kind(change.field) else {
            continue;
        };
        if let Some(encoded) = encode_value(kind, &change.value) {
            properties
                .insert(columns.column(change.field).to_string(), encoded);
        }
    }

    let mut body = Map::new();
    if !properties.is_empty() {
        body.insert("properties".into(), Value::Object(properties));
    }
    if let Some(cover) = &update.cover {
        body.insert("cover".into(), encode_cover(cover));
    }
    Value::Object(body)
}

/// Notion database client.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    token: ApiCredential,
    database_id: String,
    columns: ColumnMap,
    retry: RetryPolicy,
}

impl NotionClient {
    pub fn new(
        http: Client,
        token: ApiCredential,
        database_id: impl Into<String>,
        columns: ColumnMap,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            token,
            database_id: database_id.into(),
            columns,
            retry,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{NOTION_API_BASE_URL}{path}"))
            .bearer_auth(self.token.expose())
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn query(
        &self,
        filter: Option<&Value>,
        sorts: Option<&Value>,
        cursor: Option<&str>,
    ) -> Result<QueryResponse, NotionError> {
        let mut body = Map::new();
        body.insert("page_size".into(), json!(PAGE_SIZE));
        if let Some(filter) = filter {
            body.insert("filter".into(), filter.clone());
        }
        if let Some(sorts) = sorts {
            body.insert("sorts".into(), sorts.clone());
        }
        if let Some(cursor) = cursor {
            body.insert("start_cursor".into(), json!(cursor));
        }

        let path = format!("/databases/{}/query", self.database_id);
        execute(self.request(Method::POST, &path).json(&Value::Object(body)))
            .await
    }

    async fn collect_rows<K>(
        &self,
        filter: Option<&Value>,
        sorts: Option<&Value>,
        limit: usize,
        keep: K,
    ) -> Result<Vec<MovieRow>, NotionError>
    where
        K: Fn(&MovieRow) -> bool + Send,
    {
        walk_pages(&self.columns, limit, keep, |cursor| async move {
            self.query(filter, sorts, cursor.as_deref()).await
        })
        .await
    }

    async fn patch_page(
        &self,
        page_id: &str,
        body: &Value,
    ) -> Result<(), NotionError> {
        let path = format!("/pages/{page_id}");
        send_with_retry(&self.retry, page_id, || {
            execute::<Value>(self.request(Method::PATCH, &path).json(body))
        })
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl MovieStore for NotionClient {
    async fn rows_needing_fill(
        &self,
        limit: usize,
    ) -> Result<Vec<MovieRow>, NotionError> {
        let filter = review_url_filter(&self.columns);
        let rows = self
            .collect_rows(Some(&filter), None, limit, |row| {
                row.review_url.is_some() && row.needs_fill()
            })
            .await?;
        info!(rows = rows.len(), "selected rows needing fill");
        Ok(rows)
    }

    async fn recent_rows(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<MovieRow>, NotionError> {
        let filter = edited_since_filter(since);
        let sorts = json!([
            { "timestamp": "last_edited_time", "direction": "descending" }
        ]);
        let mut rows = self
            .collect_rows(Some(&filter), Some(&sorts), limit, |_| true)
            .await?;
        let edited = rows.len();
        rows.retain(|row| row.review_url.is_some());
        info!(
            edited,
            with_review_url = rows.len(),
            since = %since,
            "selected recently edited rows"
        );
        Ok(rows)
    }

    async fn all_rows(&self) -> Result<Vec<MovieRow>, NotionError> {
        self.collect_rows(None, None, 0, |_| true).await
    }

    async fn write_row(
        &self,
        row: &MovieRow,
        update: &RowUpdate,
    ) -> Result<(), NotionError> {
        let body = update_body(row, &self.columns, update);
        self.patch_page(&row.id, &body).await
    }

    async fn set_cover(
        &self,
        row: &MovieRow,
        url: &str,
    ) -> Result<(), NotionError> {
        let body = json!({ "cover": encode_cover(url) });
        self.patch_page(&row.id, &body).await
    }
}
