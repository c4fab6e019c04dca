//! Wikipedia data source adapter
//!
//! One `action=query` request per subject. The response is decoded defensively
//! into a [`PageRecord`]; every error stays inside this module and surfaces
//! only as [`FetchOutcome::Failed`] plus a log line.

use crate::config::ExporterConfig;
use crate::metrics::ExporterMetrics;
use async_trait::async_trait;
use herowatch_shared::utils::time::parse_timestamp;
use herowatch_shared::{FetchOutcome, PageRecord};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Page properties requested for every subject.
const PAGE_PROPS: &str = "info|revisions|categories|langlinks|pageprops";
/// Upper bound the API accepts for category and language link lists.
const LIST_LIMIT: &str = "500";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response carries no pages")]
    NoPages,
}

/// Anything that can look up a subject's page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Look up one subject. Never fails past this boundary.
    async fn fetch(&self, title: &str) -> FetchOutcome;
}

/// Call `source` for `title`, recording the call, its latency and any failure.
pub async fn fetch_instrumented(
    source: &dyn PageSource,
    metrics: &ExporterMetrics,
    title: &str,
) -> FetchOutcome {
    metrics.api_calls.inc();
    let start = Instant::now();
    let outcome = source.fetch(title).await;
    metrics
        .api_response_time
        .observe(start.elapsed().as_secs_f64());
    if outcome.is_failure() {
        metrics.api_errors.inc();
    }
    outcome
}

/// HTTP client for the MediaWiki query API.
pub struct WikipediaClient {
    client: reqwest::Client,
    api_base: String,
    revision_limit: String,
}

impl WikipediaClient {
    pub fn new(config: &ExporterConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            revision_limit: config.revision_limit.to_string(),
        })
    }

    async fn try_fetch(&self, title: &str) -> Result<FetchOutcome, SourceError> {
        let start = Instant::now();
        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", PAGE_PROPS),
                ("rvlimit", self.revision_limit.as_str()),
                ("cllimit", LIST_LIMIT),
                ("lllimit", LIST_LIMIT),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        info!(
            hero = %title,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched page info"
        );
        parse_query_response(&body, title)
    }
}

#[async_trait]
impl PageSource for WikipediaClient {
    async fn fetch(&self, title: &str) -> FetchOutcome {
        match self.try_fetch(title).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(hero = %title, error = %e, "Page lookup failed");
                FetchOutcome::Failed
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: HashMap<String, RawPage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPage {
    title: Option<String>,
    ns: Value,
    missing: Option<Value>,
    invalid: Option<Value>,
    redirect: Option<Value>,
    length: Value,
    touched: Option<String>,
    revisions: Vec<Value>,
    categories: Vec<RawCategory>,
    langlinks: Vec<RawLangLink>,
    pageprops: HashMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCategory {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLangLink {
    lang: String,
}

/// Decode a query response body for `title`.
pub fn parse_query_response(body: &[u8], title: &str) -> Result<FetchOutcome, SourceError> {
    let response: QueryResponse = serde_json::from_slice(body)?;
    let page = response
        .query
        .and_then(|q| q.pages.into_values().next())
        .ok_or(SourceError::NoPages)?;

    if flag(&page.missing) || flag(&page.invalid) {
        debug!(hero = %title, "Subject not found on Wikipedia");
        return Ok(FetchOutcome::Missing);
    }

    Ok(FetchOutcome::Found(PageRecord {
        title: page.title.unwrap_or_else(|| title.to_string()),
        length: lenient_u64(&page.length),
        revisions: page.revisions.len() as u64,
        categories: page.categories.into_iter().map(|c| c.title).collect(),
        languages: page.langlinks.into_iter().map(|l| l.lang).collect(),
        namespace: lenient_i64(&page.ns),
        redirect: flag(&page.redirect),
        disambiguation: page.pageprops.contains_key("disambiguation"),
        touched: page.touched.as_deref().and_then(parse_timestamp),
    }))
}

/// Presence flags are `""` in format version 1 and booleans in version 2.
fn flag(value: &Option<Value>) -> bool {
    match value {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

/// Numbers or numeric strings; anything else counts as 0.
fn lenient_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Namespace ids are signed: -1 is Special, -2 is Media.
fn lenient_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
