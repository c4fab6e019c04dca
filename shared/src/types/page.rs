//! Per-subject page data
//!
//! A `PageRecord` is what one successful lookup against the encyclopedia API
//! yields for a single roster subject. Records are rebuilt on every fetch and
//! never carried across refresh cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Namespace id of regular articles.
pub const MAIN_NAMESPACE: i64 = 0;

/// Page information for one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Title as reported by the source (may differ from the subject name)
    pub title: String,

    /// Content length in bytes
    pub length: u64,

    /// Number of revision entries returned
    pub revisions: u64,

    /// Category titles, in source order
    pub categories: Vec<String>,

    /// Language codes of the available translations
    pub languages: Vec<String>,

    /// Namespace id
    pub namespace: i64,

    /// Page is a redirect
    pub redirect: bool,

    /// Page is a disambiguation page
    pub disambiguation: bool,

    /// Last time the page was touched
    pub touched: Option<DateTime<Utc>>,
}

impl PageRecord {
    /// Create a record with only a title; counters start at zero.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            length: 0,
            revisions: 0,
            categories: Vec::new(),
            languages: Vec::new(),
            namespace: MAIN_NAMESPACE,
            redirect: false,
            disambiguation: false,
            touched: None,
        }
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn language_count(&self) -> usize {
        self.languages.len()
    }

    pub fn is_mainspace(&self) -> bool {
        self.namespace == MAIN_NAMESPACE
    }
}

/// Result of looking up one subject.
///
/// `Missing` and `Failed` are both "no data this cycle" for aggregation, but
/// only `Failed` counts as an API error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Valid response carrying page data
    Found(PageRecord),

    /// Valid response, the source does not know the subject
    Missing,

    /// Network error, timeout, non-success status or malformed payload
    Failed,
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed)
    }

    /// The page record, if any.
    pub fn into_record(self) -> Option<PageRecord> {
        match self {
            FetchOutcome::Found(record) => Some(record),
            FetchOutcome::Missing | FetchOutcome::Failed => None,
        }
    }
}
