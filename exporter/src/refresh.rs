//! Refresh cycle: fetch every roster subject and fold the results into the registry
//!
//! Per-hero gauges are written as soon as a subject's page arrives. Subjects
//! that are missing or fail keep whatever the last successful cycle wrote.
//! Roster-wide gauges are derived from this cycle's successes only and
//! replaced in one batch after the loop.

use crate::metrics::{ExporterMetrics, MetricsError};
use crate::source::{fetch_instrumented, PageSource};
use herowatch_shared::utils::time::unix_seconds;
use herowatch_shared::{FetchOutcome, PageRecord, Roster};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to publish roster aggregates: {0}")]
    Publish(#[from] MetricsError),
}

/// Roster-wide statistics of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub roster_size: usize,
    pub pages_found: u64,
    pub missing: u64,
    pub failed: u64,
    pub avg_page_length: f64,
    pub max_page_length: u64,
    pub most_edited_revisions: u64,
    pub total_categories: usize,
    pub total_languages: usize,
    pub pages_with_categories: u64,
    pub pages_mainspace: u64,
    pub redirect_pages: u64,
    pub disambiguation_pages: u64,
    pub completeness_percent: f64,
}

impl CycleSummary {
    fn publish(&self, m: &ExporterMetrics) {
        m.hero_pages.set(self.pages_found as f64);
        m.avg_page_length.set(self.avg_page_length);
        m.max_page_length.set(self.max_page_length as f64);
        m.most_edited_revisions.set(self.most_edited_revisions as f64);
        m.total_categories.set(self.total_categories as f64);
        m.total_languages.set(self.total_languages as f64);
        m.pages_with_categories.set(self.pages_with_categories as f64);
        m.pages_mainspace.set(self.pages_mainspace as f64);
        m.redirect_pages.set(self.redirect_pages as f64);
        m.disambiguation_pages.set(self.disambiguation_pages as f64);
        m.data_completeness.set(self.completeness_percent);
    }
}

/// Running totals over the successful subjects of a cycle.
#[derive(Debug, Default)]
pub struct CycleAccumulator {
    successes: u64,
    missing: u64,
    failed: u64,
    total_length: u64,
    max_length: u64,
    max_revisions: u64,
    categories: HashSet<String>,
    languages: HashSet<String>,
    with_categories: u64,
    mainspace: u64,
    redirects: u64,
    disambiguations: u64,
}

impl CycleAccumulator {
    pub fn add(&mut self, record: &PageRecord) {
        self.successes += 1;
        self.total_length += record.length;
        self.max_length = self.max_length.max(record.length);
        self.max_revisions = self.max_revisions.max(record.revisions);
        self.categories.extend(record.categories.iter().cloned());
        self.languages.extend(record.languages.iter().cloned());

        if !record.categories.is_empty() {
            self.with_categories += 1;
        }
        if record.is_mainspace() {
            self.mainspace += 1;
        }
        if record.redirect {
            self.redirects += 1;
        }
        if record.disambiguation {
            self.disambiguations += 1;
        }
    }

    pub fn skip_missing(&mut self) {
        self.missing += 1;
    }

    pub fn skip_failed(&mut self) {
        self.failed += 1;
    }

    pub fn finish(self, roster_size: usize) -> CycleSummary {
        let avg_page_length = if self.successes > 0 {
            self.total_length as f64 / self.successes as f64
        } else {
            0.0
        };
        let completeness_percent = if roster_size > 0 {
            self.successes as f64 * 100.0 / roster_size as f64
        } else {
            0.0
        };

        CycleSummary {
            roster_size,
            pages_found: self.successes,
            missing: self.missing,
            failed: self.failed,
            avg_page_length,
            max_page_length: self.max_length,
            most_edited_revisions: self.max_revisions,
            total_categories: self.categories.len(),
            total_languages: self.languages.len(),
            pages_with_categories: self.with_categories,
            pages_mainspace: self.mainspace,
            redirect_pages: self.redirects,
            disambiguation_pages: self.disambiguations,
            completeness_percent,
        }
    }
}

/// Runs refresh cycles over a fixed roster.
pub struct RefreshEngine {
    source: Arc<dyn PageSource>,
    metrics: Arc<ExporterMetrics>,
    roster: Roster,
}

impl RefreshEngine {
    pub fn new(source: Arc<dyn PageSource>, metrics: Arc<ExporterMetrics>, roster: Roster) -> Self {
        Self {
            source,
            metrics,
            roster,
        }
    }

    /// One full pass over the roster.
    ///
    /// Fails only if the roster-wide batch cannot be published; per-subject
    /// problems are logged and counted as that subject's failure.
    pub async fn refresh(&self) -> Result<CycleSummary, RefreshError> {
        info!(heroes = self.roster.len(), "Updating metrics from Wikipedia API");
        self.metrics.heroes_monitored.set(self.roster.len() as f64);

        let mut acc = CycleAccumulator::default();
        for hero in self.roster.iter() {
            match fetch_instrumented(self.source.as_ref(), &self.metrics, hero).await {
                FetchOutcome::Found(record) => match self.record_hero(hero, &record) {
                    Ok(()) => {
                        info!(
                            hero = %hero,
                            length = record.length,
                            categories = record.category_count(),
                            languages = record.language_count(),
                            "Recorded page"
                        );
                        acc.add(&record);
                    }
                    Err(e) => {
                        error!(hero = %hero, error = %e, "Failed to record page metrics");
                        acc.skip_failed();
                    }
                },
                FetchOutcome::Missing => {
                    warn!(hero = %hero, "Not found on Wikipedia");
                    acc.skip_missing();
                }
                FetchOutcome::Failed => {
                    warn!(hero = %hero, "No data this cycle");
                    acc.skip_failed();
                }
            }
        }

        let summary = acc.finish(self.roster.len());
        self.metrics.batch_update(|m| summary.publish(m))?;

        info!(
            found = summary.pages_found,
            heroes = summary.roster_size,
            categories = summary.total_categories,
            languages = summary.total_languages,
            "All metrics updated"
        );
        Ok(summary)
    }

    fn record_hero(&self, hero: &str, record: &PageRecord) -> Result<(), MetricsError> {
        let m = &self.metrics;
        let length = m.hero_page_length.get_metric_with_label_values(&[hero])?;
        let revisions = m.hero_revisions.get_metric_with_label_values(&[hero])?;
        let categories = m.hero_categories.get_metric_with_label_values(&[hero])?;
        let languages = m.hero_languages.get_metric_with_label_values(&[hero])?;
        let modified = match &record.touched {
            Some(touched) => Some((
                m.hero_last_modified.get_metric_with_label_values(&[hero])?,
                unix_seconds(touched),
            )),
            None => None,
        };

        length.set(record.length as f64);
        revisions.set(record.revisions as f64);
        categories.set(record.category_count() as f64);
        languages.set(record.language_count() as f64);
        if let Some((gauge, secs)) = modified {
            gauge.set(secs);
        }
        Ok(())
    }
}
