//! Prometheus metrics published by the exporter
//!
//! All instruments live in one explicitly constructed [`Registry`] owned by
//! [`ExporterMetrics`]. The refresh scheduler writes through it and the
//! snapshot server reads from it; both hold the same `Arc<ExporterMetrics>`.

use prometheus::{
    Counter, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::RwLock;
use thiserror::Error;

/// Label carrying the subject name on per-hero metrics.
pub const HERO_LABEL: &str = "hero_name";

/// Upstream latency buckets, in seconds. The last bucket matches the request timeout.
const RESPONSE_TIME_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("exposition output is not valid UTF-8: {0}")]
    Encode(#[from] std::string::FromUtf8Error),

    #[error("metrics snapshot lock poisoned")]
    LockPoisoned,
}

/// The exporter's metric set.
pub struct ExporterMetrics {
    registry: Registry,
    /// Held for writing while roster-wide aggregates are replaced, for reading while encoding.
    snapshot: RwLock<()>,

    // ── Roster ───────────────────────────────────────────────────────────────
    pub heroes_monitored: Gauge,
    pub hero_pages: Gauge,
    pub pages_with_categories: Gauge,
    pub pages_mainspace: Gauge,
    pub redirect_pages: Gauge,
    pub disambiguation_pages: Gauge,

    // ── Content aggregates ───────────────────────────────────────────────────
    pub avg_page_length: Gauge,
    pub max_page_length: Gauge,
    pub most_edited_revisions: Gauge,
    pub total_categories: Gauge,
    pub total_languages: Gauge,
    pub data_completeness: Gauge,

    // ── Per hero ─────────────────────────────────────────────────────────────
    pub hero_page_length: GaugeVec,
    pub hero_revisions: GaugeVec,
    pub hero_categories: GaugeVec,
    pub hero_languages: GaugeVec,
    pub hero_last_modified: GaugeVec,

    // ── Upstream API ─────────────────────────────────────────────────────────
    pub api_response_time: Histogram,
    pub api_errors: Counter,
    pub api_calls: Counter,
}

impl ExporterMetrics {
    /// Create every instrument and register it in a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        Ok(Self {
            heroes_monitored: gauge(
                &registry,
                "wikipedia_heroes_monitored",
                "Total heroes monitored",
            )?,
            hero_pages: gauge(
                &registry,
                "wikipedia_hero_pages_total",
                "Total hero Wikipedia pages found",
            )?,
            pages_with_categories: gauge(
                &registry,
                "wikipedia_pages_with_categories",
                "Pages with categories",
            )?,
            pages_mainspace: gauge(
                &registry,
                "wikipedia_pages_mainspace",
                "Pages in main namespace",
            )?,
            redirect_pages: gauge(
                &registry,
                "wikipedia_redirect_pages_count",
                "Pages that are redirects",
            )?,
            disambiguation_pages: gauge(
                &registry,
                "wikipedia_disambiguation_pages_count",
                "Disambiguation pages for heroes",
            )?,

            avg_page_length: gauge(
                &registry,
                "wikipedia_avg_page_length_chars",
                "Average page length in characters",
            )?,
            max_page_length: gauge(
                &registry,
                "wikipedia_max_page_length_chars",
                "Longest page length",
            )?,
            most_edited_revisions: gauge(
                &registry,
                "wikipedia_most_edited_hero_revisions",
                "Revisions for most edited hero",
            )?,
            total_categories: gauge(
                &registry,
                "wikipedia_total_categories",
                "Total unique categories",
            )?,
            total_languages: gauge(
                &registry,
                "wikipedia_total_languages_available",
                "Total language versions available",
            )?,
            data_completeness: gauge(
                &registry,
                "wikipedia_data_completeness_percent",
                "Data completeness %",
            )?,

            hero_page_length: hero_gauge(
                &registry,
                "wikipedia_hero_page_length_chars",
                "Hero page length",
            )?,
            hero_revisions: hero_gauge(
                &registry,
                "wikipedia_hero_revisions_total",
                "Total revisions of page",
            )?,
            hero_categories: hero_gauge(
                &registry,
                "wikipedia_hero_categories_count",
                "Number of categories",
            )?,
            hero_languages: hero_gauge(
                &registry,
                "wikipedia_hero_languages_count",
                "Available language versions",
            )?,
            hero_last_modified: hero_gauge(
                &registry,
                "wikipedia_hero_page_modified_unix",
                "Hero page last modified time",
            )?,

            api_response_time: {
                let h = Histogram::with_opts(
                    HistogramOpts::new("wikipedia_api_response_time_seconds", "API response time")
                        .buckets(RESPONSE_TIME_BUCKETS.to_vec()),
                )?;
                registry.register(Box::new(h.clone()))?;
                h
            },
            api_errors: counter(&registry, "wikipedia_api_errors_total", "Total API errors")?,
            api_calls: counter(&registry, "wikipedia_api_calls_total", "Total API calls")?,

            registry,
            snapshot: RwLock::new(()),
        })
    }

    /// Apply a group of writes that scrapes must see all-or-nothing.
    pub fn batch_update<F>(&self, update: F) -> Result<(), MetricsError>
    where
        F: FnOnce(&Self),
    {
        let _guard = self.snapshot.write().map_err(|_| MetricsError::LockPoisoned)?;
        update(self);
        Ok(())
    }

    /// Render all registered metrics to Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let families = {
            let _guard = self.snapshot.read().map_err(|_| MetricsError::LockPoisoned)?;
            self.registry.gather()
        };
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, MetricsError> {
    let g = Gauge::new(name, help)?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn hero_gauge(registry: &Registry, name: &str, help: &str) -> Result<GaugeVec, MetricsError> {
    let g = GaugeVec::new(Opts::new(name, help), &[HERO_LABEL])?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<Counter, MetricsError> {
    let c = Counter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}
