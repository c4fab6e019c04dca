//! Wikipedia superhero exporter library
//!
//! Polls the MediaWiki API for a fixed roster of heroes, aggregates the
//! results into Prometheus metrics and serves them over HTTP.

pub mod config;
pub mod metrics;
pub mod refresh;
pub mod scheduler;
pub mod server;
pub mod source;
