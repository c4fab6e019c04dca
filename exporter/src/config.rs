//! Exporter configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then environment variables (`EXPORTER_PORT`, `SCRAPE_INTERVAL`, ...).

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use herowatch_shared::Roster;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str =
    "SuperheroExporter/1.0 (Custom Prometheus Exporter; +https://github.com/)";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Port for the metrics HTTP server
    pub exporter_port: u16,

    /// Seconds between refresh cycles
    pub scrape_interval: u64,

    /// MediaWiki API endpoint
    pub api_base: String,

    /// Identifying User-Agent header (the API rejects anonymous clients)
    pub user_agent: String,

    /// Upstream request timeout in seconds
    pub request_timeout: u64,

    /// Revisions requested per page (`rvlimit`)
    pub revision_limit: u32,

    /// Subjects to monitor
    pub heroes: Roster,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            exporter_port: 8000,
            scrape_interval: 20,
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: 10,
            revision_limit: 1,
            heroes: Roster::default(),
        }
    }
}

impl ExporterConfig {
    /// Load defaults, then `path` (if given and present), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(environment());
        Self::from_builder(builder)
    }

    /// Deserialize and validate whatever sources `builder` carries.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: ExporterConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Address the metrics server binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.exporter_port))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.exporter_port == 0 {
            anyhow::bail!("Exporter port must be greater than 0");
        }

        if self.scrape_interval == 0 {
            anyhow::bail!("Scrape interval must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("Request timeout must be greater than 0");
        }

        if self.user_agent.trim().is_empty() {
            anyhow::bail!("User-Agent must not be empty");
        }

        if self.heroes.is_empty() {
            anyhow::bail!("Hero roster must not be empty");
        }

        Ok(())
    }
}

/// Environment source; `HEROES` is a comma-separated roster.
fn environment() -> Environment {
    Environment::default()
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("heroes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<ExporterConfig> {
        ExporterConfig::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.exporter_port, 8000);
        assert_eq!(config.refresh_interval(), Duration::from_secs(20));
        assert_eq!(config.request_timeout, 10);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.heroes.len(), 10);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn test_file_overrides() {
        let config = from_toml(
            r#"
            exporter_port = 9100
            scrape_interval = 60
            heroes = ["Superman", "Batman"]
            "#,
        )
        .unwrap();
        assert_eq!(config.exporter_port, 9100);
        assert_eq!(config.scrape_interval, 60);
        let heroes: Vec<&str> = config.heroes.iter().collect();
        assert_eq!(heroes, vec!["Superman", "Batman"]);
        // Untouched keys keep their defaults
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    fn from_env(vars: &[(&str, &str)]) -> Result<ExporterConfig> {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ExporterConfig::from_builder(
            config::Config::builder().add_source(environment().source(Some(map))),
        )
    }

    #[test]
    fn test_env_roster_is_comma_separated() {
        let config = from_env(&[("HEROES", "Superman,Batman")]).unwrap();
        let heroes: Vec<&str> = config.heroes.iter().collect();
        assert_eq!(heroes, vec!["Superman", "Batman"]);

        let config = from_env(&[("HEROES", "Superman")]).unwrap();
        let heroes: Vec<&str> = config.heroes.iter().collect();
        assert_eq!(heroes, vec!["Superman"]);

        let config = from_env(&[]).unwrap();
        assert_eq!(config.heroes.len(), 10);
    }

    #[test]
    fn test_validation_errors() {
        assert!(from_toml("exporter_port = 0").is_err());
        assert!(from_toml("scrape_interval = 0").is_err());
        assert!(from_toml("request_timeout = 0").is_err());
        assert!(from_toml("user_agent = \"  \"").is_err());
        assert!(from_toml("heroes = []").is_err());
        assert!(from_toml("heroes = [\"Thor\", \"Thor\"]").is_err());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let path = Path::new("/nonexistent/herowatch.toml");
        let config = ExporterConfig::from_builder(
            config::Config::builder().add_source(File::from(path).required(false)),
        )
        .unwrap();
        assert_eq!(config.exporter_port, 8000);
    }
}
