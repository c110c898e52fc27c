use crate::error::ConfigError;
use core_types::{RangeSelection, RoiBasis};
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub graph: GraphConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// Where the exchange data is served from.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Scheme and host of the data service (e.g., "http://localhost").
    pub origin: String,
    /// Path prefix of the live API; hosts `grandExchange` and, by default, the summary.
    pub api_prefix: String,
    /// Path prefix of the static mirror; hosts the pre-aggregated graph files.
    pub static_prefix: String,
    /// Overrides the prefix the summary is fetched from. Some deployments serve
    /// `exchange/summary.json` from the static mirror instead of the API.
    #[serde(default)]
    pub summary_prefix: Option<String>,
}

impl ServerConfig {
    /// The prefix the catalog summary is fetched from.
    pub fn summary_prefix(&self) -> &str {
        self.summary_prefix.as_deref().unwrap_or(&self.api_prefix)
    }
}

/// Initial range selection for item graphs, in minutes.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub range: u32,
    pub interval: u32,
}

impl GraphConfig {
    pub fn selection(&self) -> Result<RangeSelection, ConfigError> {
        RangeSelection::new(self.range, self.interval)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Which average ROI is expressed against.
    pub roi_basis: RoiBasis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct Overrides {
    /// Path to the configuration file.
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub config: Option<PathBuf>,
    /// Origin of the data service, e.g. "https://prices.example.com".
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub origin: Option<String>,
    /// Average that ROI is expressed against ("buy_average" or "sell_average").
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub roi_basis: Option<RoiBasis>,
}

impl Config {
    /// Checks the settings that cannot be expressed through types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.server.origin.trim();
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "server.origin must start with http:// or https://, got: '{}'",
                origin
            )));
        }
        for (key, prefix) in [
            ("server.api_prefix", self.server.api_prefix.as_str()),
            ("server.static_prefix", self.server.static_prefix.as_str()),
            ("server.summary_prefix", self.server.summary_prefix()),
        ] {
            if prefix.trim_matches('/').is_empty() {
                return Err(ConfigError::ValidationError(format!("{} must not be empty", key)));
            }
        }
        self.graph.selection()?;
        Ok(())
    }

    /// Applies command-line overrides and re-validates the result.
    pub fn apply(mut self, overrides: &Overrides) -> Result<Self, ConfigError> {
        if let Some(origin) = &overrides.origin {
            self.server.origin = origin.clone();
        }
        if let Some(basis) = overrides.roi_basis {
            self.metrics.roi_basis = basis;
        }
        self.validate()?;
        Ok(self)
    }
}
