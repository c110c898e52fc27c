use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{Config, GraphConfig, LoggingConfig, MetricsConfig, Overrides, ServerConfig};

/// Prefix for environment variable overrides, e.g. `GESLACKER__SERVER__ORIGIN`.
pub const ENV_PREFIX: &str = "GESLACKER";

/// Loads the application configuration from `config.toml` in the working directory.
///
/// The file is optional: every setting has a default, and any setting can be
/// overridden through `GESLACKER__<SECTION>__<KEY>` environment variables.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads the application configuration from an explicit file path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

/// Parses a configuration from TOML text layered over the defaults.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    let defaults = core_types::RangeSelection::default();
    Ok(builder
        .set_default("server.origin", "http://localhost")?
        .set_default("server.api_prefix", "api")?
        .set_default("server.static_prefix", "base")?
        .set_default("graph.range", i64::from(defaults.range))?
        .set_default("graph.interval", i64::from(defaults.interval))?
        .set_default("metrics.roi_basis", core_types::RoiBasis::default().as_str())?
        .set_default("logging.level", "info")?
        .set_default("logging.file_prefix", "geslacker.log")?)
}
