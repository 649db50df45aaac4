use std::path::Path;
use tracing::{debug, info};

use super::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};

pub const ENV_PREFIX: &str = "EQUITY_INTEL";

impl AnalyticsConfig {
    /// Layers, lowest precedence first: built-in defaults, the TOML file at
    /// `path` (optional), then `EQUITY_INTEL__SECTION__FIELD` variables.
    pub fn load(path: &Path) -> Result<Self> {
        let defaults = config::Config::try_from(&AnalyticsConfig::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("universe.symbols")
                    .try_parsing(true),
            )
            .build()?;

        let config: AnalyticsConfig = settings.try_deserialize()?;
        config.validate().map_err(AnalyticsError::InvalidConfig)?;

        if path.exists() {
            info!("Loaded configuration from {}", path.display());
        } else {
            debug!("No config file at {}, using defaults", path.display());
        }

        Ok(config)
    }

    /// Parses a TOML document on its own, without defaults files or env
    /// layering. Missing sections fall back to their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AnalyticsConfig =
            toml::from_str(raw).map_err(|e| AnalyticsError::InvalidConfig(vec![e.to_string()]))?;
        config.validate().map_err(AnalyticsError::InvalidConfig)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AnalyticsError::InvalidConfig(vec![e.to_string()]))
    }
}
