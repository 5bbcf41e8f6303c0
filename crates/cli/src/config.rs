//! Application configuration
//!
//! One TOML file (optional) layered under `QUEUEPULSE__*` environment
//! variables, e.g. `QUEUEPULSE__NETWORK__PLATFORM__API_TOKEN`.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use queuepulse_core::config::DashboardConfig;
use queuepulse_core::types::ReportDate;
use queuepulse_network::config::NetworkConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default file looked up in the working directory when `--config` is absent
const DEFAULT_CONFIG_NAME: &str = "queuepulse";

const ENV_PREFIX: &str = "QUEUEPULSE";

/// Everything the binary needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Polling and thresholds
    pub dashboard: DashboardConfig,
    /// Remote services
    pub network: NetworkConfig,
}

impl AppConfig {
    /// Load from `path` (required when given) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(environment(None))
            .build()
            .context("reading configuration")?;
        Self::finish(settings)
    }

    /// Load from TOML text and an explicit variable map
    pub fn from_toml(text: &str, env: HashMap<String, String>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .add_source(environment(Some(env)))
            .build()
            .context("reading configuration")?;
        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .context("configuration has the wrong shape")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate both halves
    pub fn validate(&self) -> Result<()> {
        self.dashboard
            .validate()
            .context("invalid [dashboard] section")?;
        self.network.validate().context("invalid [network] section")?;
        Ok(())
    }

    /// Deployment check on top of [`AppConfig::validate`]
    pub fn validate_strict(&self) -> Result<()> {
        self.validate()?;
        self.network
            .validate_production()
            .context("[network] section is not fit for deployment")?;
        Ok(())
    }

    /// Apply command line overrides, then re-validate
    pub fn with_overrides(
        mut self,
        queue: Option<&str>,
        date: Option<ReportDate>,
        interval_s: Option<u64>,
    ) -> Result<Self> {
        let polling = &mut self.dashboard.polling;
        if let Some(queue) = queue {
            polling.default_queue = queue.to_string();
        }
        if date.is_some() {
            polling.default_date = date;
        }
        if let Some(interval_s) = interval_s {
            polling.interval_s = interval_s;
            polling.cycle_timeout_s = polling.cycle_timeout_s.min(interval_s.max(1));
        }
        self.validate()?;
        Ok(self)
    }

    /// TOML rendering with credentials masked
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        redact(&mut shown.network.platform.api_token);
        redact(&mut shown.network.analysis.api_key);
        toml::to_string_pretty(&shown).context("rendering configuration")
    }
}

fn environment(source: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .source(source)
}

fn redact(secret: &mut String) {
    if !secret.is_empty() {
        *secret = "***".to_string();
    }
}
