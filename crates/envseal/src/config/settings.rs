//! Process settings loaded and validated from environment variables.
//!
//! All values are read at startup. The process exits with a clear error
//! message if any variable is present but invalid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::app::Environment;
use crate::key::DEFAULT_KEY_VAR;

/// Validated process settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Deployment environment (`APP_ENV`): `development`, `staging` or `production`.
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// Overrides the environment's configuration directory.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Forces debug-level logging when `true`.
    #[serde(default)]
    pub debug: bool,

    /// Name of the variable that holds the raw 32-byte key.
    #[serde(default = "default_enc_key_var")]
    pub enc_key_var: String,
}

fn default_app_env() -> String {
    "development".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_enc_key_var() -> String {
    DEFAULT_KEY_VAR.into()
}

impl Settings {
    /// Load and validate settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("failed to build settings from environment")?;

        let s: Settings = cfg
            .try_deserialize()
            .context("failed to deserialise settings")?;

        s.validate()?;
        Ok(s)
    }

    /// Parsed deployment environment.
    pub fn environment(&self) -> Environment {
        Environment::parse(&self.app_env)
    }

    /// Effective log filter directive.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// Whether logs are emitted as JSON.
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }

    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.log_level, "LOG_LEVEL")?;
        ensure_non_empty(&self.enc_key_var, "ENC_KEY_VAR")?;
        if !matches!(self.log_format.as_str(), "text" | "json") {
            anyhow::bail!("LOG_FORMAT must be `text` or `json`, got `{}`", self.log_format);
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(())
}
