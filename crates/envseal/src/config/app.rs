//! Application configuration: environment-selected YAML file plus overrides,
//! with marked secrets decrypted before typed deserialization.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{File, FileFormat, Source as _, Value, ValueKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use super::hook::{apply_hook, FieldHook};

/// Prefix of environment variables that override file values
/// (`APP__DB__PASSWORD` → `db.password`).
pub const OVERRIDE_PREFIX: &str = "APP";

/// Deployment environment, selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse an `APP_ENV` value. Unknown values fall back to
    /// [`Environment::Development`].
    pub fn parse(value: &str) -> Self {
        match value {
            "staging" => Self::Staging,
            "production" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Directory searched for configuration files in this environment.
    pub fn config_dir(&self) -> PathBuf {
        match self {
            Self::Development => PathBuf::from("./files/etc/config"),
            Self::Staging | Self::Production => PathBuf::from("/etc/config"),
        }
    }

    /// File name of `app`'s configuration in this environment.
    pub fn config_file_name(&self, app: &str) -> String {
        format!("{app}.{}.yaml", self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub db: DbConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Database connection settings.
#[derive(Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_db_port() -> u16 {
    5432
}
fn default_redis_port() -> u16 {
    6379
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_redis_port(),
        }
    }
}

impl AppConfig {
    /// `host:port` the HTTP server binds to.
    ///
    /// The bare `HOST` and `PORT` variables take precedence over the file. A
    /// `PORT` that does not parse as a port number is ignored.
    pub fn address(&self) -> String {
        self.address_with(|name| std::env::var(name).ok())
    }

    fn address_with(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        let host = lookup("HOST")
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.host.clone());
        let port = lookup("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(self.port);
        format!("{host}:{port}")
    }
}

impl DbConfig {
    /// PostgreSQL key/value connection string. Contains the password; never log it.
    pub fn dsn(&self) -> String {
        format!(
            "host={} user={} password={} dbname={} port={} sslmode=disable",
            self.host, self.user, self.password, self.name, self.port
        )
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// Load `app`'s configuration for `env` from `dir` (or the environment's
/// default directory), decrypting marked fields with `hook`.
///
/// # Errors
///
/// Returns an error if the file is missing or unparsable, if any marked field
/// fails to decrypt, or if the result does not fit `T`.
pub fn load_config<T>(
    app: &str,
    env: Environment,
    dir: Option<&Path>,
    hook: &dyn FieldHook,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let dir = dir.map_or_else(|| env.config_dir(), Path::to_path_buf);
    let path = dir.join(env.config_file_name(app));
    load_config_file(&path, hook)
}

/// Load a single YAML file plus `APP__*` overrides, decrypting marked fields
/// with `hook`.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_file<T>(path: &Path, hook: &dyn FieldHook) -> Result<T>
where
    T: DeserializeOwned,
{
    info!(path = %path.display(), "loading configuration");

    let cfg = config::Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml).required(true))
        .add_source(
            config::Environment::with_prefix(OVERRIDE_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;

    let mut table = cfg
        .collect()
        .context("failed to collect configuration values")?;

    let decrypted = apply_hook(&mut table, hook).context("failed to decrypt configuration")?;
    info!(decrypted, "configuration secrets resolved");

    Value::new(None, ValueKind::Table(table))
        .try_deserialize()
        .context("failed to deserialise configuration")
}
