//! Configuration types for cluster-testdata.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::path::Path;

use crate::error::Result;
use crate::telemetry::parse_level;

/// Prefix for environment variable overrides, e.g.
/// `TESTDATA__APPLICATION__DATABASE__PASSWORD`.
pub const ENV_PREFIX: &str = "TESTDATA";

/// Root of the YAML document. Everything lives under `application`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Application settings.
    pub application: Config,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name, used in the startup log line.
    pub name: String,

    /// Log level override (e.g. "DEBUG", "info"). Wins over CLI verbosity.
    #[serde(default)]
    pub loglevel: Option<String>,

    /// Database connection parameters.
    pub database: DatabaseConfig,

    /// Route53 parameters.
    pub aws: AwsConfig,
}

/// Postgres connection parameters.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Server hostname.
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Login role.
    pub user: String,

    /// Login password.
    pub password: String,
}

impl DatabaseConfig {
    /// Build driver connection options from these parameters.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Route53 parameters.
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Static access key id.
    pub aws_access_key_id: String,

    /// Static secret access key.
    pub aws_secret_access_key: String,

    /// Domain of the hosted zone records are created under (e.g. "example.com").
    pub hosted_zone: String,

    /// Signing region. Route53 is global, so this rarely needs changing.
    #[serde(default = "default_region")]
    pub region: String,

    /// TTL for created A records in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: i64,
}

impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("hosted_zone", &self.hosted_zone)
            .field("region", &self.region)
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn default_port() -> u16 {
    5432
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_ttl() -> i64 {
    60
}

/// Load the configuration from a YAML file, applying `TESTDATA__*`
/// environment overrides.
///
/// Fails if the file is missing or unreadable, is not a mapping, lacks the
/// `application` key, lacks any required sub-key, or names an unknown
/// `loglevel`.
pub fn load(path: &Path) -> Result<Config> {
    let root: ConfigFile = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()).format(config::FileFormat::Yaml))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    let application = root.application;
    if let Some(level) = &application.loglevel {
        if parse_level(level).is_none() {
            return Err(config::ConfigError::Message(format!(
                "application.loglevel: unknown log level {:?}",
                level
            ))
            .into());
        }
    }

    Ok(application)
}
