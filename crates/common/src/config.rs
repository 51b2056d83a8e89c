//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Token verification configuration.
    pub auth: AuthConfig,
    /// Mood journal configuration.
    #[serde(default)]
    pub journal: JournalConfig,
    /// Support group configuration.
    #[serde(default)]
    pub groups: GroupsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin of the single-page frontend allowed by CORS.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Bearer token verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer.
    pub jwt_secret: String,
}

/// Mood journal settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// Number of entries returned when the caller gives no limit.
    #[serde(default = "default_entry_limit")]
    pub default_entry_limit: u64,
    /// Upper bound on a caller-supplied limit.
    #[serde(default = "default_max_entry_limit")]
    pub max_entry_limit: u64,
    /// IANA timezone used when a request names none.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            default_entry_limit: default_entry_limit(),
            max_entry_limit: default_max_entry_limit(),
            default_timezone: default_timezone(),
        }
    }
}

/// Support group settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupsConfig {
    /// Insert the default support groups at startup when missing.
    #[serde(default = "default_true")]
    pub seed_on_start: bool,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            seed_on_start: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5001
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_entry_limit() -> u64 {
    30
}

const fn default_max_entry_limit() -> u64 {
    100
}

fn default_timezone() -> String {
    "UTC".to_string()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `MINDFUL_ENV`)
    /// 3. Environment variables with `MINDFUL__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("MINDFUL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MINDFUL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MINDFUL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
