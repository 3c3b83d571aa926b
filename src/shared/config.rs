//! Server configuration
//!
//! Options are read from an optional TOML file (`MEDIAMILL_CONFIG`, falling
//! back to `mediamill.toml` in the working directory) and overridden by
//! environment variables. Defaults follow the recognised option list.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::shared::error::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory scanned for new files
    pub ingest_path: PathBuf,
    /// Cadence of the periodic re-scan in seconds (0 disables it)
    pub force_sync_seconds: u64,
    /// Minimum age before a discovered file leaves the import hold
    pub modtime_threshold_seconds: u64,
    /// Ingest worker count
    pub ingestion_parallelism: usize,
    /// Transcode thread budget; defaults to the host core count
    pub thread_pool_size: u32,
    /// TMDB API key for the title searcher
    pub tmdb_api_key: String,
    pub format: FormatConfig,
    pub auth: AuthConfig,
    pub services: ServicesConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

/// External tool and output options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Root for transcoded outputs
    pub output_dir: PathBuf,
    /// Metadata prober binary
    pub prober_path: String,
    /// Transcoder binary
    pub runner_path: String,
}

/// Token signing and lifetime options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_lifetime_secs: i64,
    pub refresh_lifetime_secs: i64,
    /// Remaining access-token validity below which a request auto-refreshes
    pub auto_refresh_threshold_secs: i64,
}

/// Lifecycle toggles for auxiliary containers. Supervision itself is an
/// external collaborator; the server only records the operator's intent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub enable_embedded_db: bool,
    pub enable_embedded_db_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ingest_path: PathBuf::from("./ingest"),
            force_sync_seconds: 3600,
            modtime_threshold_seconds: 120,
            ingestion_parallelism: 2,
            thread_pool_size: num_cpus::get() as u32,
            tmdb_api_key: String::new(),
            format: FormatConfig::default(),
            auth: AuthConfig::default(),
            services: ServicesConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./transcoded"),
            prober_path: "ffprobe".to_string(),
            runner_path: "ffmpeg".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_lifetime_secs: 3600,
            refresh_lifetime_secs: 86_400,
            auto_refresh_threshold_secs: 900,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            enable_embedded_db: false,
            enable_embedded_db_admin: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:mediamill.db?mode=rwc".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Loads configuration from file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MEDIAMILL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("mediamill.toml"));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MEDIAMILL_INGEST_PATH") {
            self.ingest_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MEDIAMILL_FORCE_SYNC_SECONDS") {
            if let Ok(n) = v.parse() {
                self.force_sync_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("MEDIAMILL_MODTIME_THRESHOLD_SECONDS") {
            if let Ok(n) = v.parse() {
                self.modtime_threshold_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("MEDIAMILL_INGESTION_PARALLELISM") {
            if let Ok(n) = v.parse() {
                self.ingestion_parallelism = n;
            }
        }
        if let Ok(v) = std::env::var("MEDIAMILL_THREAD_POOL_SIZE") {
            if let Ok(n) = v.parse() {
                self.thread_pool_size = n;
            }
        }
        if let Ok(v) = std::env::var("MEDIAMILL_OUTPUT_DIR") {
            self.format.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MEDIAMILL_PROBER_PATH") {
            self.format.prober_path = v;
        }
        if let Ok(v) = std::env::var("MEDIAMILL_RUNNER_PATH") {
            self.format.runner_path = v;
        }
        if let Ok(v) = std::env::var("MEDIAMILL_ACCESS_SECRET") {
            self.auth.access_secret = v;
        }
        if let Ok(v) = std::env::var("MEDIAMILL_REFRESH_SECRET") {
            self.auth.refresh_secret = v;
        }
        if let Ok(v) = std::env::var("TMDB_API_KEY") {
            self.tmdb_api_key = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(n) = v.parse() {
                self.server.port = n;
            }
        }
    }

    /// Rejects configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.access_secret.is_empty() {
            return Err(ConfigError::Missing("auth.access_secret".to_string()));
        }
        if self.auth.refresh_secret.is_empty() {
            return Err(ConfigError::Missing("auth.refresh_secret".to_string()));
        }
        if self.auth.access_secret == self.auth.refresh_secret {
            return Err(ConfigError::Parse(
                "auth.access_secret and auth.refresh_secret must differ".to_string(),
            ));
        }
        if self.ingestion_parallelism == 0 {
            return Err(ConfigError::Parse(
                "ingestion_parallelism must be at least 1".to_string(),
            ));
        }
        if self.thread_pool_size == 0 {
            return Err(ConfigError::Parse(
                "thread_pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.force_sync_seconds, 3600);
        assert_eq!(config.auth.access_lifetime_secs, 3600);
        assert_eq!(config.auth.refresh_lifetime_secs, 86_400);
        assert_eq!(config.auth.auto_refresh_threshold_secs, 900);
        assert_eq!(config.format.prober_path, "ffprobe");
        assert!(config.thread_pool_size >= 1);
    }

    #[test]
    fn parses_partial_toml() {
        let raw = r#"
            ingest_path = "/srv/staging"
            modtime_threshold_seconds = 5

            [format]
            output_dir = "/srv/out"

            [auth]
            access_secret = "a"
            refresh_secret = "b"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.ingest_path, PathBuf::from("/srv/staging"));
        assert_eq!(config.modtime_threshold_seconds, 5);
        assert_eq!(config.format.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.format.runner_path, "ffmpeg");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_distinct_secrets() {
        let mut config = Config::default();
        config.auth.access_secret = "same".to_string();
        config.auth.refresh_secret = "same".to_string();
        assert!(config.validate().is_err());
    }
}
