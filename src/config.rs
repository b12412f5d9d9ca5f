//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Media configuration
///
/// Images and avatars are stored elsewhere; posts and users only carry keys.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Public base URL for media keys
    /// e.g., "https://media.example.com"
    pub public_url: String,
}

impl MediaConfig {
    /// Public URL of a stored media key
    pub fn url_for(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

/// Feed assembly configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Page size used when the client does not ask for one (default: 20)
    pub default_page_size: usize,
    /// Upper bound on client page sizes (default: 40)
    pub max_page_size: usize,
    /// Posts decorated concurrently within one page (default: 8)
    pub decoration_concurrency: usize,
    /// Deadline for assembling one page, in milliseconds (default: 5000)
    pub request_timeout_ms: u64,
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 40,
            decoration_concurrency: 8,
            request_timeout_ms: 5000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (AGORA__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/agora.db")?
            .set_default("database.max_connections", 5)?
            .set_default("media.public_url", "http://localhost:8080/media")?
            .set_default("feed.default_page_size", 20)?
            .set_default("feed.max_page_size", 40)?
            .set_default("feed.decoration_concurrency", 8)?
            .set_default("feed.request_timeout_ms", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (AGORA__*)
            .add_source(
                Environment::with_prefix("AGORA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        let feed = &self.feed;

        if feed.max_page_size == 0 {
            return Err(crate::error::AppError::Config(
                "feed.max_page_size must be greater than 0".to_string(),
            ));
        }

        if feed.default_page_size == 0 || feed.default_page_size > feed.max_page_size {
            return Err(crate::error::AppError::Config(format!(
                "feed.default_page_size must be between 1 and feed.max_page_size ({})",
                feed.max_page_size
            )));
        }

        if feed.decoration_concurrency == 0 {
            return Err(crate::error::AppError::Config(
                "feed.decoration_concurrency must be greater than 0".to_string(),
            ));
        }

        if feed.request_timeout_ms == 0 {
            return Err(crate::error::AppError::Config(
                "feed.request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        match url::Url::parse(&self.media.public_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(crate::error::AppError::Config(format!(
                    "media.public_url must be an http(s) URL: {}",
                    self.media.public_url
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/agora-test.db"),
                max_connections: 5,
            },
            media: MediaConfig {
                public_url: "https://media.example.com".to_string(),
            },
            feed: FeedConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_default_page_size_above_max() {
        let mut config = valid_config();
        config.feed.default_page_size = 50;

        let error = config
            .validate()
            .expect_err("default page size above max must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("feed.default_page_size")
        ));
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = valid_config();
        config.feed.decoration_concurrency = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_media_url() {
        let mut config = valid_config();
        config.media.public_url = "ftp://media.example.com".to_string();

        let error = config.validate().expect_err("ftp media url must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message) if message.contains("media.public_url")
        ));
    }

    #[test]
    fn media_url_joins_without_double_slashes() {
        let media = MediaConfig {
            public_url: "https://media.example.com/".to_string(),
        };
        assert_eq!(
            media.url_for("/images/a.webp"),
            "https://media.example.com/images/a.webp"
        );
    }
}
