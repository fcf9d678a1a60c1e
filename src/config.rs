use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Largest page the Mastodon statuses endpoint will return
pub const MAX_PAGE_SIZE: u32 = 40;

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_page_delay_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mastodon: MastodonConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MastodonConfig {
    #[serde(default)]
    pub instance_url: String,
    #[serde(default)]
    pub access_token: String,
}

/// Pagination settings for the history collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_true")]
    pub exclude_reblogs: bool,
    #[serde(default = "default_true")]
    pub exclude_replies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            exclude_reblogs: true,
            exclude_replies: true,
        }
    }
}

impl CollectionConfig {
    /// Pause between two page requests
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Some("info".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file with XDG directory support and environment variable overrides
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_file = if let Some(path) = config_path {
            path
        } else {
            Self::find_config_file()
        };

        let mut config = if config_file.exists() {
            tracing::debug!("Loading config from: {}", config_file.display());
            let content = std::fs::read_to_string(&config_file)?;
            toml::from_str::<Config>(&content)?
        } else {
            tracing::debug!("No config file found, using environment variables only");
            Config {
                mastodon: MastodonConfig::default(),
                collection: CollectionConfig::default(),
                logging: LoggingConfig::default(),
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Find configuration file in the current directory or the XDG config directory
    fn find_config_file() -> PathBuf {
        let current_dir_config = PathBuf::from("tootstats.toml");
        if current_dir_config.exists() {
            return current_dir_config;
        }

        let xdg_config = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(xdg_config_home))
        } else {
            dirs::config_dir()
        }
        .map(|dir| dir.join("tootstats").join("tootstats.toml"));

        match xdg_config {
            Some(path) if path.exists() => path,
            _ => current_dir_config,
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Plain names first so the prefixed ones win when both are set
        if let Ok(instance_url) = env::var("MASTODON_SERVER") {
            self.mastodon.instance_url = instance_url;
        }
        if let Ok(access_token) = env::var("MASTODON_TOKEN") {
            self.mastodon.access_token = access_token;
        }
        if let Ok(instance_url) = env::var("TOOTSTATS_MASTODON_INSTANCE_URL") {
            self.mastodon.instance_url = instance_url;
        }
        if let Ok(access_token) = env::var("TOOTSTATS_MASTODON_ACCESS_TOKEN") {
            self.mastodon.access_token = access_token;
        }

        if let Ok(page_size) = env::var("TOOTSTATS_PAGE_SIZE") {
            self.collection.page_size = page_size.parse().map_err(|_| {
                ConfigError::InvalidValue("TOOTSTATS_PAGE_SIZE must be a valid number".to_string())
            })?;
        }
        if let Ok(page_delay_ms) = env::var("TOOTSTATS_PAGE_DELAY_MS") {
            self.collection.page_delay_ms = page_delay_ms.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "TOOTSTATS_PAGE_DELAY_MS must be a valid number".to_string(),
                )
            })?;
        }

        if let Ok(level) = env::var("TOOTSTATS_LOG_LEVEL") {
            self.logging.level = Some(level);
        }

        Ok(())
    }

    /// Validate that all required configuration is present
    fn validate(&self) -> Result<(), ConfigError> {
        if self.mastodon.instance_url.is_empty() {
            return Err(ConfigError::MissingRequired(
                "mastodon.instance_url or MASTODON_SERVER".to_string(),
            ));
        }

        if self.mastodon.access_token.is_empty() {
            return Err(ConfigError::MissingRequired(
                "mastodon.access_token or MASTODON_TOKEN".to_string(),
            ));
        }

        let url = Url::parse(&self.mastodon.instance_url).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "mastodon.instance_url is not a valid URL ({}): {e}",
                self.mastodon.instance_url
            ))
        })?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::InvalidValue(format!(
                "mastodon.instance_url must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.collection.page_size == 0 || self.collection.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue(format!(
                "collection.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(())
    }

    /// Get the configured log level
    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            mastodon: MastodonConfig {
                instance_url: "https://mastodon.social".to_string(),
                access_token: "token".to_string(),
            },
            collection: CollectionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let collection = CollectionConfig::default();
        assert_eq!(collection.page_size, 40);
        assert_eq!(collection.page_delay_ms, 100);
        assert_eq!(collection.page_delay(), Duration::from_millis(100));
        assert!(collection.exclude_reblogs);
        assert!(collection.exclude_replies);

        let logging = LoggingConfig::default();
        assert_eq!(logging.level, Some("info".to_string()));
    }

    #[test]
    fn test_config_validation_missing_required() {
        let mut config = valid_config();
        config.mastodon.instance_url = String::new();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("mastodon.instance_url"));

        let mut config = valid_config();
        config.mastodon.access_token = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
        assert!(err.to_string().contains("MASTODON_TOKEN"));
    }

    #[test]
    fn test_config_validation_invalid_url() {
        let mut config = valid_config();
        config.mastodon.instance_url = "not a url".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidValue(_)
        ));

        config.mastodon.instance_url = "ftp://mastodon.social".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("http or https"));
    }

    #[test]
    fn test_config_validation_page_size_bounds() {
        let mut config = valid_config();
        config.collection.page_size = 41;
        assert!(config.validate().unwrap_err().to_string().contains("page_size"));

        config.collection.page_size = 0;
        assert!(config.validate().is_err());

        config.collection.page_size = 40;
        assert!(config.validate().is_ok());

        config.collection.page_size = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_overrides() {
        env::set_var("MASTODON_SERVER", "https://plain.social");
        env::set_var("MASTODON_TOKEN", "plain_token");
        env::set_var("TOOTSTATS_MASTODON_ACCESS_TOKEN", "prefixed_token");
        env::set_var("TOOTSTATS_PAGE_SIZE", "20");
        env::set_var("TOOTSTATS_PAGE_DELAY_MS", "0");
        env::set_var("TOOTSTATS_LOG_LEVEL", "debug");

        let mut config = Config {
            mastodon: MastodonConfig::default(),
            collection: CollectionConfig::default(),
            logging: LoggingConfig::default(),
        };

        let result = config.apply_env_overrides();

        env::remove_var("MASTODON_SERVER");
        env::remove_var("MASTODON_TOKEN");
        env::remove_var("TOOTSTATS_MASTODON_ACCESS_TOKEN");
        env::remove_var("TOOTSTATS_PAGE_SIZE");
        env::remove_var("TOOTSTATS_PAGE_DELAY_MS");
        env::remove_var("TOOTSTATS_LOG_LEVEL");

        result.unwrap();
        assert_eq!(config.mastodon.instance_url, "https://plain.social");
        assert_eq!(config.mastodon.access_token, "prefixed_token");
        assert_eq!(config.collection.page_size, 20);
        assert_eq!(config.collection.page_delay_ms, 0);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_content = r#"
[mastodon]
instance_url = "https://mastodon.social"
access_token = "your_token_here"

[collection]
page_size = 25
page_delay_ms = 250
exclude_replies = false

[logging]
level = "warn"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.mastodon.instance_url, "https://mastodon.social");
        assert_eq!(config.mastodon.access_token, "your_token_here");
        assert_eq!(config.collection.page_size, 25);
        assert_eq!(config.collection.page_delay_ms, 250);
        assert!(config.collection.exclude_reblogs);
        assert!(!config.collection.exclude_replies);
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    fn test_toml_parsing_optional_sections() {
        let toml_content = r#"
[mastodon]
instance_url = "https://mastodon.social"
access_token = "your_token_here"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.collection, CollectionConfig::default());
        assert_eq!(config.log_level(), "info");
    }
}
