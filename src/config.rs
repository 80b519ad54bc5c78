use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GmailError, Result};

/// Environment variable that overrides `responder.owner_address`
pub const OWNER_ENV_VAR: &str = "AUTOREPLY_OWNER";

/// Upper bound on `poll.batch_size`, the Gmail list page limit
pub const MAX_BATCH_SIZE: u32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub responder: ResponderConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Mailbox owner's address; mail from it is never auto-replied
    #[serde(default)]
    pub owner_address: String,
    /// Label applied to messages after they have been answered
    #[serde(default = "default_label_name")]
    pub label_name: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            owner_address: String::new(),
            label_name: default_label_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Only messages carrying all of these labels are polled
    #[serde(default = "default_label_filter")]
    pub label_filter: Vec<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            label_filter: default_label_filter(),
        }
    }
}

fn default_label_name() -> String {
    "replied".to_string()
}

fn default_batch_size() -> u32 {
    1
}

fn default_min_interval_ms() -> u64 {
    45_000
}

fn default_max_interval_ms() -> u64 {
    120_000
}

fn default_label_filter() -> Vec<String> {
    vec![crate::models::INBOX_LABEL.to_string()]
}

impl Config {
    /// Load from TOML. A missing file yields the defaults; nothing is validated
    /// here because CLI and environment overrides are applied afterwards.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GmailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    GmailError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GmailError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Apply the owner override: an explicit flag beats the environment,
    /// which beats the file
    pub fn apply_owner_override(&mut self, flag: Option<&str>) {
        let env_owner = std::env::var(OWNER_ENV_VAR).ok();
        if let Some(owner) = flag.map(str::to_string).or(env_owner) {
            let owner = owner.trim().to_string();
            if !owner.is_empty() {
                self.responder.owner_address = owner;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.responder.owner_address.trim().is_empty() {
            return Err(GmailError::ConfigError(format!(
                "responder.owner_address must be set (config file, --owner or {})",
                OWNER_ENV_VAR
            )));
        }

        if self.responder.label_name.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "responder.label_name cannot be empty".to_string(),
            ));
        }

        if self.poll.batch_size == 0 {
            return Err(GmailError::ConfigError(
                "poll.batch_size must be at least 1".to_string(),
            ));
        }
        if self.poll.batch_size > MAX_BATCH_SIZE {
            return Err(GmailError::ConfigError(format!(
                "poll.batch_size cannot exceed {}",
                MAX_BATCH_SIZE
            )));
        }

        if self.poll.min_interval_ms == 0 {
            return Err(GmailError::ConfigError(
                "poll.min_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.poll.min_interval_ms > self.poll.max_interval_ms {
            return Err(GmailError::ConfigError(
                "poll.min_interval_ms cannot exceed poll.max_interval_ms".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let mut config = Self::default();
        config.responder.owner_address = "you@example.com".to_string();
        config.save(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.responder.owner_address = "owner@example.com".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.responder.owner_address, "");
        assert_eq!(config.responder.label_name, "replied");
        assert_eq!(config.poll.batch_size, 1);
        assert_eq!(config.poll.min_interval_ms, 45_000);
        assert_eq!(config.poll.max_interval_ms, 120_000);
        assert_eq!(config.poll.label_filter, vec!["INBOX".to_string()]);
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_requires_owner() {
        let result = Config::default().validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("owner_address must be set"));
    }

    #[test]
    fn test_config_validation_empty_label() {
        let mut config = valid_config();
        config.responder.label_name = "  ".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("label_name cannot be empty"));
    }

    #[test]
    fn test_config_validation_batch_size_bounds() {
        let mut config = valid_config();

        config.poll.batch_size = 0;
        assert!(config.validate().unwrap_err().to_string().contains("at least 1"));

        config.poll.batch_size = MAX_BATCH_SIZE + 1;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot exceed 500"));

        config.poll.batch_size = MAX_BATCH_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_interval_order() {
        let mut config = valid_config();

        config.poll.min_interval_ms = 0;
        assert!(config.validate().is_err());

        config.poll.min_interval_ms = 130_000;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot exceed poll.max_interval_ms"));

        config.poll.min_interval_ms = 120_000;
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(config.responder.label_name, "replied");
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("autoreply.toml");
        tokio::fs::write(
            &path,
            "[responder]\nowner_address = \"me@example.com\"\n\n[poll]\nbatch_size = 10\n",
        )
        .await
        .unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.responder.owner_address, "me@example.com");
        assert_eq!(config.responder.label_name, "replied");
        assert_eq!(config.poll.batch_size, 10);
        assert_eq!(config.poll.max_interval_ms, 120_000);
    }

    #[tokio::test]
    async fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "[poll\nbatch_size = ").await.unwrap();

        let result = Config::load(&path).await;
        assert!(matches!(result, Err(GmailError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_example_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/autoreply.toml");

        Config::create_example(&path).await.unwrap();
        let loaded = Config::load(&path).await.unwrap();
        assert_eq!(loaded.responder.owner_address, "you@example.com");
        assert!(loaded.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_owner_override_precedence() {
        std::env::set_var(OWNER_ENV_VAR, "env@example.com");

        let mut config = valid_config();
        config.apply_owner_override(None);
        assert_eq!(config.responder.owner_address, "env@example.com");

        config.apply_owner_override(Some("flag@example.com"));
        assert_eq!(config.responder.owner_address, "flag@example.com");

        std::env::remove_var(OWNER_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_owner_override_keeps_file_value() {
        std::env::remove_var(OWNER_ENV_VAR);

        let mut config = valid_config();
        config.apply_owner_override(None);
        assert_eq!(config.responder.owner_address, "owner@example.com");

        config.apply_owner_override(Some("   "));
        assert_eq!(config.responder.owner_address, "owner@example.com");
    }
}
