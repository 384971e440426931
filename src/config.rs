use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::RetryPolicy;

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(stripped) = s.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if s == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Configuration for checkout-snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Directory holding config.json and the clients/ directories
    #[serde(default = "defaults::default_state_dir")]
    pub state_dir: PathBuf,
    /// Total attempts for each SNAPSHOT write
    #[serde(default = "defaults::default_write_attempts")]
    pub write_attempts: u32,
    /// Delay between SNAPSHOT write attempts
    #[serde(default = "defaults::default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            state_dir: defaults::default_state_dir(),
            write_attempts: defaults::default_write_attempts(),
            retry_delay_ms: defaults::default_retry_delay_ms(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from the config file, if any, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        tracing::debug!("loading checkout-snapshot config from {:?}", config_path);
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = env::var("CHECKOUT_SNAPSHOT_STATE_DIR") {
            self.state_dir = expand_tilde(&PathBuf::from(path));
        }

        if let Ok(attempts) = env::var("CHECKOUT_SNAPSHOT_WRITE_ATTEMPTS") {
            self.write_attempts = attempts
                .parse()
                .context("Failed to parse CHECKOUT_SNAPSHOT_WRITE_ATTEMPTS as u32")?;
        }

        if let Ok(delay) = env::var("CHECKOUT_SNAPSHOT_RETRY_DELAY_MS") {
            self.retry_delay_ms = delay
                .parse()
                .context("Failed to parse CHECKOUT_SNAPSHOT_RETRY_DELAY_MS as u64")?;
        }

        Ok(self)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: ToolConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.state_dir = expand_tilde(&config.state_dir);

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get default config file path
    pub fn config_file_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".config/checkout-snapshot/config.yaml"))
            .context("Could not determine home directory for config file")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_attempts(self.write_attempts)
            .with_delay(Duration::from_millis(self.retry_delay_ms))
    }
}

mod defaults {
    use std::path::PathBuf;

    pub(crate) fn default_state_dir() -> PathBuf {
        super::expand_tilde(&PathBuf::from("~/.eden"))
    }

    pub(crate) fn default_write_attempts() -> u32 {
        3
    }

    pub(crate) fn default_retry_delay_ms() -> u64 {
        1
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");

        let config = ToolConfig {
            state_dir: dir.path().join("state"),
            write_attempts: 5,
            retry_delay_ms: 20,
        };
        config.save(&config_path).unwrap();

        let loaded = ToolConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "write_attempts: 7\n").unwrap();

        let loaded = ToolConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.write_attempts, 7);
        assert_eq!(loaded.retry_delay_ms, 1);
        assert_eq!(loaded.state_dir, defaults::default_state_dir());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "write_attemps: 7\n").unwrap();

        assert!(ToolConfig::load_from_file(&config_path).is_err());
    }

    #[test]
    fn test_tilde_expansion() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "state_dir: ~/checkouts\n").unwrap();

        let loaded = ToolConfig::load_from_file(&config_path).unwrap();

        if let Some(home) = dirs::home_dir() {
            assert_eq!(loaded.state_dir, home.join("checkouts"));
        }
    }

    #[test]
    fn test_env_override() {
        env::set_var("CHECKOUT_SNAPSHOT_WRITE_ATTEMPTS", "9");
        env::set_var("CHECKOUT_SNAPSHOT_RETRY_DELAY_MS", "250");

        let config = ToolConfig::default().with_env_overrides().unwrap();
        assert_eq!(config.write_attempts, 9);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy {
                attempts: 9,
                delay: Duration::from_millis(250),
            }
        );

        env::remove_var("CHECKOUT_SNAPSHOT_WRITE_ATTEMPTS");
        env::remove_var("CHECKOUT_SNAPSHOT_RETRY_DELAY_MS");
    }
}
