//! Configuration file management.

use std::path::{Path, PathBuf};

use poa_rewards::scheduler::DEFAULT_IMPLEMENTATION;
use poa_rewards::RewardParams;
use poa_types::{Address, SYSTEM_ADDRESS};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "POA_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Scheduler parameters.
    #[serde(default)]
    pub rewards: RewardParams,
    /// Who may trigger rewards.
    #[serde(default)]
    pub access: AccessConfig,
    /// Which implementation runs and who may replace it.
    #[serde(default)]
    pub upgrade: UpgradeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Access control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// The only caller allowed to trigger a distribution.
    #[serde(default = "default_system_address")]
    pub system_address: Address,
    /// Upgrade authority recorded when the database is first initialized.
    #[serde(default)]
    pub proxy_storage: Address,
}

/// Upgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Name of the reward implementation to attach.
    #[serde(default = "default_implementation")]
    pub implementation: String,
    /// Account performing an upgrade on startup when the database is bound
    /// to a different implementation. Unset means such a start fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Address>,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Validator set file, relative to the data directory unless absolute.
    #[serde(default = "default_validators_file")]
    pub validators_file: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error". `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds between reward calls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_system_address() -> Address {
    SYSTEM_ADDRESS
}

fn default_implementation() -> String {
    DEFAULT_IMPLEMENTATION.to_string()
}

fn default_validators_file() -> String {
    "validators.toml".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            system_address: default_system_address(),
            proxy_storage: Address::ZERO,
        }
    }
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            implementation: default_implementation(),
            caller: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            validators_file: default_validators_file(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&content)?;
        config.rewards.validate()?;
        if config.advanced.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be positive");
        }
        Ok(config)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the validator set file path.
    pub fn validators_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.storage.validators_file);
        if file.is_absolute() {
            file
        } else {
            self.data_dir().join(file)
        }
    }

    /// `tracing` filter directives for the configured level.
    pub fn log_directives(&self) -> String {
        let level = &self.advanced.log_level;
        ["poa_daemon", "poa_rewards", "poa_registry", "poa_db"]
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".poa-rewards"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/poa-rewards"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poa_rewards::RefreshPolicy;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.rewards, RewardParams::default());
        assert_eq!(config.access.system_address, SYSTEM_ADDRESS);
        assert_eq!(config.upgrade.implementation, DEFAULT_IMPLEMENTATION);
        assert!(config.upgrade.caller.is_none());
        assert_eq!(config.storage.validators_file, "validators.toml");
        assert_eq!(config.advanced.poll_interval_secs, 5);
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed.rewards, config.rewards);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[rewards]
threshold_secs = 10
block_reward = "2000000000000000000"
treasury_address = "0x00000000000000000000000000000000000000aa"
refresh_policy = "on_wrap"

[access]
proxy_storage = "0x0000000000000000000000000000000000000008"

[upgrade]
implementation = "reward-by-time-v2"
caller = "0x0000000000000000000000000000000000000008"

[storage]
data_dir = "/var/lib/poa"
"#,
        )
        .expect("write");

        let config = DaemonConfig::load_from(&path).expect("load");
        assert_eq!(config.rewards.threshold_secs, 10);
        assert_eq!(config.rewards.block_reward, 2_000_000_000_000_000_000);
        assert_eq!(config.rewards.treasury_address, Address::from_low_u64(0xaa));
        assert_eq!(config.rewards.refresh_policy, RefreshPolicy::OnWrap);
        assert_eq!(config.access.system_address, SYSTEM_ADDRESS);
        assert_eq!(config.upgrade.caller, Some(Address::from_low_u64(8)));
        assert_eq!(
            config.validators_path(),
            PathBuf::from("/var/lib/poa/validators.toml")
        );
    }

    #[test]
    fn test_load_rejects_zero_threshold() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[rewards]\nthreshold_secs = 0\n").expect("write");
        assert!(DaemonConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_absolute_validators_file() {
        let mut config = DaemonConfig::default();
        config.storage.validators_file = "/etc/poa/validators.toml".into();
        assert_eq!(
            config.validators_path(),
            PathBuf::from("/etc/poa/validators.toml")
        );
    }

    #[test]
    fn test_log_directives() {
        let mut config = DaemonConfig::default();
        config.advanced.log_level = "debug".into();
        let directives = config.log_directives();
        assert!(directives.contains("poa_rewards=debug"));
        assert!(directives.contains("poa_db=debug"));
    }
}
