use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use taskdeck_core::Provider;
use taskdeck_store_fs::is_valid_key;

const CONFIG_FILE: &str = "config.toml";
const STORAGE_DIR: &str = "store";

/// Application configuration loaded from `<data-dir>/config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a data directory. A missing file yields defaults.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = data_dir.as_ref().join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("failed to parse {}", config_path.display()))
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory holding the durable snapshots.
    pub fn storage_dir(&self, data_dir: impl AsRef<Path>) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(|| data_dir.as_ref().join(STORAGE_DIR))
    }

    fn validate(&self) -> Result<()> {
        self.storage.ensure_valid_keys()
    }
}

/// Storage keys and location.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the snapshot directory (defaults to `<data-dir>/store`).
    pub dir: Option<PathBuf>,
    /// Key holding the todo collection.
    pub todos_key: String,
    /// Key holding the current session.
    pub session_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            todos_key: "todos".into(),
            session_key: "user".into(),
        }
    }
}

impl StorageConfig {
    fn ensure_valid_keys(&self) -> Result<()> {
        for key in [&self.todos_key, &self.session_key] {
            if !is_valid_key(key) {
                bail!("storage key '{key}' must be non-empty and use only [A-Za-z0-9_.-]");
            }
        }
        if self.todos_key == self.session_key {
            bail!("todos_key and session_key must differ (both are '{}')", self.todos_key);
        }
        Ok(())
    }
}

/// Mock sign-in settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Simulated round-trip for demo sign-in.
    pub demo_delay_ms: u64,
    /// Simulated round-trip for Google sign-in.
    pub google_delay_ms: u64,
    /// Display name given to mock accounts.
    pub display_name: String,
    /// Email given to mock accounts.
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            demo_delay_ms: 1_000,
            google_delay_ms: 1_500,
            display_name: "Your Name".into(),
            email: "your.email@example.invalid".into(),
        }
    }
}

impl IdentityConfig {
    /// Configuration without artificial latency (used mainly in tests).
    #[must_use]
    pub fn instant() -> Self {
        Self {
            demo_delay_ms: 0,
            google_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Simulated latency for a provider.
    #[must_use]
    pub const fn delay_for(&self, provider: Provider) -> Duration {
        match provider {
            Provider::Demo => Duration::from_millis(self.demo_delay_ms),
            Provider::Google => Duration::from_millis(self.google_delay_ms),
        }
    }
}

/// Telemetry forwarding switch.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Forward user context and breadcrumbs.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::with_prefix("taskdeck-config-")
            .unwrap_or_else(|err| panic!("create temp dir: {err}"));
        let config = AppConfig::load(dir.path()).unwrap_or_else(|err| panic!("load: {err}"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.todos_key, "todos");
        assert_eq!(config.storage.session_key, "user");
        assert_eq!(config.storage_dir(dir.path()), dir.path().join("store"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [identity]
            demo_delay_ms = 0

            [telemetry]
            enabled = true
            "#,
        )
        .unwrap_or_else(|err| panic!("parse: {err}"));

        assert_eq!(config.identity.delay_for(Provider::Demo), Duration::ZERO);
        assert_eq!(
            config.identity.delay_for(Provider::Google),
            Duration::from_millis(1_500)
        );
        assert!(config.telemetry.enabled);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn load_reads_file_from_data_dir() {
        let dir = tempfile::TempDir::with_prefix("taskdeck-config-")
            .unwrap_or_else(|err| panic!("create temp dir: {err}"));
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[storage]\ntodos_key = \"tasks\"\ndir = \"/var/lib/taskdeck\"\n",
        )
        .unwrap_or_else(|err| panic!("write config: {err}"));

        let config = AppConfig::load(dir.path()).unwrap_or_else(|err| panic!("load: {err}"));
        assert_eq!(config.storage.todos_key, "tasks");
        assert_eq!(config.storage_dir(dir.path()), PathBuf::from("/var/lib/taskdeck"));
    }

    #[test]
    fn rejects_colliding_keys() {
        let err = AppConfig::from_toml("[storage]\ntodos_key = \"user\"\n")
            .err()
            .unwrap_or_else(|| panic!("colliding keys must be rejected"));
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn rejects_path_like_keys() {
        assert!(AppConfig::from_toml("[storage]\nsession_key = \"../user\"\n").is_err());
        assert!(AppConfig::from_toml("[storage]\ntodos_key = \"\"\n").is_err());
    }
}
