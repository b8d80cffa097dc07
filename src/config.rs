// Settings file for the automation daemon and CLI
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::{ConfigDefaults, MIN_INTERVAL_SECONDS};

pub const DEFAULT_SETTINGS_FILE: &str = "automation.toml";
pub const TOKEN_ENV_VAR: &str = "SPACETRADERS_TOKEN";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),

    #[error("no agent token: {} is unreadable ({source}) and SPACETRADERS_TOKEN is not set", .path.display())]
    MissingToken {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub automation: AutomationDefaults,
    pub timing: TimingSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// SpaceTraders API root, without trailing slash
    pub base_url: String,
    /// File holding the agent bearer token
    pub token_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for the configs / run flags / status JSON files
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationDefaults {
    /// Trade good mined and sold when a ship is started without a config
    pub default_trade_symbol: String,
    /// Polling interval for defaulted configs (floored to 5 at runtime)
    pub default_interval_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// How often the daemon re-reads run flags and configs written by the CLI
    pub store_sync_interval_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 0 = warnings only, 1 = info, 2 = debug
    pub verbosity: u8,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: crate::API_BASE_URL.to_string(),
            token_file: crate::AGENT_TOKEN_FILE.to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            directory: "storage".to_string(),
        }
    }
}

impl Default for AutomationDefaults {
    fn default() -> Self {
        let defaults = ConfigDefaults::default();
        Self {
            default_trade_symbol: defaults.trade_symbol,
            default_interval_seconds: defaults.interval_seconds,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            store_sync_interval_seconds: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { verbosity: 1 }
    }
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            storage: StorageSettings::default(),
            automation: AutomationDefaults::default(),
            timing: TimingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AutomationSettings {
    /// Load settings from file, creating the default file if it doesn't exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if path.exists() {
            info!(path = %path.display(), "📋 Loading settings");
            let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })
        } else {
            info!(path = %path.display(), "📋 Creating default settings");
            let settings = Self::default();
            settings.save(path)?;
            Ok(settings)
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let io_error = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_error)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.api.base_url.trim().is_empty() {
            return Err(SettingsError::Invalid("api.base_url must not be empty".to_string()));
        }
        if self.storage.directory.trim().is_empty() {
            return Err(SettingsError::Invalid("storage.directory must not be empty".to_string()));
        }
        if self.automation.default_trade_symbol.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "automation.default_trade_symbol must not be empty".to_string(),
            ));
        }
        if self.timing.store_sync_interval_seconds == 0 {
            return Err(SettingsError::Invalid(
                "timing.store_sync_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.logging.verbosity > 2 {
            return Err(SettingsError::Invalid("logging.verbosity must be 0, 1 or 2".to_string()));
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        info!("📋 Settings summary:");
        info!("   🌐 API: {}", self.api.base_url);
        info!("   💾 Storage: {}", self.storage.directory);
        info!(
            "   ⛏️ Defaults: {} every {}s",
            self.automation.default_trade_symbol,
            self.automation.default_interval_seconds.max(MIN_INTERVAL_SECONDS)
        );
        info!("   🔄 Store sync: {}s", self.timing.store_sync_interval_seconds);
    }

    pub fn config_defaults(&self) -> ConfigDefaults {
        ConfigDefaults {
            trade_symbol: self.automation.default_trade_symbol.clone(),
            interval_seconds: self.automation.default_interval_seconds,
        }
    }

    /// Token from the token file, falling back to `SPACETRADERS_TOKEN`.
    pub fn load_token(&self) -> Result<String, SettingsError> {
        let path = PathBuf::from(&self.api.token_file);
        match fs::read_to_string(&path) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Ok(_) => token_from_env().ok_or_else(|| SettingsError::MissingToken {
                path,
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "token file is empty"),
            }),
            Err(source) => token_from_env().ok_or(SettingsError::MissingToken { path, source }),
        }
    }
}

fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV_VAR)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_SETTINGS_FILE);

        let settings = AutomationSettings::load_or_create(&path).unwrap();
        assert_eq!(settings, AutomationSettings::default());
        assert!(path.exists());

        let reloaded = AutomationSettings::load_or_create(&path).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        fs::write(&path, "[automation]\ndefault_trade_symbol = \"COPPER_ORE\"\n").unwrap();

        let settings = AutomationSettings::load_or_create(&path).unwrap();
        assert_eq!(settings.automation.default_trade_symbol, "COPPER_ORE");
        assert_eq!(settings.automation.default_interval_seconds, 15);
        assert_eq!(settings.api.base_url, crate::API_BASE_URL);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        fs::write(&path, "[timing\n").unwrap();

        let result = AutomationSettings::load_or_create(&path);
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn validation_rejects_zero_sync_interval() {
        let mut settings = AutomationSettings::default();
        settings.timing.store_sync_interval_seconds = 0;
        assert!(settings.validate().is_err());

        assert!(AutomationSettings::default().validate().is_ok());
    }

    #[test]
    fn token_is_trimmed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("AGENT_TOKEN");
        fs::write(&token_path, "  eyJtoken\n").unwrap();

        let mut settings = AutomationSettings::default();
        settings.api.token_file = token_path.display().to_string();
        assert_eq!(settings.load_token().unwrap(), "eyJtoken");
    }

    #[test]
    fn config_defaults_follow_settings() {
        let mut settings = AutomationSettings::default();
        settings.automation.default_trade_symbol = "SILICON_CRYSTALS".to_string();
        settings.automation.default_interval_seconds = 30;

        let defaults = settings.config_defaults();
        assert_eq!(defaults.trade_symbol, "SILICON_CRYSTALS");
        assert_eq!(defaults.interval_seconds, 30);
    }
}
