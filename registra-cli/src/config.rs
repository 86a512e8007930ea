use registra_core::RegistrationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "REGISTRA_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "REGISTRA_LOG_LEVEL";

/// CLI configuration loaded from YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub registration: RegistrationConfig,
    pub storage: StorageSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub drafts_db: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            drafts_db: "drafts.redb".to_string(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: CliConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with priority: env vars > config file > defaults.
    /// The registration rules are checked before the config is returned.
    pub fn load(config_path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if let Some(path) = config_path {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.registration.validate()?;

        Ok(config)
    }

    /// Resolve the config for a CLI run.
    ///
    /// An `explicit` file must load and validate. The `implicit` default file
    /// is only used when present; if it fails, defaults are used and the
    /// failure comes back as the second element for the caller to log.
    pub fn resolve(
        explicit: Option<&Path>,
        implicit: &Path,
    ) -> Result<(Self, Option<String>), Box<dyn std::error::Error>> {
        if let Some(path) = explicit {
            return Ok((Self::load(Some(path))?, None));
        }
        if !implicit.exists() {
            return Ok((Self::load(None)?, None));
        }
        match Self::load(Some(implicit)) {
            Ok(config) => Ok((config, None)),
            Err(e) => Ok((Self::load(None)?, Some(e.to_string()))),
        }
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(data_dir) = lookup(DATA_DIR_ENV) {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log.level = level;
        }
    }

    /// Get the full path to the drafts database
    pub fn drafts_db_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.drafts_db)
    }
}
