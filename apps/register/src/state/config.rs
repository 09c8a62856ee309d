//! # Register Configuration
//!
//! Process-level settings loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAFE_DB_PATH=/var/lib/cafe/cafe.db                                 │
//! │     CAFE_ADMIN_PASSWORD=...                                            │
//! │     CAFE_MAX_CONNECTIONS=5                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path> or CAFE_CONFIG, else                               │
//! │     ~/.config/cafe-register/register.toml (Linux)                      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business settings (cafe name, currency, receipt texts) are not here;
//! they live in the `settings` table and are edited from the register.
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! [database]
//! path = "/var/lib/cafe/cafe.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [admin]
//! default_password = "change-me"
//!
//! [receipt]
//! width = 42
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use cafe_core::receipt::MIN_RECEIPT_WIDTH;
use cafe_core::validation::validate_password;
use cafe_db::DbConfig;

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "register.toml";

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite file. Defaults to `cafe.db` in the platform data directory.
    pub path: Option<PathBuf>,

    pub max_connections: u32,

    pub connect_timeout_secs: u64,

    pub busy_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_busy_timeout_secs() -> u64 {
    5
}

/// `[admin]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminSection {
    /// Password for the `admin` account created when no users exist.
    pub default_password: String,
}

impl Default for AdminSection {
    fn default() -> Self {
        AdminSection {
            default_password: default_admin_password(),
        }
    }
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

/// `[receipt]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReceiptSection {
    /// Columns of the plain-text receipt (42 fits 80mm paper).
    pub width: usize,
}

impl Default for ReceiptSection {
    fn default() -> Self {
        ReceiptSection {
            width: default_receipt_width(),
        }
    }
}

fn default_receipt_width() -> usize {
    42
}

// =============================================================================
// Register Config
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegisterConfig {
    pub database: DatabaseSection,
    pub admin: AdminSection,
    pub receipt: ReceiptSection,
}

impl RegisterConfig {
    /// Loads configuration: defaults, then the TOML file (if present), then
    /// environment overrides. The result is validated.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        validate_password(&self.admin.default_password)
            .map_err(|e| ConfigError::Invalid(format!("admin.default_password: {}", e)))?;

        if self.receipt.width < MIN_RECEIPT_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "receipt.width must be at least {}",
                MIN_RECEIPT_WIDTH
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("CAFE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(password) = std::env::var("CAFE_ADMIN_PASSWORD") {
            self.admin.default_password = password;
        }

        if let Ok(max) = std::env::var("CAFE_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse::<u32>() {
                self.database.max_connections = n;
            }
        }
    }

    /// `register.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// The database file: configured path, else `cafe.db` in the platform
    /// data directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("cafe.db")))
            .unwrap_or_else(|| PathBuf::from("cafe.db"))
    }

    /// Translates the `[database]` section into pool settings.
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path())
            .max_connections(self.database.max_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "cafe", "cafe-register")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RegisterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.receipt.width, 42);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = RegisterConfig::from_toml(
            r#"
            [database]
            path = "/tmp/cafe-test.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/cafe-test.db")));
        assert_eq!(config.database.busy_timeout_secs, 5);
        assert_eq!(config.admin.default_password, "admin123");

        let db = config.to_db_config();
        assert_eq!(db.database_path, PathBuf::from("/tmp/cafe-test.db"));
        assert_eq!(db.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = RegisterConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = RegisterConfig::default();
        config.receipt.width = 10;
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.admin.default_password = "123".to_string();
        assert!(config.validate().is_err());

        assert!(matches!(
            RegisterConfig::from_toml("[database]\nmax_connections = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
