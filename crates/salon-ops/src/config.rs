//! # Salon Configuration
//!
//! Configuration for the reconciliation services and the console.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SALON_DB_PATH=/var/lib/salon/salon.db                              │
//! │     SALON_AUTOMATION_ENABLED=false                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/salon-pos/salon.toml (Linux)                             │
//! │     ~/Library/Application Support/com.salon.pos/salon.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loaded value is handed to the services that need it. Nothing reads
//! configuration from global state; changing a toggle means building a new
//! value and, if it should persist, calling [`SalonConfig::save`].
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "salon.db"
//! max_connections = 5
//!
//! [automation]
//! enabled = true
//! order_created = true
//! order_updated = true
//! order_deleted = false
//!
//! [logging]
//! filter = "info,salon_ops=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use salon_db::DbConfig;

use crate::error::{OpsError, OpsResult};

// =============================================================================
// Database Settings
// =============================================================================

/// Where the store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a free connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("salon.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Automation Settings
// =============================================================================

/// Client messaging toggles for order events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationSettings {
    /// Master switch.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub order_created: bool,

    #[serde(default = "default_true")]
    pub order_updated: bool,

    #[serde(default = "default_true")]
    pub order_deleted: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AutomationSettings {
    fn default() -> Self {
        AutomationSettings {
            enabled: true,
            order_created: true,
            order_updated: true,
            order_deleted: true,
        }
    }
}

/// Order events a client can be messaged about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEvent::Created => write!(f, "order_created"),
            OrderEvent::Updated => write!(f, "order_updated"),
            OrderEvent::Deleted => write!(f, "order_deleted"),
        }
    }
}

impl AutomationSettings {
    /// Returns true if messages for `event` should be sent.
    pub fn allows(&self, event: OrderEvent) -> bool {
        self.enabled
            && match event {
                OrderEvent::Created => self.order_created,
                OrderEvent::Updated => self.order_updated,
                OrderEvent::Deleted => self.order_deleted,
            }
    }

    /// Everything off.
    pub fn disabled() -> Self {
        AutomationSettings {
            enabled: false,
            ..Default::default()
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

/// Log filter used when `RUST_LOG` is not set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalonConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub automation: AutomationSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl SalonConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (salon.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> OpsResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading salon config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load salon config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file and returns the path written.
    pub fn save(&self, config_path: Option<PathBuf>) -> OpsResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| OpsError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OpsError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| OpsError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Salon config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OpsResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(OpsError::InvalidConfig("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(OpsError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(OpsError::InvalidConfig("logging.filter must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `SALON_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("SALON_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("SALON_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid SALON_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(enabled) = lookup("SALON_AUTOMATION_ENABLED") {
            match parse_bool(&enabled) {
                Some(b) => {
                    debug!(enabled = b, "Overriding automation switch from environment");
                    self.automation.enabled = b;
                }
                None => warn!(value = %enabled, "Ignoring invalid SALON_AUTOMATION_ENABLED"),
            }
        }

        if let Some(filter) = lookup("SALON_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "salon", "pos")
            .map(|dirs| dirs.config_dir().join("salon.toml"))
    }

    /// Database settings as a pool configuration.
    pub fn db_config(&self) -> DbConfig {
        if self.database.path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .connect_timeout(std::time::Duration::from_secs(
                self.database.connect_timeout_secs,
            ))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SalonConfig::default();
        assert_eq!(config.database.path, PathBuf::from("salon.db"));
        assert_eq!(config.database.max_connections, 5);
        assert!(config.automation.allows(OrderEvent::Created));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SalonConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 2;
        config.logging.filter = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_automation_toggles() {
        let mut automation = AutomationSettings::default();
        automation.order_deleted = false;
        assert!(automation.allows(OrderEvent::Updated));
        assert!(!automation.allows(OrderEvent::Deleted));

        let off = AutomationSettings::disabled();
        assert!(!off.allows(OrderEvent::Created));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("salon.toml");

        let mut config = SalonConfig::default();
        config.database.path = PathBuf::from("/srv/salon/prod.db");
        config.automation.order_updated = false;
        config.logging.filter = "debug".to_string();

        let written = config.save(Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[database]"));
        assert!(contents.contains("[automation]"));

        let loaded: SalonConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.database.path, PathBuf::from("/srv/salon/prod.db"));
        assert!(!loaded.automation.order_updated);
        assert_eq!(loaded.logging.filter, "debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: SalonConfig = toml::from_str("[automation]\norder_created = false\n").unwrap();
        assert!(!config.automation.order_created);
        assert!(config.automation.enabled);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_invalid_toml_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salon.toml");
        std::fs::write(&path, "[database\npath = ").unwrap();

        let err = SalonConfig::load(Some(path)).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SALON_DB_PATH", "/tmp/override.db"),
            ("SALON_DB_MAX_CONNECTIONS", "9"),
            ("SALON_AUTOMATION_ENABLED", "off"),
            ("SALON_LOG", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = SalonConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.database.max_connections, 9);
        assert!(!config.automation.enabled);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = SalonConfig::default();
        config.apply_overrides(|k| match k {
            "SALON_DB_MAX_CONNECTIONS" => Some("many".to_string()),
            "SALON_AUTOMATION_ENABLED" => Some("perhaps".to_string()),
            _ => None,
        });
        assert_eq!(config.database.max_connections, 5);
        assert!(config.automation.enabled);
    }

    #[test]
    fn test_memory_path_maps_to_in_memory_pool() {
        let mut config = SalonConfig::default();
        config.database.path = PathBuf::from(":memory:");
        assert!(config.db_config().is_in_memory());
    }
}
