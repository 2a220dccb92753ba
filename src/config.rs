use crate::storage::{create_storage, SessionStorage, StorageError, StorageType};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

pub const KEYS: &[&str] = &[
    "server.host",
    "server.port",
    "storage.type",
    "storage.path",
    "session.cookie-name",
    "session.max-age",
];

const VALID_STORAGE_TYPES: &[&str] = &["memory", "json", "sqlite"];

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5003;
const DEFAULT_COOKIE_NAME: &str = "session_id";
/// 31 days.
const DEFAULT_MAX_AGE_SECS: u64 = 31 * 24 * 60 * 60;
/// Ten years.
const MAX_MAX_AGE_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn validate_host(value: &str) -> Result<(), ConfigError> {
    value.parse::<IpAddr>().map(|_| ()).map_err(|_| {
        ConfigError::InvalidConfig(format!("server.host must be an IP address: {}", value))
    })
}

fn validate_port(value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidConfig(
            "server.port must be an integer between 1 and 65535".to_string(),
        )),
    }
}

fn validate_storage_type(value: &str) -> Result<(), ConfigError> {
    if !VALID_STORAGE_TYPES.contains(&value) {
        return Err(ConfigError::InvalidConfig(format!(
            "storage.type must be one of: {}",
            VALID_STORAGE_TYPES.join(", ")
        )));
    }
    Ok(())
}

fn validate_storage_path(path: &str) -> Result<PathBuf, ConfigError> {
    if path.contains('\0') {
        return Err(ConfigError::InvalidConfig(
            "Path contains invalid characters".to_string(),
        ));
    }
    if path.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "Path cannot be empty".to_string(),
        ));
    }

    let path = PathBuf::from(shellexpand::tilde(path).as_ref());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ConfigError::InvalidConfig(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }
    }

    Ok(path)
}

fn validate_cookie_name(value: &str) -> Result<(), ConfigError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ConfigError::InvalidConfig(
            "session.cookie-name may only contain letters, digits, '-', '_' and '.'".to_string(),
        ));
    }
    Ok(())
}

fn validate_max_age(value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(secs) if (1..=MAX_MAX_AGE_SECS).contains(&secs) => Ok(secs),
        _ => Err(ConfigError::InvalidConfig(format!(
            "session.max-age must be a number of seconds between 1 and {}",
            MAX_MAX_AGE_SECS
        ))),
    }
}

/// Settings as stored on disk. Unset keys fall back to built-in defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
    #[serde(default)]
    pub cookie_name: Option<String>,
    /// Seconds a session survives without being written.
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl Config {
    pub fn with_defaults() -> Self {
        Self {
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            storage_type: Some(StorageType::Memory.as_str().to_string()),
            storage_path: Some(default_storage_path(StorageType::Memory)),
            cookie_name: Some(DEFAULT_COOKIE_NAME.to_string()),
            max_age: Some(DEFAULT_MAX_AGE_SECS),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref host) = self.host {
            validate_host(host)?;
        }
        if let Some(port) = self.port {
            validate_port(&port.to_string())?;
        }
        if let Some(ref storage_type) = self.storage_type {
            validate_storage_type(storage_type)?;
        }
        if let Some(ref path) = self.storage_path {
            validate_storage_path(path)?;
        }
        if let Some(ref name) = self.cookie_name {
            validate_cookie_name(name)?;
        }
        if let Some(secs) = self.max_age {
            validate_max_age(&secs.to_string())?;
        }
        Ok(())
    }

    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn storage_type(&self) -> Result<StorageType, ConfigError> {
        match self.storage_type.as_deref() {
            Some(value) => Ok(value.parse()?),
            None => Ok(StorageType::Memory),
        }
    }

    /// Tilde-expanded location of the session store.
    pub fn storage_path(&self) -> Result<PathBuf, ConfigError> {
        let path = match self.storage_path {
            Some(ref path) => path.clone(),
            None => default_storage_path(self.storage_type()?),
        };
        Ok(PathBuf::from(shellexpand::tilde(&path).as_ref()))
    }

    pub fn cookie_name(&self) -> String {
        self.cookie_name
            .clone()
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string())
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age.unwrap_or(DEFAULT_MAX_AGE_SECS))
    }
}

fn default_storage_path(storage_type: StorageType) -> String {
    match storage_type {
        StorageType::Sqlite => "~/.config/todo-lists/sessions.db".to_string(),
        StorageType::Memory | StorageType::Json => "~/.config/todo-lists/sessions".to_string(),
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::InvalidConfig("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".config").join("todo-lists").join("config.json"))
}

/// Reads and writes the JSON config file one key at a time.
pub struct ConfigManager {
    path: PathBuf,
    config: Config,
}

impl ConfigManager {
    pub fn new(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };

        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Config::default()
            } else {
                let config: Config = serde_json::from_str(&contents)?;
                config.validate()?;
                config
            }
        } else {
            Config::default()
        };

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// The explicitly configured value, if any.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let config = &self.config;
        let value = match key {
            "server.host" => config.host.clone(),
            "server.port" => config.port.map(|v| v.to_string()),
            "storage.type" => config.storage_type.clone(),
            "storage.path" => config.storage_path.clone(),
            "session.cookie-name" => config.cookie_name.clone(),
            "session.max-age" => config.max_age.map(|v| v.to_string()),
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut config = self.config.clone();

        match key {
            "server.host" => {
                validate_host(value)?;
                config.host = Some(value.to_string());
            }
            "server.port" => {
                config.port = Some(validate_port(value)?);
            }
            "storage.type" => {
                validate_storage_type(value)?;
                if config.storage_type.as_deref() != Some(value) {
                    tracing::warn!("changing storage type does not migrate existing sessions");
                }
                config.storage_type = Some(value.to_string());
            }
            "storage.path" => {
                let path = validate_storage_path(value)?;
                config.storage_path = Some(path.to_string_lossy().to_string());
            }
            "session.cookie-name" => {
                validate_cookie_name(value)?;
                config.cookie_name = Some(value.to_string());
            }
            "session.max-age" => {
                config.max_age = Some(validate_max_age(value)?);
            }
            _ => {
                return Err(ConfigError::InvalidKey(key.to_string()));
            }
        }
        config.validate()?;
        self.config = config;
        self.save()
    }

    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "server.host" => self.config.host = None,
            "server.port" => self.config.port = None,
            "storage.type" => self.config.storage_type = None,
            "storage.path" => self.config.storage_path = None,
            "session.cookie-name" => self.config.cookie_name = None,
            "session.max-age" => self.config.max_age = None,
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        }
        self.save()
    }

    /// Every key with its effective value, flagged `true` when it is the default.
    pub fn list(&self) -> Vec<(String, String, bool)> {
        let defaults = Config::with_defaults();
        let default_path =
            default_storage_path(self.config.storage_type().unwrap_or(StorageType::Memory));

        let entries = [
            ("server.host", self.config.host.clone(), defaults.host),
            (
                "server.port",
                self.config.port.map(|v| v.to_string()),
                defaults.port.map(|v| v.to_string()),
            ),
            (
                "storage.type",
                self.config.storage_type.clone(),
                defaults.storage_type,
            ),
            (
                "storage.path",
                self.config.storage_path.clone(),
                Some(default_path),
            ),
            (
                "session.cookie-name",
                self.config.cookie_name.clone(),
                defaults.cookie_name,
            ),
            (
                "session.max-age",
                self.config.max_age.map(|v| v.to_string()),
                defaults.max_age.map(|v| v.to_string()),
            ),
        ];

        entries
            .into_iter()
            .map(|(key, value, default)| match value {
                Some(value) => (key.to_string(), value, false),
                None => (
                    key.to_string(),
                    default.unwrap_or_else(|| "null".to_string()),
                    true,
                ),
            })
            .collect()
    }

    pub fn create_storage(&self) -> Result<Box<dyn SessionStorage>, ConfigError> {
        let storage_type = self.config.storage_type()?;
        let path = self.config.storage_path()?;
        Ok(create_storage(storage_type, &path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> (ConfigManager, tempfile::TempDir) {
        let temp_dir = tempfile::Builder::new()
            .prefix("todo_lists_test")
            .tempdir()
            .expect("Failed to create temporary directory");
        let manager = ConfigManager::new(Some(&temp_dir.path().join("config.json")))
            .expect("Failed to create config manager");
        (manager, temp_dir)
    }

    #[test]
    fn test_config_manager_set_and_get() {
        let (mut manager, temp_dir) = test_manager();

        assert!(manager.set("server.host", "0.0.0.0").is_ok());
        assert_eq!(manager.get("server.host").unwrap(), Some("0.0.0.0".to_string()));

        assert!(manager.set("server.port", "8080").is_ok());
        assert_eq!(manager.config().port(), 8080);

        assert!(manager.set("storage.type", "sqlite").is_ok());
        assert_eq!(manager.config().storage_type().unwrap(), StorageType::Sqlite);

        let storage_path = temp_dir.path().join("sessions.db");
        assert!(manager
            .set("storage.path", storage_path.to_str().unwrap())
            .is_ok());
        assert_eq!(manager.config().storage_path().unwrap(), storage_path);

        assert!(manager.set("session.cookie-name", "todo_session").is_ok());
        assert_eq!(manager.config().cookie_name(), "todo_session");

        assert!(manager.unset("server.host").is_ok());
        assert_eq!(manager.get("server.host").unwrap(), None);
        assert_eq!(manager.config().host(), "127.0.0.1");
    }

    #[test]
    fn test_config_manager_max_age() {
        let (mut manager, _temp_dir) = test_manager();
        manager.set("session.max-age", "3600").unwrap();
        assert_eq!(manager.get("session.max-age").unwrap(), Some("3600".to_string()));
        assert_eq!(manager.config().max_age(), Duration::from_secs(3600));

        let reloaded = ConfigManager::new(Some(manager.path())).unwrap();
        assert_eq!(reloaded.config().max_age(), Duration::from_secs(3600));

        manager.unset("session.max-age").unwrap();
        assert_eq!(manager.config().max_age(), Duration::from_secs(2_678_400));
    }

    #[test]
    fn test_config_manager_persists() {
        let (mut manager, _temp_dir) = test_manager();
        manager.set("server.port", "9000").unwrap();

        let reloaded = ConfigManager::new(Some(manager.path())).unwrap();
        assert_eq!(reloaded.config().port(), 9000);
    }

    #[test]
    fn test_config_manager_rejects_invalid_values() {
        let (mut manager, _temp_dir) = test_manager();

        assert!(matches!(
            manager.set("server.port", "0"),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(manager.set("server.port", "70000").is_err());
        assert!(manager.set("server.host", "not a host").is_err());
        assert!(manager.set("storage.type", "redis").is_err());
        assert!(manager.set("session.cookie-name", "bad name;").is_err());
        assert!(manager.set("session.max-age", "0").is_err());
        assert!(manager.set("session.max-age", "forever").is_err());
        assert!(manager.set("session.max-age", "999999999999").is_err());
        assert!(manager
            .set("storage.path", "/definitely/not/here/sessions")
            .is_err());
        assert!(matches!(
            manager.set("color", "blue"),
            Err(ConfigError::InvalidKey(_))
        ));
        assert!(matches!(
            manager.get("color"),
            Err(ConfigError::InvalidKey(_))
        ));

        // Nothing was written by the failed calls.
        assert_eq!(manager.config(), &Config::default());
    }

    #[test]
    fn test_config_manager_defaults() {
        let (manager, _temp_dir) = test_manager();
        let config = manager.config();

        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 5003);
        assert_eq!(config.storage_type().unwrap(), StorageType::Memory);
        assert_eq!(config.cookie_name(), "session_id");
        assert_eq!(config.max_age(), Duration::from_secs(2_678_400));
        assert!(manager.get("storage.type").unwrap().is_none());
    }

    #[test]
    fn test_config_manager_list() {
        let (mut manager, _temp_dir) = test_manager();
        manager.set("server.port", "8000").unwrap();

        let list = manager.list();
        assert_eq!(list.len(), KEYS.len());
        assert!(list
            .iter()
            .any(|(key, value, is_default)| key == "server.port" && value == "8000" && !is_default));
        assert!(list
            .iter()
            .any(|(key, value, is_default)| key == "storage.type" && value == "memory" && *is_default));
        assert!(list.iter().any(|(key, value, is_default)| {
            key == "storage.path" && value.ends_with("sessions") && *is_default
        }));
    }

    #[test]
    fn test_default_storage_path_follows_type() {
        let (mut manager, _temp_dir) = test_manager();
        manager.set("storage.type", "sqlite").unwrap();
        let path = manager.config().storage_path().unwrap();
        assert!(path.to_string_lossy().ends_with("sessions.db"));
        assert!(!path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_create_storage_from_config() {
        let (mut manager, temp_dir) = test_manager();
        manager.set("storage.type", "json").unwrap();
        manager
            .set(
                "storage.path",
                temp_dir.path().join("sessions").to_str().unwrap(),
            )
            .unwrap();

        assert!(manager.create_storage().is_ok());
        assert!(temp_dir.path().join("sessions").is_dir());
    }
}
