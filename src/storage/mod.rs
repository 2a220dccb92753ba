use crate::models::{SessionData, StoreError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub(crate) mod test_utils;

pub mod json;
pub mod memory;
mod migrations;
pub mod sqlite;

pub use json::JsonStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid session data: {0}")]
    InvalidData(#[from] StoreError),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Opaque key of one session, always a hyphenated lowercase UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns `None` for anything that is not a UUID.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim())
            .ok()
            .map(|uuid| Self(uuid.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Memory,
    Json,
    Sqlite,
}

impl StorageType {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageType::Memory => "memory",
            StorageType::Json => "json",
            StorageType::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageType::Memory),
            "json" => Ok(StorageType::Json),
            "sqlite" => Ok(StorageType::Sqlite),
            _ => Err(StorageError::Storage(format!("Unknown storage type: {}", s))),
        }
    }
}

/// Where session data lives between requests.
pub trait SessionStorage: Send + Sync {
    fn load(&self, token: &SessionToken) -> Result<Option<SessionData>, StorageError>;
    fn save(&self, token: &SessionToken, data: &SessionData) -> Result<(), StorageError>;
    fn delete(&self, token: &SessionToken) -> Result<(), StorageError>;
    /// Removes every session last written before `cutoff` and returns how
    /// many went away.
    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError>;
}

/// `path` is a directory for [`StorageType::Json`], a database file for
/// [`StorageType::Sqlite`], and ignored for [`StorageType::Memory`].
pub fn create_storage(
    storage_type: StorageType,
    path: &Path,
) -> Result<Box<dyn SessionStorage>, StorageError> {
    tracing::info!(
        storage = storage_type.as_str(),
        path = %path.display(),
        "opening session storage"
    );
    match storage_type {
        StorageType::Memory => Ok(Box::new(MemoryStorage::new())),
        StorageType::Json => {
            let storage = JsonStorage::new(path)?;
            Ok(Box::new(storage))
        }
        StorageType::Sqlite => {
            let storage = SqliteStorage::open(path)?;
            Ok(Box::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::sample_session;

    #[test]
    fn test_session_token_parse() {
        let token = SessionToken::generate();
        assert_eq!(SessionToken::parse(token.as_str()), Some(token.clone()));
        assert_eq!(
            SessionToken::parse(&token.as_str().to_uppercase()),
            Some(token)
        );
        assert_eq!(SessionToken::parse("../../etc/passwd"), None);
        assert_eq!(SessionToken::parse(""), None);
    }

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!("memory".parse::<StorageType>().unwrap(), StorageType::Memory);
        assert_eq!("JSON".parse::<StorageType>().unwrap(), StorageType::Json);
        assert_eq!("sqlite".parse::<StorageType>().unwrap(), StorageType::Sqlite);
        assert!("redis".parse::<StorageType>().is_err());
    }

    #[test]
    fn test_storage_factory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let token = SessionToken::generate();
        let data = sample_session();

        for (storage_type, path) in [
            (StorageType::Memory, temp_dir.path().join("unused")),
            (StorageType::Json, temp_dir.path().join("sessions")),
            (StorageType::Sqlite, temp_dir.path().join("sessions.db")),
        ] {
            let storage = create_storage(storage_type, &path).unwrap();
            assert!(storage.load(&token).unwrap().is_none());

            storage.save(&token, &data).unwrap();
            let loaded = storage.load(&token).unwrap().unwrap();
            assert_eq!(loaded.lists, data.lists);

            storage.delete(&token).unwrap();
            assert!(storage.load(&token).unwrap().is_none());
        }
    }
}
