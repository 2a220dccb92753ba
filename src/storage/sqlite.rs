use super::migrations;
use super::{SessionStorage, SessionToken, StorageError};
use crate::models::SessionData;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Fixed-width UTC so `updated_at` compares correctly as text.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Sessions stored as JSON blobs in a `sessions` table.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)
            .map_err(|e| StorageError::Storage(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self, StorageError> {
        migrations::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn get_connection(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Storage(format!("Failed to lock connection: {}", e)))
    }
}

impl SessionStorage for SqliteStorage {
    fn load(&self, token: &SessionToken) -> Result<Option<SessionData>, StorageError> {
        let conn = self.get_connection()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT data FROM sessions WHERE token = ?1",
                params![token.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Storage(format!("Failed to query session: {}", e)))?;

        match json {
            Some(json) => {
                let data: SessionData = serde_json::from_str(&json)?;
                data.validate()?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    fn save(&self, token: &SessionToken, data: &SessionData) -> Result<(), StorageError> {
        data.validate()?;
        let json = serde_json::to_string(data)?;

        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO sessions (token, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(token) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![token.as_str(), json, format_timestamp(data.updated_at)],
        )?;
        Ok(())
    }

    fn delete(&self, token: &SessionToken) -> Result<(), StorageError> {
        let conn = self.get_connection()?;
        conn.execute(
            "DELETE FROM sessions WHERE token = ?1",
            params![token.as_str()],
        )?;
        Ok(())
    }

    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let conn = self.get_connection()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE updated_at < ?1",
            params![format_timestamp(cutoff)],
        )?;
        Ok(removed)
    }
}
