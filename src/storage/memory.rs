use super::{SessionStorage, SessionToken, StorageError};
use crate::models::SessionData;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Keeps sessions in process memory; they are gone once the server stops.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sessions: Mutex<HashMap<SessionToken, SessionData>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<SessionToken, SessionData>>, StorageError> {
        self.sessions
            .lock()
            .map_err(|e| StorageError::Storage(format!("Failed to lock sessions: {}", e)))
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, token: &SessionToken) -> Result<Option<SessionData>, StorageError> {
        Ok(self.sessions()?.get(token).cloned())
    }

    fn save(&self, token: &SessionToken, data: &SessionData) -> Result<(), StorageError> {
        data.validate()?;
        self.sessions()?.insert(token.clone(), data.clone());
        Ok(())
    }

    fn delete(&self, token: &SessionToken) -> Result<(), StorageError> {
        self.sessions()?.remove(token);
        Ok(())
    }

    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        sessions.retain(|_, data| data.updated_at >= cutoff);
        Ok(before - sessions.len())
    }
}
