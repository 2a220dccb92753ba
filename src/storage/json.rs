use super::{SessionStorage, SessionToken, StorageError};
use crate::models::SessionData;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One pretty-printed `<token>.json` file per session inside a directory.
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    pub fn new(dir: &Path) -> Result<Self, StorageError> {
        let dir = PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).to_string());
        if dir.as_os_str().is_empty() {
            return Err(StorageError::Storage(
                "Session directory not configured".to_string(),
            ));
        }
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn session_path(&self, token: &SessionToken) -> PathBuf {
        self.dir.join(format!("{}.json", token))
    }
}

impl SessionStorage for JsonStorage {
    fn load(&self, token: &SessionToken) -> Result<Option<SessionData>, StorageError> {
        let path = self.session_path(token);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let data: SessionData = serde_json::from_str(&contents)?;
        data.validate()?;
        Ok(Some(data))
    }

    fn save(&self, token: &SessionToken, data: &SessionData) -> Result<(), StorageError> {
        data.validate()?;

        let path = self.session_path(token);
        let json = serde_json::to_string_pretty(data)?;

        // Write next to the target and rename so readers never see half a file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        // Verify the write was successful by reading back
        let contents = std::fs::read_to_string(&path)?;
        let read_data: SessionData = serde_json::from_str(&contents)?;
        if read_data.lists.len() != data.lists.len() {
            return Err(StorageError::Storage(
                "Data integrity check failed".to_string(),
            ));
        }

        Ok(())
    }

    fn delete(&self, token: &SessionToken) -> Result<(), StorageError> {
        let path = self.session_path(token);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let stale = match serde_json::from_str::<SessionData>(&contents) {
                Ok(data) => data.updated_at < cutoff,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable session file"
                    );
                    false
                }
            };
            if stale {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
