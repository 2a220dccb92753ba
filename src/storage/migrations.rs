//! Schema migrations for the SQLite session store
//!
//! The schema version lives in SQLite's `user_version` pragma. Opening a
//! database runs every step newer than that version, in order, inside one
//! transaction. Append new steps to [`STEPS`]; never edit a shipped one.

use super::StorageError;
use rusqlite::Connection;

/// One forward-only schema change, identified by the version it produces.
#[derive(Debug)]
pub struct Step {
    pub version: u32,
    pub sql: &'static str,
}

pub const STEPS: &[Step] = &[
    Step {
        version: 1,
        sql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
    Step {
        version: 2,
        sql: "CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at);",
    },
];

pub fn schema_version(conn: &Connection) -> Result<u32, StorageError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Runs the pending steps. A failing step rolls back the whole upgrade.
pub fn migrate(conn: &mut Connection) -> Result<(), StorageError> {
    let from = schema_version(conn)?;
    let pending: Vec<&Step> = STEPS.iter().filter(|step| step.version > from).collect();
    let Some(target) = pending.last().map(|step| step.version) else {
        return Ok(());
    };

    tracing::info!(from, to = target, "migrating session database");
    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql).map_err(|e| {
            StorageError::Storage(format!("Schema step {} failed: {}", step.version, e))
        })?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;
    Ok(())
}
