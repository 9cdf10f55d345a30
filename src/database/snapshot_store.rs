/*!
 * Durable storage for the job snapshot.
 *
 * The snapshot is one JSON document kept under a fixed key. The SQLite store
 * is used by the application; the in-memory store backs tests.
 */

use log::{debug, warn};
use parking_lot::Mutex;
use rusqlite::OptionalExtension;
use std::sync::Arc;

use crate::errors::JobError;
use crate::job::models::JobSnapshot;

use super::connection::DatabaseConnection;

/// Key the job snapshot is stored under
pub const SNAPSHOT_KEY: &str = "mc_addon_translator_progress";

/// Keyed blob storage for the job snapshot
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot, `None` when nothing usable is stored
    fn load(&self) -> Result<Option<JobSnapshot>, JobError>;

    /// Replace the stored snapshot
    fn save(&self, snapshot: &JobSnapshot) -> Result<(), JobError>;

    /// Remove the stored snapshot
    fn clear(&self) -> Result<(), JobError>;
}

fn persistence(e: impl std::fmt::Display) -> JobError {
    JobError::Persistence(e.to_string())
}

/// Decode a stored document. Unreadable documents are discarded with a warning.
fn decode(raw: Option<String>) -> Option<JobSnapshot> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Failed to load saved progress, ignoring it: {}", e);
            None
        }
    }
}

/// Snapshot store backed by the SQLite state database
#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    db: DatabaseConnection,
}

impl SqliteSnapshotStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store at the default database location
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(DatabaseConnection::new_default()?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> Result<Option<JobSnapshot>, JobError> {
        let raw = self
            .db
            .execute(|conn| {
                Ok(conn
                    .query_row(
                        "SELECT value FROM kv_store WHERE key = ?1",
                        [SNAPSHOT_KEY],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .map_err(persistence)?;

        Ok(decode(raw))
    }

    fn save(&self, snapshot: &JobSnapshot) -> Result<(), JobError> {
        let json = serde_json::to_string(snapshot).map_err(persistence)?;
        debug!("Saving progress ({} bytes)", json.len());

        self.db
            .execute(|conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
                    [SNAPSHOT_KEY, json.as_str()],
                )?;
                Ok(())
            })
            .map_err(persistence)
    }

    fn clear(&self) -> Result<(), JobError> {
        self.db
            .execute(|conn| {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", [SNAPSHOT_KEY])?;
                Ok(())
            })
            .map_err(persistence)
    }
}

/// In-memory snapshot store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document, if any
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().clone()
    }

    /// Put a raw document in the slot, bypassing serialisation
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock() = Some(raw.into());
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<JobSnapshot>, JobError> {
        Ok(decode(self.raw()))
    }

    fn save(&self, snapshot: &JobSnapshot) -> Result<(), JobError> {
        let json = serde_json::to_string(snapshot).map_err(persistence)?;
        *self.slot.lock() = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), JobError> {
        *self.slot.lock() = None;
        Ok(())
    }
}
