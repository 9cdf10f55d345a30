/*!
 * SQLite state database.
 *
 * One connection per process, shared behind a mutex. The file and its
 * directory are created on first use and the schema is brought up to date
 * before the handle is returned.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::schema;

const APP_DIR: &str = "mcat";
const DB_FILE: &str = "mcat.db";

/// Another mcat process may hold the write lock briefly
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the state database. Clones share the connection.
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl DatabaseConnection {
    /// Open the database under the user's local data directory
    pub fn new_default() -> Result<Self> {
        Self::new(Self::default_database_path()?)
    }

    /// Open or create the database file at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let parent = db_path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening state database at: {:?}", db_path);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        Self::prepare(conn, db_path)
    }

    /// Throwaway database, gone when the last clone is dropped
    pub fn new_in_memory() -> Result<Self> {
        debug!("Opening in-memory state database");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::prepare(conn, PathBuf::from(":memory:"))
    }

    fn prepare(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to configure database busy timeout")?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<local data dir>/mcat/mcat.db`, falling back to `~/.local/share`
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow!("Could not determine a data directory for saved progress"))?;

        Ok(base_dir.join(APP_DIR).join(DB_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run `f` with exclusive access to the connection
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection.lock();
        f(&conn)
    }
}
