/*!
 * State database schema.
 *
 * A single key/value table; each key holds one JSON document (currently only
 * the saved job snapshot). The schema version lives in `PRAGMA user_version`.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

const CREATE_KV_STORE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// Bring the schema up to the current version
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    match schema_version(conn)? {
        0 => {
            info!("Initializing state database schema v{}", SCHEMA_VERSION);
            // WAL keeps the last committed snapshot readable after a crash
            conn.pragma_update(None, "journal_mode", "WAL")
                .context("Failed to enable WAL journal")?;
            conn.execute_batch(CREATE_KV_STORE)
                .context("Failed to create kv_store table")?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .context("Failed to record schema version")?;
            Ok(())
        }
        version if version > SCHEMA_VERSION => Err(anyhow!(
            "State database has schema v{}, this build only knows v{}",
            version,
            SCHEMA_VERSION
        )),
        version => {
            debug!("State database schema is v{}", version);
            Ok(())
        }
    }
}

fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .context("Failed to read schema version")
}
