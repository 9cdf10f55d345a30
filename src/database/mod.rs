/*!
 * Local state persistence.
 *
 * SQLite-backed storage for the saved translation job, so an interrupted
 * translation can be resumed later.
 */

pub mod connection;
pub mod schema;
pub mod snapshot_store;

pub use connection::DatabaseConnection;
pub use snapshot_store::{MemorySnapshotStore, SNAPSHOT_KEY, SnapshotStore, SqliteSnapshotStore};
