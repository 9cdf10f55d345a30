/*!
 * Translation job state.
 *
 * `models` holds the pure job and its entries, `manager` adds the save hook,
 * the archive handle lifecycle and the single-run guard.
 */

pub mod manager;
pub mod models;

pub use manager::{JobManager, RunTicket, SharedJob};
pub use models::{
    ClaimedEntry, ContentKind, EntryStatus, JobProgress, JobSnapshot, ScanOutcome,
    TranslatableEntry, TranslationJob,
};
