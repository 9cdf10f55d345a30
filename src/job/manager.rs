/*!
 * Job manager: the translation job plus its persistence.
 *
 * This module handles:
 * - Opening an archive and merging with saved progress of the same name
 * - Saving a snapshot after every state change
 * - Guarding against two runs at once
 * - Building the output archive
 */

use bytes::Bytes;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::archive::{ArchiveHandle, build_output_archive};
use crate::classifier::scan_archive;
use crate::database::SnapshotStore;
use crate::errors::{JobError, TranslationError};
use crate::file_utils::FileManager;
use crate::language_utils::SupportLanguage;

use super::models::{ClaimedEntry, EntryStatus, ScanOutcome, TranslationJob};

/// Job manager shared between the runner and progress readers.
///
/// The lock is only held for individual state transitions.
pub type SharedJob = Arc<Mutex<JobManager>>;

/// Proof that a run is in flight. Dropping it ends the run.
#[derive(Debug)]
pub struct RunTicket {
    queue: Vec<String>,
    generation: u64,
    flag: Arc<AtomicBool>,
}

impl RunTicket {
    /// Job generation the queue was taken from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Paths to process, in order
    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the translation job and keeps the snapshot store in sync with it.
///
/// The generation is bumped whenever the entry list is replaced, merged or
/// reset. Claims and results from an older generation are refused, so a run
/// that outlives its job never writes into the next one.
pub struct JobManager {
    job: TranslationJob,
    store: Box<dyn SnapshotStore>,
    run_in_flight: Arc<AtomicBool>,
    generation: u64,
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("job", &self.job)
            .field("run_in_flight", &self.is_running())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl JobManager {
    /// Manager with an empty job, nothing is loaded from the store
    pub fn new(store: Box<dyn SnapshotStore>, job: TranslationJob) -> Self {
        Self {
            job,
            store,
            run_in_flight: Arc::new(AtomicBool::new(false)),
            generation: 0,
        }
    }

    /// Manager restored from the store's snapshot, or empty if there is none
    pub fn restore(store: Box<dyn SnapshotStore>) -> Result<Self, JobError> {
        let job = match store.load()? {
            Some(snapshot) => {
                info!(
                    "Restored saved progress for '{}' ({} files)",
                    snapshot.archive_name,
                    snapshot.entries.len()
                );
                TranslationJob::from_snapshot(snapshot)
            }
            None => TranslationJob::default(),
        };
        Ok(Self::new(store, job))
    }

    pub fn into_shared(self) -> SharedJob {
        Arc::new(Mutex::new(self))
    }

    pub fn job(&self) -> &TranslationJob {
        &self.job
    }

    pub fn is_running(&self) -> bool {
        self.run_in_flight.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Message for the user when saved progress exists without its archive
    pub fn restore_notice(&self) -> Option<String> {
        if self.job.archive().is_some() || !self.job.has_state() {
            return None;
        }
        Some(format!(
            "Saved progress found for '{}' ({}). Supply this archive again to continue.",
            self.job.archive_name,
            self.job.progress()
        ))
    }

    /// Open an archive and scan it.
    ///
    /// The exact archive the job was scanned from (same name and fingerprint)
    /// is re-attached with every entry kept as is. The same name with other
    /// content is merged by path, any other name replaces the job. A
    /// malformed archive leaves the job untouched.
    pub fn open_archive(
        &mut self,
        name: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<ScanOutcome, JobError> {
        let bytes = bytes.into();
        let handle = ArchiveHandle::open(bytes.clone())?;
        let fingerprint = FileManager::fingerprint(&bytes);

        let same_name = !self.job.entries().is_empty() && self.job.archive_name == name;
        if same_name && self.job.archive_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            self.job.set_archive(Some(handle));
            let candidates = self.job.entries().len();
            let completed = self.job.progress().completed;
            info!("Re-attached {} ({} of {} files translated)", name, completed, candidates);
            return Ok(ScanOutcome::Resumed {
                candidates,
                completed,
            });
        }

        let fresh = scan_archive(&handle)?;
        let candidates = fresh.len();
        self.generation += 1;

        let outcome = if same_name {
            warn!(
                "'{}' differs from the archive the saved progress was made from, merging by path",
                name
            );
            let carried_over = self.job.merge_rescan(fresh);
            info!(
                "Merged {} with saved progress ({} completed files kept)",
                name, carried_over
            );
            ScanOutcome::Merged {
                candidates,
                carried_over,
            }
        } else {
            self.job.replace_entries(fresh);
            ScanOutcome::Fresh { candidates }
        };

        self.job.archive_name = name.to_string();
        self.job.archive_fingerprint = Some(fingerprint);
        self.job.set_archive(Some(handle));
        self.persist();

        if candidates == 0 {
            return Ok(ScanOutcome::NoCandidatesFound);
        }
        Ok(outcome)
    }

    /// Start a run over every selected, not yet completed entry
    pub fn try_begin_run(&mut self) -> Result<RunTicket, JobError> {
        self.require_archive()?;
        let queue = self.job.begin_run();
        self.acquire(queue)
    }

    /// Start a run over a single entry, whatever its selection or status
    pub fn try_begin_retry(&mut self, path: &str) -> Result<RunTicket, JobError> {
        self.require_archive()?;
        if self.job.entry(path).is_none() {
            return Err(JobError::UnknownEntry(path.to_string()));
        }
        self.acquire(vec![path.to_string()])
    }

    fn acquire(&self, queue: Vec<String>) -> Result<RunTicket, JobError> {
        self.run_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| JobError::RunInFlight)?;
        debug!(
            "Run started with {} queued files (generation {})",
            queue.len(),
            self.generation
        );
        Ok(RunTicket {
            queue,
            generation: self.generation,
            flag: self.run_in_flight.clone(),
        })
    }

    fn require_archive(&self) -> Result<&ArchiveHandle, JobError> {
        self.job
            .archive()
            .ok_or_else(|| JobError::ReuploadRequired(self.job.archive_name.clone()))
    }

    pub fn claim(&mut self, path: &str) -> Result<ClaimedEntry, JobError> {
        let mut claimed = self.job.claim(path)?;
        claimed.generation = self.generation;
        self.persist();
        Ok(claimed)
    }

    /// Claim the next queued entry of a run
    pub fn claim_queued(&mut self, ticket: &RunTicket, path: &str) -> Result<ClaimedEntry, JobError> {
        self.check_generation(ticket.generation, path)?;
        self.claim(path)
    }

    pub fn record_result(
        &mut self,
        path: &str,
        outcome: Result<String, TranslationError>,
    ) -> Result<EntryStatus, JobError> {
        let status = self.job.record_result(path, outcome)?;
        self.persist();
        Ok(status)
    }

    /// Record the outcome for a claimed entry, unless its job has been replaced since
    pub fn record_claimed(
        &mut self,
        claimed: &ClaimedEntry,
        outcome: Result<String, TranslationError>,
    ) -> Result<EntryStatus, JobError> {
        self.check_generation(claimed.generation, &claimed.path)?;
        self.record_result(&claimed.path, outcome)
    }

    fn check_generation(&self, generation: u64, path: &str) -> Result<(), JobError> {
        if generation != self.generation {
            return Err(JobError::Superseded(path.to_string()));
        }
        Ok(())
    }

    pub fn apply_manual_edit(&mut self, path: &str, content: String) -> Result<(), JobError> {
        self.job.apply_manual_edit(path, content)?;
        self.persist();
        Ok(())
    }

    pub fn toggle_selection(&mut self, path: &str) -> Result<bool, JobError> {
        let selected = self.job.toggle_selection(path)?;
        self.persist();
        Ok(selected)
    }

    pub fn toggle_all_matching(&mut self, filter: &str) -> (bool, usize) {
        let result = self.job.toggle_all_matching(filter);
        self.persist();
        result
    }

    pub fn set_languages(
        &mut self,
        source: SupportLanguage,
        target: SupportLanguage,
    ) -> Result<(), JobError> {
        if target.is_auto() {
            return Err(JobError::AutoTarget);
        }
        self.job.set_languages(source, target);
        self.persist();
        Ok(())
    }

    /// Forget everything, including the saved snapshot. Languages are kept.
    pub fn reset(&mut self) -> Result<(), JobError> {
        if self.is_running() {
            warn!("Resetting while a run is in flight, remaining files will be skipped");
        }
        self.job = TranslationJob::new(self.job.source_language, self.job.target_language);
        self.generation += 1;
        self.store.clear()?;
        info!("Progress cleared");
        Ok(())
    }

    /// Build the translated archive from the original and all completed entries
    pub fn build_output(&self) -> Result<Vec<u8>, JobError> {
        let handle = self.require_archive()?;
        let code = self
            .job
            .target_language
            .locale_code()
            .ok_or(JobError::AutoTarget)?;
        Ok(build_output_archive(handle, self.job.entries(), code)?)
    }

    /// File name for the output archive
    pub fn output_file_name(&self) -> String {
        FileManager::output_file_name(&self.job.archive_name, self.job.target_language)
    }

    /// Write the current snapshot. Failures are logged, the in-memory job stays authoritative.
    fn persist(&self) {
        if !self.job.has_state() {
            return;
        }
        if let Err(e) = self.store.save(&self.job.snapshot()) {
            warn!("Failed to save progress: {}", e);
        }
    }
}
