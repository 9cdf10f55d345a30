/*!
 * Sequential translation runs over a shared job.
 *
 * One entry at a time, in scan order. The job lock is taken only to claim an
 * entry and to record its outcome, so progress can be read while a request
 * is in flight. A failed entry is recorded and the run moves on.
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::JobError;
use crate::job::{ContentKind, EntryStatus, RunTicket, SharedJob};

use super::backend::TranslationBackend;
use super::prompts::KindInstructions;

/// Outcome counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries sent to the backend
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Entries that disappeared from the job, or whose job was reset or
    /// replaced, before their outcome could be recorded
    pub skipped: usize,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(f, "done with {} file errors", self.failed)
        } else {
            write!(f, "done, {} files translated", self.completed)
        }
    }
}

/// Drives runs of a job against a translation backend
#[derive(Clone)]
pub struct TranslationRunner {
    backend: Arc<dyn TranslationBackend>,
    /// Pause between consecutive requests
    request_spacing: Duration,
    show_progress: bool,
}

impl fmt::Debug for TranslationRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationRunner")
            .field("request_spacing", &self.request_spacing)
            .field("show_progress", &self.show_progress)
            .finish_non_exhaustive()
    }
}

impl TranslationRunner {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            backend,
            request_spacing: Duration::ZERO,
            show_progress: false,
        }
    }

    pub fn with_request_spacing(mut self, spacing_ms: u64) -> Self {
        self.request_spacing = Duration::from_millis(spacing_ms);
        self
    }

    /// Draw a progress bar on the terminal while running
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Translate every selected entry that is not completed yet
    pub async fn run(&self, job: &SharedJob) -> Result<RunSummary, JobError> {
        let ticket = job.lock().try_begin_run()?;
        info!("Starting translation of {} files", ticket.len());
        self.process(job, ticket).await
    }

    /// Translate a single entry again, whatever its selection or status
    pub async fn retry(&self, job: &SharedJob, path: &str) -> Result<RunSummary, JobError> {
        let ticket = job.lock().try_begin_retry(path)?;
        info!("Retrying {}", path);
        self.process(job, ticket).await
    }

    async fn process(&self, job: &SharedJob, ticket: RunTicket) -> Result<RunSummary, JobError> {
        let progress_bar = self.progress_bar(ticket.len() as u64);
        let mut summary = RunSummary::default();

        for (index, path) in ticket.queue().iter().enumerate() {
            if index > 0 && !self.request_spacing.is_zero() {
                tokio::time::sleep(self.request_spacing).await;
            }

            let claimed = job.lock().claim_queued(&ticket, path);
            let claimed = match claimed {
                Ok(claimed) => claimed,
                Err(JobError::UnknownEntry(_) | JobError::Superseded(_)) => {
                    warn!("{} is no longer part of the job, skipping", path);
                    summary.skipped += 1;
                    progress_bar.inc(1);
                    continue;
                }
                Err(e) => return Err(e),
            };

            progress_bar.set_message(path.clone());
            debug!("Translating {} ({})", path, claimed.kind);
            summary.attempted += 1;

            let instructions = KindInstructions::for_kind(
                claimed.kind,
                claimed.source_language,
                claimed.target_language,
            );
            let outcome = self
                .backend
                .translate(
                    &claimed.content,
                    &instructions,
                    claimed.source_language,
                    claimed.target_language,
                )
                .await;

            match &outcome {
                Ok(text) => {
                    if claimed.kind == ContentKind::StructuredData {
                        warn_on_lost_json(path, &claimed.content, text);
                    }
                }
                Err(e) => warn!("Failed to translate {}: {}", path, e),
            }

            let recorded = job.lock().record_claimed(&claimed, outcome);
            match recorded {
                Ok(EntryStatus::Completed) => summary.completed += 1,
                Ok(_) => summary.failed += 1,
                Err(JobError::UnknownEntry(_) | JobError::Superseded(_)) => {
                    warn!("{} was removed while it was being translated, result dropped", path);
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
            progress_bar.inc(1);
        }

        progress_bar.finish_with_message(summary.to_string());
        info!(
            "Run finished: {} completed, {} failed, {} skipped",
            summary.completed, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=> "));
        progress_bar.set_message("Translating");
        progress_bar
    }
}

/// JSON that parsed before translation should still parse after it
fn warn_on_lost_json(path: &str, original: &str, translated: &str) {
    let was_valid = serde_json::from_str::<serde_json::Value>(original).is_ok();
    if was_valid && serde_json::from_str::<serde_json::Value>(translated).is_err() {
        warn!("Translated {} is no longer valid JSON, review it before use", path);
    }
}
