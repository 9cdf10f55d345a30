use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::database::{DatabaseConnection, SnapshotStore, SqliteSnapshotStore};
use crate::file_utils::FileManager;
use crate::job::{EntryStatus, JobManager, ScanOutcome, SharedJob};
use crate::translation::{RunSummary, TranslationBackend, TranslationRunner, TranslationService};

// @module: Application controller for addon translation

/// Result of a command that may write the translated archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub summary: Option<RunSummary>,
    /// Written output archive, when packaging happened
    pub output: Option<PathBuf>,
}

/// Main application controller for addon translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Job state shared with the runner
    job: SharedJob,
    // @field: Translation backend
    backend: Arc<dyn TranslationBackend>,
    // @field: Where output archives go, next to the input when unset
    output_dir: Option<PathBuf>,
    // @field: Whether to draw progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller with the configured provider and the progress database
    pub fn with_config(config: Config) -> Result<Self> {
        let store = match config.state_path() {
            Some(path) => SqliteSnapshotStore::new(DatabaseConnection::new(path)?),
            None => SqliteSnapshotStore::open_default()?,
        };
        let backend = TranslationService::new(config.translation.clone())
            .context("Failed to set up the translation provider")?;

        Self::with_parts(config, Box::new(store), Arc::new(backend))
    }

    // @method: Create a controller from explicit parts
    pub fn with_parts(
        config: Config,
        store: Box<dyn SnapshotStore>,
        backend: Arc<dyn TranslationBackend>,
    ) -> Result<Self> {
        let mut manager = JobManager::restore(store)?;
        if !manager.job().has_state() {
            manager.set_languages(config.source()?, config.target()?)?;
        }

        Ok(Self {
            config,
            job: manager.into_shared(),
            backend,
            output_dir: None,
            show_progress: false,
        })
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn job(&self) -> &SharedJob {
        &self.job
    }

    /// Apply the configured languages to the job, replacing the saved ones
    pub fn apply_config_languages(&self) -> Result<()> {
        let (source, target) = (self.config.source()?, self.config.target()?);
        self.job.lock().set_languages(source, target)?;
        info!("Languages: {} -> {}", source.display_name(), target.display_name());
        Ok(())
    }

    /// Notice shown when saved progress exists but its archive is not loaded
    pub fn restore_notice(&self) -> Option<String> {
        self.job.lock().restore_notice()
    }

    /// Open an archive and scan it, merging with saved progress of the same name
    pub fn scan(&self, archive: &Path) -> Result<ScanOutcome> {
        if !FileManager::file_exists(archive) {
            return Err(anyhow!("Input file does not exist: {:?}", archive));
        }

        let bytes = FileManager::read_bytes(archive)?;
        let name = FileManager::display_name(archive);
        let outcome = self
            .job
            .lock()
            .open_archive(&name, bytes)
            .with_context(|| format!("Failed to open {}", name))?;

        match outcome {
            ScanOutcome::Fresh { candidates } => {
                info!("Found {} translatable files in {}", candidates, name)
            }
            ScanOutcome::Resumed {
                candidates,
                completed,
            } => info!(
                "Resuming {}: {} translatable files, {} already translated",
                name, candidates, completed
            ),
            ScanOutcome::Merged {
                candidates,
                carried_over,
            } => info!(
                "{} changed since it was scanned: {} translatable files, {} translations kept",
                name, candidates, carried_over
            ),
            ScanOutcome::NoCandidatesFound => warn!("No translatable files found in {}", name),
        }
        Ok(outcome)
    }

    /// Translate every selected, unfinished file, then package if anything completed
    pub async fn translate(&self, archive: &Path) -> Result<CommandOutcome> {
        if self.scan(archive)? == ScanOutcome::NoCandidatesFound {
            return Ok(CommandOutcome {
                summary: None,
                output: None,
            });
        }

        let start_time = Instant::now();
        let summary = self.runner().run(&self.job).await?;
        info!(
            "Translation {} in {}",
            summary,
            Self::format_duration(start_time.elapsed())
        );

        let any_completed = self.job.lock().job().any_completed();
        let output = if any_completed {
            Some(self.write_output(archive)?)
        } else {
            warn!("Nothing was translated, no output written");
            None
        };

        Ok(CommandOutcome {
            summary: Some(summary),
            output,
        })
    }

    /// Translate one file again, then package once every selected file is done
    pub async fn retry(&self, archive: &Path, path: &str) -> Result<CommandOutcome> {
        self.scan(archive)?;
        let summary = self.runner().retry(&self.job, path).await?;

        let output = self.package_if_all_selected_completed(archive)?;
        Ok(CommandOutcome {
            summary: Some(summary),
            output,
        })
    }

    /// Write the translated archive from what is completed so far
    pub fn package(&self, archive: &Path) -> Result<PathBuf> {
        self.scan(archive)?;
        if !self.job.lock().job().any_completed() {
            warn!("No file is translated yet, the output will match the original");
        }
        self.write_output(archive)
    }

    /// Replace a file's translation by hand
    pub fn edit(&self, path: &str, content: String, archive: Option<&Path>) -> Result<CommandOutcome> {
        if let Some(archive) = archive {
            self.scan(archive)?;
        }
        self.job.lock().apply_manual_edit(path, content)?;
        info!("Saved manual translation for {}", path);

        let output = match archive {
            Some(archive) => self.package_if_all_selected_completed(archive)?,
            None => None,
        };
        Ok(CommandOutcome {
            summary: None,
            output,
        })
    }

    /// Flip the selection of one file
    pub fn toggle(&self, path: &str) -> Result<bool> {
        Ok(self.job.lock().toggle_selection(path)?)
    }

    /// Flip the selection of every file whose path contains `filter`
    pub fn toggle_matching(&self, filter: &str) -> (bool, usize) {
        self.job.lock().toggle_all_matching(filter)
    }

    /// Forget all progress
    pub fn reset(&self) -> Result<()> {
        self.job.lock().reset()?;
        Ok(())
    }

    /// Human-readable summary of the job, optionally listing every file
    pub fn status_report(&self, list_files: bool) -> String {
        let guard = self.job.lock();
        let job = guard.job();
        let mut report = String::new();

        if job.archive_name.is_empty() {
            let _ = writeln!(report, "No saved progress.");
            return report;
        }

        let _ = writeln!(
            report,
            "{} ({} -> {})",
            job.archive_name,
            job.source_language.display_name(),
            job.target_language.display_name()
        );
        let _ = writeln!(report, "{}", job.progress());
        if let Some(current) = job.in_flight_path() {
            let _ = writeln!(report, "Translating: {}", current);
        }

        if list_files {
            for entry in job.entries() {
                let mark = if entry.selected { "x" } else { " " };
                let _ = writeln!(
                    report,
                    "[{}] {:<10} {:<10} {}",
                    mark,
                    entry.status.to_string(),
                    entry.kind.to_string(),
                    entry.path
                );
            }
        }
        report
    }

    fn runner(&self) -> TranslationRunner {
        TranslationRunner::new(self.backend.clone())
            .with_request_spacing(self.config.translation.request_spacing_ms())
            .with_progress_bar(self.show_progress)
    }

    fn package_if_all_selected_completed(&self, archive: &Path) -> Result<Option<PathBuf>> {
        let ready = {
            let guard = self.job.lock();
            let job = guard.job();
            job.all_selected_completed()
                && job.entries().iter().any(|e| e.status == EntryStatus::Completed)
        };
        if ready {
            Ok(Some(self.write_output(archive)?))
        } else {
            Ok(None)
        }
    }

    fn write_output(&self, archive: &Path) -> Result<PathBuf> {
        let (bytes, target) = {
            let guard = self.job.lock();
            (guard.build_output()?, guard.job().target_language)
        };

        if let Some(dir) = &self.output_dir {
            FileManager::ensure_dir(dir)?;
        }
        let output_path =
            FileManager::generate_output_path(archive, self.output_dir.as_deref(), target);
        FileManager::write_bytes(&output_path, &bytes)?;

        info!("Success: {}", output_path.display());
        Ok(output_path)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
