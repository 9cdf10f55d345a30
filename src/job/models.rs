/*!
 * Translation job models.
 *
 * A job is the ordered list of translatable entries found in one archive plus
 * the language pair it is being translated with. All state transitions happen
 * through methods on [`TranslationJob`]; persistence is layered on top by the
 * job manager.
 */

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::archive::ArchiveHandle;
use crate::errors::{JobError, TranslationError};
use crate::language_utils::SupportLanguage;

/// Translation status of a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Waiting to be translated
    Pending,
    /// Claimed by a run, backend call outstanding
    Translating,
    /// Translated content attached
    Completed,
    /// Last attempt failed
    Error,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Pending => write!(f, "pending"),
            EntryStatus::Translating => write!(f, "translating"),
            EntryStatus::Completed => write!(f, "completed"),
            EntryStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EntryStatus::Pending),
            "translating" => Ok(EntryStatus::Translating),
            "completed" => Ok(EntryStatus::Completed),
            "error" => Ok(EntryStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid entry status: {}", s)),
        }
    }
}

/// What kind of text a file holds, which decides how it is translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    /// `key=value` localization file
    #[serde(rename = "lang")]
    Localization,
    /// JSON manifest, UI or entity definition
    #[serde(rename = "json")]
    StructuredData,
    /// JavaScript or TypeScript source
    #[serde(rename = "js")]
    Script,
    /// mcfunction command file
    #[serde(rename = "mcfunction")]
    CommandScript,
    /// Free-form text or markdown
    #[serde(rename = "txt")]
    PlainText,
}

impl ContentKind {
    /// Short tag shown in listings and stored in snapshots
    pub fn tag(&self) -> &'static str {
        match self {
            ContentKind::Localization => "lang",
            ContentKind::StructuredData => "json",
            ContentKind::Script => "js",
            ContentKind::CommandScript => "mcfunction",
            ContentKind::PlainText => "txt",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One file of the archive that may contain player-visible text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatableEntry {
    /// Path inside the archive, unique within a job
    pub path: String,
    /// Decoded original content
    pub content: String,
    /// Content kind from classification
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Present once translated or manually edited
    #[serde(
        rename = "translatedContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub translated_content: Option<String>,
    pub status: EntryStatus,
    pub selected: bool,
}

impl TranslatableEntry {
    /// Fresh entry as produced by a scan: pending and selected
    pub fn new(path: impl Into<String>, content: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind,
            translated_content: None,
            status: EntryStatus::Pending,
            selected: true,
        }
    }

    /// Whether a run should pick this entry up
    pub fn is_eligible(&self) -> bool {
        self.selected && self.status != EntryStatus::Completed
    }
}

/// Work item handed to the backend once an entry has been claimed
#[derive(Debug, Clone)]
pub struct ClaimedEntry {
    pub path: String,
    pub content: String,
    pub kind: ContentKind,
    pub source_language: SupportLanguage,
    pub target_language: SupportLanguage,
    /// Job generation the claim was made in, see [`JobManager`](super::JobManager)
    pub generation: u64,
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub total: usize,
    pub selected: usize,
    pub pending: usize,
    pub translating: usize,
    pub completed: usize,
    pub error: usize,
}

impl fmt::Display for JobProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files ({} selected): {} completed, {} pending, {} translating, {} errors",
            self.total, self.selected, self.completed, self.pending, self.translating, self.error
        )
    }
}

/// Result of opening an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan produced a fresh job
    Fresh { candidates: usize },
    /// The exact archive the job was scanned from, all entry state kept
    Resumed { candidates: usize, completed: usize },
    /// Same archive name but different content, completed work was carried over
    Merged { candidates: usize, carried_over: usize },
    /// The archive holds nothing worth translating
    NoCandidatesFound,
}

/// Persisted form of a job: everything but the archive bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub source_language: SupportLanguage,
    pub target_language: SupportLanguage,
    #[serde(rename = "originalFileName", default)]
    pub archive_name: String,
    #[serde(rename = "filesToTranslate", default)]
    pub entries: Vec<TranslatableEntry>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// SHA-256 of the archive the entries were scanned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_fingerprint: Option<String>,
}

/// The in-memory translation job
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub source_language: SupportLanguage,
    pub target_language: SupportLanguage,
    /// Display name of the originating archive, empty when none
    pub archive_name: String,
    /// SHA-256 of the originating archive bytes
    pub archive_fingerprint: Option<String>,
    entries: Vec<TranslatableEntry>,
    /// Originating archive, never persisted
    archive: Option<ArchiveHandle>,
}

impl Default for TranslationJob {
    fn default() -> Self {
        Self::new(SupportLanguage::Auto, SupportLanguage::Vietnamese)
    }
}

impl TranslationJob {
    /// Empty job with the given language pair
    pub fn new(source_language: SupportLanguage, target_language: SupportLanguage) -> Self {
        Self {
            source_language,
            target_language,
            archive_name: String::new(),
            archive_fingerprint: None,
            entries: Vec::new(),
            archive: None,
        }
    }

    /// Rebuild a job from a snapshot. The archive handle is not part of it.
    pub fn from_snapshot(snapshot: JobSnapshot) -> Self {
        let mut entries = snapshot.entries;
        // A run cannot survive a restart
        for entry in entries.iter_mut() {
            if entry.status == EntryStatus::Translating {
                entry.status = EntryStatus::Pending;
            }
        }

        Self {
            source_language: snapshot.source_language,
            target_language: snapshot.target_language,
            archive_name: snapshot.archive_name,
            archive_fingerprint: snapshot.archive_fingerprint,
            entries,
            archive: None,
        }
    }

    /// Persistable view of the job
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            source_language: self.source_language,
            target_language: self.target_language,
            archive_name: self.archive_name.clone(),
            entries: self.entries.clone(),
            saved_at: Some(Utc::now()),
            archive_fingerprint: self.archive_fingerprint.clone(),
        }
    }

    /// Whether there is anything worth persisting
    pub fn has_state(&self) -> bool {
        !self.entries.is_empty() || !self.archive_name.is_empty()
    }

    pub fn entries(&self) -> &[TranslatableEntry] {
        &self.entries
    }

    pub fn entry(&self, path: &str) -> Option<&TranslatableEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    fn entry_mut(&mut self, path: &str) -> Result<&mut TranslatableEntry, JobError> {
        self.entries
            .iter_mut()
            .find(|e| e.path == path)
            .ok_or_else(|| JobError::UnknownEntry(path.to_string()))
    }

    pub fn archive(&self) -> Option<&ArchiveHandle> {
        self.archive.as_ref()
    }

    pub fn set_archive(&mut self, archive: Option<ArchiveHandle>) {
        self.archive = archive;
    }

    /// Replace all entries with a fresh scan
    pub fn replace_entries(&mut self, fresh: Vec<TranslatableEntry>) {
        self.entries = fresh;
    }

    /// Paths a run should process, in scan order: selected and not completed
    pub fn begin_run(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_eligible())
            .map(|e| e.path.clone())
            .collect()
    }

    /// Mark an entry as being translated and hand out what the backend needs
    pub fn claim(&mut self, path: &str) -> Result<ClaimedEntry, JobError> {
        let (source_language, target_language) = (self.source_language, self.target_language);
        let entry = self.entry_mut(path)?;
        entry.status = EntryStatus::Translating;
        Ok(ClaimedEntry {
            path: entry.path.clone(),
            content: entry.content.clone(),
            kind: entry.kind,
            source_language,
            target_language,
            generation: 0,
        })
    }

    /// Commit a backend outcome. A failure leaves any earlier content in place.
    pub fn record_result(
        &mut self,
        path: &str,
        outcome: Result<String, TranslationError>,
    ) -> Result<EntryStatus, JobError> {
        let entry = self.entry_mut(path)?;
        match outcome {
            Ok(content) => {
                entry.translated_content = Some(content);
                entry.status = EntryStatus::Completed;
            }
            Err(e) => {
                debug!("Recording failure for {}: {}", path, e);
                entry.status = EntryStatus::Error;
            }
        }
        Ok(entry.status)
    }

    /// Replace the translated content by hand; the entry becomes completed
    pub fn apply_manual_edit(&mut self, path: &str, content: String) -> Result<(), JobError> {
        let entry = self.entry_mut(path)?;
        entry.translated_content = Some(content);
        entry.status = EntryStatus::Completed;
        Ok(())
    }

    /// Merge a fresh scan of the same archive into the job.
    ///
    /// Completed entries that still exist keep their content and selection,
    /// everything else comes from the fresh scan. Entries that disappeared
    /// are dropped. Returns how many completed entries were carried over.
    pub fn merge_rescan(&mut self, fresh: Vec<TranslatableEntry>) -> usize {
        let mut previous: HashMap<String, TranslatableEntry> = self
            .entries
            .drain(..)
            .filter(|e| e.status == EntryStatus::Completed)
            .map(|e| (e.path.clone(), e))
            .collect();

        let mut carried_over = 0;
        self.entries = fresh
            .into_iter()
            .map(|mut entry| {
                if let Some(existing) = previous.remove(&entry.path) {
                    entry.translated_content = existing.translated_content;
                    entry.status = EntryStatus::Completed;
                    entry.selected = existing.selected;
                    carried_over += 1;
                }
                entry
            })
            .collect();

        carried_over
    }

    /// Flip the selection of one entry, returning the new state
    pub fn toggle_selection(&mut self, path: &str) -> Result<bool, JobError> {
        let entry = self.entry_mut(path)?;
        entry.selected = !entry.selected;
        Ok(entry.selected)
    }

    /// Toggle every entry whose path contains `filter` (case-insensitive).
    ///
    /// If all matching entries are selected they are all deselected,
    /// otherwise they are all selected. Returns the new state and how many
    /// entries matched.
    pub fn toggle_all_matching(&mut self, filter: &str) -> (bool, usize) {
        let needle = filter.to_lowercase();

        let all_selected = self
            .entries
            .iter()
            .filter(|e| path_matches(e, &needle))
            .all(|e| e.selected);
        let new_state = !all_selected;

        let mut count = 0;
        for entry in self.entries.iter_mut().filter(|e| path_matches(e, &needle)) {
            entry.selected = new_state;
            count += 1;
        }
        (new_state, count)
    }

    pub fn set_languages(&mut self, source: SupportLanguage, target: SupportLanguage) {
        self.source_language = source;
        self.target_language = target;
    }

    pub fn progress(&self) -> JobProgress {
        let mut progress = JobProgress {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            if entry.selected {
                progress.selected += 1;
            }
            match entry.status {
                EntryStatus::Pending => progress.pending += 1,
                EntryStatus::Translating => progress.translating += 1,
                EntryStatus::Completed => progress.completed += 1,
                EntryStatus::Error => progress.error += 1,
            }
        }
        progress
    }

    /// Path of the entry currently out for translation
    pub fn in_flight_path(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.status == EntryStatus::Translating)
            .map(|e| e.path.as_str())
    }

    /// Selected entries whose last attempt failed
    pub fn selected_error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.selected && e.status == EntryStatus::Error)
            .count()
    }

    pub fn any_completed(&self) -> bool {
        self.entries.iter().any(|e| e.status == EntryStatus::Completed)
    }

    /// True when every selected entry is completed
    pub fn all_selected_completed(&self) -> bool {
        self.entries
            .iter()
            .filter(|e| e.selected)
            .all(|e| e.status == EntryStatus::Completed)
    }
}

fn path_matches(entry: &TranslatableEntry, needle: &str) -> bool {
    entry.path.to_lowercase().contains(needle)
}
