/*!
 * Tests for job state transitions and their persistence
 */

use mcat::database::{MemorySnapshotStore, SnapshotStore};
use mcat::errors::{JobError, TranslationError};
use mcat::job::{EntryStatus, JobManager, ScanOutcome, TranslationJob};
use mcat::language_utils::SupportLanguage;

use crate::common::{sample_addon, AddonBuilder};

fn manager_with(store: &MemorySnapshotStore) -> JobManager {
    JobManager::new(Box::new(store.clone()), TranslationJob::default())
}

#[test]
fn test_openArchive_withSameArchive_shouldKeepAllEntryState() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();
    manager
        .record_result("readme.txt", Ok("Cảm ơn đã tải".to_string()))
        .unwrap();
    manager
        .record_result("RP/manifest.json", Err(TranslationError::EmptyResponse))
        .unwrap();
    manager.toggle_selection("BP/scripts/main.js").unwrap();

    let outcome = manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();

    assert_eq!(
        outcome,
        ScanOutcome::Resumed {
            candidates: 5,
            completed: 1
        }
    );
    let readme = manager.job().entry("readme.txt").unwrap();
    assert_eq!(readme.status, EntryStatus::Completed);
    assert_eq!(readme.translated_content.as_deref(), Some("Cảm ơn đã tải"));
    assert!(!manager.job().entry("BP/scripts/main.js").unwrap().selected);
    assert_eq!(
        manager.job().entry("RP/manifest.json").unwrap().status,
        EntryStatus::Error
    );
    assert!(manager.job().archive().is_some());
}

#[test]
fn test_openArchive_withChangedContent_shouldResetUnfinishedSelection() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager
        .open_archive("pack.mcaddon", AddonBuilder::new().file("a.txt", "one").file("b.txt", "two").build())
        .unwrap();
    manager.toggle_selection("b.txt").unwrap();

    manager
        .open_archive("pack.mcaddon", AddonBuilder::new().file("a.txt", "one").file("b.txt", "two!").build())
        .unwrap();

    // Only completed entries keep their state across a content change
    assert!(manager.job().entry("b.txt").unwrap().selected);
}

#[test]
fn test_openArchive_withChangedContent_shouldMergeByPath() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager
        .open_archive("pack.mcaddon", AddonBuilder::new().file("a.txt", "one").file("b.txt", "two").build())
        .unwrap();
    manager.apply_manual_edit("a.txt", "một".to_string()).unwrap();
    manager.apply_manual_edit("b.txt", "hai".to_string()).unwrap();

    // b.txt is gone, c.txt is new
    let outcome = manager
        .open_archive("pack.mcaddon", AddonBuilder::new().file("a.txt", "one!").file("c.txt", "three").build())
        .unwrap();

    assert_eq!(
        outcome,
        ScanOutcome::Merged {
            candidates: 2,
            carried_over: 1
        }
    );
    let paths: Vec<&str> = manager.job().entries().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["a.txt", "c.txt"]);
    assert_eq!(manager.job().entry("a.txt").unwrap().content, "one!");
    assert_eq!(manager.job().entry("c.txt").unwrap().status, EntryStatus::Pending);
}

#[test]
fn test_openArchive_withOtherName_shouldReplaceJob() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager.open_archive("one.mcaddon", sample_addon().build()).unwrap();
    manager.apply_manual_edit("readme.txt", "x".to_string()).unwrap();

    let outcome = manager.open_archive("two.mcaddon", sample_addon().build()).unwrap();
    assert_eq!(outcome, ScanOutcome::Fresh { candidates: 5 });
    assert!(!manager.job().any_completed());
    assert_eq!(manager.job().archive_name, "two.mcaddon");
}

#[test]
fn test_openArchive_withMalformedBytes_shouldKeepJob() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();

    let result = manager.open_archive("pack.mcaddon", b"PK but broken".to_vec());
    assert!(matches!(result, Err(JobError::Archive(_))));
    assert_eq!(manager.job().entries().len(), 5);
}

#[test]
fn test_openArchive_withoutCandidates_shouldReportNone() {
    let mut manager = manager_with(&MemorySnapshotStore::new());
    let outcome = manager
        .open_archive("art.mcpack", AddonBuilder::new().file("a.png", [0u8, 1]).build())
        .unwrap();
    assert_eq!(outcome, ScanOutcome::NoCandidatesFound);
}

#[test]
fn test_recordResult_withFailure_shouldKeepEarlierTranslation() {
    let mut manager = manager_with(&MemorySnapshotStore::new());
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();
    manager.apply_manual_edit("readme.txt", "bản cũ".to_string()).unwrap();

    let status = manager
        .record_result("readme.txt", Err(TranslationError::EmptyResponse))
        .unwrap();

    assert_eq!(status, EntryStatus::Error);
    assert_eq!(
        manager.job().entry("readme.txt").unwrap().translated_content.as_deref(),
        Some("bản cũ")
    );
}

#[test]
fn test_everyChange_shouldBeSaved() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();
    manager.toggle_all_matching("bp/");

    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.archive_name, "pack.mcaddon");
    let deselected: Vec<&str> = saved
        .entries
        .iter()
        .filter(|e| !e.selected)
        .map(|e| e.path.as_str())
        .collect();
    assert_eq!(deselected, vec!["BP/scripts/main.js", "BP/functions/greet.mcfunction"]);
}

#[test]
fn test_restore_withoutArchive_shouldRequireReupload() {
    let store = MemorySnapshotStore::new();
    manager_with(&store)
        .open_archive("pack.mcaddon", sample_addon().build())
        .unwrap();

    let mut restored = JobManager::restore(Box::new(store.clone())).unwrap();
    assert_eq!(restored.job().entries().len(), 5);
    assert!(restored.restore_notice().unwrap().contains("pack.mcaddon"));
    assert!(matches!(
        restored.try_begin_run(),
        Err(JobError::ReuploadRequired(name)) if name == "pack.mcaddon"
    ));
    assert!(matches!(restored.build_output(), Err(JobError::ReuploadRequired(_))));

    // Manual edits and selection work without the archive
    restored.apply_manual_edit("readme.txt", "xin chào".to_string()).unwrap();
    restored.toggle_selection("readme.txt").unwrap();
}

#[test]
fn test_restore_withTranslatingEntry_shouldResetToPending() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();
    manager.claim("readme.txt").unwrap();
    assert_eq!(store.load().unwrap().unwrap().entries[4].status, EntryStatus::Translating);

    let restored = JobManager::restore(Box::new(store.clone())).unwrap();
    assert_eq!(restored.job().entry("readme.txt").unwrap().status, EntryStatus::Pending);
}

#[test]
fn test_restore_withCorruptDocument_shouldStartEmpty() {
    let store = MemorySnapshotStore::new();
    store.set_raw("{ not json");

    let restored = JobManager::restore(Box::new(store)).unwrap();
    assert!(!restored.job().has_state());
    assert!(restored.restore_notice().is_none());
}

#[test]
fn test_tryBeginRun_twice_shouldRejectSecond() {
    let mut manager = manager_with(&MemorySnapshotStore::new());
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();

    let ticket = manager.try_begin_run().unwrap();
    assert_eq!(ticket.len(), 5);
    assert!(matches!(manager.try_begin_run(), Err(JobError::RunInFlight)));
    assert!(matches!(manager.try_begin_retry("readme.txt"), Err(JobError::RunInFlight)));

    drop(ticket);
    assert!(manager.try_begin_run().is_ok());
}

#[test]
fn test_setLanguages_withAutoTarget_shouldFail() {
    let mut manager = manager_with(&MemorySnapshotStore::new());
    let result = manager.set_languages(SupportLanguage::English, SupportLanguage::Auto);
    assert!(matches!(result, Err(JobError::AutoTarget)));
    assert_eq!(manager.job().target_language, SupportLanguage::Vietnamese);
}

#[test]
fn test_reset_shouldClearStoreAndKeepLanguages() {
    let store = MemorySnapshotStore::new();
    let mut manager = manager_with(&store);
    manager
        .set_languages(SupportLanguage::English, SupportLanguage::Japanese)
        .unwrap();
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();

    manager.reset().unwrap();

    assert!(store.raw().is_none());
    assert!(!manager.job().has_state());
    assert_eq!(manager.job().target_language, SupportLanguage::Japanese);
}

#[test]
fn test_outputFileName_shouldUseTargetDisplayName() {
    let mut manager = manager_with(&MemorySnapshotStore::new());
    manager.open_archive("cool pack.mcaddon", sample_addon().build()).unwrap();
    assert_eq!(manager.output_file_name(), "cool pack_Vietnamese.mcaddon");
}
