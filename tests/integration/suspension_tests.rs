/*!
 * Progress stays readable while a translation request is outstanding
 */

use anyhow::Result;

use mcat::app_config::Config;
use mcat::app_controller::Controller;
use mcat::database::{MemorySnapshotStore, SnapshotStore};
use mcat::errors::JobError;
use mcat::job::{EntryStatus, JobManager, TranslationJob};
use mcat::translation::TranslationRunner;

use crate::common::scripted_backends::GatedBackend;
use crate::common::{self, sample_addon, AddonBuilder, SAMPLE_TRANSLATABLE};

#[tokio::test]
async fn test_run_whileSuspended_shouldExposeInFlightEntry() {
    common::init_logging();
    let store = MemorySnapshotStore::new();
    let mut manager = JobManager::new(Box::new(store.clone()), TranslationJob::default());
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();
    let job = manager.into_shared();

    let backend = GatedBackend::new();
    let runner = TranslationRunner::new(backend.clone());
    let handle = {
        let runner = runner.clone();
        let job = job.clone();
        tokio::spawn(async move { runner.run(&job).await })
    };

    backend.started.notified().await;
    {
        let guard = job.lock();
        assert!(guard.is_running());
        assert_eq!(guard.job().in_flight_path(), Some(SAMPLE_TRANSLATABLE[0]));
        assert_eq!(guard.job().progress().translating, 1);
    }
    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved.entries[0].status, EntryStatus::Translating);

    // A second run is refused while the first is suspended
    assert!(matches!(runner.run(&job).await, Err(JobError::RunInFlight)));
    assert!(matches!(
        runner.retry(&job, SAMPLE_TRANSLATABLE[1]).await,
        Err(JobError::RunInFlight)
    ));

    backend.release.notify_one();
    for _ in 1..SAMPLE_TRANSLATABLE.len() {
        backend.started.notified().await;
        backend.release.notify_one();
    }

    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.completed, SAMPLE_TRANSLATABLE.len());
    let guard = job.lock();
    assert!(!guard.is_running());
    assert!(guard.job().in_flight_path().is_none());
    assert_eq!(
        guard.job().entry("readme.txt").unwrap().translated_content.as_deref(),
        Some("THANKS FOR DOWNLOADING")
    );
}

#[tokio::test]
async fn test_statusReport_duringTranslate_shouldNameCurrentFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = sample_addon().write_to(temp_dir.path(), "pack.mcaddon")?;
    let backend = GatedBackend::new();
    let mut config = Config::default();
    config.translation.common.rate_limit_delay_ms = 0;
    let controller = Controller::with_parts(config, Box::new(MemorySnapshotStore::new()), backend.clone())?
        .with_output_dir(Some(temp_dir.path().join("out")));

    let translate = controller.translate(&archive);
    let observe = async {
        backend.started.notified().await;
        let report = controller.status_report(false);
        assert!(report.contains("Translating: RP/texts/en_US.lang"), "{}", report);
        assert!(report.contains("1 translating"), "{}", report);

        let second = TranslationRunner::new(backend.clone()).run(controller.job()).await;
        assert!(matches!(second, Err(JobError::RunInFlight)));

        backend.release.notify_one();
        for _ in 1..SAMPLE_TRANSLATABLE.len() {
            backend.started.notified().await;
            backend.release.notify_one();
        }
    };

    let (outcome, ()) = tokio::join!(translate, observe);
    let outcome = outcome?;
    assert_eq!(outcome.summary.unwrap().completed, SAMPLE_TRANSLATABLE.len());
    assert!(outcome.output.unwrap().starts_with(temp_dir.path().join("out")));
    assert!(!controller.job().lock().is_running());
    Ok(())
}

#[tokio::test]
async fn test_reset_whileSuspended_shouldDropRemainingResults() {
    let mut manager = JobManager::new(Box::new(MemorySnapshotStore::new()), TranslationJob::default());
    manager.open_archive("pack.mcaddon", sample_addon().build()).unwrap();
    let job = manager.into_shared();
    let backend = GatedBackend::new();
    let handle = {
        let runner = TranslationRunner::new(backend.clone());
        let job = job.clone();
        tokio::spawn(async move { runner.run(&job).await })
    };

    backend.started.notified().await;
    job.lock().reset().unwrap();
    backend.release.notify_one();

    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.skipped, SAMPLE_TRANSLATABLE.len());
    assert!(!job.lock().job().has_state());
}

#[tokio::test]
async fn test_reopen_whileSuspended_shouldNotLeakOldResult() {
    let mut manager = JobManager::new(Box::new(MemorySnapshotStore::new()), TranslationJob::default());
    manager
        .open_archive("a.mcpack", AddonBuilder::new().file("readme.txt", "old pack text").build())
        .unwrap();
    let job = manager.into_shared();
    let backend = GatedBackend::new();
    let handle = {
        let runner = TranslationRunner::new(backend.clone());
        let job = job.clone();
        tokio::spawn(async move { runner.run(&job).await })
    };

    backend.started.notified().await;
    {
        let mut guard = job.lock();
        guard.reset().unwrap();
        guard
            .open_archive("b.mcpack", AddonBuilder::new().file("readme.txt", "new pack text").build())
            .unwrap();
    }
    backend.release.notify_one();

    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.skipped, 1);

    let guard = job.lock();
    let readme = guard.job().entry("readme.txt").unwrap();
    assert_eq!(readme.content, "new pack text");
    assert_eq!(readme.status, EntryStatus::Pending);
    assert!(readme.translated_content.is_none());
    assert!(!guard.is_running());
}
