/*!
 * End-to-end tests: scan, translate, retry, edit and package an addon
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mcat::app_config::Config;
use mcat::app_controller::Controller;
use mcat::archive::ArchiveHandle;
use mcat::database::MemorySnapshotStore;
use mcat::errors::JobError;
use mcat::job::{EntryStatus, ScanOutcome};
use mcat::translation::TranslationBackend;

use crate::common::scripted_backends::ScriptedBackend;
use crate::common::{self, AddonBuilder};

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.translation.common.rate_limit_delay_ms = 0;
    config
}

fn controller_for(backend: Arc<dyn TranslationBackend>, config: Config, out: &Path) -> Result<Controller> {
    Ok(Controller::with_parts(config, Box::new(MemorySnapshotStore::new()), backend)?
        .with_output_dir(Some(out.to_path_buf())))
}

/// Localization, plain text and command script: one of each
fn three_file_addon(dir: &Path) -> Result<PathBuf> {
    AddonBuilder::new()
        .file("RP/texts/en_US.lang", "item.apple.name=Apple\n")
        .file("RP/textures/apple.png", [0x89u8, b'P', b'N', b'G'])
        .file("readme.txt", "Hello miner")
        .file("BP/functions/greet.mcfunction", "say Welcome")
        .write_to(dir, "farm.mcaddon")
}

fn open_output(path: &Path) -> ArchiveHandle {
    ArchiveHandle::open(std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_translate_withOneFailure_shouldPackagePartialResult() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let backend = ScriptedBackend::new();
    backend.fail_on("say Welcome");
    let controller = controller_for(backend.clone(), quiet_config(), temp_dir.path())?;

    let outcome = controller.translate(&archive).await?;

    let summary = outcome.summary.unwrap();
    assert_eq!((summary.completed, summary.failed), (2, 1));
    assert_eq!(summary.to_string(), "done with 1 file errors");

    let output = open_output(&outcome.output.unwrap());
    assert_eq!(output.read_text("RP/texts/en_US.lang")?, "item.apple.name=Apple\n");
    assert_eq!(output.read_text("RP/texts/vi_VN.lang")?, "[Vietnamese] item.apple.name=Apple\n");
    assert_eq!(output.read_text("readme.txt")?, "[Vietnamese] Hello miner");
    assert_eq!(output.read_text("BP/functions/greet.mcfunction")?, "say Welcome");
    assert_eq!(output.read_bytes("RP/textures/apple.png")?, vec![0x89u8, b'P', b'N', b'G']);

    let guard = controller.job().lock();
    let failed = guard.job().entry("BP/functions/greet.mcfunction").unwrap();
    assert_eq!(failed.status, EntryStatus::Error);
    assert!(failed.translated_content.is_none());
    Ok(())
}

#[tokio::test]
async fn test_translate_again_shouldOnlySendUnfinishedFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let backend = ScriptedBackend::new();
    backend.fail_on("say Welcome");
    let controller = controller_for(backend.clone(), quiet_config(), temp_dir.path())?;
    controller.translate(&archive).await?;
    assert_eq!(backend.calls().len(), 3);

    backend.clear_failures();
    let outcome = controller.translate(&archive).await?;

    assert_eq!(backend.calls().len(), 4);
    assert_eq!(backend.calls()[3], "say Welcome");
    assert_eq!(outcome.summary.unwrap().completed, 1);
    let output = open_output(&outcome.output.unwrap());
    assert_eq!(output.read_text("BP/functions/greet.mcfunction")?, "[Vietnamese] say Welcome");
    Ok(())
}

#[tokio::test]
async fn test_retry_afterFailure_shouldPackageWhenAllSelectedDone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let backend = ScriptedBackend::new();
    backend.fail_on("say Welcome");
    let controller = controller_for(backend.clone(), quiet_config(), temp_dir.path())?;
    controller.translate(&archive).await?;

    // Still failing: nothing new is written
    let still_failing = controller.retry(&archive, "BP/functions/greet.mcfunction").await?;
    assert!(still_failing.output.is_none());
    assert_eq!(still_failing.summary.unwrap().failed, 1);

    backend.clear_failures();
    let fixed = controller.retry(&archive, "BP/functions/greet.mcfunction").await?;
    assert!(fixed.output.is_some());
    assert!(controller.job().lock().job().all_selected_completed());
    Ok(())
}

#[tokio::test]
async fn test_retry_withUnknownPath_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let controller = controller_for(ScriptedBackend::new(), quiet_config(), temp_dir.path())?;

    let error = controller.retry(&archive, "BP/functions/missing.mcfunction").await.unwrap_err();
    assert!(matches!(error.downcast_ref::<JobError>(), Some(JobError::UnknownEntry(_))));
    Ok(())
}

#[tokio::test]
async fn test_edit_afterError_shouldOverlayManualText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let backend = ScriptedBackend::new();
    backend.fail_on("Hello miner");
    let controller = controller_for(backend, quiet_config(), temp_dir.path())?;
    controller.translate(&archive).await?;

    let outcome = controller.edit("readme.txt", "Xin chào thợ mỏ".to_string(), Some(&archive))?;

    let output = open_output(&outcome.output.unwrap());
    assert_eq!(output.read_text("readme.txt")?, "Xin chào thợ mỏ");
    assert_eq!(
        controller.job().lock().job().entry("readme.txt").unwrap().status,
        EntryStatus::Completed
    );
    Ok(())
}

#[tokio::test]
async fn test_translate_withDeselectedFile_shouldLeaveItOriginal() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let backend = ScriptedBackend::new();
    let controller = controller_for(backend.clone(), quiet_config(), temp_dir.path())?;
    controller.scan(&archive)?;
    assert!(!controller.toggle("readme.txt")?);

    let outcome = controller.translate(&archive).await?;

    assert!(!backend.calls().iter().any(|c| c == "Hello miner"));
    let output = open_output(&outcome.output.unwrap());
    assert_eq!(output.read_text("readme.txt")?, "Hello miner");
    Ok(())
}

#[tokio::test]
async fn test_translate_toJapanese_shouldNameOutputsAfterTarget() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let mut config = quiet_config();
    config.target_language = "ja".to_string();
    let controller = controller_for(ScriptedBackend::new(), config, temp_dir.path())?;

    let output_path = controller.translate(&archive).await?.output.unwrap();

    assert_eq!(output_path.file_name().unwrap(), "farm_Japanese.mcaddon");
    let output = open_output(&output_path);
    assert_eq!(output.read_text("RP/texts/ja_JP.lang")?, "[Japanese] item.apple.name=Apple\n");
    Ok(())
}

#[tokio::test]
async fn test_translate_withAssetsOnly_shouldDoNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = AddonBuilder::new()
        .file("RP/textures/a.png", [1u8, 2, 3])
        .write_to(temp_dir.path(), "art.mcpack")?;
    let backend = ScriptedBackend::new();
    let controller = controller_for(backend.clone(), quiet_config(), temp_dir.path())?;

    assert_eq!(controller.scan(&archive)?, ScanOutcome::NoCandidatesFound);
    let outcome = controller.translate(&archive).await?;
    assert!(outcome.summary.is_none());
    assert!(outcome.output.is_none());
    assert!(backend.calls().is_empty());
    Ok(())
}

#[test]
fn test_package_withNothingTranslated_shouldCopyOriginalEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let controller = controller_for(ScriptedBackend::new(), quiet_config(), temp_dir.path())?;

    let output = open_output(&controller.package(&archive)?);
    let original = open_output(&archive);
    assert_eq!(output.paths(), original.paths());
    for path in original.paths() {
        assert_eq!(output.read_bytes(path)?, original.read_bytes(path)?);
    }
    Ok(())
}

#[test]
fn test_toggleMatching_shouldFlipGroup() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let archive = three_file_addon(temp_dir.path())?;
    let controller = controller_for(ScriptedBackend::new(), quiet_config(), temp_dir.path())?;
    controller.scan(&archive)?;

    assert_eq!(controller.toggle_matching("RP/"), (false, 1));
    assert_eq!(controller.toggle_matching("rp/"), (true, 1));
    assert!(controller.status_report(true).contains("[x] pending"));
    Ok(())
}
