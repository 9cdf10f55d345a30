/*!
 * Tests for archive reading, writing and the translation overlay
 */

use mcat::archive::{build_output_archive, localization_target_path, ArchiveHandle};
use mcat::errors::ArchiveError;
use mcat::job::{ContentKind, EntryStatus, TranslatableEntry};

use crate::common::{sample_addon, AddonBuilder};

fn completed(path: &str, original: &str, translated: &str, kind: ContentKind) -> TranslatableEntry {
    let mut entry = TranslatableEntry::new(path, original, kind);
    entry.translated_content = Some(translated.to_string());
    entry.status = EntryStatus::Completed;
    entry
}

/// Packaging without completed entries keeps every original entry's bytes
#[test]
fn test_buildOutput_withZeroCompleted_shouldCopyEveryEntryUnchanged() {
    let original = ArchiveHandle::open(sample_addon().build()).unwrap();
    let pending = vec![TranslatableEntry::new(
        "readme.txt",
        "Thanks for downloading",
        ContentKind::PlainText,
    )];

    let output = build_output_archive(&original, &pending, "vi_VN").unwrap();
    let copy = ArchiveHandle::open(output).unwrap();

    assert_eq!(copy.paths(), original.paths());
    for entry in original.entries() {
        let copied = copy.entry(&entry.name).unwrap();
        assert_eq!(copied.crc32, entry.crc32);
        assert_eq!(
            copy.raw_data(copied).unwrap(),
            original.raw_data(entry).unwrap(),
            "compressed payload of {} changed",
            entry.name
        );
        assert_eq!(copy.read_bytes(&entry.name).unwrap(), original.read_bytes(&entry.name).unwrap());
    }
}

#[test]
fn test_buildOutput_runTwice_shouldProduceSameEntries() {
    let original = ArchiveHandle::open(sample_addon().build()).unwrap();
    let entries = vec![
        completed("RP/texts/en_US.lang", "a=Apple", "a=Táo", ContentKind::Localization),
        completed("readme.txt", "Thanks", "Cảm ơn", ContentKind::PlainText),
    ];

    let first = ArchiveHandle::open(build_output_archive(&original, &entries, "vi_VN").unwrap()).unwrap();
    let second = ArchiveHandle::open(build_output_archive(&original, &entries, "vi_VN").unwrap()).unwrap();

    assert_eq!(first.paths(), second.paths());
    for path in first.paths() {
        assert_eq!(first.read_bytes(path).unwrap(), second.read_bytes(path).unwrap());
    }
}

#[test]
fn test_buildOutput_withLocalization_shouldAddTargetLocaleFile() {
    let original = ArchiveHandle::open(sample_addon().build()).unwrap();
    let entries = vec![completed(
        "RP/texts/en_US.lang",
        "item.apple.name=Apple",
        "item.apple.name=Táo",
        ContentKind::Localization,
    )];

    let output = ArchiveHandle::open(build_output_archive(&original, &entries, "vi_VN").unwrap()).unwrap();

    assert_eq!(output.len(), original.len() + 1);
    assert_eq!(
        output.read_text("RP/texts/en_US.lang").unwrap(),
        "item.apple.name=Apple\nitem.bread.name=Bread\n"
    );
    assert_eq!(output.read_text("RP/texts/vi_VN.lang").unwrap(), "item.apple.name=Táo");
}

#[test]
fn test_buildOutput_withExistingTargetLocale_shouldReplaceIt() {
    let original = ArchiveHandle::open(
        AddonBuilder::new()
            .file("RP/texts/en_US.lang", "a=Apple")
            .file("RP/texts/vi_VN.lang", "a=old")
            .build(),
    )
    .unwrap();
    let entries = vec![completed("RP/texts/en_US.lang", "a=Apple", "a=Táo", ContentKind::Localization)];

    let output = ArchiveHandle::open(build_output_archive(&original, &entries, "vi_VN").unwrap()).unwrap();

    assert_eq!(output.len(), 2);
    assert_eq!(output.read_text("RP/texts/vi_VN.lang").unwrap(), "a=Táo");
}

#[test]
fn test_buildOutput_withEmptyTranslation_shouldKeepOriginal() {
    let original = ArchiveHandle::open(sample_addon().build()).unwrap();
    let entries = vec![completed("readme.txt", "Thanks for downloading", "", ContentKind::PlainText)];

    let output = ArchiveHandle::open(build_output_archive(&original, &entries, "vi_VN").unwrap()).unwrap();
    assert_eq!(output.read_text("readme.txt").unwrap(), "Thanks for downloading");
}

#[test]
fn test_localizationTargetPath_outsideTexts_shouldKeepPath() {
    assert_eq!(localization_target_path("RP/texts/en_US.lang", "ja_JP"), "RP/texts/ja_JP.lang");
    assert_eq!(localization_target_path("RP/lang/en_US.lang", "ja_JP"), "RP/lang/en_US.lang");
    assert_eq!(localization_target_path("RP/readme.txt", "ja_JP"), "RP/readme.txt");
}

#[test]
fn test_open_withGarbage_shouldBeMalformed() {
    let result = ArchiveHandle::open(b"definitely not a zip file".to_vec());
    assert!(matches!(result, Err(ArchiveError::MalformedArchive(_))));
}

#[test]
fn test_readText_withMissingEntry_shouldReportPath() {
    let handle = ArchiveHandle::open(sample_addon().build()).unwrap();
    match handle.read_text("RP/texts/fr_FR.lang") {
        Err(ArchiveError::EntryNotFound(path)) => assert_eq!(path, "RP/texts/fr_FR.lang"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_buildOutput_withDuplicateNames_shouldWriteIndexedCopy() {
    let original = ArchiveHandle::open(
        AddonBuilder::new()
            .file("readme.txt", "first")
            .file("icon.png", [1u8, 2, 3])
            .file("readme.txt", "second")
            .build(),
    )
    .unwrap();
    assert_eq!(original.len(), 3);

    let untouched = ArchiveHandle::open(build_output_archive(&original, &[], "vi_VN").unwrap()).unwrap();
    assert_eq!(untouched.paths(), vec!["icon.png", "readme.txt"]);
    assert_eq!(untouched.read_text("readme.txt").unwrap(), "second");

    let entries = vec![completed("readme.txt", "second", "thứ hai", ContentKind::PlainText)];
    let output = ArchiveHandle::open(build_output_archive(&original, &entries, "vi_VN").unwrap()).unwrap();
    assert_eq!(output.len(), 2);
    assert_eq!(output.read_text("readme.txt").unwrap(), "thứ hai");
}
