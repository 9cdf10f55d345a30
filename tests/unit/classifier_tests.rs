/*!
 * Tests for translatable file detection
 */

use mcat::archive::ArchiveHandle;
use mcat::classifier::{classify, scan_archive};
use mcat::job::{ContentKind, EntryStatus};

use crate::common::{sample_addon, AddonBuilder, SAMPLE_TRANSLATABLE};

#[test]
fn test_scanArchive_withSampleAddon_shouldFindTranslatableInOrder() {
    let handle = ArchiveHandle::open(sample_addon().build()).unwrap();
    let entries = scan_archive(&handle).unwrap();

    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, SAMPLE_TRANSLATABLE);

    let kinds: Vec<ContentKind> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ContentKind::Localization,
            ContentKind::StructuredData,
            ContentKind::Script,
            ContentKind::CommandScript,
            ContentKind::PlainText,
        ]
    );
    assert!(entries.iter().all(|e| e.selected && e.status == EntryStatus::Pending));
}

#[test]
fn test_scanArchive_withOnlyAssets_shouldFindNothing() {
    let handle = ArchiveHandle::open(
        AddonBuilder::new()
            .file("RP/textures/a.png", [1u8, 2, 3])
            .file("RP/sounds/b.ogg", [4u8, 5, 6])
            .file("BP/entities/c.json", r#"{"minecraft:entity":{}}"#)
            .build(),
    )
    .unwrap();

    assert!(scan_archive(&handle).unwrap().is_empty());
}

#[test]
fn test_classify_withManifest_shouldAlwaysBeStructuredData() {
    assert_eq!(classify("BP/MANIFEST.json", "{}"), Some(ContentKind::StructuredData));
    assert_eq!(classify("BP/items/x.json", "{}"), None);
    assert_eq!(
        classify("RP/ui/hud.json5", r#"{ "text": "Hi" }"#),
        Some(ContentKind::StructuredData)
    );
}

#[test]
fn test_classify_withExtensionCase_shouldIgnoreCase() {
    assert_eq!(classify("RP/texts/EN_US.LANG", "a=b"), Some(ContentKind::Localization));
    assert_eq!(classify("RP/pack_icon.PNG", "a=b"), None);
}

#[test]
fn test_classify_withoutSignals_shouldSkip() {
    assert_eq!(classify("BP/scripts/math.js", "export const x = 1;"), None);
    assert_eq!(classify("BP/functions/tick.mcfunction", "effect @a speed"), None);
    assert_eq!(classify("notes.txt", "   \n"), None);
    assert_eq!(classify("LICENSE", "MIT"), None);
}

#[test]
fn test_classify_withSignals_shouldPickKind() {
    assert_eq!(classify("BP/scripts/ui.ts", "const s = `hi`;"), Some(ContentKind::Script));
    assert_eq!(
        classify("BP/functions/tick.mcfunction", "# comment only"),
        Some(ContentKind::CommandScript)
    );
    assert_eq!(classify("docs/README.md", "# Title"), Some(ContentKind::PlainText));
}

#[test]
fn test_scanArchive_withDuplicateNames_shouldKeepLastCopyOnce() {
    let handle = ArchiveHandle::open(
        AddonBuilder::new()
            .file("readme.txt", "first")
            .file("RP/texts/en_US.lang", "a=b")
            .file("readme.txt", "second")
            .build(),
    )
    .unwrap();

    let entries = scan_archive(&handle).unwrap();
    let found: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.path.as_str(), e.content.as_str()))
        .collect();
    assert_eq!(found, vec![("RP/texts/en_US.lang", "a=b"), ("readme.txt", "second")]);
}

#[test]
fn test_scanArchive_withCorruptBinaryEntry_shouldStillSucceed() {
    let mut bytes = AddonBuilder::new()
        .file("BP/structures/house.mcstructure", "STRUCTURE-PAYLOAD")
        .file("readme.txt", "Hello")
        .build();
    let payload = bytes
        .windows(b"STRUCTURE-PAYLOAD".len())
        .position(|w| w == b"STRUCTURE-PAYLOAD")
        .unwrap();
    bytes[payload] ^= 0xFF;

    let handle = ArchiveHandle::open(bytes).unwrap();
    assert!(handle.read_bytes("BP/structures/house.mcstructure").is_err());

    let entries = scan_archive(&handle).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "readme.txt");
}
