//! Repackaging: the original archive with translated entries laid over it.

use log::debug;
use std::collections::HashMap;

use crate::errors::ArchiveError;
use crate::job::models::{EntryStatus, TranslatableEntry};

use super::reader::ArchiveHandle;
use super::writer::ArchiveWriter;

/// Where a translated entry is written in the output archive.
///
/// Localization files under a `texts/` directory are renamed after the target
/// locale so the game picks them up (`RP/texts/en_US.lang` becomes
/// `RP/texts/vi_VN.lang`); every other path is kept as is.
pub fn localization_target_path(path: &str, target_code: &str) -> String {
    if path.contains("texts/") && path.ends_with(".lang") {
        let dir = match path.rfind('/') {
            Some(pos) => &path[..=pos],
            None => "",
        };
        format!("{}{}.lang", dir, target_code)
    } else {
        path.to_string()
    }
}

/// Build the output archive.
///
/// Every original entry is copied in order with its compressed payload
/// untouched. Completed entries with non-empty content then replace the entry
/// at their target path, or are appended when no such entry exists. Output
/// paths are unique: of duplicate names in the input only the last copy is
/// written, the one [`ArchiveHandle::entry`] resolves to.
pub fn build_output_archive(
    handle: &ArchiveHandle,
    entries: &[TranslatableEntry],
    target_code: &str,
) -> Result<Vec<u8>, ArchiveError> {
    // Target path -> translated text, in job order, last writer wins
    let mut order: Vec<String> = Vec::new();
    let mut overlays: HashMap<String, &str> = HashMap::new();
    for entry in entries {
        let content = match (&entry.status, &entry.translated_content) {
            (EntryStatus::Completed, Some(content)) if !content.is_empty() => content.as_str(),
            _ => continue,
        };
        let target = localization_target_path(&entry.path, target_code);
        if overlays.insert(target.clone(), content).is_none() {
            order.push(target);
        }
    }

    let mut writer = ArchiveWriter::new();

    for original in handle.entries() {
        if !handle.is_indexed(original) {
            debug!("Skipping shadowed duplicate {}", original.name);
            continue;
        }

        if let Some(content) = overlays.get(&original.name) {
            debug!("Replacing {} with translated content", original.name);
            writer.add_file(&original.name, content.as_bytes())?;
        } else if original.is_directory {
            writer.add_directory(&original.name)?;
        } else {
            let raw = handle.raw_data(original)?;
            writer.add_raw(original, &raw)?;
        }
    }

    for target in &order {
        if handle.entry(target).is_some() {
            continue;
        }
        debug!("Adding translated entry {}", target);
        writer.add_file(target, overlays[target].as_bytes())?;
    }

    writer.finish()
}
