/*!
 * Translatable file detection.
 *
 * Decides from a path and its decoded text whether a file inside an addon is
 * likely to contain player-visible text, and which [`ContentKind`] it is.
 * The checks are substring heuristics over the raw text.
 */

use log::{debug, info};

use crate::archive::ArchiveHandle;
use crate::errors::ArchiveError;
use crate::job::models::{ContentKind, TranslatableEntry};

/// Extensions that are never decoded as text
pub const BINARY_EXTENSIONS: &[&str] = &["png", "tga", "wav", "ogg", "fsb", "bin", "dat", "pyc"];

/// Extensions that can classify as translatable; nothing else is decompressed
pub const TEXT_EXTENSIONS: &[&str] = &["lang", "json", "json5", "js", "ts", "mcfunction", "txt", "md"];

/// JSON keys whose values are usually shown to the player (quotes included)
pub const DISPLAY_KEYWORDS: &[&str] = &[
    "\"name\"",
    "\"description\"",
    "\"display_name\"",
    "\"text\"",
    "\"label\"",
    "\"title\"",
    "\"subtitle\"",
    "\"value\"",
    "\"header\"",
    "\"footer\"",
    "\"rawtext\"",
    "\"translate\"",
];

/// Lowercased text after the final `.` of the path.
///
/// A path without any `.` yields the whole lowercased path, which matches no
/// known extension.
pub fn extension_of(path: &str) -> String {
    match path.rfind('.') {
        Some(pos) => path[pos + 1..].to_lowercase(),
        None => path.to_lowercase(),
    }
}

/// Whether the path is excluded before its content is ever read
pub fn is_binary_path(path: &str) -> bool {
    let ext = extension_of(path);
    BINARY_EXTENSIONS.contains(&ext.as_str())
}

/// Whether the content of the path is worth decoding at all
pub fn may_hold_text(path: &str) -> bool {
    let ext = extension_of(path);
    TEXT_EXTENSIONS.contains(&ext.as_str())
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Classify a file. `None` means the file is skipped.
pub fn classify(path: &str, content: &str) -> Option<ContentKind> {
    if path.ends_with('/') || is_binary_path(path) {
        return None;
    }

    match extension_of(path).as_str() {
        "lang" => Some(ContentKind::Localization),
        "json" | "json5" => {
            let is_manifest = basename(path).eq_ignore_ascii_case("manifest.json");
            let has_display_text = DISPLAY_KEYWORDS.iter().any(|kw| content.contains(kw));
            (is_manifest || has_display_text).then_some(ContentKind::StructuredData)
        }
        "js" | "ts" => {
            let has_literal = content.contains('\'') || content.contains('"') || content.contains('`');
            has_literal.then_some(ContentKind::Script)
        }
        "mcfunction" => {
            let has_text = content.contains("say ") || content.contains("rawtext") || content.contains('#');
            has_text.then_some(ContentKind::CommandScript)
        }
        "txt" | "md" => (!content.trim().is_empty()).then_some(ContentKind::PlainText),
        _ => None,
    }
}

/// Scan every file entry of an archive, in archive order.
///
/// Only entries with a text extension are decompressed, so a broken texture
/// or structure file never fails the scan. Of duplicate names only the last
/// copy is scanned, matching [`ArchiveHandle::entry`]. Text entries that
/// cannot be decoded fail the whole scan.
pub fn scan_archive(handle: &ArchiveHandle) -> Result<Vec<TranslatableEntry>, ArchiveError> {
    let mut found = Vec::new();

    for entry in handle.entries() {
        if entry.is_directory || !may_hold_text(&entry.name) {
            continue;
        }
        if !handle.is_indexed(entry) {
            debug!("Skipping shadowed duplicate {}", entry.name);
            continue;
        }

        let content = handle.read_text(&entry.name)?;
        match classify(&entry.name, &content) {
            Some(kind) => {
                debug!("Found {} file: {}", kind, entry.name);
                found.push(TranslatableEntry::new(entry.name.clone(), content, kind));
            }
            None => debug!("Skipping {}", entry.name),
        }
    }

    info!(
        "Scan found {} translatable files out of {} entries",
        found.len(),
        handle.len()
    );
    Ok(found)
}
