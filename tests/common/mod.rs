/*!
 * Common test utilities for the mcat test suite
 */

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use mcat::archive::ArchiveWriter;

// Re-export the scripted backends module
pub mod scripted_backends;

/// Route library logs through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

fn fixed_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

/// Builds addon archives in memory
#[derive(Default)]
pub struct AddonBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl AddonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.push((path.to_string(), content.as_ref().to_vec()));
        self
    }

    /// Same files always give the same bytes
    pub fn build(self) -> Vec<u8> {
        let mut writer = ArchiveWriter::with_timestamp(fixed_timestamp());
        for (path, content) in &self.files {
            writer.add_file(path, content).expect("valid entry");
        }
        writer.finish().expect("archive builds")
    }

    /// Build the archive and write it into `dir`
    pub fn write_to(self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        let path = dir.join(file_name);
        fs::write(&path, self.build())?;
        Ok(path)
    }
}

/// A small addon with one file of every kind plus files that are skipped
pub fn sample_addon() -> AddonBuilder {
    AddonBuilder::new()
        .file("RP/texts/en_US.lang", "item.apple.name=Apple\nitem.bread.name=Bread\n")
        .file(
            "RP/manifest.json",
            r#"{"header":{"name":"Sample Pack","description":"A pack"}}"#,
        )
        .file("RP/textures/apple.png", [0x89u8, b'P', b'N', b'G', 0, 1, 2, 3])
        .file("BP/scripts/main.js", "world.sendMessage(\"Welcome!\");")
        .file("BP/functions/greet.mcfunction", "say Hello there")
        .file("BP/entities/cow.json", r#"{"format_version":"1.20.0"}"#)
        .file("readme.txt", "Thanks for downloading")
}

/// Paths of `sample_addon` that classify as translatable, in archive order
pub const SAMPLE_TRANSLATABLE: [&str; 5] = [
    "RP/texts/en_US.lang",
    "RP/manifest.json",
    "BP/scripts/main.js",
    "BP/functions/greet.mcfunction",
    "readme.txt",
];
