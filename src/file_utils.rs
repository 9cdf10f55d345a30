use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::language_utils::SupportLanguage;

// @module: File and path utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Name of the translated archive
    // @example: pack.mcaddon + Vietnamese -> pack_Vietnamese.mcaddon
    pub fn output_file_name(archive_name: &str, target_language: SupportLanguage) -> String {
        let target = target_language.display_name();
        match archive_name.rfind('.') {
            Some(pos) if pos > 0 => {
                format!("{}_{}{}", &archive_name[..pos], target, &archive_name[pos..])
            }
            _ => format!("{}_{}", archive_name, target),
        }
    }

    // @generates: Output path next to the input archive, or inside output_dir
    pub fn generate_output_path<P: AsRef<Path>>(
        input_file: P,
        output_dir: Option<&Path>,
        target_language: SupportLanguage,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let name = Self::display_name(input_file);
        let file_name = Self::output_file_name(&name, target_language);

        match output_dir {
            Some(dir) => dir.join(file_name),
            None => input_file
                .parent()
                .map(|p| p.join(&file_name))
                .unwrap_or_else(|| PathBuf::from(&file_name)),
        }
    }

    /// File name of a path as shown to the user and stored in the job
    pub fn display_name<P: AsRef<Path>>(path: P) -> String {
        path.as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.as_ref().to_string_lossy().to_string())
    }

    /// SHA-256 of a byte buffer as lowercase hex
    pub fn fingerprint(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Read a whole file into memory
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write bytes to a file, creating parent directories
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
