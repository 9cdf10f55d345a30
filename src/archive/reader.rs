//! Zip archive reader.
//!
//! Zip files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all entries
//! 4. Entry payloads are decoded only when asked for
//!
//! The handle keeps the original bytes alive so that untouched entries can be
//! copied into an output archive without being decompressed.

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use flate2::read::DeflateDecoder;
use log::debug;
use std::collections::HashMap;
use std::io::{Cursor, Read};

use crate::errors::ArchiveError;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

fn malformed(reason: impl Into<String>) -> ArchiveError {
    ArchiveError::MalformedArchive(reason.into())
}

/// An opened archive: original bytes plus the parsed central directory
#[derive(Debug, Clone)]
pub struct ArchiveHandle {
    /// Raw archive bytes
    data: Bytes,
    /// Entries in central directory order
    entries: Vec<ArchiveEntry>,
    /// Path to position in `entries`
    index: HashMap<String, usize>,
}

impl ArchiveHandle {
    /// Parse the archive structure from raw bytes.
    ///
    /// Only the central directory is parsed here; entry payloads stay
    /// compressed until [`read_bytes`](Self::read_bytes) is called.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::MalformedArchive`] if the bytes are not a zip
    /// container or any central directory record is damaged.
    pub fn open(data: impl Into<Bytes>) -> Result<Self, ArchiveError> {
        let data = data.into();
        let (eocd, eocd_offset) = find_eocd(&data)?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = read_zip64_eocd(&data, eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_data = slice(&data, cd_offset, cd_size)
            .ok_or_else(|| malformed("central directory lies outside the archive"))?;

        // Every CDFH is at least 46 bytes, which bounds a sane entry count
        if total_entries > (cd_data.len() / CDFH_MIN_SIZE) as u64 {
            return Err(malformed(format!(
                "central directory too small for {} entries",
                total_entries
            )));
        }

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut index = HashMap::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..total_entries {
            let entry = parse_cdfh(&mut cursor)?;
            if entry.lfh_offset + LFH_SIZE as u64 > data.len() as u64 {
                return Err(malformed(format!(
                    "local header of '{}' lies outside the archive",
                    entry.name
                )));
            }
            // Later duplicates shadow earlier ones, like most extractors
            index.insert(entry.name.clone(), entries.len());
            entries.push(entry);
        }

        debug!("Opened archive with {} entries", entries.len());

        Ok(Self {
            data,
            entries,
            index,
        })
    }

    /// All entries in archive order, directories included
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Ordered list of entry paths
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its path
    pub fn entry(&self, path: &str) -> Option<&ArchiveEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// False for an entry shadowed by a later one with the same name
    pub fn is_indexed(&self, entry: &ArchiveEntry) -> bool {
        self.entry(&entry.name)
            .is_some_and(|indexed| std::ptr::eq(indexed, entry))
    }

    /// The original archive bytes
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Still-compressed payload of an entry, exactly as stored in the archive
    pub fn raw_data(&self, entry: &ArchiveEntry) -> Result<Bytes, ArchiveError> {
        let data_offset = self.data_offset(entry)?;
        if data_offset + entry.compressed_size > self.data.len() as u64 {
            return Err(malformed(format!(
                "data of '{}' extends past the end of the archive",
                entry.name
            )));
        }
        let start = data_offset as usize;
        let end = start + entry.compressed_size as usize;
        Ok(self.data.slice(start..end))
    }

    /// Decompressed content of the entry at `path`
    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .entry(path)
            .ok_or_else(|| ArchiveError::EntryNotFound(path.to_string()))?;
        self.read_entry(entry)
    }

    /// Content of the entry at `path` decoded as UTF-8 (invalid sequences replaced)
    pub fn read_text(&self, path: &str) -> Result<String, ArchiveError> {
        let bytes = self.read_bytes(path)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Decompress a single entry and verify its checksum
    pub fn read_entry(&self, entry: &ArchiveEntry) -> Result<Vec<u8>, ArchiveError> {
        if entry.is_directory {
            return Ok(Vec::new());
        }

        let raw = self.raw_data(entry)?;

        let content = match entry.compression_method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size.min(1 << 24) as usize);
                DeflateDecoder::new(raw.as_ref())
                    .read_to_end(&mut out)
                    .map_err(|e| ArchiveError::CorruptEntry {
                        path: entry.name.clone(),
                        reason: format!("inflate failed: {}", e),
                    })?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(ArchiveError::UnsupportedCompression {
                    path: entry.name.clone(),
                    method,
                });
            }
        };

        if content.len() as u64 != entry.uncompressed_size {
            return Err(ArchiveError::CorruptEntry {
                path: entry.name.clone(),
                reason: format!(
                    "expected {} bytes, got {}",
                    entry.uncompressed_size,
                    content.len()
                ),
            });
        }

        let crc = crc32fast::hash(&content);
        if crc != entry.crc32 {
            return Err(ArchiveError::CorruptEntry {
                path: entry.name.clone(),
                reason: format!("CRC mismatch ({:08x} != {:08x})", crc, entry.crc32),
            });
        }

        Ok(content)
    }

    /// Offset where the entry's compressed data begins.
    ///
    /// The Local File Header has variable-length fields (file name, extra
    /// field) that may differ from the Central Directory entry, so it has to
    /// be read to find the payload.
    fn data_offset(&self, entry: &ArchiveEntry) -> Result<u64, ArchiveError> {
        let lfh = slice(&self.data, entry.lfh_offset, LFH_SIZE as u64)
            .ok_or_else(|| malformed(format!("truncated local header for '{}'", entry.name)))?;

        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(malformed(format!("invalid local header for '{}'", entry.name)));
        }

        let mut cursor = Cursor::new(lfh);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }
}

/// Bounds-checked sub-slice
fn slice(data: &[u8], offset: u64, len: u64) -> Option<&[u8]> {
    let end = offset.checked_add(len)?;
    if end > data.len() as u64 {
        return None;
    }
    Some(&data[offset as usize..end as usize])
}

/// Find and parse the End of Central Directory record.
///
/// Handles both the simple case (no comment) and archives with comments by
/// searching backwards for the signature.
fn find_eocd(data: &[u8]) -> Result<(EndOfCentralDirectory, u64), ArchiveError> {
    let size = data.len();
    if size < EndOfCentralDirectory::SIZE {
        return Err(malformed("file is too small to be a zip archive"));
    }

    // Common case: no comment, EOCD is the last 22 bytes
    let offset = size - EndOfCentralDirectory::SIZE;
    let tail = &data[offset..];
    if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
        return Ok((EndOfCentralDirectory::from_bytes(tail)?, offset as u64));
    }

    let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(size);
    let search_start = size - search_size;
    let buf = &data[search_start..];

    for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
        if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
            // The comment length field must account for the remaining bytes
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, (search_start + i) as u64));
            }
        }
    }

    Err(malformed("no End of Central Directory record found"))
}

/// Read the ZIP64 End of Central Directory via its locator, which sits
/// immediately before the regular EOCD
fn read_zip64_eocd(data: &[u8], eocd_offset: u64) -> Result<Zip64EOCD, ArchiveError> {
    let locator_offset = eocd_offset
        .checked_sub(Zip64EOCDLocator::SIZE as u64)
        .ok_or_else(|| malformed("missing ZIP64 locator"))?;
    let locator_buf = slice(data, locator_offset, Zip64EOCDLocator::SIZE as u64)
        .ok_or_else(|| malformed("truncated ZIP64 locator"))?;
    let locator = Zip64EOCDLocator::from_bytes(locator_buf)?;

    let eocd64_buf = slice(data, locator.eocd64_offset, Zip64EOCD::MIN_SIZE as u64)
        .ok_or_else(|| malformed("truncated ZIP64 End of Central Directory"))?;
    Zip64EOCD::from_bytes(eocd64_buf)
}

/// Parse a Central Directory File Header from a cursor
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ArchiveEntry, ArchiveError> {
    let truncated = |_| malformed("truncated central directory");

    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).map_err(truncated)?;
    if &sig[..] != CDFH_SIGNATURE {
        return Err(malformed("invalid Central Directory File Header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _version_needed = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let flags = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let compression_method = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let last_mod_time = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let last_mod_date = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let crc32 = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let file_comment_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    let external_attrs = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes).map_err(truncated)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

    // Directory entries end with '/'
    let is_directory = file_name.ends_with('/');

    // ZIP64 extended information lives in extra field 0x0001
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let field_size = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let field_end = cursor.position() + field_size as u64;

        if header_id == 0x0001 {
            // Fields are present only if the header field is saturated
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            }
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);
    if cursor.position() > cursor.get_ref().len() as u64 {
        return Err(malformed("truncated central directory"));
    }

    Ok(ArchiveEntry {
        name: file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        flags,
        last_mod_time,
        last_mod_date,
        external_attrs,
        is_directory,
    })
}
