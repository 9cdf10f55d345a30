//! Zip archive writer.
//!
//! Entries are appended one by one as Local File Header followed by the
//! payload; the Central Directory and End of Central Directory are written by
//! [`ArchiveWriter::finish`]. Only classic (non-ZIP64) archives are produced.

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{Local, NaiveDateTime};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use crate::errors::ArchiveError;

use super::structures::*;

/// Unix mode bits for regular files (rw-r--r--)
const FILE_ATTRS: u32 = 0o100644 << 16;

/// Unix mode bits for directories (rwxr-xr-x) plus the MS-DOS directory bit
const DIR_ATTRS: u32 = (0o040755 << 16) | 0x10;

/// Bit 3: sizes and CRC are in a trailing data descriptor
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Central directory record kept until the archive is finished
struct CentralRecord {
    name: Vec<u8>,
    flags: u16,
    method: u16,
    time: u16,
    date: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    external_attrs: u32,
    lfh_offset: u32,
}

/// Builds a zip archive in memory
pub struct ArchiveWriter {
    buf: Vec<u8>,
    records: Vec<CentralRecord>,
    time: u16,
    date: u16,
    level: Compression,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter {
    /// New writer stamping entries with the current local time
    pub fn new() -> Self {
        Self::with_timestamp(Local::now().naive_local())
    }

    /// New writer stamping new entries with a fixed time
    pub fn with_timestamp(timestamp: NaiveDateTime) -> Self {
        let (time, date) = to_dos_datetime(timestamp);
        Self {
            buf: Vec::new(),
            records: Vec::new(),
            time,
            date,
            level: Compression::default(),
        }
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a directory entry. A trailing `/` is appended when missing.
    pub fn add_directory(&mut self, name: &str) -> Result<(), ArchiveError> {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };

        self.push_entry(
            CentralRecord {
                name: name.into_bytes(),
                flags: FLAG_UTF8,
                method: CompressionMethod::Stored.as_u16(),
                time: self.time,
                date: self.date,
                crc32: 0,
                compressed_size: 0,
                uncompressed_size: 0,
                external_attrs: DIR_ATTRS,
                lfh_offset: 0,
            },
            &[],
        )
    }

    /// Add a file, deflating it unless that makes it larger
    pub fn add_file(&mut self, name: &str, content: &[u8]) -> Result<(), ArchiveError> {
        let uncompressed_size = u32::try_from(content.len())
            .map_err(|_| ArchiveError::TooLarge(format!("entry '{}' exceeds 4 GiB", name)))?;

        let deflated = self.deflate(content)?;
        let (method, payload) = if deflated.len() < content.len() {
            (CompressionMethod::Deflate, deflated.as_slice())
        } else {
            (CompressionMethod::Stored, content)
        };

        self.push_entry(
            CentralRecord {
                name: name.as_bytes().to_vec(),
                flags: FLAG_UTF8,
                method: method.as_u16(),
                time: self.time,
                date: self.date,
                crc32: crc32fast::hash(content),
                compressed_size: payload.len() as u32,
                uncompressed_size,
                external_attrs: FILE_ATTRS,
                lfh_offset: 0,
            },
            payload,
        )
    }

    /// Copy an entry from another archive without recompressing it.
    ///
    /// `raw` must be the entry's compressed payload as returned by
    /// [`ArchiveHandle::raw_data`](super::ArchiveHandle::raw_data).
    pub fn add_raw(&mut self, entry: &ArchiveEntry, raw: &[u8]) -> Result<(), ArchiveError> {
        let too_large = || ArchiveError::TooLarge(format!("entry '{}' exceeds 4 GiB", entry.name));
        let compressed_size = u32::try_from(entry.compressed_size).map_err(|_| too_large())?;
        let uncompressed_size = u32::try_from(entry.uncompressed_size).map_err(|_| too_large())?;

        if raw.len() as u64 != entry.compressed_size {
            return Err(ArchiveError::CorruptEntry {
                path: entry.name.clone(),
                reason: "raw payload does not match the recorded size".to_string(),
            });
        }

        self.push_entry(
            CentralRecord {
                name: entry.name.as_bytes().to_vec(),
                // Sizes go in the local header, so no data descriptor follows
                flags: (entry.flags & !FLAG_DATA_DESCRIPTOR) | FLAG_UTF8,
                method: entry.compression_method.as_u16(),
                time: entry.last_mod_time,
                date: entry.last_mod_date,
                crc32: entry.crc32,
                compressed_size,
                uncompressed_size,
                external_attrs: entry.external_attrs,
                lfh_offset: 0,
            },
            raw,
        )
    }

    /// Write the central directory and return the finished archive bytes
    pub fn finish(mut self) -> Result<Vec<u8>, ArchiveError> {
        let total_entries = u16::try_from(self.records.len()).map_err(|_| {
            ArchiveError::TooLarge(format!("{} entries exceed the zip limit", self.records.len()))
        })?;
        let cd_offset = self.offset()?;

        let mut cd = Vec::new();
        for record in &self.records {
            write_central_header(&mut cd, record)?;
        }
        let cd_size = u32::try_from(cd.len())
            .map_err(|_| ArchiveError::TooLarge("central directory exceeds 4 GiB".to_string()))?;
        self.buf.extend_from_slice(&cd);

        // End of Central Directory
        let out = &mut self.buf;
        out.write_all(EndOfCentralDirectory::SIGNATURE)?;
        out.write_u16::<LittleEndian>(0)?; // disk number
        out.write_u16::<LittleEndian>(0)?; // disk with central directory
        out.write_u16::<LittleEndian>(total_entries)?;
        out.write_u16::<LittleEndian>(total_entries)?;
        out.write_u32::<LittleEndian>(cd_size)?;
        out.write_u32::<LittleEndian>(cd_offset)?;
        out.write_u16::<LittleEndian>(0)?; // comment length

        Ok(self.buf)
    }

    fn deflate(&self, content: &[u8]) -> Result<Vec<u8>, ArchiveError> {
        let mut encoder = DeflateEncoder::new(Vec::with_capacity(content.len() / 2), self.level);
        encoder.write_all(content)?;
        Ok(encoder.finish()?)
    }

    fn offset(&self) -> Result<u32, ArchiveError> {
        u32::try_from(self.buf.len())
            .map_err(|_| ArchiveError::TooLarge("archive exceeds 4 GiB".to_string()))
    }

    fn push_entry(&mut self, mut record: CentralRecord, payload: &[u8]) -> Result<(), ArchiveError> {
        if record.name.len() > u16::MAX as usize {
            return Err(ArchiveError::TooLarge("entry name too long".to_string()));
        }
        record.lfh_offset = self.offset()?;

        let out = &mut self.buf;
        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(record.flags)?;
        out.write_u16::<LittleEndian>(record.method)?;
        out.write_u16::<LittleEndian>(record.time)?;
        out.write_u16::<LittleEndian>(record.date)?;
        out.write_u32::<LittleEndian>(record.crc32)?;
        out.write_u32::<LittleEndian>(record.compressed_size)?;
        out.write_u32::<LittleEndian>(record.uncompressed_size)?;
        out.write_u16::<LittleEndian>(record.name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_all(&record.name)?;
        out.write_all(payload)?;

        self.records.push(record);
        Ok(())
    }
}

fn write_central_header(out: &mut Vec<u8>, record: &CentralRecord) -> Result<(), ArchiveError> {
    out.write_all(CDFH_SIGNATURE)?;
    out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
    out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
    out.write_u16::<LittleEndian>(record.flags)?;
    out.write_u16::<LittleEndian>(record.method)?;
    out.write_u16::<LittleEndian>(record.time)?;
    out.write_u16::<LittleEndian>(record.date)?;
    out.write_u32::<LittleEndian>(record.crc32)?;
    out.write_u32::<LittleEndian>(record.compressed_size)?;
    out.write_u32::<LittleEndian>(record.uncompressed_size)?;
    out.write_u16::<LittleEndian>(record.name.len() as u16)?;
    out.write_u16::<LittleEndian>(0)?; // extra field length
    out.write_u16::<LittleEndian>(0)?; // comment length
    out.write_u16::<LittleEndian>(0)?; // disk number start
    out.write_u16::<LittleEndian>(0)?; // internal attributes
    out.write_u32::<LittleEndian>(record.external_attrs)?;
    out.write_u32::<LittleEndian>(record.lfh_offset)?;
    out.write_all(&record.name)?;
    Ok(())
}
