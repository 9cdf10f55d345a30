use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::Cursor;

use crate::errors::ArchiveError;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

fn malformed(what: &str) -> ArchiveError {
    ArchiveError::MalformedArchive(what.to_string())
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ArchiveError> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(malformed("invalid End of Central Directory"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ArchiveError> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(malformed("invalid ZIP64 locator"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ArchiveError> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(malformed("invalid ZIP64 End of Central Directory"));
        }

        // Skip record size, versions and disk numbers
        let mut cursor = Cursor::new(&data[4..]);
        cursor.set_position(8 + 2 + 2 + 4 + 4);
        let _disk_entries = cursor.read_u64::<LittleEndian>()?;

        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Version needed to extract: 2.0 (deflate, directories)
pub const VERSION_NEEDED: u16 = 20;

/// Version made by: upper byte 3 = unix, lower byte = zip format version 2.0
pub const VERSION_MADE_BY: u16 = (3 << 8) | 20;

/// General purpose flag bit 11: names are UTF-8
pub const FLAG_UTF8: u16 = 1 << 11;

/// One entry of the central directory
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub flags: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub external_attrs: u32,
    pub is_directory: bool,
}

/// Encode a timestamp as an MS-DOS (time, date) pair
pub fn to_dos_datetime(datetime: NaiveDateTime) -> (u16, u16) {
    // DOS dates start at 1980
    let year = datetime.year().clamp(1980, 2107) as u16;
    let date = ((year - 1980) << 9) | ((datetime.month() as u16) << 5) | datetime.day() as u16;
    let time = ((datetime.hour() as u16) << 11)
        | ((datetime.minute() as u16) << 5)
        | (datetime.second() as u16 / 2);
    (time, date)
}
