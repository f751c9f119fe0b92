//! Strongly typed fixed headers of the three ZIP records

use crate::error::Result;
use crate::layout::{self, Field};

/// Local file header signature
pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;

/// Central directory header signature
pub const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x02014b50;

/// End of central directory signature
pub const END_OF_ARCHIVE_SIGNATURE: u32 = 0x06054b50;

/// The record kinds a stream can contain, keyed by signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    LocalFile,
    CentralDirectory,
    EndOfArchive,
}

impl RecordKind {
    pub fn from_signature(signature: u32) -> Option<Self> {
        match signature {
            LOCAL_FILE_HEADER_SIGNATURE => Some(RecordKind::LocalFile),
            CENTRAL_DIRECTORY_SIGNATURE => Some(RecordKind::CentralDirectory),
            END_OF_ARCHIVE_SIGNATURE => Some(RecordKind::EndOfArchive),
            _ => None,
        }
    }

    pub fn signature(self) -> u32 {
        match self {
            RecordKind::LocalFile => LOCAL_FILE_HEADER_SIGNATURE,
            RecordKind::CentralDirectory => CENTRAL_DIRECTORY_SIGNATURE,
            RecordKind::EndOfArchive => END_OF_ARCHIVE_SIGNATURE,
        }
    }

    /// Length of the fixed header following the signature
    pub fn fixed_len(self) -> usize {
        match self {
            RecordKind::LocalFile => LocalFileHeader::FIXED_LEN,
            RecordKind::CentralDirectory => CentralDirectoryHeader::FIXED_LEN,
            RecordKind::EndOfArchive => EndOfArchiveHeader::FIXED_LEN,
        }
    }
}

/// A fixed-width header described by a static field table
pub trait ZipHeader: Sized {
    const KIND: RecordKind;
    const LAYOUT: &'static [Field];
    const FIXED_LEN: usize = layout::fixed_len(Self::LAYOUT);

    /// Build the header from one value per layout field
    fn from_fields(values: &[u32]) -> Self;

    /// One value per layout field, in layout order
    fn to_fields(&self) -> Vec<u32>;

    fn unpack(bytes: &[u8]) -> Result<Self> {
        let values = layout::unpack(Self::LAYOUT, bytes)?;
        Ok(Self::from_fields(&values))
    }

    fn pack(&self, out: &mut Vec<u8>) -> Result<()> {
        layout::pack(Self::LAYOUT, &self.to_fields(), out)
    }
}

// Pulls values off in layout order; the layout guarantees the count.
struct Values<'a>(std::slice::Iter<'a, u32>);

impl Values<'_> {
    fn u16(&mut self) -> u16 {
        self.0.next().copied().unwrap_or(0) as u16
    }

    fn u32(&mut self) -> u32 {
        self.0.next().copied().unwrap_or(0)
    }
}

/// Fixed part of a local file header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub dos_time: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub filename_len: u16,
    pub extra_len: u16,
}

impl ZipHeader for LocalFileHeader {
    const KIND: RecordKind = RecordKind::LocalFile;
    const LAYOUT: &'static [Field] = layout::LOCAL_FILE_HEADER;

    fn from_fields(values: &[u32]) -> Self {
        let mut v = Values(values.iter());
        Self {
            version: v.u16(),
            flags: v.u16(),
            compression_method: v.u16(),
            dos_time: v.u32(),
            crc32: v.u32(),
            compressed_size: v.u32(),
            uncompressed_size: v.u32(),
            filename_len: v.u16(),
            extra_len: v.u16(),
        }
    }

    fn to_fields(&self) -> Vec<u32> {
        vec![
            self.version as u32,
            self.flags as u32,
            self.compression_method as u32,
            self.dos_time,
            self.crc32,
            self.compressed_size,
            self.uncompressed_size,
            self.filename_len as u32,
            self.extra_len as u32,
        ]
    }
}

/// Fixed part of a central directory header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version: u16,
    pub extract_version: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub dos_time: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub filename_len: u16,
    pub extra_len: u16,
    pub comment_len: u16,
    pub disk_number_start: u16,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    pub local_header_offset: u32,
}

impl ZipHeader for CentralDirectoryHeader {
    const KIND: RecordKind = RecordKind::CentralDirectory;
    const LAYOUT: &'static [Field] = layout::CENTRAL_DIRECTORY_HEADER;

    fn from_fields(values: &[u32]) -> Self {
        let mut v = Values(values.iter());
        Self {
            version: v.u16(),
            extract_version: v.u16(),
            flags: v.u16(),
            compression_method: v.u16(),
            dos_time: v.u32(),
            crc32: v.u32(),
            compressed_size: v.u32(),
            uncompressed_size: v.u32(),
            filename_len: v.u16(),
            extra_len: v.u16(),
            comment_len: v.u16(),
            disk_number_start: v.u16(),
            internal_attributes: v.u16(),
            external_attributes: v.u32(),
            local_header_offset: v.u32(),
        }
    }

    fn to_fields(&self) -> Vec<u32> {
        vec![
            self.version as u32,
            self.extract_version as u32,
            self.flags as u32,
            self.compression_method as u32,
            self.dos_time,
            self.crc32,
            self.compressed_size,
            self.uncompressed_size,
            self.filename_len as u32,
            self.extra_len as u32,
            self.comment_len as u32,
            self.disk_number_start as u32,
            self.internal_attributes as u32,
            self.external_attributes,
            self.local_header_offset,
        ]
    }
}

/// Fixed part of the end of central directory record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfArchiveHeader {
    pub disk_number: u16,
    pub disk_start: u16,
    pub entries_this_disk: u16,
    pub entries_total: u16,
    pub dir_size: u32,
    pub dir_offset: u32,
    pub comment_len: u16,
}

impl ZipHeader for EndOfArchiveHeader {
    const KIND: RecordKind = RecordKind::EndOfArchive;
    const LAYOUT: &'static [Field] = layout::END_OF_ARCHIVE;

    fn from_fields(values: &[u32]) -> Self {
        let mut v = Values(values.iter());
        Self {
            disk_number: v.u16(),
            disk_start: v.u16(),
            entries_this_disk: v.u16(),
            entries_total: v.u16(),
            dir_size: v.u32(),
            dir_offset: v.u32(),
            comment_len: v.u16(),
        }
    }

    fn to_fields(&self) -> Vec<u32> {
        vec![
            self.disk_number as u32,
            self.disk_start as u32,
            self.entries_this_disk as u32,
            self.entries_total as u32,
            self.dir_size,
            self.dir_offset,
            self.comment_len as u32,
        ]
    }
}
