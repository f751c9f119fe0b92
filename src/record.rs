//! Archive records and their binary codec
//!
//! A stream is a sequence of records, each introduced by a 4-byte signature:
//! local file headers (with their payload inline), central directory headers,
//! and one end of central directory record.
//!
//! Reading and writing use separate types. [`ReadRecord`] is produced by
//! [`ReadRecord::decode`] once the whole record has been consumed.
//! [`WriteRecord`] is built in memory and emitted with [`WriteRecord::flush`];
//! after the first flush it is synchronized and further flushes write nothing.

use crate::compression::{self, CompressionMethod, DEFAULT_COMPRESSION_LEVEL};
use crate::error::{Result, ZipStreamError};
use crate::header::{
    CentralDirectoryHeader, EndOfArchiveHeader, LocalFileHeader, RecordKind, ZipHeader,
};
use crate::time::DosDateTime;
use log::trace;
use std::borrow::Cow;
use std::io::{ErrorKind, Read, Write};

/// Version written to the "made by" and "needed to extract" fields (2.0)
pub const ZIP_VERSION: u16 = 20;

/// General purpose flag: filename and comment are UTF-8
pub const FLAG_UTF8: u16 = 1 << 11;

const SIGNATURE_LEN: u64 = 4;

// Internal attribute bit 0 marks text data; external 0x20 is the DOS archive bit.
const DEFAULT_INTERNAL_ATTRIBUTES: u16 = 1;
const DEFAULT_EXTERNAL_ATTRIBUTES: u32 = 0x20;

/// Fill `buf` from `reader`, stopping early only at end of stream
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn read_header<H: ZipHeader, R: Read>(reader: &mut R) -> Result<H> {
    let mut block = vec![0u8; H::FIXED_LEN];
    let n = read_full(reader, &mut block)?;
    if n < H::FIXED_LEN {
        return Err(ZipStreamError::format(format!(
            "truncated header: expected {} bytes, got {}",
            H::FIXED_LEN,
            n
        )));
    }
    H::unpack(&block)
}

/// Read a declared-length section; the buffer grows only as bytes arrive
fn read_section<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Vec<u8>> {
    let mut section = Vec::new();
    if len == 0 {
        return Ok(section);
    }
    reader.by_ref().take(len).read_to_end(&mut section)?;
    if (section.len() as u64) < len {
        return Err(ZipStreamError::format(format!(
            "truncated {}: expected {} bytes, got {}",
            what,
            len,
            section.len()
        )));
    }
    Ok(section)
}

fn section_len<T: TryFrom<usize>>(section: &[u8], what: &str) -> Result<T> {
    T::try_from(section.len()).map_err(|_| {
        ZipStreamError::format(format!("{} is too long ({} bytes)", what, section.len()))
    })
}

/// Local file header followed by its compressed payload
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub header: LocalFileHeader,
    pub filename: Vec<u8>,
    pub extra: Vec<u8>,
    pub payload: Vec<u8>,
}

impl LocalFile {
    fn decode_body<R: Read>(reader: &mut R) -> Result<Self> {
        let header: LocalFileHeader = read_header(reader)?;
        let filename = read_section(reader, header.filename_len as u64, "filename")?;
        let extra = read_section(reader, header.extra_len as u64, "extra data")?;
        let payload = read_section(reader, header.compressed_size as u64, "file data")?;
        Ok(Self {
            header,
            filename,
            extra,
            payload,
        })
    }

    /// Decompress the payload and check it against the stored CRC-32
    pub fn content(&self) -> Result<Vec<u8>> {
        let method = CompressionMethod::try_from(self.header.compression_method)?;
        let content = method.decompress(&self.payload)?;
        let actual = compression::crc32(&content);
        if actual != self.header.crc32 {
            return Err(ZipStreamError::CrcMismatch {
                expected: self.header.crc32,
                actual,
            });
        }
        Ok(content)
    }
}

/// Central directory header
#[derive(Debug, Clone)]
pub struct CentralDirectory {
    pub header: CentralDirectoryHeader,
    pub filename: Vec<u8>,
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

impl CentralDirectory {
    fn decode_body<R: Read>(reader: &mut R) -> Result<Self> {
        let header: CentralDirectoryHeader = read_header(reader)?;
        let filename = read_section(reader, header.filename_len as u64, "filename")?;
        let extra = read_section(reader, header.extra_len as u64, "extra data")?;
        let comment = read_section(reader, header.comment_len as u64, "comment")?;
        Ok(Self {
            header,
            filename,
            extra,
            comment,
        })
    }
}

/// End of central directory record
#[derive(Debug, Clone)]
pub struct EndOfArchive {
    pub header: EndOfArchiveHeader,
    pub comment: Vec<u8>,
}

impl EndOfArchive {
    fn decode_body<R: Read>(reader: &mut R) -> Result<Self> {
        let header: EndOfArchiveHeader = read_header(reader)?;
        let comment = read_section(reader, header.comment_len as u64, "comment")?;
        Ok(Self { header, comment })
    }
}

/// A record decoded from a stream
#[derive(Debug, Clone)]
pub enum ReadRecord {
    LocalFile(LocalFile),
    CentralDirectory(CentralDirectory),
    EndOfArchive(EndOfArchive),
}

impl ReadRecord {
    /// Decode the next record
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a signature.
    pub fn decode<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let mut signature = [0u8; 4];
        let n = read_full(reader, &mut signature)?;
        if n == 0 {
            return Ok(None);
        }
        if n < signature.len() {
            return Err(ZipStreamError::format(format!(
                "truncated signature: got {} of 4 bytes",
                n
            )));
        }

        let signature = u32::from_le_bytes(signature);
        let kind = RecordKind::from_signature(signature).ok_or_else(|| {
            ZipStreamError::format(format!("invalid header signature: 0x{:08x}", signature))
        })?;
        Self::decode_kind(kind, reader).map(Some)
    }

    /// Decode the rest of a record whose signature has already been read
    pub fn decode_kind<R: Read>(kind: RecordKind, reader: &mut R) -> Result<Self> {
        let record = match kind {
            RecordKind::LocalFile => ReadRecord::LocalFile(LocalFile::decode_body(reader)?),
            RecordKind::CentralDirectory => {
                ReadRecord::CentralDirectory(CentralDirectory::decode_body(reader)?)
            }
            RecordKind::EndOfArchive => {
                ReadRecord::EndOfArchive(EndOfArchive::decode_body(reader)?)
            }
        };
        trace!(
            "decoded {:?} record ({} bytes) {:?}",
            kind,
            record.size(),
            record.filename_lossy()
        );
        Ok(record)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            ReadRecord::LocalFile(_) => RecordKind::LocalFile,
            ReadRecord::CentralDirectory(_) => RecordKind::CentralDirectory,
            ReadRecord::EndOfArchive(_) => RecordKind::EndOfArchive,
        }
    }

    pub fn signature(&self) -> u32 {
        self.kind().signature()
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ReadRecord::LocalFile(_))
    }

    /// Raw filename bytes; empty for the end record
    pub fn filename(&self) -> &[u8] {
        match self {
            ReadRecord::LocalFile(r) => &r.filename,
            ReadRecord::CentralDirectory(r) => &r.filename,
            ReadRecord::EndOfArchive(_) => &[],
        }
    }

    pub fn filename_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.filename())
    }

    pub fn extra(&self) -> &[u8] {
        match self {
            ReadRecord::LocalFile(r) => &r.extra,
            ReadRecord::CentralDirectory(r) => &r.extra,
            ReadRecord::EndOfArchive(_) => &[],
        }
    }

    /// Comment bytes; local file headers carry none
    pub fn comment(&self) -> &[u8] {
        match self {
            ReadRecord::LocalFile(_) => &[],
            ReadRecord::CentralDirectory(r) => &r.comment,
            ReadRecord::EndOfArchive(r) => &r.comment,
        }
    }

    pub fn compression_method(&self) -> Option<u16> {
        match self {
            ReadRecord::LocalFile(r) => Some(r.header.compression_method),
            ReadRecord::CentralDirectory(r) => Some(r.header.compression_method),
            ReadRecord::EndOfArchive(_) => None,
        }
    }

    pub fn crc32(&self) -> Option<u32> {
        match self {
            ReadRecord::LocalFile(r) => Some(r.header.crc32),
            ReadRecord::CentralDirectory(r) => Some(r.header.crc32),
            ReadRecord::EndOfArchive(_) => None,
        }
    }

    pub fn compressed_size(&self) -> Option<u32> {
        match self {
            ReadRecord::LocalFile(r) => Some(r.header.compressed_size),
            ReadRecord::CentralDirectory(r) => Some(r.header.compressed_size),
            ReadRecord::EndOfArchive(_) => None,
        }
    }

    /// Uncompressed length declared by the header
    pub fn content_size(&self) -> Option<u32> {
        match self {
            ReadRecord::LocalFile(r) => Some(r.header.uncompressed_size),
            ReadRecord::CentralDirectory(r) => Some(r.header.uncompressed_size),
            ReadRecord::EndOfArchive(_) => None,
        }
    }

    pub fn timestamp(&self) -> Option<DosDateTime> {
        match self {
            ReadRecord::LocalFile(r) => Some(DosDateTime::from_dos(r.header.dos_time)),
            ReadRecord::CentralDirectory(r) => Some(DosDateTime::from_dos(r.header.dos_time)),
            ReadRecord::EndOfArchive(_) => None,
        }
    }

    /// Offset of the local header a central directory record points at
    pub fn local_header_offset(&self) -> Option<u32> {
        match self {
            ReadRecord::CentralDirectory(r) => Some(r.header.local_header_offset),
            _ => None,
        }
    }

    /// Entry content
    ///
    /// For a local file header this is the decompressed payload, verified
    /// against the stored CRC-32. The other records return their comment.
    pub fn content(&self) -> Result<Vec<u8>> {
        match self {
            ReadRecord::LocalFile(r) => r.content(),
            ReadRecord::CentralDirectory(r) => Ok(r.comment.clone()),
            ReadRecord::EndOfArchive(r) => Ok(r.comment.clone()),
        }
    }

    /// Bytes this record occupied in the stream
    pub fn size(&self) -> u64 {
        let fixed = SIGNATURE_LEN + self.kind().fixed_len() as u64;
        let variable = match self {
            ReadRecord::LocalFile(r) => r.filename.len() + r.extra.len() + r.payload.len(),
            ReadRecord::CentralDirectory(r) => {
                r.filename.len() + r.extra.len() + r.comment.len()
            }
            ReadRecord::EndOfArchive(r) => r.comment.len(),
        };
        fixed + variable as u64
    }
}

/// A record being built for output
///
/// Holds the union of header fields for every record kind; only the fields of
/// the current kind are emitted. Changing the kind (a local file header is
/// re-tagged as its central directory entry) makes the record unsynchronized
/// again so it can be flushed a second time.
#[derive(Debug, Clone)]
pub struct WriteRecord {
    kind: RecordKind,
    flags: u16,
    compression_method: u16,
    dos_time: Option<u32>,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    disk_number_start: u16,
    internal_attributes: Option<u16>,
    external_attributes: Option<u32>,
    local_header_offset: u32,
    entries: u16,
    dir_size: u32,
    dir_offset: u32,
    filename: Vec<u8>,
    extra: Vec<u8>,
    comment: Vec<u8>,
    payload: Vec<u8>,
    synchronized: bool,
}

impl WriteRecord {
    fn empty(kind: RecordKind) -> Self {
        Self {
            kind,
            flags: 0,
            compression_method: 0,
            dos_time: None,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            disk_number_start: 0,
            internal_attributes: None,
            external_attributes: None,
            local_header_offset: 0,
            entries: 0,
            dir_size: 0,
            dir_offset: 0,
            filename: Vec::new(),
            extra: Vec::new(),
            comment: Vec::new(),
            payload: Vec::new(),
            synchronized: false,
        }
    }

    /// New local file header with an empty stored payload
    pub fn file(name: &str) -> Self {
        let mut record = Self::empty(RecordKind::LocalFile);
        record.set_filename(name);
        record.crc32 = compression::crc32(&[]);
        record
    }

    /// New end of central directory record
    pub fn end_of_archive() -> Self {
        Self::empty(RecordKind::EndOfArchive)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Re-tag the record; a no-op when the kind is unchanged
    pub(crate) fn set_kind(&mut self, kind: RecordKind) {
        if self.kind == kind {
            return;
        }
        self.kind = kind;
        self.synchronized = false;
    }

    /// Store content with the default DEFLATE level
    pub fn set_content(&mut self, content: &[u8], method: CompressionMethod) -> Result<&mut Self> {
        self.set_content_with_level(content, method, DEFAULT_COMPRESSION_LEVEL)
    }

    /// Compress `content` and record its CRC-32 and both lengths
    pub fn set_content_with_level(
        &mut self,
        content: &[u8],
        method: CompressionMethod,
        level: u32,
    ) -> Result<&mut Self> {
        let payload = method.compress(content, level)?;
        let uncompressed_size: u32 = section_len(content, "content")?;
        let compressed_size: u32 = section_len(&payload, "compressed content")?;

        self.compression_method = method.to_zip_method();
        self.crc32 = compression::crc32(content);
        self.uncompressed_size = uncompressed_size;
        self.compressed_size = compressed_size;
        self.payload = payload;
        Ok(self)
    }

    /// Set the filename, flagging it as UTF-8 when it is not plain ASCII
    pub fn set_filename(&mut self, name: &str) -> &mut Self {
        if name.is_ascii() {
            self.flags &= !FLAG_UTF8;
        } else {
            self.flags |= FLAG_UTF8;
        }
        self.filename = name.as_bytes().to_vec();
        self
    }

    pub fn set_extra(&mut self, extra: impl Into<Vec<u8>>) -> &mut Self {
        self.extra = extra.into();
        self
    }

    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) -> &mut Self {
        self.comment = comment.into();
        self
    }

    pub fn set_timestamp(&mut self, timestamp: DosDateTime) -> &mut Self {
        self.dos_time = Some(timestamp.to_dos());
        self
    }

    pub fn set_flags(&mut self, flags: u16) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn set_internal_attributes(&mut self, attributes: u16) -> &mut Self {
        self.internal_attributes = Some(attributes);
        self
    }

    pub fn set_external_attributes(&mut self, attributes: u32) -> &mut Self {
        self.external_attributes = Some(attributes);
        self
    }

    pub(crate) fn set_local_header_offset(&mut self, offset: u32) -> &mut Self {
        self.local_header_offset = offset;
        self
    }

    /// Entry count of an end of central directory record
    pub fn set_entry_count(&mut self, count: u16) -> Result<&mut Self> {
        self.require_end_of_archive()?;
        self.entries = count;
        Ok(self)
    }

    /// Location of the central directory, for an end of central directory record
    pub fn set_central_directory(&mut self, offset: u32, size: u32) -> Result<&mut Self> {
        self.require_end_of_archive()?;
        self.dir_offset = offset;
        self.dir_size = size;
        Ok(self)
    }

    fn require_end_of_archive(&self) -> Result<()> {
        if self.kind != RecordKind::EndOfArchive {
            return Err(ZipStreamError::state(format!(
                "{:?} record has no central directory fields",
                self.kind
            )));
        }
        Ok(())
    }

    pub fn filename(&self) -> &[u8] {
        &self.filename
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    pub fn local_header_offset(&self) -> u32 {
        self.local_header_offset
    }

    /// Timestamp, if one was set or assigned by a flush
    pub fn timestamp(&self) -> Option<DosDateTime> {
        self.dos_time.map(DosDateTime::from_dos)
    }

    /// Bytes this record occupies once encoded as its current kind
    pub fn size(&self) -> u64 {
        let fixed = SIGNATURE_LEN + self.kind.fixed_len() as u64;
        let variable = match self.kind {
            RecordKind::LocalFile => {
                self.filename.len() as u64 + self.extra.len() as u64 + self.compressed_size as u64
            }
            RecordKind::CentralDirectory => {
                (self.filename.len() + self.extra.len() + self.comment.len()) as u64
            }
            RecordKind::EndOfArchive => self.comment.len() as u64,
        };
        fixed + variable
    }

    fn pack_header(&self, dos_time: u32, out: &mut Vec<u8>) -> Result<()> {
        match self.kind {
            RecordKind::LocalFile => LocalFileHeader {
                version: ZIP_VERSION,
                flags: self.flags,
                compression_method: self.compression_method,
                dos_time,
                crc32: self.crc32,
                compressed_size: self.compressed_size,
                uncompressed_size: self.uncompressed_size,
                filename_len: section_len(&self.filename, "filename")?,
                extra_len: section_len(&self.extra, "extra data")?,
            }
            .pack(out),
            RecordKind::CentralDirectory => CentralDirectoryHeader {
                version: ZIP_VERSION,
                extract_version: ZIP_VERSION,
                flags: self.flags,
                compression_method: self.compression_method,
                dos_time,
                crc32: self.crc32,
                compressed_size: self.compressed_size,
                uncompressed_size: self.uncompressed_size,
                filename_len: section_len(&self.filename, "filename")?,
                extra_len: section_len(&self.extra, "extra data")?,
                comment_len: section_len(&self.comment, "comment")?,
                disk_number_start: self.disk_number_start,
                internal_attributes: self
                    .internal_attributes
                    .unwrap_or(DEFAULT_INTERNAL_ATTRIBUTES),
                external_attributes: self
                    .external_attributes
                    .unwrap_or(DEFAULT_EXTERNAL_ATTRIBUTES),
                local_header_offset: self.local_header_offset,
            }
            .pack(out),
            RecordKind::EndOfArchive => EndOfArchiveHeader {
                disk_number: 0,
                disk_start: 0,
                entries_this_disk: self.entries,
                entries_total: self.entries,
                dir_size: self.dir_size,
                dir_offset: self.dir_offset,
                comment_len: section_len(&self.comment, "comment")?,
            }
            .pack(out),
        }
    }

    /// Emit the record to `writer`
    ///
    /// Returns the number of bytes written, or 0 if the record was already
    /// synchronized. A local file header's payload is released once written.
    pub fn flush<W: Write>(&mut self, writer: &mut W) -> Result<u64> {
        if self.synchronized {
            return Ok(0);
        }
        if self.kind == RecordKind::LocalFile && self.payload.len() != self.compressed_size as usize
        {
            return Err(ZipStreamError::state(format!(
                "payload of {:?} was already written",
                String::from_utf8_lossy(&self.filename)
            )));
        }

        let dos_time = *self
            .dos_time
            .get_or_insert_with(|| DosDateTime::now().to_dos());

        let mut block = Vec::with_capacity(
            SIGNATURE_LEN as usize
                + self.kind.fixed_len()
                + self.filename.len()
                + self.extra.len()
                + self.comment.len(),
        );
        block.extend_from_slice(&self.kind.signature().to_le_bytes());
        self.pack_header(dos_time, &mut block)?;
        match self.kind {
            RecordKind::LocalFile => {
                block.extend_from_slice(&self.filename);
                block.extend_from_slice(&self.extra);
            }
            RecordKind::CentralDirectory => {
                block.extend_from_slice(&self.filename);
                block.extend_from_slice(&self.extra);
                block.extend_from_slice(&self.comment);
            }
            RecordKind::EndOfArchive => block.extend_from_slice(&self.comment),
        }

        writer.write_all(&block)?;
        let mut written = block.len() as u64;
        if self.kind == RecordKind::LocalFile {
            writer.write_all(&self.payload)?;
            written += self.payload.len() as u64;
            self.payload = Vec::new();
        }

        trace!(
            "encoded {:?} record ({} bytes) {:?}",
            self.kind,
            written,
            String::from_utf8_lossy(&self.filename)
        );
        self.synchronized = true;
        Ok(written)
    }
}
