//! Append-only ZIP writer
//!
//! Entries are compressed and held in memory as they are added. [`finish`]
//! then writes, in order, every local file header with its payload, every
//! central directory header, and the end of central directory record,
//! tracking offsets itself so the output stream never needs to seek.
//!
//! Each entry is buffered whole before compression; large inputs are held in
//! memory in both their raw and compressed form.
//!
//! [`finish`]: ZipStreamWriter::finish

use crate::compression::{CompressionMethod, DEFAULT_COMPRESSION_LEVEL};
use crate::error::{Result, ZipStreamError};
use crate::header::RecordKind;
use crate::record::WriteRecord;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Streaming ZIP writer that accumulates entries until [`ZipStreamWriter::finish`]
pub struct ZipStreamWriter<W: Write> {
    output: W,
    entries: Vec<WriteRecord>,
    compression_method: CompressionMethod,
    compression_level: u32,
    comment: Vec<u8>,
}

impl ZipStreamWriter<BufWriter<File>> {
    /// Create a new ZIP file with default compression level (6) using DEFLATE
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_compression(path, DEFAULT_COMPRESSION_LEVEL)
    }

    /// Create a new ZIP file with custom compression level (0-9) using DEFLATE
    pub fn with_compression<P: AsRef<Path>>(path: P, compression_level: u32) -> Result<Self> {
        Self::with_method(path, CompressionMethod::Deflate, compression_level)
    }

    /// Create a new ZIP file with specified compression method and level
    pub fn with_method<P: AsRef<Path>>(
        path: P,
        method: CompressionMethod,
        compression_level: u32,
    ) -> Result<Self> {
        let output = BufWriter::new(File::create(path)?);
        Ok(Self::from_writer_with_method(
            output,
            method,
            compression_level,
        ))
    }
}

impl<W: Write> ZipStreamWriter<W> {
    /// Write to an arbitrary writer with default compression level (6) using DEFLATE
    pub fn from_writer(writer: W) -> Self {
        Self::from_writer_with_method(writer, CompressionMethod::Deflate, DEFAULT_COMPRESSION_LEVEL)
    }

    /// Write to an arbitrary writer with specified compression method and level
    ///
    /// # Arguments
    /// * `writer` - Any writer; offsets are relative to the first byte written to it
    /// * `method` - Default method for entries added without an explicit one
    /// * `compression_level` - DEFLATE level (0-9)
    pub fn from_writer_with_method(
        writer: W,
        method: CompressionMethod,
        compression_level: u32,
    ) -> Self {
        Self {
            output: writer,
            entries: Vec::new(),
            compression_method: method,
            compression_level,
            comment: Vec::new(),
        }
    }

    /// Set the archive comment stored in the end of central directory record
    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) -> &mut Self {
        self.comment = comment.into();
        self
    }

    /// Add an entry with the writer's default compression method
    ///
    /// The returned record can be used to adjust the entry (timestamp, extra
    /// data, comment) before [`finish`](Self::finish) writes it.
    pub fn add_content(&mut self, name: &str, content: &[u8]) -> Result<&mut WriteRecord> {
        self.add_content_with_method(name, content, self.compression_method)
    }

    /// Add an entry compressed with `method`
    pub fn add_content_with_method(
        &mut self,
        name: &str,
        content: &[u8],
        method: CompressionMethod,
    ) -> Result<&mut WriteRecord> {
        let mut record = WriteRecord::file(name);
        record.set_content_with_level(content, method, self.compression_level)?;
        debug!(
            "added entry {:?}: {} bytes, {} compressed ({:?})",
            name,
            record.uncompressed_size(),
            record.compressed_size(),
            method
        );

        let index = self.entries.len();
        self.entries.push(record);
        Ok(&mut self.entries[index])
    }

    /// Add an entry read from `reader`, up to `length` bytes if given
    ///
    /// The source is read to exhaustion (or the cap) and buffered whole before
    /// it is compressed.
    pub fn add_from_reader<R: Read>(
        &mut self,
        name: &str,
        mut reader: R,
        length: Option<u64>,
    ) -> Result<&mut WriteRecord> {
        let mut contents = Vec::new();
        match length {
            Some(cap) => reader.take(cap).read_to_end(&mut contents)?,
            None => reader.read_to_end(&mut contents)?,
        };
        self.add_content(name, &contents)
    }

    /// Add an entry from a file on disk
    ///
    /// `local_name` is the name stored in the archive and defaults to `path`
    /// as given. `start` and `length` select a byte range of the file.
    pub fn add_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        local_name: Option<&str>,
        start: Option<u64>,
        length: Option<u64>,
    ) -> Result<&mut WriteRecord> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        if let Some(start) = start {
            file.seek(SeekFrom::Start(start))?;
        }
        let name = match local_name {
            Some(name) => name.to_string(),
            None => path.to_string_lossy().into_owned(),
        };
        self.add_from_reader(&name, file, length)
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write all entries, the central directory and the end record, then
    /// return the writer
    ///
    /// If this fails part way the output is not a valid archive and should be
    /// discarded.
    pub fn finish(mut self) -> Result<W> {
        let count = u16::try_from(self.entries.len()).map_err(|_| {
            ZipStreamError::format(format!(
                "{} entries exceed the 65535 entry limit",
                self.entries.len()
            ))
        })?;

        for entry in &self.entries {
            if entry.kind() != RecordKind::LocalFile {
                return Err(ZipStreamError::state(format!(
                    "pending entry {:?} is a {:?} record, not a local file header",
                    String::from_utf8_lossy(entry.filename()),
                    entry.kind()
                )));
            }
            if entry.is_synchronized() {
                return Err(ZipStreamError::state(format!(
                    "pending entry {:?} was already flushed outside the archive",
                    String::from_utf8_lossy(entry.filename())
                )));
            }
        }

        let mut offset: u64 = 0;
        for entry in &mut self.entries {
            entry.set_local_header_offset(to_u32(offset, "local header offset")?);
            entry.flush(&mut self.output)?;
            offset += entry.size();
        }

        let dir_start = offset;
        for entry in &mut self.entries {
            entry.set_kind(RecordKind::CentralDirectory);
            entry.flush(&mut self.output)?;
            offset += entry.size();
        }

        let dir_size = offset - dir_start;
        let mut end = WriteRecord::end_of_archive();
        end.set_entry_count(count)?
            .set_central_directory(
                to_u32(dir_start, "central directory offset")?,
                to_u32(dir_size, "central directory size")?,
            )?
            .set_comment(std::mem::take(&mut self.comment));
        end.flush(&mut self.output)?;

        debug!(
            "finished archive: {} entries, directory {} bytes at {}, {} bytes total",
            count,
            dir_size,
            dir_start,
            offset + end.size()
        );

        self.output.flush()?;
        Ok(self.output)
    }
}

fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        ZipStreamError::format(format!(
            "{} {} exceeds 4 GiB; ZIP64 is not supported",
            what, value
        ))
    })
}
