//! Sequential ZIP reader - pulls records off a stream front to back
//!
//! Unlike a central-directory reader this never seeks: local file headers are
//! returned with their payload as they appear, followed by the central
//! directory records. Reading stops at the end of central directory record or
//! at a clean end of stream.

use crate::error::Result;
use crate::record::{EndOfArchive, ReadRecord};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Streaming ZIP archive reader
pub struct ZipStreamReader<R: Read> {
    reader: R,
    end: Option<EndOfArchive>,
    records_read: u64,
    finished: bool,
}

impl ZipStreamReader<BufReader<File>> {
    /// Open a ZIP file for sequential reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_reader(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> ZipStreamReader<R> {
    /// Read records from an arbitrary byte stream
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            end: None,
            records_read: 0,
            finished: false,
        }
    }

    /// Next local file header or central directory record
    ///
    /// Returns `None` once the end of central directory record has been read or
    /// the stream ends cleanly; every later call returns `None` too.
    pub fn next_record(&mut self) -> Result<Option<ReadRecord>> {
        if self.finished {
            return Ok(None);
        }

        let record = match ReadRecord::decode(&mut self.reader) {
            Ok(record) => record,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        match record {
            None => {
                debug!(
                    "stream ended after {} records without an end record",
                    self.records_read
                );
                self.finished = true;
                Ok(None)
            }
            Some(ReadRecord::EndOfArchive(end)) => {
                debug!(
                    "end of archive after {} records: {} entries, directory {} bytes at {}",
                    self.records_read,
                    end.header.entries_total,
                    end.header.dir_size,
                    end.header.dir_offset
                );
                self.end = Some(end);
                self.finished = true;
                Ok(None)
            }
            Some(record) => {
                self.records_read += 1;
                Ok(Some(record))
            }
        }
    }

    /// Next local file header, skipping central directory records
    pub fn next_file(&mut self) -> Result<Option<ReadRecord>> {
        while let Some(record) = self.next_record()? {
            if record.is_file() {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// The end of central directory record, once reading has reached it
    pub fn end_of_archive(&self) -> Option<&EndOfArchive> {
        self.end.as_ref()
    }

    /// Number of records returned so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for ZipStreamReader<R> {
    type Item = Result<ReadRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
