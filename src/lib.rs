//! # zipstream: Sequential ZIP Record Codec
//!
//! `zipstream` reads and writes ZIP archives strictly front to back. The
//! reader pulls records off any [`std::io::Read`] one at a time; the writer
//! collects entries and appends a complete archive to any [`std::io::Write`]
//! without ever seeking.
//!
//! ## Features
//!
//! - **Sequential Read**: local file headers (with content), central directory
//!   records and the end record, in stream order
//! - **Append-only Write**: offsets and sizes are computed while writing, so
//!   pipes and sockets work as outputs
//! - **Integrity**: every entry's content is checked against its CRC-32
//! - **Store and DEFLATE**: compression method chosen per writer or per entry
//!
//! ## Quick Start
//!
//! ### Writing an archive
//!
//! ```
//! use zipstream::{CompressionMethod, ZipStreamWriter};
//!
//! let mut writer = ZipStreamWriter::from_writer(Vec::new());
//! writer.add_content("a.txt", b"12345678901234567890\r\n")?;
//! writer.add_content_with_method(
//!     "b.txt",
//!     b"abcdefghijklmnopqrstuvwxyz",
//!     CompressionMethod::Stored,
//! )?;
//! let zip_bytes = writer.finish()?;
//! # Ok::<(), zipstream::ZipStreamError>(())
//! ```
//!
//! ### Reading it back
//!
//! ```
//! use zipstream::{ZipStreamReader, ZipStreamWriter};
//!
//! # let mut writer = ZipStreamWriter::from_writer(Vec::new());
//! # writer.add_content("a.txt", b"hello")?;
//! # let zip_bytes = writer.finish()?;
//! let mut reader = ZipStreamReader::from_reader(&zip_bytes[..]);
//! while let Some(record) = reader.next_file()? {
//!     let content = record.content()?;
//!     println!("{}: {} bytes", record.filename_lossy(), content.len());
//! }
//! # Ok::<(), zipstream::ZipStreamError>(())
//! ```

pub mod compression;
pub mod error;
pub mod header;
pub mod layout;
pub mod reader;
pub mod record;
pub mod time;
pub mod writer;

pub use compression::{CompressionMethod, DEFAULT_COMPRESSION_LEVEL};
pub use error::{Result, ZipStreamError};
pub use header::{CentralDirectoryHeader, EndOfArchiveHeader, LocalFileHeader, RecordKind};
pub use reader::ZipStreamReader;
pub use record::{ReadRecord, WriteRecord};
pub use time::DosDateTime;
pub use writer::ZipStreamWriter;
