//! Compression methods and the CRC-32 used by entry payloads

use crate::error::{Result, ZipStreamError};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Default DEFLATE level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Compression method to use for ZIP entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    /// No compression (stored)
    Stored,
    /// DEFLATE compression (most common)
    #[default]
    Deflate,
}

impl CompressionMethod {
    pub fn to_zip_method(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
        }
    }

    /// Compress a whole payload
    ///
    /// `level` is clamped to 0-9 and ignored for [`CompressionMethod::Stored`].
    pub fn compress(self, data: &[u8], level: u32) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::Stored => Ok(data.to_vec()),
            CompressionMethod::Deflate => {
                let mut encoder = DeflateEncoder::new(
                    Vec::with_capacity(data.len() / 2 + 64),
                    Compression::new(level.min(9)),
                );
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
        }
    }

    /// Decompress a whole payload
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::Stored => Ok(data.to_vec()),
            CompressionMethod::Deflate => {
                let mut decoder = DeflateDecoder::new(data);
                let mut decompressed = Vec::new();
                decoder.read_to_end(&mut decompressed).map_err(|e| {
                    ZipStreamError::format(format!("malformed deflate data: {}", e))
                })?;
                Ok(decompressed)
            }
        }
    }
}

impl TryFrom<u16> for CompressionMethod {
    type Error = ZipStreamError;

    fn try_from(method: u16) -> Result<Self> {
        match method {
            0 => Ok(CompressionMethod::Stored),
            8 => Ok(CompressionMethod::Deflate),
            other => Err(ZipStreamError::UnsupportedCompression(other)),
        }
    }
}

/// CRC-32 of uncompressed content
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
