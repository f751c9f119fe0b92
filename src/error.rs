//! Error types for zipstream

use std::io;

/// Result type for zipstream operations
pub type Result<T> = std::result::Result<T, ZipStreamError>;

/// Error types that can occur while reading or writing archive records
#[derive(Debug)]
pub enum ZipStreamError {
    /// I/O error from the underlying stream
    Io(io::Error),
    /// Malformed or truncated record, or a value that does not fit its wire field
    InvalidFormat(String),
    /// Unsupported compression method
    UnsupportedCompression(u16),
    /// Stored CRC-32 does not match the decoded content
    CrcMismatch { expected: u32, actual: u32 },
    /// Operation not valid for the record kind or session state
    InvalidState(String),
}

impl ZipStreamError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ZipStreamError::InvalidFormat(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        ZipStreamError::InvalidState(msg.into())
    }
}

impl std::fmt::Display for ZipStreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZipStreamError::Io(e) => write!(f, "I/O error: {}", e),
            ZipStreamError::InvalidFormat(msg) => write!(f, "Invalid ZIP format: {}", msg),
            ZipStreamError::UnsupportedCompression(method) => {
                write!(f, "Unsupported compression method: {}", method)
            }
            ZipStreamError::CrcMismatch { expected, actual } => write!(
                f,
                "CRC error: expected 0x{:08x}, got 0x{:08x}",
                expected, actual
            ),
            ZipStreamError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for ZipStreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ZipStreamError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ZipStreamError {
    fn from(err: io::Error) -> Self {
        ZipStreamError::Io(err)
    }
}
