//! Fixed-field layout tables for the three ZIP records
//!
//! Each record's fixed header is described once as an ordered list of field
//! descriptors. [`pack`] and [`unpack`] walk that list and move little-endian
//! integers in and out of a byte buffer, so the per-record code only maps
//! values to named struct fields.

use crate::error::{Result, ZipStreamError};

/// Width of a fixed header field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    U16,
    U32,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::U16 => 2,
            Width::U32 => 4,
        }
    }

    const fn max(self) -> u32 {
        match self {
            Width::U16 => u16::MAX as u32,
            Width::U32 => u32::MAX,
        }
    }
}

/// One field of a fixed header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub width: Width,
}

const fn u16_field(name: &'static str) -> Field {
    Field {
        name,
        width: Width::U16,
    }
}

const fn u32_field(name: &'static str) -> Field {
    Field {
        name,
        width: Width::U32,
    }
}

/// Local file header, after the signature
pub const LOCAL_FILE_HEADER: &[Field] = &[
    u16_field("version"),
    u16_field("flags"),
    u16_field("compression"),
    u32_field("dostime"),
    u32_field("crc32"),
    u32_field("compressed-length"),
    u32_field("uncompressed-length"),
    u16_field("filename-length"),
    u16_field("extra-length"),
];

/// Central directory header, after the signature
pub const CENTRAL_DIRECTORY_HEADER: &[Field] = &[
    u16_field("version"),
    u16_field("extract-version"),
    u16_field("flags"),
    u16_field("compression"),
    u32_field("dostime"),
    u32_field("crc32"),
    u32_field("compressed-length"),
    u32_field("uncompressed-length"),
    u16_field("filename-length"),
    u16_field("extra-length"),
    u16_field("comment-length"),
    u16_field("disk-number-start"),
    u16_field("internal-attributes"),
    u32_field("external-attributes"),
    u32_field("local-header-offset"),
];

/// End of central directory record, after the signature
pub const END_OF_ARCHIVE: &[Field] = &[
    u16_field("disk-number"),
    u16_field("disk-start"),
    u16_field("entries-this-disk"),
    u16_field("entries-total"),
    u32_field("dir-size"),
    u32_field("dir-offset"),
    u16_field("comment-length"),
];

/// Total byte length of a layout
pub const fn fixed_len(layout: &[Field]) -> usize {
    let mut len = 0;
    let mut i = 0;
    while i < layout.len() {
        len += layout[i].width.bytes();
        i += 1;
    }
    len
}

/// Unpack `bytes` into one value per field, in layout order
pub fn unpack(layout: &[Field], bytes: &[u8]) -> Result<Vec<u32>> {
    let expected = fixed_len(layout);
    if bytes.len() != expected {
        return Err(ZipStreamError::format(format!(
            "header block is {} bytes, expected {}",
            bytes.len(),
            expected
        )));
    }

    let mut values = Vec::with_capacity(layout.len());
    let mut pos = 0;
    for field in layout {
        let value = match field.width {
            Width::U16 => u16::from_le_bytes([bytes[pos], bytes[pos + 1]]) as u32,
            Width::U32 => u32::from_le_bytes([
                bytes[pos],
                bytes[pos + 1],
                bytes[pos + 2],
                bytes[pos + 3],
            ]),
        };
        values.push(value);
        pos += field.width.bytes();
    }
    Ok(values)
}

/// Pack one value per field onto the end of `out`
///
/// A value that does not fit its field width is rejected rather than truncated.
pub fn pack(layout: &[Field], values: &[u32], out: &mut Vec<u8>) -> Result<()> {
    if values.len() != layout.len() {
        return Err(ZipStreamError::format(format!(
            "{} values for a {}-field header",
            values.len(),
            layout.len()
        )));
    }

    out.reserve(fixed_len(layout));
    for (field, &value) in layout.iter().zip(values) {
        if value > field.width.max() {
            return Err(ZipStreamError::format(format!(
                "{} value {} does not fit in {} bytes",
                field.name,
                value,
                field.width.bytes()
            )));
        }
        match field.width {
            Width::U16 => out.extend_from_slice(&(value as u16).to_le_bytes()),
            Width::U32 => out.extend_from_slice(&value.to_le_bytes()),
        }
    }
    Ok(())
}
