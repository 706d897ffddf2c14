use serde::Serialize;

use super::error::HeaderError;
use super::layout;
use crate::protocols::common::ByteCursor;

/// Decoded fixed PPI header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PpiHeader {
    pub version: u8,
    pub flags: u8,
    /// Total bytes of header plus TLV fields.
    pub length: u16,
    /// Data link type of the encapsulated frame.
    pub dlt: u32,
}

impl PpiHeader {
    /// Whether TLV fields are padded to 32-bit boundaries.
    pub fn is_aligned(&self) -> bool {
        self.flags & layout::FLAG_ALIGN_32 != 0
    }
}

/// Result of a successful header decode: the header, the TLV field region
/// (`buffer[8..length]`) and the payload (`buffer[length..]`).
#[derive(Debug, Clone, Copy)]
pub struct HeaderSplit<'a> {
    pub header: PpiHeader,
    pub contents: &'a [u8],
    pub fields: &'a [u8],
    pub payload: &'a [u8],
}

/// Decode and validate the fixed header, then split the buffer.
///
/// # Errors
/// - `TooShort` when fewer than 8 bytes are available;
/// - `InvalidLength` when the declared length is below 8;
/// - `Truncated` when the declared length exceeds the buffer.
pub fn decode_header(buffer: &[u8]) -> Result<HeaderSplit<'_>, HeaderError> {
    if buffer.len() < layout::FIXED_HEADER_LEN {
        return Err(HeaderError::TooShort {
            needed: layout::FIXED_HEADER_LEN,
            actual: buffer.len(),
        });
    }

    let mut cursor = ByteCursor::new(buffer);
    let header = PpiHeader {
        version: cursor.read_u8()?,
        flags: cursor.read_u8()?,
        length: cursor.read_u16_le()?,
        dlt: cursor.read_u32_le()?,
    };

    let declared = header.length as usize;
    if declared < layout::FIXED_HEADER_LEN {
        return Err(HeaderError::InvalidLength {
            declared: header.length,
            minimum: layout::FIXED_HEADER_LEN,
        });
    }
    if declared > buffer.len() {
        return Err(HeaderError::Truncated {
            declared: header.length,
            actual: buffer.len(),
        });
    }

    let (contents, payload) = buffer.split_at(declared);
    let fields = contents.get(layout::FIXED_HEADER_LEN..).unwrap_or_default();
    Ok(HeaderSplit {
        header,
        contents,
        fields,
        payload,
    })
}
