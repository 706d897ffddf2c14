use thiserror::Error;

use crate::protocols::common::CursorError;

/// Fatal errors for the fixed PPI header; no layer is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("PPI header too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid PPI header length {declared}: must be at least {minimum}")]
    InvalidLength { declared: u16, minimum: usize },
    #[error("PPI header truncated: declares {declared} bytes, only {actual} available")]
    Truncated { declared: u16, actual: usize },
}

impl From<CursorError> for HeaderError {
    fn from(value: CursorError) -> Self {
        match value {
            CursorError::OutOfBounds {
                offset,
                needed,
                remaining,
            } => HeaderError::TooShort {
                needed: offset + needed,
                actual: offset + remaining,
            },
        }
    }
}

/// Errors in the TLV section. Offsets are relative to the start of the layer.
///
/// These never invalidate the header or the payload split; the layer keeps
/// the fields decoded before the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error(
        "PPI field type {field_type} at offset {offset} declares {length} data bytes, only {remaining} left in field section"
    )]
    FieldOverrun {
        offset: usize,
        field_type: u16,
        length: u16,
        remaining: usize,
    },
    #[error("incomplete trailing PPI field at offset {offset}: {remaining} bytes left, need 4")]
    IncompleteTrailingField { offset: usize, remaining: usize },
}

/// A typed view was requested on a field whose data has the wrong size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("PPI field type {field_type} has {actual} data bytes, expected {expected}")]
pub struct FieldSizeError {
    pub field_type: u16,
    pub expected: usize,
    pub actual: usize,
}
