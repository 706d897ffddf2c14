//! Per-Packet Information (PPI) header decoding.
//!
//! A PPI header is an 8-byte fixed part (version, flags, total length, DLT of
//! the encapsulated frame) followed by type-length-value fields. The decoder
//! validates the declared length against the buffer, splits header from
//! payload without copying, and walks the TLV section lazily. Header errors
//! are fatal for the layer; field errors are kept alongside the fields that
//! decoded cleanly.
//!
//! Offsets and constants live in `layout`; header access in `reader`; TLV
//! walking and typed field views in `fields`.

pub mod error;
pub mod fields;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{PpiLayer, parse_ppi};
