//! Next-layer dispatch.
//!
//! A PPI header names the data link type of the frame it wraps. The
//! [`LayerTypeRegistry`] maps those codes to [`LayerDecoder`] capabilities,
//! and the [`DispatchEngine`] uses it to interpret the payload. A code with
//! no registered decoder is a normal outcome: the PPI layer is still
//! returned, only the payload stays uninterpreted.

mod engine;
mod registry;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

pub use engine::{DecodedPacket, DispatchEngine, NextLayer, UnknownEncapsulation};
pub use registry::{LayerTypeRegistry, RegistryError, default_registry};

/// Decoder for the bytes that follow a header.
///
/// Implementations know nothing about PPI; they receive the payload region
/// and return their own summary of it.
pub trait LayerDecoder: Send + Sync {
    /// Short, stable protocol name (e.g., "ethernet").
    fn name(&self) -> &'static str;

    fn decode(&self, data: &[u8]) -> Result<DecodedPayload, PayloadError>;
}

/// Summary produced by a [`LayerDecoder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedPayload {
    pub protocol: String,
    /// Bytes consumed by this protocol's own header.
    pub header_len: usize,
    /// Protocol-specific attributes in stable order.
    pub details: BTreeMap<String, String>,
}

impl DecodedPayload {
    pub fn new(protocol: impl Into<String>, header_len: usize) -> Self {
        Self {
            protocol: protocol.into(),
            header_len,
            details: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

/// Errors returned by next-layer decoders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("malformed {protocol} payload: {message}")]
    Malformed {
        protocol: &'static str,
        message: String,
    },
}
