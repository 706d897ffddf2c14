use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::registry::LayerTypeRegistry;
use super::{DecodedPayload, LayerDecoder, PayloadError};
use crate::protocols::ppi::error::HeaderError;
use crate::protocols::ppi::reader::PpiHeader;
use crate::protocols::ppi::{PpiLayer, parse_ppi};

/// Dispatch outcome for a code with no registered decoder. Not fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("unknown encapsulation code {code}")]
pub struct UnknownEncapsulation {
    pub code: u32,
}

/// What became of the payload after the PPI layer.
#[derive(Debug, Clone)]
pub enum NextLayer {
    /// The registered decoder interpreted the payload.
    Decoded {
        decoder: &'static str,
        payload: DecodedPayload,
    },
    /// The registered decoder rejected the payload.
    Failed {
        decoder: &'static str,
        error: PayloadError,
    },
    /// No decoder is registered for the header's code.
    Unknown(UnknownEncapsulation),
}

impl NextLayer {
    pub fn decoder_name(&self) -> Option<&'static str> {
        match self {
            NextLayer::Decoded { decoder, .. } | NextLayer::Failed { decoder, .. } => {
                Some(*decoder)
            }
            NextLayer::Unknown(_) => None,
        }
    }
}

/// A decoded PPI layer plus the outcome of dispatching its payload.
#[derive(Debug, Clone)]
pub struct DecodedPacket<'a> {
    pub layer: PpiLayer<'a>,
    pub next: NextLayer,
}

/// Selects and runs the decoder for the payload of a PPI layer.
///
/// # Examples
/// ```
/// use ppiscope_core::{DispatchEngine, NextLayer, default_registry};
///
/// let engine = DispatchEngine::new(default_registry());
/// let frame = [0x00, 0x00, 0x08, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
/// let packet = engine.decode_packet(&frame)?;
/// assert_eq!(packet.layer.payload, &[0x01]);
/// assert!(matches!(packet.next, NextLayer::Unknown(unknown) if unknown.code == u32::MAX));
/// # Ok::<(), ppiscope_core::HeaderError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DispatchEngine<'r> {
    registry: &'r LayerTypeRegistry,
}

impl<'r> DispatchEngine<'r> {
    pub fn new(registry: &'r LayerTypeRegistry) -> Self {
        Self { registry }
    }

    /// Decoder registered for the header's encapsulation code.
    pub fn next_decoder(
        &self,
        header: &PpiHeader,
    ) -> Result<Arc<dyn LayerDecoder>, UnknownEncapsulation> {
        match self.registry.lookup(header.dlt) {
            Some(decoder) => {
                debug!(code = header.dlt, decoder = decoder.name(), "dispatch resolved");
                Ok(Arc::clone(decoder))
            }
            None => {
                debug!(code = header.dlt, "dispatch miss");
                Err(UnknownEncapsulation { code: header.dlt })
            }
        }
    }

    /// Run the next decoder over the layer's payload.
    pub fn dispatch(&self, layer: &PpiLayer<'_>) -> NextLayer {
        let decoder = match self.next_decoder(&layer.header) {
            Ok(decoder) => decoder,
            Err(unknown) => return NextLayer::Unknown(unknown),
        };
        match decoder.decode(layer.payload) {
            Ok(payload) => NextLayer::Decoded {
                decoder: decoder.name(),
                payload,
            },
            Err(error) => NextLayer::Failed {
                decoder: decoder.name(),
                error,
            },
        }
    }

    /// Decode the PPI layer at the start of `buffer` and dispatch its payload.
    ///
    /// Only header errors fail; field errors and dispatch outcomes are
    /// reported on the returned packet.
    pub fn decode_packet<'a>(&self, buffer: &'a [u8]) -> Result<DecodedPacket<'a>, HeaderError> {
        let layer = parse_ppi(buffer)?;
        let next = self.dispatch(&layer);
        Ok(DecodedPacket { layer, next })
    }
}
