//! Built-in next-layer decoders and their data link type codes.
//!
//! These are ordinary [`LayerDecoder`] implementations: they register into a
//! [`LayerTypeRegistry`](crate::LayerTypeRegistry) the same way external
//! decoders do.

mod dot11;
mod ethernet;

use std::sync::Arc;

use crate::dispatch::LayerDecoder;

pub use dot11::Dot11Decoder;
pub use ethernet::{EthernetDecoder, RawIpDecoder};

pub const DLT_ETHERNET: u32 = 1;
pub const DLT_RAW: u32 = 101;
pub const DLT_IEEE802_11: u32 = 105;
pub const DLT_PPI: u32 = 192;

/// Built-in decoders keyed by data link type.
pub fn builtin() -> Vec<(u32, Arc<dyn LayerDecoder>)> {
    vec![
        (DLT_ETHERNET, Arc::new(EthernetDecoder)),
        (DLT_RAW, Arc::new(RawIpDecoder)),
        (DLT_IEEE802_11, Arc::new(Dot11Decoder)),
    ]
}

/// Lowercase, colon-separated hardware address.
pub(crate) fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::format_mac;

    #[test]
    fn mac_is_lowercase_colon_separated() {
        assert_eq!(format_mac(&[0xAB, 0, 1, 2, 3, 0xFF]), "ab:00:01:02:03:ff");
    }
}
