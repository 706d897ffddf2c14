//! Packet sources.
//!
//! Sources deliver raw link-layer frames with their capture link type; they
//! do no protocol decoding. Capture file formats are handled by
//! `pcap-parser`.

mod pcap;

pub use pcap::PcapFileSource;

use pcap_parser::Linktype;
use thiserror::Error;

use crate::decoders::DLT_PPI;

/// One captured frame.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Capture time in seconds since the Unix epoch, scaled by the file's
    /// timestamp precision. `None` for blocks without a timestamp.
    pub ts: Option<f64>,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

impl PacketEvent {
    /// Link type as a DLT code; `None` for negative (invalid) values.
    pub fn dlt(&self) -> Option<u32> {
        u32::try_from(self.linktype.0).ok()
    }

    /// Whether `data` starts with a PPI header.
    pub fn carries_ppi(&self) -> bool {
        self.dlt() == Some(DLT_PPI)
    }
}

pub trait PacketSource {
    /// Next frame, or `Ok(None)` once the source is exhausted.
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

/// In-memory source, mostly useful for tests and for callers that already
/// hold decoded frames.
impl PacketSource for std::vec::IntoIter<PacketEvent> {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        Ok(self.next())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed {format} capture: {message}")]
    Capture {
        format: &'static str,
        message: String,
    },
}

impl From<pcap::error::PcapSourceError> for SourceError {
    fn from(value: pcap::error::PcapSourceError) -> Self {
        match value {
            pcap::error::PcapSourceError::Io(err) => SourceError::Io(err),
            pcap::error::PcapSourceError::Pcap { context, message } => SourceError::Capture {
                format: context,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pcap_parser::Linktype;

    use super::PacketEvent;

    fn event(linktype: i32) -> PacketEvent {
        PacketEvent {
            ts: None,
            linktype: Linktype(linktype),
            data: Vec::new(),
        }
    }

    #[test]
    fn only_linktype_192_carries_ppi() {
        assert!(event(192).carries_ppi());
        assert!(!event(105).carries_ppi());
        assert_eq!(event(-1).dlt(), None);
        assert!(!event(-1).carries_ppi());
    }
}
