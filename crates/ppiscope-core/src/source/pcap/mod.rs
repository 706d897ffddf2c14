//! PCAP/PCAPNG file source backed by `pcap-parser`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
