//! ppiscope core library: PPI header decoding and next-layer dispatch.
//!
//! Per-Packet Information (PPI) headers wrap raw link-layer captures with a
//! small fixed header (version, flags, length, data link type) and a list of
//! type-length-value fields carrying radio and capture metadata. This crate
//! decodes that header without copying, walks its fields, and hands the
//! remaining bytes to the decoder registered for the announced data link
//! type.
//!
//! Layers:
//! - `protocols`: byte cursor and the PPI layout/reader/fields/parser stack;
//! - `dispatch`: the layer-type registry and dispatch engine;
//! - `decoders`: built-in next-layer decoders (Ethernet, raw IP, 802.11);
//! - `source` and `analysis`: capture file input and the JSON report.
//!
//! Invariants:
//! - Decoding never panics on malformed input; every failure is a typed
//!   result.
//! - Header errors abort the layer. Field errors and unknown data link types
//!   do not: the header, the fields decoded so far and the payload are kept.
//! - Registration happens before decoding; lookups afterwards are lock-free.
//!
//! # Examples
//! ```
//! use ppiscope_core::{DispatchEngine, NextLayer, default_registry};
//!
//! // PPI v0, no alignment, 8-byte header, DLT 105 (802.11), then an ACK frame.
//! let frame = [
//!     0x00, 0x00, 0x08, 0x00, 0x69, 0x00, 0x00, 0x00,
//!     0xD4, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
//! ];
//! let packet = DispatchEngine::new(default_registry()).decode_packet(&frame)?;
//! assert_eq!(packet.layer.header.dlt, 105);
//! assert!(matches!(packet.next, NextLayer::Decoded { decoder: "802.11", .. }));
//! # Ok::<(), ppiscope_core::HeaderError>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
pub mod decoders;
mod dispatch;
mod protocols;
mod source;

pub use analysis::{
    AnalysisError, DecodeOptions, analyze_pcap_file, analyze_pcap_file_with, analyze_source,
};
pub use dispatch::{
    DecodedPacket, DecodedPayload, DispatchEngine, LayerDecoder, LayerTypeRegistry, NextLayer,
    PayloadError, RegistryError, UnknownEncapsulation, default_registry,
};
pub use protocols::common::{ByteCursor, CursorError};
pub use protocols::ppi::error::{FieldError, FieldSizeError, HeaderError};
pub use protocols::ppi::fields::{
    AggregationExtension, Dot3Extension, Dot11Common, FieldType, FieldWalker, PpiField,
};
pub use protocols::ppi::layout::{FIXED_HEADER_LEN, PPI_VERSION};
pub use protocols::ppi::reader::{HeaderSplit, PpiHeader, decode_header};
pub use protocols::ppi::{PpiLayer, parse_ppi};
pub use source::{PacketEvent, PacketSource, PcapFileSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Capture analysis report with deterministic ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp; the last capture timestamp when known.
    pub generated_at: String,
    pub input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    pub ppi: PpiSummary,
    /// Per data link type summaries, ordered by code.
    pub encapsulations: Vec<EncapsulationSummary>,
    /// Per field type counts, ordered by type.
    pub field_types: Vec<FieldTypeSummary>,
    pub compliance: Vec<ComplianceSummary>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Capture-wide counters and time bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub packets_total: u64,
    /// Packets whose capture link type is PPI.
    pub ppi_packets: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Outcome counters for PPI header decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpiSummary {
    /// Packets whose header decoded (fields may still be incomplete).
    pub decoded: u64,
    pub header_errors: u64,
    /// Decoded packets whose field list stopped early.
    pub field_errors: u64,
    pub fields_total: u64,
}

/// Packets seen for one encapsulated data link type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncapsulationSummary {
    pub dlt: u32,
    /// Registered decoder name; absent when the code is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoder: Option<String>,
    pub packets: u64,
    pub payload_bytes: u64,
    /// Payloads the registered decoder rejected.
    pub payload_errors: u64,
}

/// Occurrences of one PPI field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTypeSummary {
    pub field_type: u16,
    pub name: String,
    pub count: u64,
}

/// Compliance summary for a protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub protocol: String,
    /// Share of packets without any violation (0.0–100.0).
    pub compliance_percentage: f64,
    /// Violations sorted by severity and ID.
    pub violations: Vec<Violation>,
}

/// Single compliance violation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Stable violation identifier (e.g., `PPI-FIELD-OVERRUN`).
    pub id: String,
    /// Severity label (`error` or `warning`).
    pub severity: String,
    pub message: String,
    pub count: u64,
    /// At most three examples, formatted as `packet #N: detail`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Build a report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use ppiscope_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcap", 123);
/// assert_eq!(report.report_version, ppiscope_core::REPORT_VERSION);
/// assert!(report.encapsulations.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "ppiscope".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        ppi: PpiSummary::default(),
        encapsulations: vec![],
        field_types: vec![],
        compliance: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let mut report = make_stub_report("capture.pcap", 1);
        report.capture_summary = Some(CaptureSummary {
            packets_total: 1,
            ppi_packets: 1,
            time_start: None,
            time_end: None,
        });
        report.encapsulations.push(EncapsulationSummary {
            dlt: 4242,
            decoder: None,
            packets: 1,
            payload_bytes: 0,
            payload_errors: 0,
        });

        let value = serde_json::to_value(&report).expect("report json");
        let capture = value.get("capture_summary").expect("capture_summary");
        assert!(capture.get("time_start").is_none());
        assert!(capture.get("time_end").is_none());
        assert!(value["encapsulations"][0].get("decoder").is_none());
        assert_eq!(value["ppi"]["decoded"], 0);
    }

    #[test]
    fn stub_report_omits_capture_summary() {
        let value = serde_json::to_value(make_stub_report("x.pcap", 0)).expect("report json");
        assert!(value.get("capture_summary").is_none());
        assert_eq!(value["tool"]["name"], "ppiscope");
    }
}
