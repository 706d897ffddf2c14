use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::debug;

use crate::dispatch::{DecodedPacket, DispatchEngine, LayerTypeRegistry, NextLayer, default_registry};
use crate::protocols::ppi::error::{FieldError, HeaderError};
use crate::protocols::ppi::fields::FieldType;
use crate::protocols::ppi::layout::PPI_VERSION;
use crate::source::{PacketSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

mod compliance;
mod stats;

use compliance::{ComplianceTracker, ViolationKind};
use stats::PpiStats;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Analysis settings.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions<'r> {
    /// PPI version accepted without a compliance warning.
    pub expected_version: u8,
    /// Decoders used for encapsulated frames.
    pub registry: &'r LayerTypeRegistry,
}

impl Default for DecodeOptions<'static> {
    fn default() -> Self {
        Self {
            expected_version: PPI_VERSION,
            registry: default_registry(),
        }
    }
}

pub fn analyze_pcap_file(path: &Path) -> Result<Report, AnalysisError> {
    analyze_pcap_file_with(path, &DecodeOptions::default())
}

pub fn analyze_pcap_file_with(
    path: &Path,
    options: &DecodeOptions<'_>,
) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, options)
}

/// Decode every PPI packet from `source` and aggregate the report.
///
/// Packets with other link types are counted but not decoded. Malformed PPI
/// packets never stop the analysis; they are reported as violations.
pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
    options: &DecodeOptions<'_>,
) -> Result<Report, AnalysisError> {
    let engine = DispatchEngine::new(options.registry);
    let mut packets_total = 0u64;
    let mut ppi_packets = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut stats = PpiStats::default();
    let mut compliance = ComplianceTracker::default();

    while let Some(event) = source.next_packet()? {
        packets_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, event.ts);
        if !event.carries_ppi() {
            continue;
        }
        ppi_packets += 1;
        compliance.begin_packet();

        match engine.decode_packet(&event.data) {
            Ok(packet) => {
                check_packet(&packet, packets_total, options, &mut compliance);
                stats.add_packet(&packet);
            }
            Err(err) => {
                debug!(packet = packets_total, error = %err, "PPI header rejected");
                compliance.record(header_violation(&err), packets_total, &err.to_string());
                stats.add_header_error();
            }
        }
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    report.capture_summary = Some(CaptureSummary {
        packets_total,
        ppi_packets,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.ppi = stats.summary();
    report.encapsulations = stats.build_encapsulations();
    report.field_types = stats.build_field_types();
    report.compliance = compliance.build("ppi").into_iter().collect();
    Ok(report)
}

fn check_packet(
    packet: &DecodedPacket<'_>,
    index: u64,
    options: &DecodeOptions<'_>,
    compliance: &mut ComplianceTracker,
) {
    let layer = &packet.layer;
    if layer.header.version != options.expected_version {
        compliance.record(
            ViolationKind::Version,
            index,
            &format!(
                "version {} (expected {})",
                layer.header.version, options.expected_version
            ),
        );
    }

    if let Some(err) = &layer.field_error {
        debug!(packet = index, error = %err, "PPI field section incomplete");
        let kind = match err {
            FieldError::FieldOverrun { .. } => ViolationKind::FieldOverrun,
            FieldError::IncompleteTrailingField { .. } => ViolationKind::FieldIncomplete,
        };
        compliance.record(kind, index, &err.to_string());
    }

    for field in &layer.fields {
        let checked = match field.kind() {
            FieldType::Dot11Common => field.as_dot11_common().map(|_| ()),
            FieldType::Aggregation => field.as_aggregation().map(|_| ()),
            FieldType::Dot3 => field.as_dot3().map(|_| ()),
            _ => Ok(()),
        };
        if let Err(err) = checked {
            compliance.record(ViolationKind::FieldSize, index, &err.to_string());
        }
    }

    match &packet.next {
        NextLayer::Decoded { .. } => {}
        NextLayer::Failed { decoder, error } => compliance.record(
            ViolationKind::PayloadDecode,
            index,
            &format!("{decoder}: {error}"),
        ),
        NextLayer::Unknown(unknown) => {
            compliance.record(ViolationKind::UnknownDlt, index, &unknown.to_string())
        }
    }
}

fn header_violation(err: &HeaderError) -> ViolationKind {
    match err {
        HeaderError::TooShort { .. } => ViolationKind::HeaderTooShort,
        HeaderError::InvalidLength { .. } => ViolationKind::HeaderInvalidLength,
        HeaderError::Truncated { .. } => ViolationKind::HeaderTruncated,
    }
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    *first = Some(first.map_or(ts, |existing| existing.min(ts)));
    *last = Some(last.map_or(ts, |existing| existing.max(ts)));
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
