use std::collections::BTreeMap;

use crate::{ComplianceSummary, Violation};

const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Stable violation kinds raised while analysing PPI packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ViolationKind {
    HeaderTooShort,
    HeaderInvalidLength,
    HeaderTruncated,
    FieldOverrun,
    FieldIncomplete,
    FieldSize,
    Version,
    UnknownDlt,
    PayloadDecode,
}

impl ViolationKind {
    pub(crate) fn id(self) -> &'static str {
        match self {
            ViolationKind::HeaderTooShort => "PPI-HEADER-TOO-SHORT",
            ViolationKind::HeaderInvalidLength => "PPI-HEADER-INVALID-LENGTH",
            ViolationKind::HeaderTruncated => "PPI-HEADER-TRUNCATED",
            ViolationKind::FieldOverrun => "PPI-FIELD-OVERRUN",
            ViolationKind::FieldIncomplete => "PPI-FIELD-INCOMPLETE",
            ViolationKind::FieldSize => "PPI-FIELD-SIZE",
            ViolationKind::Version => "PPI-VERSION",
            ViolationKind::UnknownDlt => "PPI-UNKNOWN-DLT",
            ViolationKind::PayloadDecode => "PPI-PAYLOAD-DECODE",
        }
    }

    pub(crate) fn severity(self) -> Severity {
        match self {
            ViolationKind::Version | ViolationKind::UnknownDlt | ViolationKind::PayloadDecode => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    fn message(self) -> &'static str {
        match self {
            ViolationKind::HeaderTooShort => "PPI frame shorter than the 8-byte fixed header",
            ViolationKind::HeaderInvalidLength => "PPI header declares a length below 8 bytes",
            ViolationKind::HeaderTruncated => "PPI header declares more bytes than captured",
            ViolationKind::FieldOverrun => "PPI field runs past the declared header length",
            ViolationKind::FieldIncomplete => "PPI field section ends with a partial field header",
            ViolationKind::FieldSize => "well-known PPI field has an unexpected size",
            ViolationKind::Version => "unexpected PPI header version",
            ViolationKind::UnknownDlt => "no decoder registered for the encapsulated DLT",
            ViolationKind::PayloadDecode => "encapsulated frame rejected by its decoder",
        }
    }
}

#[derive(Debug, Default)]
struct Occurrences {
    count: u64,
    examples: Vec<String>,
}

/// Collects violations per packet and summarises them.
#[derive(Debug, Default)]
pub(crate) struct ComplianceTracker {
    checked_packets: u64,
    failing_packets: u64,
    current_failed: bool,
    by_kind: BTreeMap<ViolationKind, Occurrences>,
}

impl ComplianceTracker {
    /// Start checking a new packet. Must precede `record` calls for it.
    pub(crate) fn begin_packet(&mut self) {
        self.finish_packet();
        self.checked_packets += 1;
    }

    pub(crate) fn record(&mut self, kind: ViolationKind, packet_index: u64, detail: &str) {
        self.current_failed = true;
        let entry = self.by_kind.entry(kind).or_default();
        entry.count += 1;
        if entry.examples.len() < MAX_EXAMPLES {
            entry.examples.push(format!("packet #{packet_index}: {detail}"));
        }
    }

    fn finish_packet(&mut self) {
        if self.current_failed {
            self.failing_packets += 1;
            self.current_failed = false;
        }
    }

    /// Summary for `protocol`, or `None` when no packet was checked.
    pub(crate) fn build(mut self, protocol: &str) -> Option<ComplianceSummary> {
        self.finish_packet();
        if self.checked_packets == 0 {
            return None;
        }
        let passing = self.checked_packets - self.failing_packets;
        let compliance_percentage = passing as f64 / self.checked_packets as f64 * 100.0;

        let mut violations: Vec<(Severity, Violation)> = self
            .by_kind
            .into_iter()
            .map(|(kind, occurrences)| {
                (
                    kind.severity(),
                    Violation {
                        id: kind.id().to_string(),
                        severity: kind.severity().label().to_string(),
                        message: kind.message().to_string(),
                        count: occurrences.count,
                        examples: occurrences.examples,
                    },
                )
            })
            .collect();
        violations.sort_by(|(sa, a), (sb, b)| sa.cmp(sb).then_with(|| a.id.cmp(&b.id)));

        Some(ComplianceSummary {
            protocol: protocol.to_string(),
            compliance_percentage,
            violations: violations.into_iter().map(|(_, v)| v).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ComplianceTracker, ViolationKind};

    #[test]
    fn empty_tracker_builds_nothing() {
        assert!(ComplianceTracker::default().build("ppi").is_none());
    }

    #[test]
    fn percentage_counts_failing_packets_once() {
        let mut tracker = ComplianceTracker::default();
        tracker.begin_packet();
        tracker.record(ViolationKind::Version, 1, "version 3");
        tracker.record(ViolationKind::UnknownDlt, 1, "DLT 4242");
        tracker.begin_packet();
        tracker.begin_packet();
        tracker.begin_packet();
        let summary = tracker.build("ppi").unwrap();
        assert!((summary.compliance_percentage - 75.0).abs() < 1e-9);
        assert_eq!(summary.violations.len(), 2);
    }

    #[test]
    fn violations_sort_errors_first_and_cap_examples() {
        let mut tracker = ComplianceTracker::default();
        for idx in 1..=5 {
            tracker.begin_packet();
            tracker.record(ViolationKind::UnknownDlt, idx, "DLT 9");
            tracker.record(ViolationKind::FieldOverrun, idx, "overrun");
        }
        let summary = tracker.build("ppi").unwrap();
        let ids: Vec<_> = summary.violations.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["PPI-FIELD-OVERRUN", "PPI-UNKNOWN-DLT"]);
        assert_eq!(summary.violations[0].severity, "error");
        assert_eq!(summary.violations[0].count, 5);
        assert_eq!(summary.violations[0].examples.len(), 3);
        assert_eq!(summary.violations[0].examples[0], "packet #1: overrun");
        assert_eq!(summary.compliance_percentage, 0.0);
    }
}
