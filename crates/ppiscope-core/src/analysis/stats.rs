use std::collections::BTreeMap;

use crate::dispatch::{DecodedPacket, NextLayer};
use crate::protocols::ppi::fields::FieldType;
use crate::{EncapsulationSummary, FieldTypeSummary, PpiSummary};

#[derive(Debug, Default)]
struct EncapStats {
    decoder: Option<&'static str>,
    packets: u64,
    payload_bytes: u64,
    payload_errors: u64,
}

/// Aggregated PPI counters; maps are ordered so summaries come out sorted.
#[derive(Debug, Default)]
pub(crate) struct PpiStats {
    summary: PpiSummary,
    encapsulations: BTreeMap<u32, EncapStats>,
    field_types: BTreeMap<u16, u64>,
}

impl PpiStats {
    pub(crate) fn add_header_error(&mut self) {
        self.summary.header_errors += 1;
    }

    pub(crate) fn add_packet(&mut self, packet: &DecodedPacket<'_>) {
        let layer = &packet.layer;
        self.summary.decoded += 1;
        if !layer.fields_complete() {
            self.summary.field_errors += 1;
        }
        self.summary.fields_total += layer.fields.len() as u64;
        for field in &layer.fields {
            *self.field_types.entry(field.field_type).or_default() += 1;
        }

        let stats = self.encapsulations.entry(layer.header.dlt).or_default();
        stats.packets += 1;
        stats.payload_bytes += layer.payload.len() as u64;
        stats.decoder = packet.next.decoder_name();
        if matches!(packet.next, NextLayer::Failed { .. }) {
            stats.payload_errors += 1;
        }
    }

    pub(crate) fn summary(&self) -> PpiSummary {
        self.summary.clone()
    }

    pub(crate) fn build_encapsulations(&self) -> Vec<EncapsulationSummary> {
        self.encapsulations
            .iter()
            .map(|(dlt, stats)| EncapsulationSummary {
                dlt: *dlt,
                decoder: stats.decoder.map(str::to_string),
                packets: stats.packets,
                payload_bytes: stats.payload_bytes,
                payload_errors: stats.payload_errors,
            })
            .collect()
    }

    pub(crate) fn build_field_types(&self) -> Vec<FieldTypeSummary> {
        self.field_types
            .iter()
            .map(|(field_type, count)| FieldTypeSummary {
                field_type: *field_type,
                name: FieldType::from_code(*field_type).name().to_string(),
                count: *count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::PpiStats;
    use crate::dispatch::{DispatchEngine, LayerTypeRegistry};

    #[test]
    fn counts_fields_and_encapsulations() {
        let registry = LayerTypeRegistry::with_builtin_decoders().unwrap();
        let engine = DispatchEngine::new(&registry);
        let mut stats = PpiStats::default();

        let with_field = [
            0x00, 0x00, 0x0D, 0x00, 0x63, 0x00, 0x00, 0x00, 0x07, 0x00, 0x01, 0x00, 0x01, 0xAA,
        ];
        let bare = [0x00, 0x00, 0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        stats.add_packet(&engine.decode_packet(&with_field).unwrap());
        stats.add_packet(&engine.decode_packet(&with_field).unwrap());
        stats.add_packet(&engine.decode_packet(&bare).unwrap());
        stats.add_header_error();

        let summary = stats.summary();
        assert_eq!(summary.decoded, 3);
        assert_eq!(summary.header_errors, 1);
        assert_eq!(summary.fields_total, 2);

        let encaps = stats.build_encapsulations();
        assert_eq!(encaps.len(), 2);
        assert_eq!(encaps[0].dlt, 1);
        assert_eq!(encaps[0].decoder.as_deref(), Some("ethernet"));
        assert_eq!(encaps[0].payload_errors, 1);
        assert_eq!(encaps[1].dlt, 99);
        assert_eq!(encaps[1].decoder, None);
        assert_eq!(encaps[1].packets, 2);
        assert_eq!(encaps[1].payload_bytes, 2);

        let fields = stats.build_field_types();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "capture-info");
        assert_eq!(fields[0].count, 2);
    }
}
