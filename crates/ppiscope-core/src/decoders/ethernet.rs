use etherparse::{Ethernet2Header, LinkSlice, NetSlice, SlicedPacket, TransportSlice};

use super::format_mac;
use crate::dispatch::{DecodedPayload, LayerDecoder, PayloadError};

/// Ethernet II frames (DLT 1).
#[derive(Debug, Default, Clone, Copy)]
pub struct EthernetDecoder;

/// Raw IPv4/IPv6 packets with no link header (DLT 101).
#[derive(Debug, Default, Clone, Copy)]
pub struct RawIpDecoder;

impl LayerDecoder for EthernetDecoder {
    fn name(&self) -> &'static str {
        "ethernet"
    }

    fn decode(&self, data: &[u8]) -> Result<DecodedPayload, PayloadError> {
        if data.len() < Ethernet2Header::LEN {
            return Err(PayloadError::TooShort {
                needed: Ethernet2Header::LEN,
                actual: data.len(),
            });
        }
        let sliced = SlicedPacket::from_ethernet(data).map_err(|e| PayloadError::Malformed {
            protocol: self.name(),
            message: e.to_string(),
        })?;

        let mut summary = DecodedPayload::new(self.name(), Ethernet2Header::LEN);
        if let Some(LinkSlice::Ethernet2(eth)) = &sliced.link {
            summary = summary
                .with("src_mac", format_mac(&eth.source()))
                .with("dst_mac", format_mac(&eth.destination()))
                .with("ether_type", format!("0x{:04x}", eth.ether_type().0));
        }
        Ok(describe_upper_layers(summary, &sliced))
    }
}

impl LayerDecoder for RawIpDecoder {
    fn name(&self) -> &'static str {
        "raw-ip"
    }

    fn decode(&self, data: &[u8]) -> Result<DecodedPayload, PayloadError> {
        let sliced = SlicedPacket::from_ip(data).map_err(|e| PayloadError::Malformed {
            protocol: self.name(),
            message: e.to_string(),
        })?;
        let ip_payload_len = sliced
            .net
            .as_ref()
            .and_then(|net| net.ip_payload_ref())
            .map(|payload| payload.payload.len())
            .unwrap_or(0);
        let header_len = data.len().saturating_sub(ip_payload_len);
        Ok(describe_upper_layers(
            DecodedPayload::new(self.name(), header_len),
            &sliced,
        ))
    }
}

fn describe_upper_layers(mut summary: DecodedPayload, sliced: &SlicedPacket<'_>) -> DecodedPayload {
    match &sliced.net {
        Some(NetSlice::Ipv4(ipv4)) => {
            summary = summary
                .with("network", "ipv4")
                .with("src_ip", ipv4.header().source_addr())
                .with("dst_ip", ipv4.header().destination_addr());
        }
        Some(NetSlice::Ipv6(ipv6)) => {
            summary = summary
                .with("network", "ipv6")
                .with("src_ip", ipv6.header().source_addr())
                .with("dst_ip", ipv6.header().destination_addr());
        }
        None => {}
    }
    match &sliced.transport {
        Some(TransportSlice::Udp(udp)) => summary
            .with("transport", "udp")
            .with("src_port", udp.source_port())
            .with("dst_port", udp.destination_port()),
        Some(TransportSlice::Tcp(tcp)) => summary
            .with("transport", "tcp")
            .with("src_port", tcp.source_port())
            .with("dst_port", tcp.destination_port()),
        Some(TransportSlice::Icmpv4(_)) => summary.with("transport", "icmpv4"),
        Some(TransportSlice::Icmpv6(_)) => summary.with("transport", "icmpv6"),
        None => summary,
    }
}
