use super::format_mac;
use crate::dispatch::{DecodedPayload, LayerDecoder, PayloadError};
use crate::protocols::common::ByteCursor;

const MIN_HEADER_LEN: usize = 10;
const CONTROL_SHORT_LEN: usize = 10;
const CONTROL_LONG_LEN: usize = 16;
const MGMT_DATA_LEN: usize = 24;
const ADDR_LEN: usize = 6;
const SEQ_CONTROL_LEN: usize = 2;
const QOS_CONTROL_LEN: usize = 2;
const HT_CONTROL_LEN: usize = 4;

const TYPE_MANAGEMENT: u8 = 0;
const TYPE_CONTROL: u8 = 1;
const TYPE_DATA: u8 = 2;

const SUBTYPE_CTS: u8 = 12;
const SUBTYPE_ACK: u8 = 13;
const SUBTYPE_QOS_BIT: u8 = 0x08;

const FLAG_TO_DS: u8 = 0x01;
const FLAG_FROM_DS: u8 = 0x02;
const FLAG_RETRY: u8 = 0x08;
const FLAG_PROTECTED: u8 = 0x40;
const FLAG_ORDER: u8 = 0x80;

/// IEEE 802.11 MAC frames (DLT 105).
///
/// Decodes the frame control word, duration and the address fields present
/// for the frame type. Frame bodies are not interpreted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dot11Decoder;

impl LayerDecoder for Dot11Decoder {
    fn name(&self) -> &'static str {
        "802.11"
    }

    fn decode(&self, data: &[u8]) -> Result<DecodedPayload, PayloadError> {
        let too_short = |needed: usize| PayloadError::TooShort {
            needed,
            actual: data.len(),
        };
        let mut cursor = ByteCursor::new(data);
        let control = cursor.read_u8().map_err(|_| too_short(MIN_HEADER_LEN))?;
        let flags = cursor.read_u8().map_err(|_| too_short(MIN_HEADER_LEN))?;

        let version = control & 0x03;
        let frame_type = (control >> 2) & 0x03;
        let subtype = control >> 4;
        if version != 0 {
            return Err(self.malformed(format!("unsupported protocol version {version}")));
        }

        let header_len = header_len(frame_type, subtype, flags)
            .ok_or_else(|| self.malformed(format!("reserved frame type {frame_type}")))?;
        if data.len() < header_len {
            return Err(too_short(header_len));
        }

        let duration = cursor.read_u16_le().map_err(|_| too_short(header_len))?;
        let mut summary = DecodedPayload::new(self.name(), header_len)
            .with("type", type_name(frame_type))
            .with("subtype", subtype)
            .with("duration", duration)
            .with("retry", flags & FLAG_RETRY != 0)
            .with("protected", flags & FLAG_PROTECTED != 0);

        let address_count = match header_len {
            CONTROL_SHORT_LEN => 1,
            CONTROL_LONG_LEN => 2,
            _ => 3,
        };
        for index in 1..=address_count {
            let addr = cursor.slice(ADDR_LEN).map_err(|_| too_short(header_len))?;
            summary = summary.with(&format!("addr{index}"), format_mac(addr));
        }
        if frame_type == TYPE_DATA && has_four_addresses(flags) {
            cursor.skip(SEQ_CONTROL_LEN).map_err(|_| too_short(header_len))?;
            let addr = cursor.slice(ADDR_LEN).map_err(|_| too_short(header_len))?;
            summary = summary.with("addr4", format_mac(addr));
        }
        Ok(summary)
    }
}

impl Dot11Decoder {
    fn malformed(&self, message: String) -> PayloadError {
        PayloadError::Malformed {
            protocol: self.name(),
            message,
        }
    }
}

fn header_len(frame_type: u8, subtype: u8, flags: u8) -> Option<usize> {
    match frame_type {
        TYPE_CONTROL => Some(match subtype {
            SUBTYPE_CTS | SUBTYPE_ACK => CONTROL_SHORT_LEN,
            _ => CONTROL_LONG_LEN,
        }),
        TYPE_MANAGEMENT => Some(MGMT_DATA_LEN),
        TYPE_DATA => {
            let mut len = MGMT_DATA_LEN;
            if has_four_addresses(flags) {
                len += ADDR_LEN;
            }
            if subtype & SUBTYPE_QOS_BIT != 0 {
                len += QOS_CONTROL_LEN;
                if flags & FLAG_ORDER != 0 {
                    len += HT_CONTROL_LEN;
                }
            }
            Some(len)
        }
        _ => None,
    }
}

fn has_four_addresses(flags: u8) -> bool {
    flags & FLAG_TO_DS != 0 && flags & FLAG_FROM_DS != 0
}

fn type_name(frame_type: u8) -> &'static str {
    match frame_type {
        TYPE_MANAGEMENT => "management",
        TYPE_CONTROL => "control",
        _ => "data",
    }
}

#[cfg(test)]
mod tests {
    use super::Dot11Decoder;
    use crate::dispatch::{LayerDecoder, PayloadError};

    fn frame(control: u8, flags: u8, len: usize) -> Vec<u8> {
        let mut data = vec![control, flags, 0x3A, 0x01];
        for idx in 0..len.saturating_sub(4) {
            data.push(idx as u8);
        }
        data
    }

    #[test]
    fn decodes_beacon_addresses() {
        // type 0 (management), subtype 8 (beacon)
        let data = frame(0x80, 0x00, 36);
        let decoded = Dot11Decoder.decode(&data).unwrap();
        assert_eq!(decoded.header_len, 24);
        let get = |key: &str| decoded.details.get(key).map(String::as_str);
        assert_eq!(get("type"), Some("management"));
        assert_eq!(get("subtype"), Some("8"));
        assert_eq!(get("duration"), Some("314"));
        assert_eq!(get("addr1"), Some("00:01:02:03:04:05"));
        assert_eq!(get("addr3"), Some("0c:0d:0e:0f:10:11"));
        assert_eq!(get("addr4"), None);
    }

    #[test]
    fn ack_has_single_address() {
        let data = frame(0xD4, 0x00, 10);
        let decoded = Dot11Decoder.decode(&data).unwrap();
        assert_eq!(decoded.header_len, 10);
        assert!(decoded.details.contains_key("addr1"));
        assert!(!decoded.details.contains_key("addr2"));
    }

    #[test]
    fn four_address_qos_data() {
        // type 2 (data), subtype 8 (QoS data), to-DS and from-DS
        let data = frame(0x88, 0x03, 32);
        let decoded = Dot11Decoder.decode(&data).unwrap();
        assert_eq!(decoded.header_len, 32);
        assert_eq!(
            decoded.details.get("addr4").map(String::as_str),
            Some("14:15:16:17:18:19")
        );
    }

    #[test]
    fn truncated_header_is_too_short() {
        let data = frame(0x80, 0x00, 20);
        assert_eq!(
            Dot11Decoder.decode(&data).unwrap_err(),
            PayloadError::TooShort {
                needed: 24,
                actual: 20,
            }
        );
        assert!(matches!(
            Dot11Decoder.decode(&[0x80]),
            Err(PayloadError::TooShort { .. })
        ));
    }

    #[test]
    fn reserved_type_is_malformed() {
        let data = frame(0x0C, 0x00, 24);
        assert!(matches!(
            Dot11Decoder.decode(&data),
            Err(PayloadError::Malformed { protocol: "802.11", .. })
        ));
    }
}
