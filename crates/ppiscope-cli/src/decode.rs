//! `ppiscope decode`: describe a single PPI frame as JSON.

use ppiscope_core::{
    DecodedPacket, DecodedPayload, DispatchEngine, FieldType, NextLayer, PpiField, PpiHeader,
    default_registry,
};
use serde::Serialize;
use serde_json::Value;

use crate::CliError;

#[derive(Debug, Serialize)]
pub(crate) struct FrameView<'a> {
    header: PpiHeader,
    aligned: bool,
    fields: Vec<FieldView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_error: Option<String>,
    header_len: usize,
    payload_len: usize,
    next: NextView,
}

#[derive(Debug, Serialize)]
struct FieldView<'a> {
    #[serde(flatten)]
    field: PpiField<'a>,
    name: &'static str,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    decoded: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum NextView {
    Decoded {
        decoder: &'static str,
        payload: DecodedPayload,
    },
    Failed {
        decoder: &'static str,
        error: String,
    },
    Unknown {
        dlt: u32,
    },
}

/// Parse hex input, tolerating whitespace, `:`/`-` separators and a `0x` prefix.
pub(crate) fn parse_hex(input: &str) -> Result<Vec<u8>, CliError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(&digits).map_err(|err| {
        CliError::new(
            format!("invalid hex input: {err}"),
            Some("pass the frame as hex digits, e.g. 000008006900000000".to_string()),
        )
    })
}

pub(crate) fn decode_frame(bytes: &[u8]) -> Result<FrameView<'_>, CliError> {
    let engine = DispatchEngine::new(default_registry());
    let packet = engine.decode_packet(bytes).map_err(|err| {
        CliError::new(
            format!("PPI decode failed: {err}"),
            Some("check that the frame starts with a PPI header".to_string()),
        )
    })?;
    Ok(frame_view(&packet))
}

fn frame_view<'a>(packet: &DecodedPacket<'a>) -> FrameView<'a> {
    let layer = &packet.layer;
    FrameView {
        header: layer.header,
        aligned: layer.header.is_aligned(),
        fields: layer.fields.iter().map(field_view).collect(),
        field_error: layer.field_error.as_ref().map(ToString::to_string),
        header_len: layer.contents.len(),
        payload_len: layer.payload.len(),
        next: match &packet.next {
            NextLayer::Decoded { decoder, payload } => NextView::Decoded {
                decoder: *decoder,
                payload: payload.clone(),
            },
            NextLayer::Failed { decoder, error } => NextView::Failed {
                decoder: *decoder,
                error: error.to_string(),
            },
            NextLayer::Unknown(unknown) => NextView::Unknown { dlt: unknown.code },
        },
    }
}

fn field_view<'a>(field: &PpiField<'a>) -> FieldView<'a> {
    let decoded = match field.kind() {
        FieldType::Dot11Common => field.as_dot11_common().ok().map(to_value),
        FieldType::Aggregation => field.as_aggregation().ok().map(to_value),
        FieldType::Dot3 => field.as_dot3().ok().map(to_value),
        _ => None,
    };
    FieldView {
        field: *field,
        name: field.kind().name(),
        data: hex::encode(field.data),
        decoded,
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::{decode_frame, parse_hex};

    #[test]
    fn parse_hex_accepts_separators_and_prefix() {
        assert_eq!(parse_hex("0x00 01:02-ff").unwrap(), vec![0, 1, 2, 0xff]);
        assert!(parse_hex("0g").is_err());
        assert!(parse_hex("abc").is_err());
    }

    #[test]
    fn frame_view_reports_unknown_dlt() {
        let bytes = parse_hex("0000 0c00 ffffffff 0700 0000 aabb").unwrap();
        let view = decode_frame(&bytes).unwrap();
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["next"]["status"], "unknown");
        assert_eq!(value["next"]["dlt"], u32::MAX);
        assert_eq!(value["fields"][0]["name"], "capture-info");
        assert_eq!(value["fields"][0]["data"], "");
        assert_eq!(value["payload_len"], 2);
    }

    #[test]
    fn header_error_is_reported() {
        let err = decode_frame(&[0x00, 0x00]).unwrap_err();
        assert!(err.message.contains("too short"));
    }
}
