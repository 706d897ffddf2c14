//! TLV field walking and typed views over well-known PPI fields.

use serde::Serialize;
use tracing::trace;

use super::error::{FieldError, FieldSizeError};
use super::layout;
use crate::protocols::common::{ByteCursor, CursorError};

/// Well-known PPI field types. Field types may repeat within a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldType {
    Dot11Common,
    Dot11nMac,
    Dot11nMacPhy,
    SpectrumMap,
    ProcessInfo,
    CaptureInfo,
    Aggregation,
    Dot3,
    Gps,
    Unknown(u16),
}

impl FieldType {
    pub fn from_code(code: u16) -> Self {
        match code {
            layout::FIELD_80211_COMMON => FieldType::Dot11Common,
            layout::FIELD_80211N_MAC => FieldType::Dot11nMac,
            layout::FIELD_80211N_MAC_PHY => FieldType::Dot11nMacPhy,
            layout::FIELD_SPECTRUM_MAP => FieldType::SpectrumMap,
            layout::FIELD_PROCESS_INFO => FieldType::ProcessInfo,
            layout::FIELD_CAPTURE_INFO => FieldType::CaptureInfo,
            layout::FIELD_AGGREGATION => FieldType::Aggregation,
            layout::FIELD_8023 => FieldType::Dot3,
            layout::FIELD_GPS => FieldType::Gps,
            other => FieldType::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Dot11Common => "802.11-common",
            FieldType::Dot11nMac => "802.11n-mac",
            FieldType::Dot11nMacPhy => "802.11n-mac-phy",
            FieldType::SpectrumMap => "spectrum-map",
            FieldType::ProcessInfo => "process-info",
            FieldType::CaptureInfo => "capture-info",
            FieldType::Aggregation => "aggregation",
            FieldType::Dot3 => "802.3",
            FieldType::Gps => "gps",
            FieldType::Unknown(_) => "unknown",
        }
    }
}

/// One TLV record. `data` borrows the original buffer and excludes padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PpiField<'a> {
    pub field_type: u16,
    pub length: u16,
    /// Offset of the field header from the start of the PPI layer.
    pub offset: usize,
    #[serde(skip)]
    pub data: &'a [u8],
}

impl<'a> PpiField<'a> {
    pub fn kind(&self) -> FieldType {
        FieldType::from_code(self.field_type)
    }

    pub fn as_dot11_common(&self) -> Result<Dot11Common, FieldSizeError> {
        let mut cursor = self.sized_cursor(layout::DOT11_COMMON_LEN)?;
        read_dot11_common(&mut cursor).map_err(|_| self.bad_size(layout::DOT11_COMMON_LEN))
    }

    pub fn as_aggregation(&self) -> Result<AggregationExtension, FieldSizeError> {
        let mut cursor = self.sized_cursor(layout::AGGREGATION_LEN)?;
        let interface_id = cursor
            .read_u32_le()
            .map_err(|_| self.bad_size(layout::AGGREGATION_LEN))?;
        Ok(AggregationExtension { interface_id })
    }

    pub fn as_dot3(&self) -> Result<Dot3Extension, FieldSizeError> {
        let mut cursor = self.sized_cursor(layout::DOT3_LEN)?;
        read_dot3(&mut cursor).map_err(|_| self.bad_size(layout::DOT3_LEN))
    }

    fn sized_cursor(&self, expected: usize) -> Result<ByteCursor<'a>, FieldSizeError> {
        if self.data.len() != expected {
            return Err(self.bad_size(expected));
        }
        Ok(ByteCursor::new(self.data))
    }

    fn bad_size(&self, expected: usize) -> FieldSizeError {
        FieldSizeError {
            field_type: self.field_type,
            expected,
            actual: self.data.len(),
        }
    }
}

/// 802.11-Common field (type 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dot11Common {
    pub tsf_timer: u64,
    pub flags: u16,
    /// Data rate in 500 kbps units.
    pub rate: u16,
    /// Channel frequency in MHz.
    pub channel_freq: u16,
    pub channel_flags: u16,
    pub fhss_hopset: u8,
    pub fhss_pattern: u8,
    /// Antenna signal in dBm.
    pub antenna_signal: i8,
    /// Antenna noise in dBm.
    pub antenna_noise: i8,
}

/// Aggregation extension field (type 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregationExtension {
    pub interface_id: u32,
}

/// 802.3 extension field (type 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dot3Extension {
    pub flags: u32,
    pub errors: u32,
}

/// Lazy walker over the TLV field region of one PPI header.
///
/// Yields fields in wire order. The walk ends cleanly when the region is
/// exhausted; after the first error the walker is fused and yields nothing.
/// When `aligned` is set, each field's on-wire size (4 + length) is padded to
/// the next multiple of 4. The final field may omit its padding only when
/// the region ends exactly at the end of its data; a partial pad is left in
/// place and reported as an incomplete trailing field.
#[derive(Debug, Clone)]
pub struct FieldWalker<'a> {
    cursor: ByteCursor<'a>,
    aligned: bool,
    base_offset: usize,
    done: bool,
}

impl<'a> FieldWalker<'a> {
    /// `region` must be exactly the bytes between the fixed header and the
    /// declared length.
    pub fn new(region: &'a [u8], aligned: bool) -> Self {
        Self {
            cursor: ByteCursor::new(region),
            aligned,
            base_offset: layout::FIXED_HEADER_LEN,
            done: false,
        }
    }

    fn next_field(&mut self) -> Result<PpiField<'a>, FieldError> {
        let start = self.cursor.position();
        let offset = self.base_offset + start;
        let remaining = self.cursor.remaining();
        if remaining < layout::FIELD_HEADER_LEN {
            return Err(FieldError::IncompleteTrailingField { offset, remaining });
        }

        let incomplete = |_| FieldError::IncompleteTrailingField { offset, remaining };
        let field_type = self.cursor.read_u16_le().map_err(incomplete)?;
        let length = self.cursor.read_u16_le().map_err(incomplete)?;

        let data = self
            .cursor
            .slice(length as usize)
            .map_err(|_| FieldError::FieldOverrun {
                offset,
                field_type,
                length,
                remaining: remaining - layout::FIELD_HEADER_LEN,
            })?;

        let padding = if self.aligned {
            padding_for(layout::FIELD_HEADER_LEN + length as usize)
        } else {
            0
        };
        if padding > 0 && self.cursor.remaining() >= padding {
            self.cursor.skip(padding).map_err(incomplete)?;
        }

        trace!(
            field_type,
            length,
            offset,
            consumed = self.cursor.position() - start,
            "walked PPI field"
        );
        Ok(PpiField {
            field_type,
            length,
            offset,
            data,
        })
    }
}

impl<'a> Iterator for FieldWalker<'a> {
    type Item = Result<PpiField<'a>, FieldError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.remaining() == 0 {
            self.done = true;
            return None;
        }
        let result = self.next_field();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for FieldWalker<'_> {}

fn read_dot11_common(cursor: &mut ByteCursor<'_>) -> Result<Dot11Common, CursorError> {
    Ok(Dot11Common {
        tsf_timer: cursor.read_u64_le()?,
        flags: cursor.read_u16_le()?,
        rate: cursor.read_u16_le()?,
        channel_freq: cursor.read_u16_le()?,
        channel_flags: cursor.read_u16_le()?,
        fhss_hopset: cursor.read_u8()?,
        fhss_pattern: cursor.read_u8()?,
        antenna_signal: cursor.read_i8()?,
        antenna_noise: cursor.read_i8()?,
    })
}

fn read_dot3(cursor: &mut ByteCursor<'_>) -> Result<Dot3Extension, CursorError> {
    Ok(Dot3Extension {
        flags: cursor.read_u32_le()?,
        errors: cursor.read_u32_le()?,
    })
}

fn padding_for(size: usize) -> usize {
    let rem = size % layout::FIELD_ALIGNMENT;
    if rem == 0 {
        0
    } else {
        layout::FIELD_ALIGNMENT - rem
    }
}
