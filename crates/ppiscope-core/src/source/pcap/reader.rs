use std::io::{Read, Seek, SeekFrom};

use pcap_parser::Linktype;

use super::error::PcapSourceError;
use super::layout;

/// Read the magic bytes and rewind the reader to the start.
///
/// # Errors
/// Returns `PcapSourceError::Io` when fewer than four bytes can be read or the
/// reader cannot be rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Fractional units per second announced by a classic PCAP header.
pub fn legacy_ts_units(nanosecond: bool) -> u64 {
    if nanosecond {
        layout::LEGACY_NANO_UNITS
    } else {
        layout::LEGACY_MICRO_UNITS
    }
}

pub fn legacy_ts_to_seconds(ts_sec: u32, ts_frac: u32, units: u64) -> f64 {
    f64::from(ts_sec) + f64::from(ts_frac) / units as f64
}

/// Units per second for a PCAPNG `if_tsresol` value.
///
/// Resolutions that do not fit in 64 bits fall back to microseconds.
pub fn tsresol_units(if_tsresol: u8) -> u64 {
    let exponent = u32::from(if_tsresol & !layout::PCAPNG_TSRESOL_BASE2);
    let units = if if_tsresol & layout::PCAPNG_TSRESOL_BASE2 != 0 {
        1u64.checked_shl(exponent)
    } else {
        10u64.checked_pow(exponent)
    };
    units
        .filter(|units| *units > 0)
        .unwrap_or(layout::LEGACY_MICRO_UNITS)
}

/// Link type and clock of one PCAPNG interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceInfo {
    pub linktype: Linktype,
    /// Timestamp units per second.
    pub ts_units: u64,
    /// Seconds added to every timestamp on this interface.
    pub ts_offset: f64,
}

impl InterfaceInfo {
    pub fn new(linktype: Linktype, if_tsresol: u8, ts_offset: f64) -> Self {
        Self {
            linktype,
            ts_units: tsresol_units(if_tsresol),
            ts_offset,
        }
    }

    pub fn ts_to_seconds(&self, ts_high: u32, ts_low: u32) -> f64 {
        let ts = (u64::from(ts_high) << 32) | u64::from(ts_low);
        let whole = (ts / self.ts_units) as f64;
        let frac = (ts % self.ts_units) as f64 / self.ts_units as f64;
        self.ts_offset + whole + frac
    }
}

impl Default for InterfaceInfo {
    /// Ethernet with microsecond timestamps, used for undescribed interfaces.
    fn default() -> Self {
        Self::new(Linktype::ETHERNET, layout::PCAPNG_DEFAULT_TSRESOL, 0.0)
    }
}

pub fn interface_for(interfaces: &[InterfaceInfo], if_id: u32) -> InterfaceInfo {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or_default()
}
