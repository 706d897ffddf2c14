//! PPI wire layout. All multi-byte integers are little-endian.

pub const VERSION_OFFSET: usize = 0;
pub const FLAGS_OFFSET: usize = 1;
pub const LENGTH_RANGE: std::ops::Range<usize> = 2..4;
pub const DLT_RANGE: std::ops::Range<usize> = 4..8;

/// Size of the fixed header (version, flags, length, DLT).
pub const FIXED_HEADER_LEN: usize = 8;

/// Header format version currently defined.
pub const PPI_VERSION: u8 = 0;

/// Flags bit 0: TLV fields are padded to 32-bit boundaries.
pub const FLAG_ALIGN_32: u8 = 0x01;

/// Field header: type (u16) + data length (u16).
pub const FIELD_HEADER_LEN: usize = 4;
pub const FIELD_ALIGNMENT: usize = 4;

pub const FIELD_80211_COMMON: u16 = 2;
pub const FIELD_80211N_MAC: u16 = 3;
pub const FIELD_80211N_MAC_PHY: u16 = 4;
pub const FIELD_SPECTRUM_MAP: u16 = 5;
pub const FIELD_PROCESS_INFO: u16 = 6;
pub const FIELD_CAPTURE_INFO: u16 = 7;
pub const FIELD_AGGREGATION: u16 = 8;
pub const FIELD_8023: u16 = 9;
pub const FIELD_GPS: u16 = 30002;

pub const DOT11_COMMON_LEN: usize = 20;
pub const AGGREGATION_LEN: usize = 4;
pub const DOT3_LEN: usize = 8;
