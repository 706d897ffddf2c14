/// Section header block type; also the first four bytes of a PCAPNG file.
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

pub const PCAP_READER_BUFFER_SIZE: usize = 64 * 1024;

/// Fractional timestamp units per second for classic PCAP files.
pub const LEGACY_MICRO_UNITS: u64 = 1_000_000;
pub const LEGACY_NANO_UNITS: u64 = 1_000_000_000;

/// `if_tsresol` when an interface omits the option (microseconds).
pub const PCAPNG_DEFAULT_TSRESOL: u8 = 6;
/// High bit of `if_tsresol`: the exponent is a power of two, not ten.
pub const PCAPNG_TSRESOL_BASE2: u8 = 0x80;
