use std::fs::File;
use std::path::Path;

use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader};

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{
    InterfaceInfo, interface_for, is_pcapng_magic, legacy_ts_to_seconds, legacy_ts_units,
    read_magic_and_rewind,
};

/// Reads frames from a PCAP or PCAPNG file, detected by magic number.
pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
        /// Fractional timestamp units per second, from the file header magic.
        ts_units: u64,
    },
    Ng {
        reader: PcapNGReader<File>,
        /// Interfaces of the current section, indexed by interface id.
        interfaces: Vec<InterfaceInfo>,
    },
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self {
            inner: create_reader(file)?,
        })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        let event = match &mut self.inner {
            PcapReader::Legacy {
                reader,
                linktype,
                ts_units,
            } => {
                next_event(reader, "pcap", |block| match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        *linktype = Some(header.network);
                        *ts_units = legacy_ts_units(header.is_nanosecond_precision());
                        None
                    }
                    PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                        ts: Some(legacy_ts_to_seconds(packet.ts_sec, packet.ts_usec, *ts_units)),
                        linktype: linktype.unwrap_or(Linktype::ETHERNET),
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })?
            }
            PcapReader::Ng { reader, interfaces } => {
                next_event(reader, "pcapng", |block| match block {
                    PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                        interfaces.clear();
                        None
                    }
                    PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                        interfaces.push(InterfaceInfo::new(
                            intf.linktype,
                            intf.if_tsresol,
                            intf.if_tsoffset as f64,
                        ));
                        None
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                        let interface = interface_for(interfaces, packet.if_id);
                        Some(PacketEvent {
                            ts: Some(interface.ts_to_seconds(packet.ts_high, packet.ts_low)),
                            linktype: interface.linktype,
                            data: packet.data.to_vec(),
                        })
                    }
                    PcapBlockOwned::NG(Block::SimplePacket(packet)) => Some(PacketEvent {
                        ts: None,
                        linktype: interface_for(interfaces, 0).linktype,
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })?
            }
        };
        Ok(event)
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut file)?;
    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcapng reader init", e))?;
        Ok(PcapReader::Ng {
            reader,
            interfaces: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcap reader init", e))?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: None,
            ts_units: legacy_ts_units(false),
        })
    }
}

/// Pull blocks until `on_block` yields a packet or the file ends.
fn next_event<R, F>(
    reader: &mut R,
    format: &'static str,
    mut on_block: F,
) -> Result<Option<PacketEvent>, PcapSourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let event = on_block(block);
                reader.consume(offset);
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader.refill().map_err(|e| PcapSourceError::pcap(format, e))?;
            }
            Err(e) => return Err(PcapSourceError::pcap(format, e)),
        }
    }
}
