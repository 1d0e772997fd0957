use super::{CaptureError, CaptureSession, Frame, FrameMeta};
use ::pcap::{BpfProgram, Capture, Linktype as PcapLinktype};
use pcap_parser::pcapng::EnhancedPacketBlock;
use pcap_parser::traits::{PcapNGPacketBlock, PcapReaderIterator};
use pcap_parser::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const READER_BUFFER_SIZE: usize = 65536;
const MAX_READER_BUFFER_SIZE: usize = 16 * 1024 * 1024;

struct InterfaceDescription {
    linktype: Linktype,
    ts_resolution: u8,
    ts_offset: i64,
}

/// Replays the Ethernet frames of a pcap or pcapng file.
///
/// The installed filter is compiled against a dead Ethernet handle and run in
/// user space, so a file behaves like a live interface with the same filter.
/// Frames of other link types are skipped. A file that ends mid-record or
/// holds a corrupt block ends the replay; every read after that reports
/// [`CaptureError::EndOfCapture`].
pub struct ReplaySession {
    path: PathBuf,
    reader: Box<dyn PcapReaderIterator + Send>,
    interfaces: Vec<InterfaceDescription>,
    legacy_linktype: Option<Linktype>,
    legacy_nanos: bool,
    program: Option<BpfProgram>,
    buffer: Vec<u8>,
    meta: FrameMeta,
    blocks: usize,
    buffer_size: usize,
    finished: bool,
}

impl ReplaySession {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let file = File::open(path).map_err(|source| CaptureError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = create_reader(READER_BUFFER_SIZE, file)
            .map_err(|e| CaptureError::Replay(format!("failed to create reader: {e:?}")))?;
        info!(path = ?path, "Opened capture file for replay");

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            interfaces: Vec::new(),
            legacy_linktype: None,
            legacy_nanos: false,
            program: None,
            buffer: Vec::with_capacity(2048),
            meta: FrameMeta::default(),
            blocks: 0,
            buffer_size: READER_BUFFER_SIZE,
            finished: false,
        })
    }

    /// Pulls blocks until one carries an Ethernet frame, copying it into the
    /// reusable buffer. Returns `Ok(false)` at end of file.
    fn next_ethernet_frame(&mut self) -> Result<bool, CaptureError> {
        if self.finished {
            return Ok(false);
        }
        let result = self.pull_ethernet_frame();
        if !matches!(result, Ok(true)) {
            self.finished = true;
        }
        result
    }

    fn pull_ethernet_frame(&mut self) -> Result<bool, CaptureError> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    self.blocks += 1;
                    let found = match block {
                        PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                            debug!("Encountered SectionHeader; clearing interface descriptions");
                            self.interfaces.clear();
                            false
                        }
                        PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                            self.interfaces.push(InterfaceDescription {
                                linktype: idb.linktype,
                                ts_resolution: idb.if_tsresol,
                                ts_offset: idb.if_tsoffset,
                            });
                            debug!(
                                if_id = self.interfaces.len() - 1,
                                linktype = ?idb.linktype,
                                "Registered interface description"
                            );
                            false
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(ref epb)) => {
                            copy_enhanced_packet(
                                epb,
                                &self.interfaces,
                                &mut self.buffer,
                                &mut self.meta,
                            )
                        }
                        PcapBlockOwned::LegacyHeader(header) => {
                            debug!(linktype = ?header.network, "Read legacy pcap header");
                            self.legacy_linktype = Some(header.network);
                            self.legacy_nanos = header.is_nanosecond_precision();
                            false
                        }
                        PcapBlockOwned::Legacy(packet) => {
                            if self.legacy_linktype == Some(Linktype::ETHERNET) {
                                let fraction = if self.legacy_nanos { 1e9 } else { 1e6 };
                                self.buffer.clear();
                                self.buffer.extend_from_slice(packet.data);
                                self.meta = FrameMeta {
                                    timestamp: packet.ts_sec as f64
                                        + packet.ts_usec as f64 / fraction,
                                    captured_len: packet.caplen,
                                    original_len: packet.origlen,
                                };
                                true
                            } else {
                                false
                            }
                        }
                        PcapBlockOwned::NG(Block::SimplePacket(_)) => {
                            debug!("Unsupported block type: SimplePacket");
                            false
                        }
                        PcapBlockOwned::NG(_) => {
                            debug!("Skipping non-packet pcapng block");
                            false
                        }
                    };
                    self.reader.consume(offset);
                    if found {
                        return Ok(true);
                    }
                }
                Err(PcapError::Eof) => {
                    info!(path = ?self.path, blocks = self.blocks, "Reached end of capture file");
                    return Ok(false);
                }
                Err(PcapError::UnexpectedEof) => {
                    warn!(path = ?self.path, blocks = self.blocks, "Capture file ends mid-record");
                    return Ok(false);
                }
                Err(PcapError::Incomplete(_)) => {
                    self.reader
                        .refill()
                        .map_err(|e| CaptureError::Replay(format!("failed to refill reader: {e:?}")))?;
                }
                Err(PcapError::BufferTooSmall) => {
                    let size = self.buffer_size * 2;
                    if size > MAX_READER_BUFFER_SIZE || !self.reader.grow(size) {
                        return Err(CaptureError::Replay(format!(
                            "block larger than {} bytes after {} blocks",
                            self.buffer_size, self.blocks
                        )));
                    }
                    debug!(size, "Grew capture reader buffer");
                    self.buffer_size = size;
                }
                Err(e) => {
                    return Err(CaptureError::Replay(format!(
                        "corrupt block after {} blocks: {e:?}",
                        self.blocks
                    )));
                }
            }
        }
    }
}

fn calculate_ts_unit(resolution: u8) -> u64 {
    if resolution & 0x80 != 0 {
        2u64.pow((resolution & 0x7F) as u32)
    } else {
        10u64.pow(resolution as u32)
    }
}

fn copy_enhanced_packet(
    epb: &EnhancedPacketBlock,
    interfaces: &[InterfaceDescription],
    buffer: &mut Vec<u8>,
    meta: &mut FrameMeta,
) -> bool {
    let Some(interface) = interfaces.get(epb.if_id as usize) else {
        warn!(if_id = epb.if_id, "EPB references unknown interface; skipping packet");
        return false;
    };
    if interface.linktype != Linktype::ETHERNET {
        return false;
    }

    let unit = calculate_ts_unit(interface.ts_resolution);
    buffer.clear();
    buffer.extend_from_slice(epb.packet_data());
    *meta = FrameMeta {
        timestamp: epb.decode_ts_f64(interface.ts_offset as u64, unit),
        captured_len: epb.caplen,
        original_len: epb.origlen,
    };
    true
}

impl CaptureSession for ReplaySession {
    fn install_filter(&mut self, expression: &str) -> Result<(), CaptureError> {
        let program = Capture::dead(PcapLinktype::ETHERNET)?.compile(expression, true)?;
        debug!(filter = expression, path = ?self.path, "Compiled BPF filter for replay");
        self.program = Some(program);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame<'_>, CaptureError> {
        loop {
            if !self.next_ethernet_frame()? {
                return Err(CaptureError::EndOfCapture);
            }
            let passes = self
                .program
                .as_ref()
                .is_none_or(|program| program.filter(&self.buffer));
            if passes {
                return Ok(Frame {
                    data: &self.buffer,
                    meta: self.meta,
                });
            }
        }
    }
}
