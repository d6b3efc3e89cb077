// OGG Vorbis metadata support
//
// OGG File Structure:
// - OGG Page Header (27 bytes)
//   - Capture Pattern: "OggS" (4 bytes)
//   - Version: 0 (1 byte)
//   - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
//   - Granule Position (8 bytes)
//   - Bitstream Serial Number (4 bytes)
//   - Page Sequence Number (4 bytes)
//   - CRC Checksum (4 bytes)
//   - Number of Page Segments (1 byte)
//   - Segment Table (variable)
//
// Vorbis Structure:
// 1. Identification Header (first page)
// 2. Comment Header (second page) - Contains Vorbis Comment
// 3. Setup Header (third page)
// 4. Audio Data pages

pub mod page;
pub mod vorbis;

use std::collections::HashMap;
use std::io::BufRead;

use tracing::{debug, warn};

use crate::config::ParseOptions;
use crate::error::{Error, Result};
use crate::flac::vorbis::VorbisComment;
use crate::model::{BuildMetadata, Metadata, StreamInfo};
use crate::utils::ByteReader;
use crate::AudioParser;

pub use page::OggPageHeader;
pub use vorbis::VorbisIdentification;

// OGG signature
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";

// OGG page header types
pub(crate) const OGG_HEADER_TYPE_CONTINUATION: u8 = 0x01;
pub(crate) const OGG_HEADER_TYPE_BOS: u8 = 0x02; // Beginning of Stream
pub(crate) const OGG_HEADER_TYPE_EOS: u8 = 0x04; // End of Stream

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum StreamKind {
    /// First packet not seen yet
    #[default]
    Unknown,
    Vorbis,
    /// Another codec, or a chained Vorbis stream after the first one
    Ignored,
}

/// Per-serial reassembly state
#[derive(Debug, Default)]
struct LogicalStream {
    kind: StreamKind,
    /// Packet continuing onto the next page; empty when its bytes are not kept
    pending: Option<Vec<u8>>,
}

/// Parsed Ogg Vorbis stream
#[derive(Debug)]
pub struct Ogg {
    metadata: Metadata,
    stream_info: StreamInfo,
}

#[derive(Debug, Default)]
struct OggReader {
    options: ParseOptions,
    streams: HashMap<u32, LogicalStream>,
    vorbis_serial: Option<u32>,
    identification: Option<VorbisIdentification>,
    comment: Option<VorbisComment>,
    last_granule: Option<u64>,
    finished: bool,
}

impl Ogg {
    pub fn read<R: BufRead>(input: R) -> Result<Self> {
        Self::read_with_options(input, ParseOptions::default())
    }

    /// Read pages until the Vorbis stream's last page (or the end of input,
    /// or the comment header when stream info is not wanted). Duration is only
    /// known when the last page is reached.
    pub fn read_with_options<R: BufRead>(input: R, options: ParseOptions) -> Result<Self> {
        let mut reader = ByteReader::new(input);
        let mut state = OggReader {
            options,
            ..OggReader::default()
        };

        if reader.is_exhausted()? {
            return Err(Error::truncated(27, 0));
        }
        while !state.finished && !reader.is_exhausted()? {
            let header = OggPageHeader::read(&mut reader)?;
            state.read_page(&mut reader, &header)?;
        }

        if state.vorbis_serial.is_none() {
            warn!("no vorbis stream found");
        }
        let stream_info = match (&state.identification, options.read_stream_info) {
            (Some(identification), true) => identification.to_stream_info(state.last_granule),
            _ => StreamInfo::default(),
        };
        Ok(Ogg {
            metadata: state.comment.unwrap_or_default().build(),
            stream_info,
        })
    }
}

impl OggReader {
    fn read_page<R: BufRead>(&mut self, reader: &mut ByteReader<R>, header: &OggPageHeader) -> Result<()> {
        let serial = header.bitstream_serial;
        if !self.streams.contains_key(&serial) && !header.is_bos() {
            debug!(serial, "first page of a stream without the BOS flag");
        }
        let keep_data = self.wants_packets(serial);
        let stream = self.streams.entry(serial).or_default();

        let mut packet = match (stream.pending.take(), header.is_continuation()) {
            (Some(pending), true) => pending,
            (None, false) => Vec::new(),
            (None, true) => {
                return Err(Error::protocol(format!(
                    "page {} of stream {} continues a packet that already ended",
                    header.page_sequence, serial
                )))
            }
            (Some(_), false) => {
                return Err(Error::protocol(format!(
                    "page {} of stream {} starts a new packet while one is unfinished",
                    header.page_sequence, serial
                )))
            }
        };

        let mut completed = Vec::new();
        let mut open = header.is_continuation();
        if keep_data {
            for &length in &header.segment_table {
                packet.extend(reader.read_bytes(usize::from(length))?);
                open = true;
                if length < 255 {
                    completed.push(std::mem::take(&mut packet));
                    open = false;
                }
            }
        } else {
            reader.skip(header.data_size())?;
            if let Some(&length) = header.segment_table.last() {
                open = length == 255;
            }
        }

        if open {
            if header.is_eos() {
                if keep_data {
                    completed.push(packet);
                }
            } else {
                stream.pending = Some(packet);
            }
        }

        for packet in completed {
            self.read_packet(serial, &packet)?;
        }

        if self.vorbis_serial == Some(serial) && header.is_eos() {
            // duration comes only from the stream's last page
            self.last_granule = header.granule();
            debug!(serial, granule = ?self.last_granule, "end of vorbis stream");
            self.finished = true;
        }
        Ok(())
    }

    /// Packet bytes are only kept while a stream is unclassified or its
    /// comment header is still outstanding
    fn wants_packets(&self, serial: u32) -> bool {
        match self.streams.get(&serial).map(|stream| stream.kind) {
            None | Some(StreamKind::Unknown) => true,
            Some(StreamKind::Vorbis) => self.comment.is_none(),
            Some(StreamKind::Ignored) => false,
        }
    }

    fn read_packet(&mut self, serial: u32, packet: &[u8]) -> Result<()> {
        let kind = self.streams.get(&serial).map(|stream| stream.kind).unwrap_or_default();
        match kind {
            StreamKind::Unknown => {
                let is_vorbis = packet.starts_with(vorbis::IDENTIFICATION_HEADER);
                let kind = if is_vorbis && self.vorbis_serial.is_none() {
                    self.identification = Some(VorbisIdentification::read(packet)?);
                    self.vorbis_serial = Some(serial);
                    debug!(serial, identification = ?self.identification, "vorbis stream");
                    StreamKind::Vorbis
                } else {
                    debug!(serial, "ignoring logical stream");
                    StreamKind::Ignored
                };
                if let Some(stream) = self.streams.get_mut(&serial) {
                    stream.kind = kind;
                }
            }
            StreamKind::Vorbis if self.comment.is_none() && packet.starts_with(vorbis::COMMENT_HEADER) => {
                self.comment = Some(vorbis::read_comment_packet(packet, self.options.read_artwork)?);
                if !self.options.read_stream_info {
                    self.finished = true;
                }
            }
            StreamKind::Vorbis | StreamKind::Ignored => {}
        }
        Ok(())
    }
}

impl AudioParser for Ogg {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn stream_info(&self) -> &StreamInfo {
        &self.stream_info
    }
}
