// Vorbis header packets carried in Ogg

use std::io::Cursor;

use crate::error::Result;
use crate::flac::vorbis::VorbisComment;
use crate::model::{duration_ms, StreamInfo};
use crate::utils::ByteReader;

pub const IDENTIFICATION_HEADER: &[u8; 7] = b"\x01vorbis";
pub const COMMENT_HEADER: &[u8; 7] = b"\x03vorbis";

/// Fields of the identification header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VorbisIdentification {
    pub channels: u8,
    pub sample_rate: u32,
    pub bitrate_nominal: Option<u32>,
    pub bitrate_minimum: Option<u32>,
    pub bitrate_maximum: Option<u32>,
}

impl VorbisIdentification {
    /// Parse a complete identification packet, prefix included
    pub fn read(packet: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(Cursor::new(packet));
        // packet type, "vorbis", vorbis_version
        reader.skip(11)?;
        let channels = reader.read_u8()?;
        let sample_rate = reader.read_u32_le()?;
        // nominal, minimum, maximum at 16, 20, 24
        let bitrate_nominal = bitrate(reader.read_u32_le()?);
        let bitrate_minimum = bitrate(reader.read_u32_le()?);
        let bitrate_maximum = bitrate(reader.read_u32_le()?);

        Ok(VorbisIdentification {
            channels,
            sample_rate,
            bitrate_nominal,
            bitrate_minimum,
            bitrate_maximum,
        })
    }

    /// Stream info; `granule` is the last page's granule position when known
    pub fn to_stream_info(&self, granule: Option<u64>) -> StreamInfo {
        let rate = u64::from(self.sample_rate);
        StreamInfo {
            duration: granule.and_then(|samples| duration_ms(samples, rate)),
            bitrate: self.bitrate_nominal.map(u64::from),
            min_bitrate: self.bitrate_minimum.map(u64::from),
            max_bitrate: self.bitrate_maximum.map(u64::from),
            channels: Some(u32::from(self.channels)),
            sample_rate: Some(rate),
            samples: granule,
            codec: Some("Vorbis".to_string()),
            ..StreamInfo::default()
        }
    }
}

/// Bitrate fields are signed; zero or negative means unset
fn bitrate(raw: u32) -> Option<u32> {
    let value = raw as i32;
    (value > 0).then_some(value as u32)
}

/// Parse a complete comment packet, prefix included
pub fn read_comment_packet(packet: &[u8], read_artwork: bool) -> Result<VorbisComment> {
    let body = packet.get(COMMENT_HEADER.len()..).unwrap_or_default();
    VorbisComment::read(&mut ByteReader::new(Cursor::new(body)), read_artwork)
}

/// Encode an identification packet; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_identification(channels: u8, rate: u32, nominal: i32, min: i32, max: i32) -> Vec<u8> {
    let mut packet = IDENTIFICATION_HEADER.to_vec();
    packet.extend_from_slice(&0u32.to_le_bytes());
    packet.push(channels);
    packet.extend_from_slice(&rate.to_le_bytes());
    packet.extend_from_slice(&nominal.to_le_bytes());
    packet.extend_from_slice(&min.to_le_bytes());
    packet.extend_from_slice(&max.to_le_bytes());
    // blocksizes, framing bit
    packet.extend_from_slice(&[0xB8, 0x01]);
    packet
}
