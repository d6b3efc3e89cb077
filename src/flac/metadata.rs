// FLAC metadata block implementation

use std::io::BufRead;

use crate::error::Result;
use crate::model::{duration_ms, StreamInfo};
use crate::utils::ByteReader;

/// FLAC metadata block types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlacMetadataBlockType {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    Reserved(u8),
}

impl FlacMetadataBlockType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => FlacMetadataBlockType::StreamInfo,
            1 => FlacMetadataBlockType::Padding,
            2 => FlacMetadataBlockType::Application,
            3 => FlacMetadataBlockType::SeekTable,
            4 => FlacMetadataBlockType::VorbisComment,
            5 => FlacMetadataBlockType::CueSheet,
            6 => FlacMetadataBlockType::Picture,
            other => FlacMetadataBlockType::Reserved(other),
        }
    }
}

/// FLAC metadata block header
#[derive(Debug)]
pub struct FlacMetadataBlockHeader {
    pub is_last: bool,
    pub block_type: FlacMetadataBlockType,
    pub length: u32,
}

impl FlacMetadataBlockHeader {
    /// Read FLAC metadata block header from reader
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        let flags = reader.read_u8()?;
        let is_last = (flags & 0x80) != 0;
        let block_type = FlacMetadataBlockType::from_byte(flags & 0x7F);
        // Length is big-endian 24-bit
        let length = reader.read_uint(3, 8)? as u32;

        Ok(FlacMetadataBlockHeader {
            is_last,
            block_type,
            length,
        })
    }
}

/// STREAMINFO block contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlacStreamInfo {
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub total_samples: u64,
}

impl FlacStreamInfo {
    /// Read a STREAMINFO block body
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        // min/max block size, min/max frame size
        reader.skip(10)?;
        // 20-bit rate | 3-bit channels-1 | 5-bit bps-1 | 36-bit samples
        let packed = reader.read_u64_be()?;
        // MD5 of the unencoded audio
        reader.skip(16)?;

        Ok(FlacStreamInfo {
            sample_rate: (packed >> 44) as u32,
            channels: ((packed >> 41) & 0x07) as u8 + 1,
            bits_per_sample: ((packed >> 36) & 0x1F) as u8 + 1,
            total_samples: packed & 0x0F_FFFF_FFFF,
        })
    }

    pub fn to_stream_info(&self) -> StreamInfo {
        let rate = u64::from(self.sample_rate);
        StreamInfo {
            duration: duration_ms(self.total_samples, rate),
            bitrate: Some(rate * u64::from(self.bits_per_sample) * u64::from(self.channels)),
            channels: Some(u32::from(self.channels)),
            bits_per_sample: Some(u32::from(self.bits_per_sample)),
            sample_rate: Some(rate),
            samples: Some(self.total_samples),
            codec: Some("FLAC".to_string()),
            ..StreamInfo::default()
        }
    }
}

/// FLAC file signature
pub const FLAC_SIGNATURE: &[u8; 4] = b"fLaC";

/// Encode a STREAMINFO body; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_stream_info(rate: u32, channels: u8, bits: u8, samples: u64) -> Vec<u8> {
    let mut body = vec![0x10, 0x00, 0x10, 0x00, 0, 0, 0x0E, 0, 0x30, 0x00];
    let packed = (u64::from(rate) << 44)
        | (u64::from(channels - 1) << 41)
        | (u64::from(bits - 1) << 36)
        | (samples & 0x0F_FFFF_FFFF);
    body.extend_from_slice(&packed.to_be_bytes());
    body.extend_from_slice(&[0u8; 16]);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn block_header_flags_and_length() {
        let mut reader = ByteReader::new(Cursor::new(&[0x84, 0x00, 0x01, 0x02][..]));
        let header = FlacMetadataBlockHeader::read(&mut reader).unwrap();
        assert!(header.is_last);
        assert_eq!(header.block_type, FlacMetadataBlockType::VorbisComment);
        assert_eq!(header.length, 258);
    }

    #[test]
    fn stream_info_bit_fields() {
        let body = encode_stream_info(44_100, 2, 16, 441_000);
        assert_eq!(body.len(), 34);
        let mut reader = ByteReader::new(Cursor::new(&body[..]));
        let info = FlacStreamInfo::read(&mut reader).unwrap();
        assert_eq!(info.sample_rate, 44_100);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.total_samples, 441_000);

        let stream = info.to_stream_info();
        assert_eq!(stream.duration, Some(10_000));
        assert_eq!(stream.bitrate, Some(1_411_200));
        assert_eq!(stream.codec.as_deref(), Some("FLAC"));
    }

    #[test]
    fn zero_rate_has_no_duration() {
        let body = encode_stream_info(0, 1, 8, 100);
        let info = FlacStreamInfo::read(&mut ByteReader::new(Cursor::new(&body[..]))).unwrap();
        assert_eq!(info.to_stream_info().duration, None);
    }
}
