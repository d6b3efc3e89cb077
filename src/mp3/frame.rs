// MPEG audio frame header and VBR info headers

use std::io::BufRead;

use crate::error::Result;
use crate::model::{duration_ms, StreamInfo};
use crate::utils::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

impl MpegVersion {
    fn name(self) -> &'static str {
        match self {
            MpegVersion::Mpeg1 => "MPEG-1",
            MpegVersion::Mpeg2 => "MPEG-2",
            MpegVersion::Mpeg25 => "MPEG-2.5",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

impl Layer {
    fn name(self) -> &'static str {
        match self {
            Layer::Layer1 => "Layer I",
            Layer::Layer2 => "Layer II",
            Layer::Layer3 => "Layer III",
        }
    }
}

// kbps, indexed by bitrate index
const MPEG1_BITRATES: [[u32; 16]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
];
const MPEG2_BITRATES: [[u32; 16]; 3] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
];

const MPEG1_SAMPLE_RATES: [u32; 3] = [44_100, 48_000, 32_000];
const MPEG2_SAMPLE_RATES: [u32; 3] = [22_050, 24_000, 16_000];
const MPEG25_SAMPLE_RATES: [u32; 3] = [11_025, 12_000, 8_000];

const SINGLE_CHANNEL: u8 = 3;

/// Decoded 4-byte frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    pub protected: bool,
    /// bits per second
    pub bitrate: u32,
    pub sample_rate: u32,
    pub channel_mode: u8,
}

impl FrameHeader {
    /// Decode a big-endian header word; `None` unless the sync bits are set
    /// and every index is valid
    pub fn parse(word: u32) -> Option<Self> {
        if word >> 21 != 0x7FF {
            return None;
        }
        let version = match (word >> 19) & 0b11 {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => return None,
        };
        let layer = match (word >> 17) & 0b11 {
            1 => Layer::Layer3,
            2 => Layer::Layer2,
            3 => Layer::Layer1,
            _ => return None,
        };
        let protected = (word >> 16) & 1 == 0;
        let bitrate_index = ((word >> 12) & 0xF) as usize;
        let sample_rate_index = ((word >> 10) & 0b11) as usize;
        let channel_mode = ((word >> 6) & 0b11) as u8;

        let layer_index = match layer {
            Layer::Layer1 => 0,
            Layer::Layer2 => 1,
            Layer::Layer3 => 2,
        };
        let bitrates = match version {
            MpegVersion::Mpeg1 => &MPEG1_BITRATES,
            MpegVersion::Mpeg2 | MpegVersion::Mpeg25 => &MPEG2_BITRATES,
        };
        let sample_rates = match version {
            MpegVersion::Mpeg1 => &MPEG1_SAMPLE_RATES,
            MpegVersion::Mpeg2 => &MPEG2_SAMPLE_RATES,
            MpegVersion::Mpeg25 => &MPEG25_SAMPLE_RATES,
        };
        // free-format and reserved indices cannot be measured
        let bitrate = bitrates[layer_index][bitrate_index];
        let sample_rate = *sample_rates.get(sample_rate_index)?;
        if bitrate == 0 {
            return None;
        }

        Some(FrameHeader {
            version,
            layer,
            protected,
            bitrate: bitrate * 1000,
            sample_rate,
            channel_mode,
        })
    }

    pub fn channels(&self) -> u32 {
        if self.channel_mode == SINGLE_CHANNEL {
            1
        } else {
            2
        }
    }

    pub fn samples_per_frame(&self) -> u64 {
        match (self.layer, self.version) {
            (Layer::Layer1, _) => 384,
            (Layer::Layer2, _) => 1152,
            (Layer::Layer3, MpegVersion::Mpeg1) => 1152,
            (Layer::Layer3, _) => 576,
        }
    }

    /// Layer III side information length
    fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode == SINGLE_CHANNEL) {
            (MpegVersion::Mpeg1, false) => 32,
            (MpegVersion::Mpeg1, true) => 17,
            (_, false) => 17,
            (_, true) => 9,
        }
    }

    pub fn codec(&self) -> String {
        format!("{} {}", self.version.name(), self.layer.name())
    }
}

/// Frame and byte counts from a `Xing`/`Info` or `VBRI` header
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VbrInfo {
    pub frames: Option<u32>,
    pub bytes: Option<u32>,
}

impl VbrInfo {
    const XING_FRAMES: u32 = 0x1;
    const XING_BYTES: u32 = 0x2;
    const VBRI_OFFSET: usize = 32;

    /// Inspect the bytes that follow the 4-byte frame header
    pub fn parse(header: &FrameHeader, window: &[u8]) -> Self {
        let mut xing = if header.protected { 2 } else { 0 };
        if header.layer == Layer::Layer3 {
            xing += header.side_info_len();
        }

        match window.get(xing..xing + 4) {
            Some(b"Xing") | Some(b"Info") => {
                let flags = be_u32(window, xing + 4).unwrap_or(0);
                let mut offset = xing + 8;
                let mut info = VbrInfo::default();
                if flags & Self::XING_FRAMES != 0 {
                    info.frames = be_u32(window, offset);
                    offset += 4;
                }
                if flags & Self::XING_BYTES != 0 {
                    info.bytes = be_u32(window, offset);
                }
                return info;
            }
            _ => {}
        }

        let vbri = Self::VBRI_OFFSET;
        if window.get(vbri..vbri + 4) == Some(b"VBRI") {
            // version, delay, quality
            return VbrInfo {
                bytes: be_u32(window, vbri + 10),
                frames: be_u32(window, vbri + 14),
            };
        }
        VbrInfo::default()
    }
}

fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Scan for the first valid frame header and derive stream info from it.
/// Running out of input before a frame is found yields `None`.
pub fn read_stream_info<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Option<StreamInfo>> {
    let mut word = 0u32;
    let mut seen = 0usize;
    let header = loop {
        let byte = match reader.read_u8() {
            Ok(byte) => byte,
            Err(e) if e.is_truncated() => return Ok(None),
            Err(e) => return Err(e),
        };
        word = (word << 8) | u32::from(byte);
        seen += 1;
        if seen >= 4 {
            if let Some(header) = FrameHeader::parse(word) {
                break header;
            }
        }
    };

    let window = reader.read_at_most(64)?;
    let vbr = VbrInfo::parse(&header, &window);
    let rate = u64::from(header.sample_rate);
    let samples = vbr
        .frames
        .map(|frames| u64::from(frames) * header.samples_per_frame());
    let duration = samples.and_then(|samples| duration_ms(samples, rate));
    // average over the whole stream when the VBR header carries a byte count
    let bitrate = match (vbr.bytes, samples) {
        (Some(bytes), Some(samples)) if bytes > 0 && samples > 0 => {
            u64::from(bytes) * 8 * rate / samples
        }
        _ => u64::from(header.bitrate),
    };

    Ok(Some(StreamInfo {
        duration,
        bitrate: Some(bitrate),
        channels: Some(header.channels()),
        sample_rate: Some(rate),
        samples,
        codec: Some(header.codec()),
        ..StreamInfo::default()
    }))
}
