// ID3v2 tag implementation

use std::io::BufRead;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::utils::bytes::bit_set;
use crate::utils::ByteReader;

/// Major versions this reader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id3v2Version {
    V2,
    V3,
    V4,
}

/// ID3v2 header structure
#[derive(Debug)]
pub struct Id3v2Header {
    pub version: Id3v2Version,
    /// Declared tag size, excluding the 10-byte header
    pub size: u32,
    /// Parsed but not applied to frame data
    pub unsynchronisation: bool,
    /// Bytes of the tag body already consumed by the extended header
    pub offset: u64,
}

impl Id3v2Header {
    const ID: [u8; 3] = *b"ID3";

    /// Read ID3v2 header from reader
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        let marker = reader.read_array::<3>()?;
        if marker != Self::ID {
            return Err(Error::BadMagic {
                expected: "ID3",
                found: marker.to_vec(),
            });
        }

        let raw_version = reader.read_u8()?;
        let version = match raw_version {
            2 => Id3v2Version::V2,
            3 => Id3v2Version::V3,
            4 => Id3v2Version::V4,
            _ => {
                return Err(Error::UnsupportedVersion {
                    container: "ID3v2",
                    version: raw_version,
                })
            }
        };
        // revision
        reader.skip(1)?;
        let flags = reader.read_u8()?;
        let unsynchronisation = bit_set(flags, 7);
        let extended_header = bit_set(flags, 6);
        let size = reader.read_syncsafe_u32()?;

        let mut offset = 0u64;
        if extended_header && version != Id3v2Version::V2 {
            // v3 sizes exclude the 4-byte size field, v4 sizes include it
            let extended_size = match version {
                Id3v2Version::V4 => u64::from(reader.read_syncsafe_u32()?).saturating_sub(4),
                _ => u64::from(reader.read_u32_be()?),
            };
            reader.skip(extended_size)?;
            offset += 4 + extended_size;
        }

        debug!(?version, size, unsynchronisation, extended_header, "read ID3v2 header");
        Ok(Id3v2Header {
            version,
            size,
            unsynchronisation,
            offset,
        })
    }
}

/// Name and declared payload size of one frame
#[derive(Debug)]
struct FrameHeader {
    name: String,
    size: u32,
    header_size: u32,
}

impl FrameHeader {
    fn read<R: BufRead>(reader: &mut ByteReader<R>, version: Id3v2Version) -> Result<Self> {
        match version {
            Id3v2Version::V2 => Ok(FrameHeader {
                name: reader.read_string(3)?,
                size: reader.read_uint(3, 8)? as u32,
                header_size: 6,
            }),
            Id3v2Version::V3 => Ok(FrameHeader {
                name: reader.read_string(4)?,
                size: reader.read_u32_be()?,
                header_size: 8,
            }),
            Id3v2Version::V4 => Ok(FrameHeader {
                name: reader.read_string(4)?,
                size: reader.read_syncsafe_u32()?,
                header_size: 8,
            }),
        }
    }
}

/// Format flags from the second flag byte of a v3/v4 frame header
#[derive(Debug, Default)]
struct FrameFlags {
    compression: bool,
    encryption: bool,
    unsynchronisation: bool,
    data_length_indicator: bool,
}

impl FrameFlags {
    const SIZE: u32 = 2;

    fn read<R: BufRead>(reader: &mut ByteReader<R>, version: Id3v2Version) -> Result<Option<Self>> {
        if version == Id3v2Version::V2 {
            return Ok(None);
        }
        // status flags
        reader.skip(1)?;
        let format = reader.read_u8()?;
        let flags = match version {
            Id3v2Version::V3 => FrameFlags {
                compression: bit_set(format, 7),
                encryption: bit_set(format, 6),
                ..FrameFlags::default()
            },
            _ => FrameFlags {
                compression: bit_set(format, 3),
                encryption: bit_set(format, 2),
                unsynchronisation: bit_set(format, 1),
                data_length_indicator: bit_set(format, 0),
            },
        };
        Ok(Some(flags))
    }
}

/// ID3v2 frame structure
#[derive(Debug)]
pub struct Id3Frame {
    pub frame_id: String,
    pub data: Vec<u8>,
}

impl Id3Frame {
    /// Frames whose payload is decoded; everything else is skipped unread
    fn is_wanted(name: &str) -> bool {
        name.starts_with('T')
            || name.starts_with('W')
            || matches!(name, "COMM" | "COM" | "USLT" | "ULT" | "APIC" | "PIC")
    }
}

/// ID3v2 tag structure
#[derive(Debug)]
pub struct Id3v2Tag {
    pub header: Id3v2Header,
    pub frames: Vec<Id3Frame>,
}

impl Id3v2Tag {
    /// Read the header and walk frames while a whole frame header still fits
    /// in the declared tag size. A zero-size frame (padding) ends the walk.
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        let header = Id3v2Header::read(reader)?;
        let mut frames = Vec::new();
        let mut offset = header.offset;
        let frame_header_size = match header.version {
            Id3v2Version::V2 => 6,
            _ => 10,
        };

        while offset + frame_header_size <= u64::from(header.size) {
            let frame_header = FrameHeader::read(reader, header.version)?;
            let flags = FrameFlags::read(reader, header.version)?;
            let mut size = frame_header.size;
            if size == 0 {
                warn!(frame = %frame_header.name.escape_debug(), offset, "zero-size frame ends the tag");
                break;
            }
            offset += u64::from(frame_header.header_size) + u64::from(size);
            if flags.is_some() {
                offset += u64::from(FrameFlags::SIZE);
            }

            if let Some(flags) = &flags {
                if flags.compression {
                    match header.version {
                        Id3v2Version::V3 => {
                            reader.skip(4)?;
                            size = shrink(size, 4, &frame_header.name)?;
                        }
                        Id3v2Version::V4 => size = reader.read_syncsafe_u32()?,
                        Id3v2Version::V2 => {}
                    }
                } else if flags.data_length_indicator {
                    reader.skip(4)?;
                    size = shrink(size, 4, &frame_header.name)?;
                }
                if flags.encryption {
                    reader.skip(1)?;
                    size = shrink(size, 1, &frame_header.name)?;
                }
                if flags.unsynchronisation {
                    debug!(frame = %frame_header.name, "frame unsynchronisation flag not applied");
                }
            }

            if Id3Frame::is_wanted(&frame_header.name) {
                let data = reader.read_bytes(size as usize)?;
                frames.push(Id3Frame {
                    frame_id: frame_header.name,
                    data,
                });
            } else {
                debug!(frame = %frame_header.name.escape_debug(), size, "skipping frame");
                reader.skip(u64::from(size))?;
            }
        }

        Ok(Id3v2Tag { header, frames })
    }
}

fn shrink(size: u32, by: u32, name: &str) -> Result<u32> {
    size.checked_sub(by)
        .ok_or_else(|| Error::protocol(format!("frame {} too small for its flags", name.escape_debug())))
}

/// Encode a tag header in front of `body`; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_tag(version: u8, flags: u8, body: &[u8]) -> Vec<u8> {
    let size = body.len() as u32;
    let mut data = b"ID3".to_vec();
    data.extend_from_slice(&[version, 0, flags]);
    data.extend_from_slice(&[
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]);
    data.extend_from_slice(body);
    data
}
