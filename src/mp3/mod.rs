// MP3 format support
//
// Metadata comes from the leading ID3v2 tag. Stream info is best effort: the
// first MPEG frame after the tag, plus a Xing/Info or VBRI header if present.

pub mod frame;

use std::io::BufRead;

use tracing::debug;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::id3::{Id3Metadata, Id3v2Tag};
use crate::model::{BuildMetadata, Metadata, StreamInfo};
use crate::utils::ByteReader;
use crate::AudioParser;

pub use frame::{FrameHeader, Layer, MpegVersion, VbrInfo};

const TAG_HEADER_SIZE: u64 = 10;

/// Parsed MP3 file
#[derive(Debug)]
pub struct Mp3 {
    metadata: Metadata,
    stream_info: StreamInfo,
}

impl Mp3 {
    pub fn read<R: BufRead>(input: R) -> Result<Self> {
        Self::read_with_options(input, ParseOptions::default())
    }

    pub fn read_with_options<R: BufRead>(input: R, options: ParseOptions) -> Result<Self> {
        let mut reader = ByteReader::new(input);
        let tag = Id3v2Tag::read(&mut reader)?;
        debug!(version = ?tag.header.version, size = tag.header.size, frames = tag.frames.len(), "id3v2 tag");
        let metadata = Id3Metadata::from_tag(&tag, options.read_artwork).build();

        let stream_info = if options.read_stream_info {
            Self::read_stream_info(&mut reader, &tag)?
        } else {
            StreamInfo::default()
        };

        Ok(Mp3 {
            metadata,
            stream_info,
        })
    }

    fn read_stream_info<R: BufRead>(reader: &mut ByteReader<R>, tag: &Id3v2Tag) -> Result<StreamInfo> {
        // padding the frame walk stopped at
        let tag_end = TAG_HEADER_SIZE + u64::from(tag.header.size);
        let rest = tag_end.saturating_sub(reader.position());
        match reader.skip(rest) {
            Ok(()) => {}
            Err(e) if e.is_truncated() => return Ok(StreamInfo::default()),
            Err(e) => return Err(e),
        }

        let info = frame::read_stream_info(reader)?;
        if info.is_none() {
            debug!("no mpeg frame after the tag");
        }
        Ok(info.unwrap_or_default())
    }
}

impl AudioParser for Mp3 {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn stream_info(&self) -> &StreamInfo {
        &self.stream_info
    }
}
