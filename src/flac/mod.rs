// FLAC metadata handling module

pub mod metadata;
pub mod picture;
pub mod vorbis;

use std::io::{BufRead, Cursor};

use tracing::debug;

use crate::config::ParseOptions;
use crate::error::{Error, Result};
use crate::model::{BuildMetadata, Metadata, StreamInfo};
use crate::utils::ByteReader;
use crate::AudioParser;

pub use metadata::{FlacMetadataBlockHeader, FlacMetadataBlockType, FlacStreamInfo, FLAC_SIGNATURE};
pub use picture::FlacPicture;
pub use vorbis::VorbisComment;

/// Parsed FLAC stream
#[derive(Debug)]
pub struct Flac {
    metadata: Metadata,
    stream_info: StreamInfo,
}

impl Flac {
    pub fn read<R: BufRead>(input: R) -> Result<Self> {
        Self::read_with_options(input, ParseOptions::default())
    }

    /// Walk metadata blocks up to and including the one flagged last. Nothing
    /// after that block is read.
    pub fn read_with_options<R: BufRead>(input: R, options: ParseOptions) -> Result<Self> {
        let mut reader = ByteReader::new(input);
        let signature = reader.read_array::<4>()?;
        if &signature != FLAC_SIGNATURE {
            return Err(Error::BadMagic {
                expected: "fLaC",
                found: signature.to_vec(),
            });
        }

        let mut comments = VorbisComment::default();
        let mut pictures = Vec::new();
        let mut stream_info = StreamInfo::default();
        loop {
            let header = FlacMetadataBlockHeader::read(&mut reader)?;
            debug!(block_type = ?header.block_type, length = header.length, is_last = header.is_last, "flac block");
            let length = header.length as usize;

            match header.block_type {
                FlacMetadataBlockType::StreamInfo if options.read_stream_info => {
                    let block = reader.read_bytes(length)?;
                    let info = FlacStreamInfo::read(&mut ByteReader::new(Cursor::new(&block[..])))?;
                    stream_info = info.to_stream_info();
                }
                FlacMetadataBlockType::VorbisComment => {
                    let block = reader.read_bytes(length)?;
                    let mut block_reader = ByteReader::new(Cursor::new(&block[..]));
                    comments.merge(VorbisComment::read(&mut block_reader, options.read_artwork)?);
                }
                FlacMetadataBlockType::Picture if options.read_artwork => {
                    let block = reader.read_bytes(length)?;
                    pictures.push(FlacPicture::read_from_data(&block)?.into_artwork());
                }
                _ => reader.skip(u64::from(header.length))?,
            }

            if header.is_last {
                break;
            }
        }

        comments.pictures.extend(pictures);
        Ok(Flac {
            metadata: comments.build(),
            stream_info,
        })
    }
}

impl AudioParser for Flac {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn stream_info(&self) -> &StreamInfo {
        &self.stream_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flac::metadata::encode_stream_info;
    use crate::flac::picture::encode_picture_block;
    use crate::flac::vorbis::encode_comment_block;
    use crate::model::ArtworkFormat;

    fn block(block_type: u8, is_last: bool, body: &[u8]) -> Vec<u8> {
        let mut data = vec![block_type | if is_last { 0x80 } else { 0 }];
        data.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn rejects_bad_signature() {
        assert!(matches!(
            Flac::read(Cursor::new(b"OggS\x00".to_vec())),
            Err(Error::BadMagic { .. })
        ));
    }

    #[test]
    fn reads_comments_pictures_and_stream_info() {
        let mut data = FLAC_SIGNATURE.to_vec();
        data.extend(block(0, false, &encode_stream_info(48_000, 2, 24, 96_000)));
        data.extend(block(6, false, &encode_picture_block("image/png", &[1, 2, 3])));
        data.extend(block(1, false, &[0u8; 8]));
        data.extend(block(4, true, &encode_comment_block(&["TITLE=Song", "GENRE=Jazz"])));

        let flac = Flac::read(Cursor::new(data)).unwrap();
        let metadata = flac.metadata();
        assert_eq!(metadata.title.as_deref(), Some("Song"));
        assert!(metadata.genres.contains("Jazz"));
        assert_eq!(metadata.artworks.len(), 1);
        assert_eq!(metadata.artworks[0].format, ArtworkFormat::Png);

        let stream = flac.stream_info();
        assert_eq!(stream.duration, Some(2_000));
        assert_eq!(stream.sample_rate, Some(48_000));
        assert_eq!(stream.bits_per_sample, Some(24));
    }

    #[test]
    fn options_skip_pictures_and_stream_info() {
        let mut data = FLAC_SIGNATURE.to_vec();
        data.extend(block(0, false, &encode_stream_info(44_100, 2, 16, 44_100)));
        data.extend(block(6, true, &encode_picture_block("image/png", &[1, 2, 3])));

        let options = ParseOptions::new().read_artwork(false).read_stream_info(false);
        let flac = Flac::read_with_options(Cursor::new(data), options).unwrap();
        assert!(flac.metadata().artworks.is_empty());
        assert_eq!(flac.stream_info(), &StreamInfo::default());
    }

    #[test]
    fn every_comment_block_is_merged() {
        let mut data = FLAC_SIGNATURE.to_vec();
        data.extend(block(4, false, &encode_comment_block(&["TITLE=First", "ARTIST=One"])));
        data.extend(block(4, true, &encode_comment_block(&["TITLE=Second", "ARTIST=Two", "ALBUM=Later"])));

        let flac = Flac::read(Cursor::new(data)).unwrap();
        let metadata = flac.metadata();
        assert_eq!(metadata.title.as_deref(), Some("First"));
        assert!(metadata.artists.contains("One") && metadata.artists.contains("Two"));
        assert_eq!(metadata.album.as_deref(), Some("Later"));
    }

    #[test]
    fn truncated_block_fails() {
        let mut data = FLAC_SIGNATURE.to_vec();
        data.extend(block(4, true, &encode_comment_block(&["TITLE=Song"])));
        data.truncate(data.len() - 4);
        assert!(Flac::read(Cursor::new(data)).unwrap_err().is_truncated());
    }
}
