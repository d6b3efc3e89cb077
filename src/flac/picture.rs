// FLAC PICTURE block implementation
//
// The same layout is carried base64-encoded in Vorbis comments under
// `metadata_block_picture`.

use std::io::{BufRead, Cursor};

use tracing::debug;

use crate::error::Result;
use crate::model::{Artwork, ArtworkFormat};
use crate::utils::ByteReader;

/// FLAC PICTURE block structure
#[derive(Debug)]
pub struct FlacPicture {
    pub picture_type: u32,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl FlacPicture {
    /// Read a PICTURE block. Description, dimensions, depth and palette size
    /// are skipped.
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        let picture_type = reader.read_u32_be()?;
        let mime_length = reader.read_u32_be()?;
        let mime_type = reader.read_string(mime_length as usize)?;
        let description_length = reader.read_u32_be()?;
        reader.skip(u64::from(description_length))?;
        // width, height, colour depth, colours used
        reader.skip(16)?;
        let data_length = reader.read_u32_be()?;
        let data = reader.read_bytes(data_length as usize)?;

        debug!(picture_type, %mime_type, size = data.len(), "read picture block");
        Ok(FlacPicture {
            picture_type,
            mime_type,
            data,
        })
    }

    /// Read FLAC PICTURE block from data
    pub fn read_from_data(data: &[u8]) -> Result<Self> {
        Self::read(&mut ByteReader::new(Cursor::new(data)))
    }

    pub fn into_artwork(self) -> Artwork {
        Artwork::new(ArtworkFormat::from_mime_type(&self.mime_type), self.data)
    }
}

/// Encode a picture block; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_picture_block(mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut block = 3u32.to_be_bytes().to_vec();
    block.extend_from_slice(&(mime_type.len() as u32).to_be_bytes());
    block.extend_from_slice(mime_type.as_bytes());
    block.extend_from_slice(&5u32.to_be_bytes());
    block.extend_from_slice(b"cover");
    block.extend_from_slice(&[0u8; 16]);
    block.extend_from_slice(&(data.len() as u32).to_be_bytes());
    block.extend_from_slice(data);
    block
}
