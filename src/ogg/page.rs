use std::io::BufRead;

use crate::error::{Error, Result};
use crate::ogg::{OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION, OGG_HEADER_TYPE_EOS, OGG_SIGNATURE};
use crate::utils::ByteReader;

/// OGG Page Header
#[derive(Debug, Clone)]
pub struct OggPageHeader {
    pub header_type: u8,
    pub granule_position: u64,
    pub bitstream_serial: u32,
    pub page_sequence: u32,
    pub segment_table: Vec<u8>,
}

impl OggPageHeader {
    /// Read a page header and its segment table
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        let signature = reader.read_array::<4>()?;
        if &signature != OGG_SIGNATURE {
            return Err(Error::BadMagic {
                expected: "OggS",
                found: signature.to_vec(),
            });
        }

        let version = reader.read_u8()?;
        if version != 0 {
            return Err(Error::UnsupportedVersion {
                container: "Ogg",
                version,
            });
        }

        let header_type = reader.read_u8()?;
        let granule_position = reader.read_u64_le()?;
        let bitstream_serial = reader.read_u32_le()?;
        let page_sequence = reader.read_u32_le()?;
        // CRC
        reader.skip(4)?;
        let segment_count = reader.read_u8()?;
        let segment_table = reader.read_bytes(usize::from(segment_count))?;

        Ok(OggPageHeader {
            header_type,
            granule_position,
            bitstream_serial,
            page_sequence,
            segment_table,
        })
    }

    /// Calculate total page data size from segment table
    pub fn data_size(&self) -> u64 {
        self.segment_table.iter().map(|&x| u64::from(x)).sum()
    }

    pub fn is_continuation(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_CONTINUATION != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & OGG_HEADER_TYPE_EOS != 0
    }

    /// A granule of all ones marks a page on which no packet completes
    pub fn granule(&self) -> Option<u64> {
        (self.granule_position != u64::MAX).then_some(self.granule_position)
    }
}

/// Encode a page; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_page(
    header_type: u8,
    granule: u64,
    serial: u32,
    sequence: u32,
    segments: &[u8],
    data: &[u8],
) -> Vec<u8> {
    let mut page = OGG_SIGNATURE.to_vec();
    page.push(0);
    page.push(header_type);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&serial.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&[0u8; 4]);
    page.push(segments.len() as u8);
    page.extend_from_slice(segments);
    page.extend_from_slice(data);
    page
}
