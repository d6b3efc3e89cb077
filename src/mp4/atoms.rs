// MP4 atom headers and the atom names the walker understands

use std::io::BufRead;

use crate::error::{Error, Result};
use crate::utils::encoding::{decode_text, TextEncoding};
use crate::utils::ByteReader;

pub const FTYP: &[u8; 4] = b"ftyp";
pub const MOOV: &[u8; 4] = b"moov";
pub const UDTA: &[u8; 4] = b"udta";
pub const META: &[u8; 4] = b"meta";
pub const ILST: &[u8; 4] = b"ilst";
pub const TRAK: &[u8; 4] = b"trak";
pub const MDIA: &[u8; 4] = b"mdia";
pub const MINF: &[u8; 4] = b"minf";
pub const STBL: &[u8; 4] = b"stbl";
pub const STSD: &[u8; 4] = b"stsd";
pub const MVHD: &[u8; 4] = b"mvhd";
pub const STTS: &[u8; 4] = b"stts";
pub const MP4A: &[u8; 4] = b"mp4a";
pub const ALAC: &[u8; 4] = b"alac";
pub const FREEFORM: &[u8; 4] = b"----";
pub const MEAN: &[u8; 4] = b"mean";
pub const NAME: &[u8; 4] = b"name";
pub const DATA: &[u8; 4] = b"data";

/// Containers walked into directly, with the bytes to skip after their header
pub const CONTAINERS: &[(&[u8; 4], u64)] = &[
    (MOOV, 0),
    (UDTA, 0),
    (ILST, 0),
    (TRAK, 0),
    (MDIA, 0),
    (MINF, 0),
    (STBL, 0),
    // version and flags
    (META, 4),
    // version, flags and entry count
    (STSD, 8),
];

/// Data atom content types
pub mod data_type {
    pub const IMPLICIT: u32 = 0;
    pub const UTF8: u32 = 1;
    pub const GIF: u32 = 12;
    pub const JPEG: u32 = 13;
    pub const PNG: u32 = 14;
    pub const BE_SIGNED: u32 = 21;
}

/// Atom header: declared size and fourcc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomHeader {
    pub name: [u8; 4],
    /// Total atom size including this header; `None` when the atom runs to
    /// the end of the stream
    pub size: Option<u64>,
    pub header_size: u64,
}

impl AtomHeader {
    /// Read an atom header, following a 64-bit extended size when the 32-bit
    /// size is 1
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Self> {
        let size = reader.read_u32_be()?;
        let name = reader.read_array::<4>()?;
        let (size, header_size) = match size {
            0 => (None, 8),
            1 => (Some(reader.read_u64_be()?), 16),
            size => (Some(u64::from(size)), 8),
        };

        let header = AtomHeader {
            name,
            size,
            header_size,
        };
        if let Some(size) = size {
            if size < header_size {
                return Err(Error::protocol(format!(
                    "atom {} declares size {} smaller than its header",
                    header.name_lossy(),
                    size
                )));
            }
        }
        Ok(header)
    }

    /// Bytes after the header
    pub fn payload_size(&self) -> Option<u64> {
        self.size.map(|size| size - self.header_size)
    }

    /// Fourcc compared without regard to ASCII case
    pub fn is(&self, name: &[u8; 4]) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Latin-1 rendering of the fourcc, for logs and errors
    pub fn name_lossy(&self) -> String {
        decode_text(&self.name, TextEncoding::Iso8859_1)
    }
}

/// Encode an atom; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_atom(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut atom = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    atom.extend_from_slice(name);
    atom.extend_from_slice(payload);
    atom
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_compact_header() {
        let atom = encode_atom(b"\xA9nam", &[0u8; 4]);
        let header = AtomHeader::read(&mut ByteReader::new(Cursor::new(&atom[..]))).unwrap();
        assert!(header.is(b"\xA9NAM"));
        assert_eq!(header.size, Some(12));
        assert_eq!(header.payload_size(), Some(4));
        assert_eq!(header.name_lossy(), "©nam");
    }

    #[test]
    fn reads_extended_size() {
        let mut atom = 1u32.to_be_bytes().to_vec();
        atom.extend_from_slice(b"mdat");
        atom.extend_from_slice(&20u64.to_be_bytes());
        let header = AtomHeader::read(&mut ByteReader::new(Cursor::new(&atom[..]))).unwrap();
        assert_eq!(header.size, Some(20));
        assert_eq!(header.payload_size(), Some(4));
    }

    #[test]
    fn zero_size_runs_to_end() {
        let atom = [0, 0, 0, 0, b'm', b'd', b'a', b't'];
        let header = AtomHeader::read(&mut ByteReader::new(Cursor::new(&atom[..]))).unwrap();
        assert_eq!(header.size, None);
    }

    #[test]
    fn undersized_atom_is_protocol_error() {
        let atom = [0, 0, 0, 4, b'f', b'r', b'e', b'e'];
        assert!(matches!(
            AtomHeader::read(&mut ByteReader::new(Cursor::new(&atom[..]))),
            Err(Error::ProtocolError(_))
        ));
    }
}
