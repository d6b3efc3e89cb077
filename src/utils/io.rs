// Forward-only byte reader used by every container parser

use std::io::{self, BufRead, Read};

use crate::error::{Error, Result};
use crate::utils::bytes::decode_uint;

/// Cursor over a caller-supplied stream.
///
/// Never seeks; tracks how many bytes have been consumed so parsers can keep
/// running offsets without a `Seek` bound.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    position: u64,
}

impl<R: BufRead> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        ByteReader { inner, position: 0 }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.position += filled as u64;
                    return Err(Error::truncated(buf.len() as u64, filled as u64));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    self.position += filled as u64;
                    return Err(Error::truncated(buf.len() as u64, filled as u64));
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.position += filled as u64;
        Ok(())
    }

    /// Read exactly `n` bytes.
    ///
    /// The buffer grows with the data actually delivered, so a bogus size field
    /// fails with `Truncated` instead of allocating up front.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(n.min(64 * 1024));
        let read = match (&mut self.inner).take(n as u64).read_to_end(&mut buf) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => buf.len(),
            Err(e) => return Err(e.into()),
        };
        self.position += read as u64;
        if read < n {
            return Err(Error::truncated(n as u64, read as u64));
        }
        Ok(buf)
    }

    /// Read up to `n` bytes, stopping early at the end of the stream
    pub fn read_at_most(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(n.min(64 * 1024));
        match (&mut self.inner).take(n as u64).read_to_end(&mut buf) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
            Err(e) => return Err(e.into()),
        }
        self.position += buf.len() as u64;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Big-endian unsigned integer from `n` bytes, each contributing its low
    /// `bits_per_byte` bits (8 for plain integers, 7 for syncsafe ones).
    pub fn read_uint(&mut self, n: usize, bits_per_byte: u32) -> Result<u64> {
        let mut buf = [0u8; 8];
        let n = n.min(8);
        self.fill(&mut buf[..n])?;
        Ok(decode_uint(&buf[..n], bits_per_byte))
    }

    pub fn read_syncsafe_u32(&mut self) -> Result<u32> {
        Ok(self.read_uint(4, 7)? as u32)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Fixed-length string; invalid UTF-8 sequences are replaced
    pub fn read_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Discard `n` bytes without buffering them
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let mut skipped = 0u64;
        while skipped < n {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf.len(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
                Err(e) => {
                    self.position += skipped;
                    return Err(e.into());
                }
            };
            if available == 0 {
                break;
            }
            let step = (available as u64).min(n - skipped) as usize;
            self.inner.consume(step);
            skipped += step as u64;
        }
        self.position += skipped;
        if skipped < n {
            return Err(Error::truncated(n, skipped));
        }
        Ok(())
    }

    /// True once the underlying stream has no more bytes
    pub fn is_exhausted(&mut self) -> Result<bool> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.is_empty()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(true),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_fixed_width_integers() {
        let data = [0x00, 0x00, 0x02, 0x01, 0x78, 0x56, 0x34, 0x12];
        let mut reader = ByteReader::new(Cursor::new(&data[..]));
        assert_eq!(reader.read_uint(4, 7).unwrap(), 257);
        assert_eq!(reader.read_u32_le().unwrap(), 0x1234_5678);
        assert_eq!(reader.position(), 8);
        assert!(reader.is_exhausted().unwrap());
    }

    #[test]
    fn short_read_is_truncated() {
        let mut reader = ByteReader::new(Cursor::new(&[1u8, 2, 3][..]));
        match reader.read_bytes(5) {
            Err(Error::Truncated { needed, available }) => {
                assert_eq!(needed, 5);
                assert_eq!(available, 3);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn skip_past_end_is_truncated() {
        let mut reader = ByteReader::new(Cursor::new(&[0u8; 4][..]));
        reader.skip(2).unwrap();
        assert!(reader.skip(3).unwrap_err().is_truncated());
    }

    /// Delivers `data`, then fails every call with `kind`
    struct FailingReader {
        data: Cursor<Vec<u8>>,
        kind: io::ErrorKind,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(self.kind, "source failed")),
                n => Ok(n),
            }
        }
    }

    fn failing(data: &[u8], kind: io::ErrorKind) -> ByteReader<io::BufReader<FailingReader>> {
        ByteReader::new(io::BufReader::new(FailingReader {
            data: Cursor::new(data.to_vec()),
            kind,
        }))
    }

    #[test]
    fn source_eof_error_is_truncated() {
        let eof = io::ErrorKind::UnexpectedEof;

        let mut reader = failing(&[1, 2], eof);
        assert!(matches!(
            reader.read_u32_be(),
            Err(Error::Truncated { needed: 4, available: 2 })
        ));

        let mut reader = failing(&[1, 2], eof);
        assert!(matches!(
            reader.skip(8),
            Err(Error::Truncated { needed: 8, available: 2 })
        ));
        assert_eq!(reader.position(), 2);

        let mut reader = failing(&[1, 2, 3], eof);
        assert_eq!(reader.read_at_most(10).unwrap(), vec![1, 2, 3]);
        assert!(reader.read_bytes(1).unwrap_err().is_truncated());
    }

    #[test]
    fn other_source_errors_are_io() {
        let mut reader = failing(&[1], io::ErrorKind::PermissionDenied);
        assert!(matches!(reader.read_u32_be(), Err(Error::Io(_))));
        let mut reader = failing(&[], io::ErrorKind::PermissionDenied);
        assert!(matches!(reader.skip(1), Err(Error::Io(_))));
    }

    #[test]
    fn huge_declared_length_does_not_preallocate() {
        let mut reader = ByteReader::new(Cursor::new(&[0u8; 16][..]));
        assert!(reader.read_bytes(usize::MAX / 2).unwrap_err().is_truncated());
    }
}
