//! Error types shared by every container parser
//!
//! A parse either produces a complete result or one of these errors; there is
//! no partially populated metadata on failure.

use thiserror::Error;

/// Errors raised while reading a container
#[derive(Debug, Error)]
pub enum Error {
    /// The stream does not start with the container's signature
    #[error("bad magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        expected: &'static str,
        found: Vec<u8>,
    },

    /// The container declares a version this crate does not understand:
    /// an ID3v2 major version other than 2, 3 or 4, or an Ogg page version other than 0
    #[error("unsupported {container} version {version}")]
    UnsupportedVersion {
        container: &'static str,
        version: u8,
    },

    /// The stream ended before a required field could be read in full
    #[error("stream truncated: needed {needed} bytes, got {available}")]
    Truncated { needed: u64, available: u64 },

    /// Structurally inconsistent page/packet/box sequencing
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A Vorbis comment entry that is not a single `KEY=VALUE` pair
    #[error("malformed vorbis comment: {0}")]
    MalformedComment(String),

    /// Any other failure reported by the underlying reader
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for parsing operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn truncated(needed: u64, available: u64) -> Self {
        Error::Truncated { needed, available }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Error::ProtocolError(message.into())
    }

    /// Returns true when the input simply ran out of bytes
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. })
    }
}
