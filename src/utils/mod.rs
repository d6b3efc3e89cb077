// Shared reader and decoding helpers
pub mod bytes;
pub mod encoding;
pub mod io;

pub use io::ByteReader;
