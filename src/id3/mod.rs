// ID3 metadata handling module
pub mod frames;
pub mod genres;
pub mod metadata;
pub mod v2;

pub use genres::{decode_genre, genre_name, GENRES};
pub use metadata::Id3Metadata;
pub use v2::Id3v2Tag;
