//! Sonotag - tag and stream-property extraction for audio containers
//!
//! One forward-only pass over a caller-supplied stream yields an immutable
//! [`Metadata`] and [`StreamInfo`] pair. Supported containers are MP3 (ID3v2),
//! FLAC, Ogg Vorbis and MP4/M4A.
//!
//! ```no_run
//! use std::fs::File;
//!
//! let file = File::open("song.flac")?;
//! if let Some(audio) = sonotag::read_audio(file, "audio/flac")? {
//!     println!("{:?}", audio.metadata().title);
//! }
//! # Ok::<(), sonotag::Error>(())
//! ```

use std::io::{BufReader, Read};

pub mod config;
pub mod error;
pub mod field_mapping;
pub mod flac;
pub mod format;
pub mod id3;
pub mod model;
pub mod mp3;
pub mod mp4;
pub mod ogg;
pub mod utils;

pub use config::ParseOptions;
pub use error::{Error, Result};
pub use flac::Flac;
pub use format::AudioFormat;
pub use model::{Artwork, ArtworkFormat, Metadata, StreamInfo};
pub use mp3::Mp3;
pub use mp4::Mpeg4;
pub use ogg::Ogg;

/// Completed parse of one container
pub trait AudioParser {
    fn metadata(&self) -> &Metadata;

    fn stream_info(&self) -> &StreamInfo;
}

/// Parse `input` as the container named by `mime_type`.
///
/// Returns `Ok(None)` when the MIME type names no supported container.
pub fn read_audio<R: Read>(input: R, mime_type: &str) -> Result<Option<Box<dyn AudioParser>>> {
    read_audio_with_options(input, mime_type, ParseOptions::default())
}

pub fn read_audio_with_options<R: Read>(
    input: R,
    mime_type: &str,
    options: ParseOptions,
) -> Result<Option<Box<dyn AudioParser>>> {
    let Some(format) = AudioFormat::from_mime_type(mime_type) else {
        tracing::debug!(mime_type, "no parser for mime type");
        return Ok(None);
    };
    read_format(BufReader::new(input), format, options).map(Some)
}

/// Parse `input` as a known container
pub fn read_format<R: std::io::BufRead>(
    input: R,
    format: AudioFormat,
    options: ParseOptions,
) -> Result<Box<dyn AudioParser>> {
    Ok(match format {
        AudioFormat::Flac => Box::new(Flac::read_with_options(input, options)?),
        AudioFormat::Mp3 => Box::new(Mp3::read_with_options(input, options)?),
        AudioFormat::Mp4 => Box::new(Mpeg4::read_with_options(input, options)?),
        AudioFormat::Ogg => Box::new(Ogg::read_with_options(input, options)?),
    })
}
