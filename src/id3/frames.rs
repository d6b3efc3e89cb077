// ID3 frame definitions and parsers

use tracing::{debug, warn};

use crate::id3::v2::Id3Frame;
use crate::model::{Artwork, ArtworkFormat};
use crate::utils::bytes::split;
use crate::utils::encoding::{decode_text, split_terminated, TextEncoding};

/// Frame identifiers consulted when building metadata, v2.2 names first
pub mod frame_ids {
    pub const TITLE: [&str; 2] = ["TT2", "TIT2"];
    pub const ARTIST: [&str; 2] = ["TP1", "TPE1"];
    pub const ALBUM: [&str; 2] = ["TAL", "TALB"];
    pub const ALBUM_ARTIST: [&str; 2] = ["TP2", "TPE2"];
    pub const COMPOSER: [&str; 2] = ["TCM", "TCOM"];
    pub const GENRE: [&str; 2] = ["TCO", "TCON"];
    pub const TRACK: [&str; 2] = ["TRK", "TRCK"];
    pub const DISC: [&str; 2] = ["TPA", "TPOS"];
    pub const ENCODER: [&str; 2] = ["TSS", "TSSE"];
    /// Release date, recording date, then the v2.3/v2.2 year
    pub const DATE: [&str; 4] = ["TDRL", "TDRC", "TYER", "TYE"];
}

/// Kind of a frame carrying a description alongside its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    UserText,
    UserUrl,
    Comment,
    Lyrics,
}

/// `TXXX`, `WXXX`, `COMM` and `USLT` style frames (and their v2.2 names)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWithDescription {
    pub kind: DescriptionKind,
    pub language: Option<String>,
    pub description: String,
    pub text: String,
}

/// A decoded frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text { name: String, values: Vec<String> },
    Described(TextWithDescription),
    Picture(Artwork),
}

/// Decode one raw frame by its identifier, `None` for empty payloads
pub fn decode_frame(frame: &Id3Frame) -> Option<Frame> {
    let name = frame.frame_id.as_str();
    let data = frame.data.as_slice();
    if data.is_empty() {
        debug!(frame = name, "empty frame payload");
        return None;
    }

    let described = |kind, has_language| {
        decode_text_with_description(data, kind, has_language).map(Frame::Described)
    };
    match name {
        "TXXX" | "TXX" => described(DescriptionKind::UserText, false),
        "WXXX" | "WXX" => described(DescriptionKind::UserUrl, false),
        "COMM" | "COM" => described(DescriptionKind::Comment, true),
        "USLT" | "ULT" => described(DescriptionKind::Lyrics, true),
        "APIC" => decode_attached_picture(data).map(Frame::Picture),
        "PIC" => decode_v22_picture(data).map(Frame::Picture),
        _ if name.starts_with('T') => Some(Frame::Text {
            name: name.to_string(),
            values: decode_text_frame(data),
        }),
        _ if name.starts_with('W') => Some(Frame::Text {
            name: name.to_string(),
            values: split_values(&decode_text(data, TextEncoding::Iso8859_1)),
        }),
        _ => None,
    }
}

/// Decode text frame data: encoding byte, then NUL-separated values
pub fn decode_text_frame(data: &[u8]) -> Vec<String> {
    let Some((&encoding, text)) = data.split_first() else {
        return Vec::new();
    };
    split_values(&decode_text(text, TextEncoding::from_byte(encoding)))
}

/// NUL-separated values with blanks dropped; URL frames share this with text frames
fn split_values(text: &str) -> Vec<String> {
    text.split('\0')
        .filter(|value| !value.trim().is_empty())
        .map(String::from)
        .collect()
}

/// Encoding byte, optional 3-byte language, terminated description, text.
/// URL values are always Latin-1 regardless of the declared encoding.
fn decode_text_with_description(
    data: &[u8],
    kind: DescriptionKind,
    has_language: bool,
) -> Option<TextWithDescription> {
    let (&encoding, mut rest) = data.split_first()?;
    let encoding = TextEncoding::from_byte(encoding);

    let mut language = None;
    if has_language {
        if rest.len() < 3 {
            warn!(?kind, "frame too short for a language code");
            return None;
        }
        language = Some(decode_text(&rest[..3], TextEncoding::Iso8859_1));
        rest = &rest[3..];
    }

    let (description, text) = split_terminated(rest, encoding);
    let text_encoding = match kind {
        DescriptionKind::UserUrl => TextEncoding::Iso8859_1,
        _ => encoding,
    };
    Some(TextWithDescription {
        kind,
        language,
        description: decode_text(description, encoding),
        text: decode_text(text, text_encoding)
            .trim_end_matches('\0')
            .to_string(),
    })
}

/// `APIC`: encoding, Latin-1 MIME type, picture type, description, image bytes
fn decode_attached_picture(data: &[u8]) -> Option<Artwork> {
    let (&encoding, rest) = data.split_first()?;
    let encoding = TextEncoding::from_byte(encoding);

    let parts = split(rest, &[0], Some(2));
    let [mime_type, rest] = parts.as_slice() else {
        warn!("APIC frame without a MIME type terminator");
        return None;
    };
    let mime_type = decode_text(mime_type, TextEncoding::Iso8859_1);
    let (_picture_type, rest) = rest.split_first()?;
    let (_description, image) = split_terminated(rest, encoding);
    Some(Artwork::new(
        ArtworkFormat::from_mime_type(&mime_type),
        image.to_vec(),
    ))
}

/// `PIC` (v2.2): encoding, 3-letter image format code, picture type, description, image bytes
fn decode_v22_picture(data: &[u8]) -> Option<Artwork> {
    if data.len() < 5 {
        warn!("PIC frame too short");
        return None;
    }
    let encoding = TextEncoding::from_byte(data[0]);
    let code = decode_text(&data[1..4], TextEncoding::Iso8859_1);
    let (_description, image) = split_terminated(&data[5..], encoding);
    Some(Artwork::new(ArtworkFormat::from_image_code(&code), image.to_vec()))
}
