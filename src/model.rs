//! Format-independent parse results
//!
//! Every container parser accumulates into its own private builder and hands
//! back these values once the stream has been read. Nothing here is mutated by
//! the parsers after construction.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::warn;

/// Image format of an embedded picture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkFormat {
    Jpeg,
    Png,
    Gif,
    Unknown,
}

impl ArtworkFormat {
    /// Resolve a MIME type; `image/jpg` and `image/jpeg` both map to JPEG
    pub fn from_mime_type(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => ArtworkFormat::Jpeg,
            "image/png" => ArtworkFormat::Png,
            "image/gif" => ArtworkFormat::Gif,
            _ => ArtworkFormat::Unknown,
        }
    }

    /// Resolve the three-letter image code used by ID3v2.2 `PIC` frames
    pub fn from_image_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "JPG" => ArtworkFormat::Jpeg,
            "PNG" => ArtworkFormat::Png,
            "GIF" => ArtworkFormat::Gif,
            _ => ArtworkFormat::Unknown,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ArtworkFormat::Jpeg => "image/jpeg",
            ArtworkFormat::Png => "image/png",
            ArtworkFormat::Gif => "image/gif",
            ArtworkFormat::Unknown => "",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtworkFormat::Jpeg => "jpg",
            ArtworkFormat::Png => "png",
            ArtworkFormat::Gif => "gif",
            ArtworkFormat::Unknown => "bin",
        }
    }
}

/// An embedded picture, compared by format and exact bytes
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Artwork {
    pub format: ArtworkFormat,
    pub data: Vec<u8>,
}

impl Artwork {
    pub fn new(format: ArtworkFormat, data: Vec<u8>) -> Self {
        Artwork { format, data }
    }
}

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artwork")
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}

impl Serialize for Artwork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Artwork", 3)?;
        state.serialize_field("format", &self.format)?;
        state.serialize_field("mime_type", self.format.mime_type())?;
        state.serialize_field("size", &self.data.len())?;
        state.end()
    }
}

/// Descriptive tags read from a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub artists: BTreeSet<String>,
    pub album: Option<String>,
    pub album_artists: BTreeSet<String>,
    pub composer: Option<String>,
    pub genres: BTreeSet<String>,
    pub year: Option<i32>,
    pub date: Option<NaiveDate>,
    pub track_number: Option<u32>,
    pub track_total: Option<u32>,
    pub disc_number: Option<u32>,
    pub disc_total: Option<u32>,
    pub encoder: Option<String>,
    pub lyrics: Option<String>,
    pub comments: BTreeSet<String>,
    pub artworks: Vec<Artwork>,
}

impl Metadata {
    /// True when no field at all was populated
    pub fn is_empty(&self) -> bool {
        *self == Metadata::default()
    }
}

/// Stream characteristics derived from header fields only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    /// Playback length in milliseconds
    pub duration: Option<u64>,
    pub bitrate: Option<u64>,
    pub min_bitrate: Option<u64>,
    pub max_bitrate: Option<u64>,
    pub channels: Option<u32>,
    pub bits_per_sample: Option<u32>,
    pub sample_rate: Option<u64>,
    pub samples: Option<u64>,
    pub codec: Option<String>,
}

impl StreamInfo {
    /// Whole seconds of playback, truncated
    pub fn duration_secs(&self) -> Option<u64> {
        self.duration.map(|ms| ms / 1000)
    }
}

/// `count` units of `1 / rate` seconds, in milliseconds
pub(crate) fn duration_ms(count: u64, rate: u64) -> Option<u64> {
    if rate == 0 {
        return None;
    }
    let ms = u128::from(count) * 1000 / u128::from(rate);
    u64::try_from(ms).ok()
}

/// Accessor set each format's accumulator exposes.
///
/// `build` assembles the immutable [`Metadata`], normalising every string set
/// to trimmed, non-blank, de-duplicated values.
pub(crate) trait BuildMetadata {
    fn title(&self) -> Option<String>;
    fn artists(&self) -> Vec<String>;
    fn album(&self) -> Option<String>;
    fn album_artists(&self) -> Vec<String>;
    fn composer(&self) -> Option<String>;
    fn genres(&self) -> Vec<String>;
    fn date(&self) -> Option<NaiveDate>;
    fn year(&self) -> Option<i32> {
        self.date().map(|date| chrono::Datelike::year(&date))
    }
    fn track_number(&self) -> Option<u32>;
    fn track_total(&self) -> Option<u32>;
    fn disc_number(&self) -> Option<u32>;
    fn disc_total(&self) -> Option<u32>;
    fn encoder(&self) -> Option<String>;
    fn lyrics(&self) -> Option<String>;
    fn comments(&self) -> Vec<String>;
    fn artworks(&self) -> Vec<Artwork>;

    fn build(&self) -> Metadata {
        Metadata {
            title: non_blank(self.title()),
            artists: string_set(self.artists()),
            album: non_blank(self.album()),
            album_artists: string_set(self.album_artists()),
            composer: non_blank(self.composer()),
            genres: string_set(self.genres()),
            year: self.year(),
            date: self.date(),
            track_number: self.track_number(),
            track_total: self.track_total(),
            disc_number: self.disc_number(),
            disc_total: self.disc_total(),
            encoder: non_blank(self.encoder()),
            lyrics: non_blank(self.lyrics()),
            comments: string_set(self.comments()),
            artworks: self.artworks(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn string_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Ordered, duplicate-free list of values accumulated under one key
#[derive(Debug, Clone, Default)]
pub(crate) struct Values(Vec<String>);

impl Values {
    pub fn push(&mut self, value: String) {
        if !self.0.contains(&value) {
            self.0.push(value);
        }
    }

    pub fn first(&self) -> Option<&String> {
        self.0.first()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl Extend<String> for Values {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl IntoIterator for Values {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<String> for Values {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut values = Values::default();
        for value in iter {
            values.push(value);
        }
        values
    }
}

/// Number part of `"3/12"` or `"3"`
pub(crate) fn number_before_slash(value: &str) -> Option<u32> {
    let head = value.split('/').next()?;
    parse_number(head, value)
}

/// Total part of `"3/12"`; absent without a slash
pub(crate) fn number_after_slash(value: &str) -> Option<u32> {
    let (_, tail) = value.split_once('/')?;
    parse_number(tail, value)
}

/// Parse `part` of the raw field value `raw`; failures are logged and absent
pub(crate) fn parse_number(part: &str, raw: &str) -> Option<u32> {
    let part = part.trim();
    if part.is_empty() {
        return None;
    }
    match part.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(value = raw, "ignoring non-numeric field");
            None
        }
    }
}

/// Parse `yyyy`, `yyyy-MM` or `yyyy-MM-dd[...]`; missing parts default to 1
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let field = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = value.get(range)?;
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    let separated = |at: usize| value.as_bytes().get(at) == Some(&b'-');

    let parsed = match value.len() {
        4 => field(0..4).and_then(|y| NaiveDate::from_ymd_opt(y as i32, 1, 1)),
        7 if separated(4) => {
            let (y, m) = (field(0..4), field(5..7));
            y.zip(m)
                .and_then(|(y, m)| NaiveDate::from_ymd_opt(y as i32, m, 1))
        }
        n if n >= 10 && separated(4) && separated(7) => {
            let (y, m, d) = (field(0..4), field(5..7), field(8..10));
            match (y, m, d) {
                (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y as i32, m, d),
                _ => None,
            }
        }
        _ => None,
    };
    if parsed.is_none() && !value.is_empty() {
        warn!(value, "ignoring unparsable date");
    }
    parsed
}
