// VORBIS_COMMENT implementation, shared by FLAC and Ogg

use std::collections::HashMap;
use std::io::BufRead;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::field_mapping::FieldMappings;
use crate::flac::picture::FlacPicture;
use crate::model::{
    number_after_slash, number_before_slash, parse_date, parse_number, Artwork, BuildMetadata,
    Values,
};
use crate::utils::ByteReader;

/// Vorbis comment structure: lower-cased keys, each holding every value seen
/// for it in order, plus decoded `metadata_block_picture` entries.
#[derive(Debug, Default)]
pub struct VorbisComment {
    pub(crate) comments: HashMap<String, Values>,
    pub(crate) pictures: Vec<Artwork>,
}

impl VorbisComment {
    /// Read a comment block: vendor string, count, then `KEY=value` entries
    pub fn read<R: BufRead>(reader: &mut ByteReader<R>, read_artwork: bool) -> Result<Self> {
        let vendor_length = reader.read_u32_le()?;
        reader.skip(u64::from(vendor_length))?;
        let comment_count = reader.read_u32_le()?;
        debug!(comment_count, "reading vorbis comments");

        let mut vorbis = VorbisComment::default();
        for _ in 0..comment_count {
            let comment_length = reader.read_u32_le()?;
            let comment = reader.read_string(comment_length as usize)?;
            let (key, value) = comment
                .split_once('=')
                .ok_or_else(|| Error::MalformedComment(comment.clone()))?;
            let key = key.to_lowercase();
            trace!(%key, "vorbis comment");

            if key == FieldMappings::VORBIS_PICTURE {
                if read_artwork {
                    let block = STANDARD.decode(value.trim()).map_err(|e| {
                        Error::MalformedComment(format!("{}: {}", FieldMappings::VORBIS_PICTURE, e))
                    })?;
                    vorbis
                        .pictures
                        .push(FlacPicture::read_from_data(&block)?.into_artwork());
                }
                continue;
            }
            vorbis
                .comments
                .entry(key)
                .or_default()
                .push(value.to_string());
        }
        Ok(vorbis)
    }

    /// Append another block's values after this one's
    pub fn merge(&mut self, other: VorbisComment) {
        for (key, values) in other.comments {
            self.comments.entry(key).or_default().extend(values);
        }
        self.pictures.extend(other.pictures);
    }

    /// Values of the first present key in `keys`
    pub(crate) fn get(&self, keys: &[&str]) -> Option<&Values> {
        keys.iter().find_map(|key| self.comments.get(*key))
    }

    fn first(&self, keys: &[&str]) -> Option<String> {
        self.get(keys).and_then(Values::first).cloned()
    }

    fn all(&self, keys: &[&str]) -> Vec<String> {
        self.get(keys).map(Values::to_vec).unwrap_or_default()
    }

    /// `3/12` in the number key, or a separate total key
    fn total(&self, number_keys: &[&str], total_keys: &[&str]) -> Option<u32> {
        self.first(number_keys)
            .and_then(|value| number_after_slash(&value))
            .or_else(|| {
                self.first(total_keys)
                    .and_then(|value| parse_number(&value, &value))
            })
    }
}

impl BuildMetadata for VorbisComment {
    fn title(&self) -> Option<String> {
        self.first(FieldMappings::VORBIS_TITLE)
    }

    fn artists(&self) -> Vec<String> {
        self.all(FieldMappings::VORBIS_ARTIST)
    }

    fn album(&self) -> Option<String> {
        self.first(FieldMappings::VORBIS_ALBUM)
    }

    fn album_artists(&self) -> Vec<String> {
        self.all(FieldMappings::VORBIS_ALBUM_ARTIST)
    }

    fn composer(&self) -> Option<String> {
        self.first(FieldMappings::VORBIS_COMPOSER)
    }

    fn genres(&self) -> Vec<String> {
        self.all(FieldMappings::VORBIS_GENRE)
    }

    fn date(&self) -> Option<NaiveDate> {
        self.first(FieldMappings::VORBIS_DATE)
            .and_then(|value| parse_date(&value))
    }

    fn year(&self) -> Option<i32> {
        self.first(FieldMappings::VORBIS_YEAR)
            .and_then(|value| value.trim().parse().ok())
            .or_else(|| self.date().map(|date| chrono::Datelike::year(&date)))
    }

    fn track_number(&self) -> Option<u32> {
        self.first(FieldMappings::VORBIS_TRACK)
            .and_then(|value| number_before_slash(&value))
    }

    fn track_total(&self) -> Option<u32> {
        self.total(FieldMappings::VORBIS_TRACK, FieldMappings::VORBIS_TRACK_TOTAL)
    }

    fn disc_number(&self) -> Option<u32> {
        self.first(FieldMappings::VORBIS_DISC)
            .and_then(|value| number_before_slash(&value))
    }

    fn disc_total(&self) -> Option<u32> {
        self.total(FieldMappings::VORBIS_DISC, FieldMappings::VORBIS_DISC_TOTAL)
    }

    fn encoder(&self) -> Option<String> {
        self.first(FieldMappings::VORBIS_ENCODER)
    }

    fn lyrics(&self) -> Option<String> {
        self.first(FieldMappings::VORBIS_LYRICS)
    }

    fn comments(&self) -> Vec<String> {
        self.all(FieldMappings::VORBIS_COMMENT)
    }

    fn artworks(&self) -> Vec<Artwork> {
        self.pictures.clone()
    }
}

/// Encode a comment block; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_comment_block(comments: &[&str]) -> Vec<u8> {
    let vendor = b"reference libFLAC 1.4.3";
    let mut block = (vendor.len() as u32).to_le_bytes().to_vec();
    block.extend_from_slice(vendor);
    block.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        block.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        block.extend_from_slice(comment.as_bytes());
    }
    block
}
