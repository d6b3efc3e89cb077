// iTunes-style `ilst` items and their `data` children

use std::collections::HashMap;
use std::io::BufRead;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::field_mapping::{FieldMappings, StandardField};
use crate::id3::genre_name;
use crate::model::{
    number_after_slash, number_before_slash, parse_date, Artwork, ArtworkFormat, BuildMetadata,
    Values,
};
use crate::mp4::atoms::{data_type, AtomHeader, DATA, FREEFORM, MEAN, NAME};
use crate::utils::bytes::decode_uint;
use crate::utils::ByteReader;

/// Values gathered from recognised items
#[derive(Debug, Default)]
pub struct Mp4Metadata {
    strings: HashMap<StandardField, Values>,
    track_number: Option<u32>,
    track_total: Option<u32>,
    disc_number: Option<u32>,
    disc_total: Option<u32>,
    pictures: Vec<Artwork>,
}

impl Mp4Metadata {
    /// Whether an item atom is worth reading rather than skipping
    pub fn recognises(header: &AtomHeader) -> bool {
        header.is(FREEFORM) || FieldMappings::from_mp4(&header.name).is_some()
    }

    /// Read the children of one item atom. `----` items name their field
    /// through `mean` and `name` children; every `data` child is decoded.
    pub fn read_item<R: BufRead>(
        &mut self,
        reader: &mut ByteReader<R>,
        item: &AtomHeader,
        read_artwork: bool,
    ) -> Result<()> {
        let mut field = FieldMappings::from_mp4(&item.name);
        let mut mean = String::new();
        let mut remaining = item
            .payload_size()
            .ok_or_else(|| Error::protocol(format!("item {} has no size", item.name_lossy())))?;

        while remaining >= 8 {
            let child = AtomHeader::read(reader)?;
            let child_size = child.size.filter(|&size| size <= remaining).ok_or_else(|| {
                Error::protocol(format!(
                    "{} child of {} overruns its parent",
                    child.name_lossy(),
                    item.name_lossy()
                ))
            })?;
            remaining -= child_size;
            let payload = child_size - child.header_size;

            if child.is(MEAN) || child.is(NAME) {
                // version and flags
                reader.skip(4)?;
                let value = reader.read_string(sub_payload(payload, 4, &child)? as usize)?;
                if child.is(MEAN) {
                    mean = value;
                } else {
                    let key = format!("{}:{}", mean, value);
                    field = FieldMappings::from_mp4_freeform(&key);
                    trace!(%key, ?field, "freeform item");
                }
            } else if let (true, Some(field)) = (child.is(DATA), field) {
                self.read_data(reader, field, payload, read_artwork)?;
            } else {
                reader.skip(payload)?;
            }
        }
        reader.skip(remaining)?;
        Ok(())
    }

    fn read_data<R: BufRead>(
        &mut self,
        reader: &mut ByteReader<R>,
        field: StandardField,
        payload: u64,
        read_artwork: bool,
    ) -> Result<()> {
        let content_type = reader.read_u32_be()? & 0x00FF_FFFF;
        // locale
        reader.skip(4)?;
        let length = payload
            .checked_sub(8)
            .ok_or_else(|| Error::protocol("data atom too small"))?;

        if field == StandardField::Picture && !read_artwork {
            return reader.skip(length);
        }
        let data = reader.read_bytes(length as usize)?;
        trace!(field = field.as_str(), content_type, length, "data atom");

        match (content_type, field) {
            (data_type::UTF8, StandardField::Track | StandardField::Disc) => {
                let text = String::from_utf8_lossy(&data);
                self.set_pair(field, number_before_slash(&text), number_after_slash(&text));
            }
            (data_type::UTF8, _) => self.push(field, String::from_utf8_lossy(&data).into_owned()),
            (data_type::IMPLICIT, StandardField::Track | StandardField::Disc) => {
                let number = data.get(3).map(|&n| u32::from(n));
                let total = data.get(5).map(|&n| u32::from(n));
                self.set_pair(field, number, total);
            }
            (data_type::IMPLICIT, StandardField::Genre) if data.len() >= 2 => {
                self.push_genre_index(decode_uint(&data[..2], 8));
            }
            (data_type::BE_SIGNED, _) => {
                // two leading bytes, then the big-endian value
                let digits = data.get(2..).unwrap_or_default();
                let value = decode_uint(&digits[digits.len().saturating_sub(8)..], 8);
                match field {
                    StandardField::Track | StandardField::Disc => {
                        self.set_pair(field, u32::try_from(value).ok(), None)
                    }
                    StandardField::Genre => self.push_genre_index(value),
                    _ => debug!(field = field.as_str(), value, "ignoring integer item"),
                }
            }
            (data_type::JPEG, StandardField::Picture) => {
                self.pictures.push(Artwork::new(ArtworkFormat::Jpeg, data))
            }
            (data_type::PNG, StandardField::Picture) => {
                self.pictures.push(Artwork::new(ArtworkFormat::Png, data))
            }
            (data_type::GIF, StandardField::Picture) => {
                self.pictures.push(Artwork::new(ArtworkFormat::Gif, data))
            }
            _ => debug!(field = field.as_str(), content_type, "ignoring data atom"),
        }
        Ok(())
    }

    fn push(&mut self, field: StandardField, value: String) {
        self.strings.entry(field).or_default().push(value);
    }

    /// `gnre` stores the ID3v1 genre number plus one
    fn push_genre_index(&mut self, value: u64) {
        let name = value
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(genre_name);
        if let Some(name) = name {
            self.push(StandardField::Genre, name.to_string());
        }
    }

    /// Zero means unset for both the number and the total
    fn set_pair(&mut self, field: StandardField, number: Option<u32>, total: Option<u32>) {
        let number = number.filter(|&n| n > 0);
        let total = total.filter(|&n| n > 0);
        let (number_slot, total_slot) = match field {
            StandardField::Disc => (&mut self.disc_number, &mut self.disc_total),
            _ => (&mut self.track_number, &mut self.track_total),
        };
        *number_slot = number_slot.or(number);
        *total_slot = total_slot.or(total);
    }

    fn first(&self, field: StandardField) -> Option<String> {
        self.strings.get(&field).and_then(Values::first).cloned()
    }

    fn all(&self, field: StandardField) -> Vec<String> {
        self.strings.get(&field).map(Values::to_vec).unwrap_or_default()
    }
}

fn sub_payload(payload: u64, by: u64, atom: &AtomHeader) -> Result<u64> {
    payload
        .checked_sub(by)
        .ok_or_else(|| Error::protocol(format!("{} atom too small", atom.name_lossy())))
}

impl BuildMetadata for Mp4Metadata {
    fn title(&self) -> Option<String> {
        self.first(StandardField::Title)
    }

    fn artists(&self) -> Vec<String> {
        self.all(StandardField::Artist)
    }

    fn album(&self) -> Option<String> {
        self.first(StandardField::Album)
    }

    fn album_artists(&self) -> Vec<String> {
        self.all(StandardField::AlbumArtist)
    }

    fn composer(&self) -> Option<String> {
        self.first(StandardField::Composer)
    }

    fn genres(&self) -> Vec<String> {
        self.all(StandardField::Genre)
    }

    fn date(&self) -> Option<NaiveDate> {
        self.first(StandardField::Year)
            .and_then(|value| parse_date(&value))
    }

    fn track_number(&self) -> Option<u32> {
        self.track_number
    }

    fn track_total(&self) -> Option<u32> {
        self.track_total
    }

    fn disc_number(&self) -> Option<u32> {
        self.disc_number
    }

    fn disc_total(&self) -> Option<u32> {
        self.disc_total
    }

    fn encoder(&self) -> Option<String> {
        self.first(StandardField::Encoder)
    }

    fn lyrics(&self) -> Option<String> {
        self.first(StandardField::Lyrics)
    }

    fn comments(&self) -> Vec<String> {
        self.all(StandardField::Comment)
    }

    fn artworks(&self) -> Vec<Artwork> {
        self.pictures.clone()
    }
}

/// Encode a `data` child; used to build fixtures
#[cfg(test)]
pub(crate) fn encode_data(content_type: u32, value: &[u8]) -> Vec<u8> {
    let mut payload = content_type.to_be_bytes().to_vec();
    payload.extend_from_slice(&[0u8; 4]);
    payload.extend_from_slice(value);
    crate::mp4::atoms::encode_atom(DATA, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::atoms::encode_atom;
    use std::io::Cursor;

    fn read_items(items: &[Vec<u8>], read_artwork: bool) -> Mp4Metadata {
        let data: Vec<u8> = items.concat();
        let mut reader = ByteReader::new(Cursor::new(&data[..]));
        let mut metadata = Mp4Metadata::default();
        while !reader.is_exhausted().unwrap() {
            let header = AtomHeader::read(&mut reader).unwrap();
            assert!(Mp4Metadata::recognises(&header));
            metadata.read_item(&mut reader, &header, read_artwork).unwrap();
        }
        metadata
    }

    #[test]
    fn binary_track_and_disc() {
        let metadata = read_items(
            &[
                encode_atom(b"trkn", &encode_data(0, &[0, 0, 0, 3, 0, 12, 0, 0])),
                encode_atom(b"disk", &encode_data(0, &[0, 0, 0, 1, 0, 2])),
            ],
            true,
        )
        .build();
        assert_eq!(metadata.track_number, Some(3));
        assert_eq!(metadata.track_total, Some(12));
        assert_eq!(metadata.disc_number, Some(1));
        assert_eq!(metadata.disc_total, Some(2));
    }

    #[test]
    fn text_items_and_case_insensitive_names() {
        let metadata = read_items(
            &[
                encode_atom(b"\xA9nam", &encode_data(1, "Café".as_bytes())),
                encode_atom(b"\xA9art", &encode_data(1, b"Solo")),
                encode_atom(b"aART", &encode_data(1, b"Group")),
                encode_atom(b"\xA9day", &encode_data(1, b"2004-05-12T07:00:00Z")),
            ],
            true,
        )
        .build();
        assert_eq!(metadata.title.as_deref(), Some("Café"));
        assert!(metadata.artists.contains("Solo"));
        assert!(metadata.album_artists.contains("Group"));
        assert_eq!(metadata.year, Some(2004));
    }

    #[test]
    fn integer_track_skips_two_bytes() {
        let metadata = read_items(&[encode_atom(b"trkn", &encode_data(21, &[0, 1, 0, 7]))], true).build();
        assert_eq!(metadata.track_number, Some(7));
        assert_eq!(metadata.track_total, None);
    }

    #[test]
    fn short_integer_item_is_unset() {
        let metadata = read_items(&[encode_atom(b"disk", &encode_data(21, &[0, 4]))], true).build();
        assert_eq!(metadata.disc_number, None);
    }

    #[test]
    fn multiple_data_children_accumulate() {
        let mut payload = encode_data(1, b"Rock");
        payload.extend(encode_data(1, b"Pop"));
        let metadata = read_items(&[encode_atom(b"\xA9gen", &payload)], true).build();
        assert_eq!(metadata.genres.len(), 2);
    }

    #[test]
    fn binary_genre_is_one_based() {
        let metadata = read_items(&[encode_atom(b"gnre", &encode_data(0, &[0, 18]))], true).build();
        assert!(metadata.genres.contains("Rock"));
    }

    #[test]
    fn freeform_artists() {
        let mut payload = encode_atom(MEAN, b"\0\0\0\0com.apple.iTunes");
        payload.extend(encode_atom(NAME, b"\0\0\0\0ARTISTS"));
        payload.extend(encode_data(1, b"First"));
        payload.extend(encode_data(1, b"Second"));
        let metadata = read_items(&[encode_atom(FREEFORM, &payload)], true).build();
        assert_eq!(metadata.artists.len(), 2);
    }

    #[test]
    fn unknown_freeform_is_skipped() {
        let mut payload = encode_atom(MEAN, b"\0\0\0\0com.apple.iTunes");
        payload.extend(encode_atom(NAME, b"\0\0\0\0iTunSMPB"));
        payload.extend(encode_data(1, b"00000000"));
        let metadata = read_items(&[encode_atom(FREEFORM, &payload)], true).build();
        assert!(metadata.is_empty());
    }

    #[test]
    fn cover_images() {
        let mut payload = encode_data(13, &[0xFF, 0xD8]);
        payload.extend(encode_data(14, &[0x89, b'P']));
        let covr = encode_atom(b"covr", &payload);
        let metadata = read_items(&[covr.clone()], true).build();
        assert_eq!(metadata.artworks.len(), 2);
        assert_eq!(metadata.artworks[0].format, ArtworkFormat::Jpeg);
        assert_eq!(metadata.artworks[1].format, ArtworkFormat::Png);

        assert!(read_items(&[covr], false).build().artworks.is_empty());
    }

    #[test]
    fn child_overrunning_item_is_protocol_error() {
        let mut item = encode_atom(b"\xA9nam", &encode_data(1, b"Title"));
        // shrink the item so its data child no longer fits
        item[3] -= 4;
        let mut reader = ByteReader::new(Cursor::new(&item[..]));
        let header = AtomHeader::read(&mut reader).unwrap();
        let mut metadata = Mp4Metadata::default();
        assert!(matches!(
            metadata.read_item(&mut reader, &header, true),
            Err(Error::ProtocolError(_))
        ));
    }
}
