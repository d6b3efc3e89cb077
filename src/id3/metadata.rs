// Accumulates decoded ID3v2 frames and resolves them into `Metadata`

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::id3::frames::{decode_frame, frame_ids, DescriptionKind, Frame, TextWithDescription};
use crate::id3::genres::decode_genres;
use crate::id3::v2::Id3v2Tag;
use crate::model::{
    number_before_slash, number_after_slash, parse_date, Artwork, BuildMetadata, Values,
};

/// Frames collected from one tag. Repeated single-valued frames keep the first
/// occurrence.
#[derive(Debug, Default)]
pub struct Id3Metadata {
    text_frames: HashMap<String, Values>,
    described: Vec<TextWithDescription>,
    pictures: Vec<Artwork>,
}

impl Id3Metadata {
    pub fn from_tag(tag: &Id3v2Tag, read_artwork: bool) -> Self {
        let mut metadata = Id3Metadata::default();
        for frame in &tag.frames {
            match decode_frame(frame) {
                Some(Frame::Text { name, values }) => {
                    metadata
                        .text_frames
                        .entry(name)
                        .or_insert_with(|| values.into_iter().collect());
                }
                Some(Frame::Described(described)) => metadata.described.push(described),
                Some(Frame::Picture(artwork)) if read_artwork => metadata.pictures.push(artwork),
                Some(Frame::Picture(_)) | None => {}
            }
        }
        metadata
    }

    fn values(&self, names: &[&str]) -> Option<&Values> {
        names.iter().find_map(|name| self.text_frames.get(*name))
    }

    fn single(&self, names: &[&str]) -> Option<String> {
        self.values(names).and_then(Values::first).cloned()
    }

    /// Values of the first present frame, even when that frame is empty
    fn multiple(&self, names: &[&str]) -> Vec<String> {
        self.values(names).map(Values::to_vec).unwrap_or_default()
    }

    fn described(&self, kind: DescriptionKind) -> impl Iterator<Item = &TextWithDescription> {
        self.described.iter().filter(move |frame| frame.kind == kind)
    }

    /// `TXXX:genre` style fallbacks, NUL-separated
    fn described_genres(&self) -> Vec<String> {
        self.described
            .iter()
            .filter(|frame| frame.description.to_lowercase() == "genre")
            .flat_map(|frame| frame.text.split('\0'))
            .filter(|value| !value.trim().is_empty())
            .map(String::from)
            .collect()
    }
}

impl BuildMetadata for Id3Metadata {
    fn title(&self) -> Option<String> {
        self.single(&frame_ids::TITLE)
    }

    fn artists(&self) -> Vec<String> {
        self.multiple(&frame_ids::ARTIST)
    }

    fn album(&self) -> Option<String> {
        self.single(&frame_ids::ALBUM)
    }

    fn album_artists(&self) -> Vec<String> {
        self.multiple(&frame_ids::ALBUM_ARTIST)
    }

    fn composer(&self) -> Option<String> {
        self.single(&frame_ids::COMPOSER)
    }

    fn genres(&self) -> Vec<String> {
        match self.values(&frame_ids::GENRE) {
            Some(values) => decode_genres(values.to_vec()),
            None => decode_genres(self.described_genres()),
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        frame_ids::DATE
            .iter()
            .filter_map(|name| self.single(&[*name]))
            .filter(|value| !value.trim().is_empty())
            .find_map(|value| parse_date(&value))
    }

    fn track_number(&self) -> Option<u32> {
        self.single(&frame_ids::TRACK)
            .and_then(|value| number_before_slash(&value))
    }

    fn track_total(&self) -> Option<u32> {
        self.single(&frame_ids::TRACK)
            .and_then(|value| number_after_slash(&value))
    }

    fn disc_number(&self) -> Option<u32> {
        self.single(&frame_ids::DISC)
            .and_then(|value| number_before_slash(&value))
    }

    fn disc_total(&self) -> Option<u32> {
        self.single(&frame_ids::DISC)
            .and_then(|value| number_after_slash(&value))
    }

    fn encoder(&self) -> Option<String> {
        self.single(&frame_ids::ENCODER)
    }

    fn lyrics(&self) -> Option<String> {
        self.described(DescriptionKind::Lyrics)
            .map(|frame| frame.text.clone())
            .next()
    }

    /// iTunes stores normalisation and gapless data as `iTun*` comments
    fn comments(&self) -> Vec<String> {
        self.described(DescriptionKind::Comment)
            .filter(|frame| !frame.description.starts_with("iTun"))
            .map(|frame| frame.text.clone())
            .collect()
    }

    fn artworks(&self) -> Vec<Artwork> {
        self.pictures.clone()
    }
}
