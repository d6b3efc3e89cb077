mod common;

use std::io::Cursor;

use common::*;
use sonotag::{AudioParser, ArtworkFormat, Error, Mpeg4};

#[test]
fn binary_track_number_and_total() {
    let data = mp4(&[atom(b"trkn", &data_atom(0, &[0, 0, 0, 3, 0, 12, 0, 0]))], 600, 0);
    let parsed = Mpeg4::read(Cursor::new(data)).unwrap();
    assert_eq!(parsed.metadata().track_number, Some(3));
    assert_eq!(parsed.metadata().track_total, Some(12));
}

#[test]
fn itunes_items() {
    let mut freeform = atom(b"mean", b"\0\0\0\0com.apple.iTunes");
    freeform.extend(atom(b"name", b"\0\0\0\0ARTISTS"));
    freeform.extend(data_atom(1, b"Guest"));

    let data = mp4(
        &[
            atom(b"\xA9nam", &data_atom(1, b"Title")),
            atom(b"\xA9ART", &data_atom(1, b"Lead")),
            atom(b"aART", &data_atom(1, b"Band")),
            atom(b"\xA9alb", &data_atom(1, b"Record")),
            atom(b"\xA9wrt", &data_atom(1, b"Writer")),
            atom(b"\xA9day", &data_atom(1, b"2015-11-20T08:00:00Z")),
            atom(b"disk", &data_atom(0, &[0, 0, 0, 2, 0, 2])),
            atom(b"gnre", &data_atom(0, &[0, 18])),
            atom(b"\xA9cmt", &data_atom(1, b"Remarks")),
            atom(b"\xA9lyr", &data_atom(1, b"Words")),
            atom(b"covr", &[data_atom(13, b"\xFF\xD8jpeg"), data_atom(14, b"\x89PNGpng")].concat()),
            atom(b"----", &freeform),
        ],
        44_100,
        441_000,
    );
    let parsed = Mpeg4::read(Cursor::new(data)).unwrap();
    let metadata = parsed.metadata();

    assert_eq!(metadata.title.as_deref(), Some("Title"));
    assert!(metadata.artists.contains("Lead") && metadata.artists.contains("Guest"));
    assert!(metadata.album_artists.contains("Band"));
    assert_eq!(metadata.album.as_deref(), Some("Record"));
    assert_eq!(metadata.composer.as_deref(), Some("Writer"));
    assert_eq!(metadata.year, Some(2015));
    assert_eq!((metadata.disc_number, metadata.disc_total), (Some(2), Some(2)));
    assert!(metadata.genres.contains("Rock"));
    assert!(metadata.comments.contains("Remarks"));
    assert_eq!(metadata.lyrics.as_deref(), Some("Words"));
    let formats: Vec<_> = metadata.artworks.iter().map(|art| art.format).collect();
    assert_eq!(formats, vec![ArtworkFormat::Jpeg, ArtworkFormat::Png]);

    assert_eq!(parsed.stream_info().duration, Some(10_000));
}

#[test]
fn extended_size_atoms() {
    let mut data = mp4(&[atom(b"\xA9nam", &data_atom(1, b"Big"))], 1_000, 500);
    // a 64-bit sized free atom after the movie
    data.extend_from_slice(&1u32.to_be_bytes());
    data.extend_from_slice(b"free");
    data.extend_from_slice(&24u64.to_be_bytes());
    data.extend_from_slice(&[0u8; 8]);

    let parsed = Mpeg4::read(Cursor::new(data)).unwrap();
    assert_eq!(parsed.metadata().title.as_deref(), Some("Big"));
    assert_eq!(parsed.stream_info().duration, Some(500));
}

#[test]
fn truncated_inside_item() {
    let mut data = mp4(&[atom(b"\xA9nam", &data_atom(1, b"Cut short"))], 1_000, 0);
    // drop mdat and the tail of the title
    data.truncate(data.len() - 24 - 4);
    assert!(matches!(Mpeg4::read(Cursor::new(data)), Err(Error::Truncated { .. })));
}

#[test]
fn integer_track_and_disc() {
    let data = mp4(
        &[
            atom(b"trkn", &data_atom(21, &[0, 1, 0, 7])),
            atom(b"disk", &data_atom(21, &[0, 0, 0, 2])),
        ],
        1_000,
        0,
    );
    let parsed = Mpeg4::read(Cursor::new(data)).unwrap();
    assert_eq!(parsed.metadata().track_number, Some(7));
    assert_eq!(parsed.metadata().disc_number, Some(2));
}
