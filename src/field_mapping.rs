// Unified metadata field mapping system
//
// Each container names its fields differently:
// - ID3v2: Frame IDs (TIT2, TPE1, TALB, etc.), see `id3::frames::frame_ids`
// - FLAC/OGG: Vorbis Comment keys (title, artist, album, etc.), matched lower-cased
// - MP4: iTunes atoms (©nam, ©ART, ©alb, etc.) and freeform `----` atoms
//
// This module maps the Vorbis and MP4 names onto one set of canonical fields.

/// Canonical metadata fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardField {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Composer,
    Genre,
    Year,
    Track,
    Disc,
    Comment,
    Lyrics,
    Encoder,
    Picture,
}

impl StandardField {
    /// Canonical field name (lowercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardField::Title => "title",
            StandardField::Artist => "artist",
            StandardField::Album => "album",
            StandardField::AlbumArtist => "album_artist",
            StandardField::Composer => "composer",
            StandardField::Genre => "genre",
            StandardField::Year => "year",
            StandardField::Track => "track",
            StandardField::Disc => "disc",
            StandardField::Comment => "comment",
            StandardField::Lyrics => "lyrics",
            StandardField::Encoder => "encoder",
            StandardField::Picture => "picture",
        }
    }
}

/// Format-specific field mappings
pub struct FieldMappings;

impl FieldMappings {
    // Vorbis Comment keys (FLAC/OGG), in lookup order
    pub const VORBIS_TITLE: &'static [&'static str] = &["title"];
    pub const VORBIS_ARTIST: &'static [&'static str] = &["artist"];
    pub const VORBIS_ALBUM: &'static [&'static str] = &["album"];
    pub const VORBIS_ALBUM_ARTIST: &'static [&'static str] = &["albumartist", "album_artist"];
    pub const VORBIS_COMPOSER: &'static [&'static str] = &["composer", "performer", "artist"];
    pub const VORBIS_GENRE: &'static [&'static str] = &["genre"];
    pub const VORBIS_DATE: &'static [&'static str] = &["date"];
    pub const VORBIS_YEAR: &'static [&'static str] = &["year"];
    pub const VORBIS_TRACK: &'static [&'static str] = &["tracknumber"];
    pub const VORBIS_TRACK_TOTAL: &'static [&'static str] = &["tracktotal", "totaltracks"];
    pub const VORBIS_DISC: &'static [&'static str] = &["discnumber"];
    pub const VORBIS_DISC_TOTAL: &'static [&'static str] = &["disctotal", "totaldiscs"];
    pub const VORBIS_COMMENT: &'static [&'static str] = &["comment", "description"];
    pub const VORBIS_ENCODER: &'static [&'static str] = &["encoder"];
    pub const VORBIS_LYRICS: &'static [&'static str] = &["lyrics", "unsyncedlyrics"];
    /// Base64-encoded FLAC picture block
    pub const VORBIS_PICTURE: &'static str = "metadata_block_picture";

    // MP4 iTunes atoms (with special characters)
    pub const MP4_ATOMS: &'static [(&'static [u8; 4], StandardField)] = &[
        (b"\xA9alb", StandardField::Album),
        (b"\xA9ART", StandardField::Artist),
        (b"aART", StandardField::AlbumArtist),
        (b"\xA9cmt", StandardField::Comment),
        (b"\xA9day", StandardField::Year),
        (b"\xA9nam", StandardField::Title),
        (b"\xA9gen", StandardField::Genre),
        (b"gnre", StandardField::Genre),
        (b"trkn", StandardField::Track),
        (b"disk", StandardField::Disc),
        (b"\xA9wrt", StandardField::Composer),
        (b"covr", StandardField::Picture),
        (b"\xA9lyr", StandardField::Lyrics),
        (b"\xA9too", StandardField::Encoder),
    ];

    /// Freeform `----` atoms, keyed by `mean:name`
    pub const MP4_FREEFORM: &'static [(&'static str, StandardField)] =
        &[("com.apple.iTunes:ARTISTS", StandardField::Artist)];

    /// Convert an MP4 atom name to a standard field, ignoring ASCII case
    pub fn from_mp4(name: &[u8; 4]) -> Option<StandardField> {
        Self::MP4_ATOMS
            .iter()
            .find(|(atom, _)| atom.eq_ignore_ascii_case(name))
            .map(|(_, field)| *field)
    }

    /// Convert a freeform `mean:name` key to a standard field
    pub fn from_mp4_freeform(key: &str) -> Option<StandardField> {
        Self::MP4_FREEFORM
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, field)| *field)
    }
}
