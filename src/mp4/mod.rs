// MP4/M4A format support
//
// MP4 format uses "atoms" (boxes) to store metadata.
// iTunes-style metadata is stored in ilst atom under moov/udta/meta.
//
// MP4 File Structure:
// - ftyp: File type atom
// - moov: Movie atom (container)
//   - mvhd: Movie header (timescale, duration)
//   - trak/mdia/minf/stbl: Track sample tables
//     - stsd: Sample descriptions (mp4a, alac)
//     - stts: Decoding time to sample
//   - udta: User data atom
//     - meta: Metadata atom
//       - ilst: Information list atom (contains metadata items)
// - mdat: Media data atom
//
// Containers are walked as if their children followed the header directly, so
// the whole file is one flat sequence of atoms.

pub mod atoms;
pub mod metadata;

use std::io::BufRead;

use tracing::{debug, trace};

use crate::config::ParseOptions;
use crate::error::{Error, Result};
use crate::model::{duration_ms, BuildMetadata, Metadata, StreamInfo};
use crate::utils::ByteReader;
use crate::AudioParser;

use atoms::{AtomHeader, ALAC, CONTAINERS, ILST, MP4A, MVHD, STTS, TRAK};
pub use metadata::Mp4Metadata;

/// Parsed MP4 audio file
#[derive(Debug)]
pub struct Mpeg4 {
    metadata: Metadata,
    stream_info: StreamInfo,
}

/// Stream characteristics collected while walking
#[derive(Debug, Default)]
struct Mp4Stream {
    info: StreamInfo,
    /// The current `trak` has an audio sample entry
    audio_track: bool,
}

impl Mpeg4 {
    pub fn read<R: BufRead>(input: R) -> Result<Self> {
        Self::read_with_options(input, ParseOptions::default())
    }

    pub fn read_with_options<R: BufRead>(input: R, options: ParseOptions) -> Result<Self> {
        let mut reader = ByteReader::new(input);
        let mut metadata = Mp4Metadata::default();
        let mut stream = Mp4Stream::default();
        // end offset of the `ilst` atom once it has been entered
        let mut ilst_end: Option<u64> = None;

        if reader.is_exhausted()? {
            return Err(Error::truncated(8, 0));
        }
        while !reader.is_exhausted()? {
            let header = AtomHeader::read(&mut reader)?;
            trace!(atom = %header.name_lossy(), size = ?header.size, offset = reader.position(), "atom");

            let in_ilst = ilst_end.is_some_and(|end| reader.position() <= end);
            if let Some((_, skip)) = CONTAINERS.iter().find(|(name, _)| header.is(name)) {
                if header.is(ILST) {
                    ilst_end = Some(
                        header
                            .payload_size()
                            .map_or(u64::MAX, |payload| reader.position().saturating_add(payload)),
                    );
                }
                reader.skip(*skip)?;
                if header.is(TRAK) {
                    stream.audio_track = false;
                }
                continue;
            }

            let Some(payload) = header.payload_size() else {
                debug!(atom = %header.name_lossy(), "atom runs to the end of the stream");
                break;
            };

            if in_ilst && Mp4Metadata::recognises(&header) {
                metadata.read_item(&mut reader, &header, options.read_artwork)?;
            } else if options.read_stream_info && header.is(MVHD) {
                stream.read_mvhd(&mut reader, payload)?;
            } else if options.read_stream_info && (header.is(MP4A) || header.is(ALAC)) {
                stream.read_sample_entry(&mut reader, &header, payload)?;
            } else if options.read_stream_info && header.is(STTS) && stream.audio_track {
                stream.read_stts(&mut reader, payload)?;
            } else {
                reader.skip(payload)?;
            }
        }

        Ok(Mpeg4 {
            metadata: metadata.build(),
            stream_info: stream.info,
        })
    }
}

impl Mp4Stream {
    /// Movie header: duration over timescale
    fn read_mvhd<R: BufRead>(&mut self, reader: &mut ByteReader<R>, payload: u64) -> Result<()> {
        let version = reader.read_u8()?;
        // flags
        reader.skip(3)?;
        let (timescale, length, consumed) = if version == 0 {
            // creation and modification times
            reader.skip(8)?;
            let timescale = reader.read_u32_be()?;
            let length = u64::from(reader.read_u32_be()?);
            (timescale, length, 20)
        } else {
            reader.skip(16)?;
            let timescale = reader.read_u32_be()?;
            let length = reader.read_u64_be()?;
            (timescale, length, 32)
        };
        reader.skip(remaining(payload, consumed, "mvhd")?)?;

        self.info.duration = duration_ms(length, u64::from(timescale));
        debug!(timescale, length, duration = ?self.info.duration, "movie header");
        Ok(())
    }

    /// `mp4a`/`alac` sample entry: channels, sample size and 16.16 sample rate
    fn read_sample_entry<R: BufRead>(
        &mut self,
        reader: &mut ByteReader<R>,
        header: &AtomHeader,
        payload: u64,
    ) -> Result<()> {
        // reserved, data reference index, version, revision, vendor
        reader.skip(16)?;
        let channels = u32::from(reader.read_u16_be()?);
        let bits_per_sample = u32::from(reader.read_u16_be()?);
        // compression id, packet size
        reader.skip(4)?;
        let sample_rate = u64::from(reader.read_u32_be()? >> 16);
        reader.skip(remaining(payload, 28, "sample entry")?)?;

        let codec = if header.is(ALAC) { "ALAC" } else { "AAC" };
        self.info.channels = Some(channels);
        self.info.bits_per_sample = Some(bits_per_sample);
        self.info.sample_rate = Some(sample_rate);
        self.info.bitrate = Some(u64::from(bits_per_sample) * sample_rate * u64::from(channels));
        self.info.codec = Some(codec.to_string());
        self.audio_track = true;
        debug!(codec, channels, sample_rate, "audio sample entry");
        Ok(())
    }

    /// Time-to-sample table: total samples is the sum of count × delta
    fn read_stts<R: BufRead>(&mut self, reader: &mut ByteReader<R>, payload: u64) -> Result<()> {
        // version and flags
        reader.skip(4)?;
        let entries = reader.read_u32_be()?;
        let table_size = u64::from(entries) * 8;
        let rest = remaining(payload, 8, "stts")?;
        if table_size > rest {
            return Err(Error::protocol(format!(
                "stts declares {} entries but holds {} bytes",
                entries, rest
            )));
        }

        let mut samples = 0u64;
        for _ in 0..entries {
            let count = u64::from(reader.read_u32_be()?);
            let delta = u64::from(reader.read_u32_be()?);
            samples = samples.saturating_add(count.saturating_mul(delta));
        }
        reader.skip(rest - table_size)?;
        self.info.samples = Some(samples);
        Ok(())
    }
}

fn remaining(payload: u64, consumed: u64, atom: &str) -> Result<u64> {
    payload
        .checked_sub(consumed)
        .ok_or_else(|| Error::protocol(format!("{} atom too small", atom)))
}

impl AudioParser for Mpeg4 {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn stream_info(&self) -> &StreamInfo {
        &self.stream_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::atoms::{encode_atom, FTYP, MDIA, META, MINF, MOOV, STBL, STSD, UDTA};
    use crate::mp4::metadata::encode_data;
    use std::io::Cursor;

    fn mvhd(timescale: u32, length: u32) -> Vec<u8> {
        let mut payload = vec![0u8; 12];
        payload.extend_from_slice(&timescale.to_be_bytes());
        payload.extend_from_slice(&length.to_be_bytes());
        payload.extend_from_slice(&[0u8; 80]);
        encode_atom(MVHD, &payload)
    }

    fn mp4a(channels: u16, bits: u16, rate: u32) -> Vec<u8> {
        let mut payload = vec![0u8; 16];
        payload.extend_from_slice(&channels.to_be_bytes());
        payload.extend_from_slice(&bits.to_be_bytes());
        payload.extend_from_slice(&[0u8; 4]);
        payload.extend_from_slice(&(rate << 16).to_be_bytes());
        payload.extend(encode_atom(b"esds", &[0u8; 12]));
        encode_atom(MP4A, &payload)
    }

    fn stts(entries: &[(u32, u32)]) -> Vec<u8> {
        let mut payload = vec![0u8; 4];
        payload.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for (count, delta) in entries {
            payload.extend_from_slice(&count.to_be_bytes());
            payload.extend_from_slice(&delta.to_be_bytes());
        }
        encode_atom(STTS, &payload)
    }

    fn file(items: &[Vec<u8>]) -> Vec<u8> {
        let mut stsd_payload = vec![0, 0, 0, 0, 0, 0, 0, 1];
        stsd_payload.extend(mp4a(2, 16, 44_100));
        let stbl = [encode_atom(STSD, &stsd_payload), stts(&[(100, 1024), (1, 400)])].concat();
        let trak = encode_atom(
            TRAK,
            &encode_atom(MDIA, &encode_atom(MINF, &encode_atom(STBL, &stbl))),
        );

        let mut meta_payload = vec![0u8; 4];
        meta_payload.extend(encode_atom(b"hdlr", &[0u8; 25]));
        meta_payload.extend(encode_atom(ILST, &items.concat()));
        let udta = encode_atom(UDTA, &encode_atom(META, &meta_payload));

        let moov = encode_atom(MOOV, &[mvhd(1_000, 2_500), trak, udta].concat());
        let mut data = encode_atom(FTYP, b"M4A \0\0\0\0M4A mp42isom");
        data.extend(moov);
        data.extend(encode_atom(b"mdat", &[0u8; 32]));
        data
    }

    #[test]
    fn reads_items_and_stream_info() {
        let data = file(&[
            encode_atom(b"\xA9nam", &encode_data(1, b"Title")),
            encode_atom(b"trkn", &encode_data(0, &[0, 0, 0, 3, 0, 12, 0, 0])),
            encode_atom(b"\xA9too", &encode_data(1, b"Lavf60")),
        ]);
        let mp4 = Mpeg4::read(Cursor::new(data)).unwrap();

        let metadata = mp4.metadata();
        assert_eq!(metadata.title.as_deref(), Some("Title"));
        assert_eq!(metadata.track_number, Some(3));
        assert_eq!(metadata.track_total, Some(12));
        assert_eq!(metadata.encoder.as_deref(), Some("Lavf60"));

        let stream = mp4.stream_info();
        assert_eq!(stream.duration, Some(2_500));
        assert_eq!(stream.channels, Some(2));
        assert_eq!(stream.sample_rate, Some(44_100));
        assert_eq!(stream.bitrate, Some(1_411_200));
        assert_eq!(stream.samples, Some(102_800));
        assert_eq!(stream.codec.as_deref(), Some("AAC"));
    }

    #[test]
    fn stream_info_can_be_skipped() {
        let data = file(&[encode_atom(b"\xA9alb", &encode_data(1, b"Album"))]);
        let options = ParseOptions::new().read_stream_info(false);
        let mp4 = Mpeg4::read_with_options(Cursor::new(data), options).unwrap();
        assert_eq!(mp4.metadata().album.as_deref(), Some("Album"));
        assert_eq!(mp4.stream_info(), &StreamInfo::default());
    }

    #[test]
    fn item_names_outside_ilst_are_not_items() {
        // a top-level atom that happens to share an item name
        let mut data = encode_atom(b"\xA9nam", b"opaque bytes");
        data.extend(file(&[]));
        let mp4 = Mpeg4::read(Cursor::new(data)).unwrap();
        assert_eq!(mp4.metadata().title, None);
    }

    #[test]
    fn item_names_after_ilst_are_not_items() {
        let mut meta_payload = vec![0u8; 4];
        meta_payload.extend(encode_atom(ILST, &encode_atom(b"\xA9nam", &encode_data(1, b"Inside"))));
        let mut udta_payload = encode_atom(META, &meta_payload);
        // a sibling of `meta` sharing an item name
        udta_payload.extend(encode_atom(b"\xA9alb", &encode_data(1, b"Outside")));
        let data = encode_atom(MOOV, &encode_atom(UDTA, &udta_payload));

        let mp4 = Mpeg4::read(Cursor::new(data)).unwrap();
        assert_eq!(mp4.metadata().title.as_deref(), Some("Inside"));
        assert_eq!(mp4.metadata().album, None);
    }

    #[test]
    fn truncated_atom_fails() {
        let mut data = file(&[encode_atom(b"\xA9nam", &encode_data(1, b"Title"))]);
        data.truncate(data.len() - 45);
        assert!(Mpeg4::read(Cursor::new(data)).unwrap_err().is_truncated());
    }
}
