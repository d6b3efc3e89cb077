// Encoding utilities

use encoding_rs::{mem, UTF_16BE, UTF_16LE, UTF_8};

/// ID3v2 text encodings, selected by the first byte of a text frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Iso8859_1 = 0,
    Utf16 = 1,
    Utf16BE = 2,
    Utf8 = 3,
}

impl TextEncoding {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => TextEncoding::Utf16,
            2 => TextEncoding::Utf16BE,
            3 => TextEncoding::Utf8,
            _ => TextEncoding::Iso8859_1,
        }
    }

    /// Terminator between strings in this encoding
    pub fn delimiter(self) -> &'static [u8] {
        match self {
            TextEncoding::Utf16 | TextEncoding::Utf16BE => &[0, 0],
            TextEncoding::Iso8859_1 | TextEncoding::Utf8 => &[0],
        }
    }

    fn is_wide(self) -> bool {
        matches!(self, TextEncoding::Utf16 | TextEncoding::Utf16BE)
    }
}

/// Decode text with specified encoding
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Iso8859_1 => mem::decode_latin1(data).into_owned(),
        TextEncoding::Utf16 => {
            // BOM decides the byte order; little-endian when it is missing
            if data.starts_with(&[0xFF, 0xFE]) {
                UTF_16LE.decode_without_bom_handling(&data[2..]).0.into_owned()
            } else if data.starts_with(&[0xFE, 0xFF]) {
                UTF_16BE.decode_without_bom_handling(&data[2..]).0.into_owned()
            } else {
                UTF_16LE.decode_without_bom_handling(data).0.into_owned()
            }
        }
        TextEncoding::Utf16BE => UTF_16BE.decode_without_bom_handling(data).0.into_owned(),
        TextEncoding::Utf8 => UTF_8.decode_with_bom_removal(data).0.into_owned(),
    }
}

/// Encode text with specified encoding
pub fn encode_text(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Iso8859_1 => mem::encode_latin1_lossy(text).into_owned(),
        TextEncoding::Utf16 => {
            let mut bytes = vec![0xFF, 0xFE];
            bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
            bytes
        }
        TextEncoding::Utf16BE => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
    }
}

/// Index of the string terminator for `encoding`.
///
/// UTF-16 terminators are only matched on code-unit boundaries so a zero high
/// byte followed by a zero low byte is not mistaken for the end of the string.
pub fn find_terminator(data: &[u8], encoding: TextEncoding) -> Option<usize> {
    if encoding.is_wide() {
        data.chunks_exact(2)
            .position(|unit| unit == [0, 0])
            .map(|i| i * 2)
    } else {
        data.iter().position(|&b| b == 0)
    }
}

/// Split `data` at the first terminator, returning the string bytes and the
/// remainder after the terminator. Without a terminator everything is text.
pub fn split_terminated(data: &[u8], encoding: TextEncoding) -> (&[u8], &[u8]) {
    match find_terminator(data, encoding) {
        Some(end) => (&data[..end], &data[end + encoding.delimiter().len()..]),
        None => (data, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TextEncoding; 4] = [
        TextEncoding::Iso8859_1,
        TextEncoding::Utf16,
        TextEncoding::Utf16BE,
        TextEncoding::Utf8,
    ];

    #[test]
    fn every_encoding_round_trips() {
        for encoding in ALL {
            for text in ["Test Song", "Café del Mar", "Motörhead"] {
                let encoded = encode_text(text, encoding);
                assert_eq!(decode_text(&encoded, encoding), text, "{:?}", encoding);
            }
        }
    }

    #[test]
    fn wide_encodings_round_trip_non_latin_text() {
        for encoding in [TextEncoding::Utf16, TextEncoding::Utf16BE, TextEncoding::Utf8] {
            let text = "東京事変 群青日和";
            assert_eq!(decode_text(&encode_text(text, encoding), encoding), text);
        }
    }

    #[test]
    fn latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0x80..=0xFF).collect();
        let decoded = decode_text(&bytes, TextEncoding::Iso8859_1);
        assert_eq!(decoded.chars().count(), bytes.len());
        assert_eq!(decoded.chars().next(), Some('\u{80}'));
        assert_eq!(encode_text(&decoded, TextEncoding::Iso8859_1), bytes);
    }

    #[test]
    fn utf16_bom_selects_byte_order() {
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x41], TextEncoding::Utf16), "A");
        assert_eq!(decode_text(&[0xFF, 0xFE, 0x41, 0x00], TextEncoding::Utf16), "A");
        assert_eq!(decode_text(&[0x41, 0x00], TextEncoding::Utf16), "A");
    }

    #[test]
    fn utf16_terminator_is_aligned() {
        // "A" (41 00) then terminator (00 00) then "B" (42 00)
        let data = [0x41, 0x00, 0x00, 0x00, 0x42, 0x00];
        assert_eq!(find_terminator(&data, TextEncoding::Utf16), Some(2));
        let (text, rest) = split_terminated(&data, TextEncoding::Utf16);
        assert_eq!(text, &[0x41, 0x00]);
        assert_eq!(rest, &[0x42, 0x00]);
    }

    #[test]
    fn missing_terminator_keeps_all_text() {
        let (text, rest) = split_terminated(b"abc", TextEncoding::Utf8);
        assert_eq!(text, b"abc");
        assert!(rest.is_empty());
    }
}
