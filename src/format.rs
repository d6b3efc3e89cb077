// Container identification by MIME type, file extension or leading bytes

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Containers this crate can parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Flac,
    Mp3,
    Mp4,
    Ogg,
}

impl AudioFormat {
    /// Map a declared container MIME type; parameters after `;` are ignored
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let essence = mime_type.split(';').next().unwrap_or_default();
        match essence.trim().to_ascii_lowercase().as_str() {
            "audio/flac" | "audio/x-flac" => Some(AudioFormat::Flac),
            "audio/mpeg" | "audio/mp3" => Some(AudioFormat::Mp3),
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Some(AudioFormat::Mp4),
            "audio/ogg" | "audio/vorbis" | "application/ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Mp4 => "audio/mp4",
            AudioFormat::Ogg => "audio/ogg",
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "flac" => Some(AudioFormat::Flac),
            "ogg" | "oga" => Some(AudioFormat::Ogg),
            "m4a" | "m4b" | "mp4" | "aac" => Some(AudioFormat::Mp4),
            _ => None,
        }
    }

    /// Identify a container from the first bytes of a file
    pub fn sniff(head: &[u8]) -> Option<Self> {
        if head.starts_with(b"ID3") {
            return Some(AudioFormat::Mp3);
        }
        if head.starts_with(crate::flac::FLAC_SIGNATURE) {
            return Some(AudioFormat::Flac);
        }
        if head.starts_with(crate::ogg::OGG_SIGNATURE) {
            return Some(AudioFormat::Ogg);
        }
        if head.get(4..8) == Some(&crate::mp4::atoms::FTYP[..]) {
            return Some(AudioFormat::Mp4);
        }
        // bare MPEG frame sync
        if head.len() >= 2 && head[0] == 0xFF && head[1] & 0xE0 == 0xE0 {
            return Some(AudioFormat::Mp3);
        }
        None
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioFormat::Flac => "FLAC",
            AudioFormat::Mp3 => "MP3",
            AudioFormat::Mp4 => "MP4",
            AudioFormat::Ogg => "Ogg",
        };
        f.write_str(name)
    }
}
