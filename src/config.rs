// Parser configuration

/// Controls which optional parts of a container are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Decode embedded pictures; when false they are skipped unread where the
    /// layout allows it
    pub read_artwork: bool,
    /// Derive stream characteristics (duration, bitrate, sample rate, ...)
    pub read_stream_info: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            read_artwork: true,
            read_stream_info: true,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_artwork(mut self, read_artwork: bool) -> Self {
        self.read_artwork = read_artwork;
        self
    }

    pub fn read_stream_info(mut self, read_stream_info: bool) -> Self {
        self.read_stream_info = read_stream_info;
        self
    }
}
