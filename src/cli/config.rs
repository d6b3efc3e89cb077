// CLI configuration
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use sonotag::ParseOptions;

/// Sonotag - read tags and stream properties from audio files
#[derive(Parser, Debug)]
#[command(name = "sonotag")]
#[command(about = "Read tags and stream properties from MP3, FLAC, Ogg Vorbis and MP4 files", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Quiet mode (only errors are logged or printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Skip embedded pictures
    #[arg(long, global = true)]
    pub no_artwork: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON, one document per line
    Json,
    /// Key-value pairs
    KeyValue,
    /// Table format
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read metadata from audio file(s)
    Read {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Container MIME type (defaults to one derived from the extension)
        #[arg(short, long)]
        mime: Option<String>,

        /// Output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect file format from leading bytes
    Detect {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Read every matching file under a directory
    Batch {
        /// Directory path
        #[arg(short, long)]
        directory: PathBuf,

        /// File pattern (e.g., "*.mp3", "*.flac")
        #[arg(short, long, default_value = "*")]
        pattern: String,
    },

    /// Export cover art
    ExportCover {
        /// Audio file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory for cover images
        #[arg(short, long)]
        output: PathBuf,

        /// Cover index (for files with multiple covers)
        #[arg(short, long)]
        index: Option<usize>,
    },
}

impl Config {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new().read_artwork(!self.no_artwork)
    }

    /// Default log filter derived from `-v`/`-q`
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let config = Config::parse_from(["sonotag", "read", "a.mp3", "-vv", "--no-artwork", "-f", "table"]);
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.log_level(), "debug");
        assert!(!config.parse_options().read_artwork);
        match config.command {
            Commands::Read { files, mime, output } => {
                assert_eq!(files, vec![PathBuf::from("a.mp3")]);
                assert_eq!(mime, None);
                assert_eq!(output, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn quiet_wins_over_verbose() {
        let config = Config::parse_from(["sonotag", "-q", "-v", "detect", "x.flac"]);
        assert_eq!(config.log_level(), "error");
    }

    #[test]
    fn batch_pattern_defaults_to_everything() {
        let config = Config::parse_from(["sonotag", "batch", "--directory", "music"]);
        match config.command {
            Commands::Batch { directory, pattern } => {
                assert_eq!(directory, PathBuf::from("music"));
                assert_eq!(pattern, "*");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
