// CLI command implementations
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use sonotag::{AudioFormat, Metadata, ParseOptions, StreamInfo};

use crate::cli::{Commands, Config, OutputFormatter};

/// Everything printed for one file
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub metadata: Metadata,
    pub stream_info: StreamInfo,
}

/// Run the selected subcommand; returns the number of files that failed
pub fn run(config: &Config) -> Result<usize> {
    let formatter = OutputFormatter::new(config.format, config.quiet);
    let options = config.parse_options();

    match &config.command {
        Commands::Read { files, mime, output } => {
            command_read(files, mime.as_deref(), output.as_deref(), options, &formatter)
        }
        Commands::Detect { files } => command_detect(files, &formatter),
        Commands::Batch { directory, pattern } => command_batch(directory, pattern, options, &formatter),
        Commands::ExportCover {
            file,
            output,
            index,
        } => command_export_cover(file, output, *index, &formatter).map(|_| 0),
    }
}

/// Choose a container: explicit MIME type, then extension, then leading bytes
fn resolve_format(path: &Path, mime: Option<&str>) -> Result<AudioFormat> {
    if let Some(mime) = mime {
        return AudioFormat::from_mime_type(mime).ok_or_else(|| anyhow!("unsupported MIME type {}", mime));
    }
    if let Some(format) = AudioFormat::from_extension(path) {
        return Ok(format);
    }
    sniff_file(path)?.ok_or_else(|| anyhow!("unrecognised audio format"))
}

fn sniff_file(path: &Path) -> Result<Option<AudioFormat>> {
    let mut head = Vec::with_capacity(12);
    File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .take(12)
        .read_to_end(&mut head)?;
    Ok(AudioFormat::sniff(&head))
}

/// Parse one file into a report
pub fn read_file(path: &Path, mime: Option<&str>, options: ParseOptions) -> Result<FileReport> {
    let format = resolve_format(path, mime)?;
    debug!(path = %path.display(), %format, "reading");
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let audio = sonotag::read_format(BufReader::new(file), format, options)
        .with_context(|| format!("failed to parse {} as {}", path.display(), format))?;

    Ok(FileReport {
        path: path.to_path_buf(),
        format,
        metadata: audio.metadata().clone(),
        stream_info: audio.stream_info().clone(),
    })
}

/// Read metadata from files
fn command_read(
    files: &[PathBuf],
    mime: Option<&str>,
    output: Option<&Path>,
    options: ParseOptions,
    formatter: &OutputFormatter,
) -> Result<usize> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    let mut failures = 0;
    for path in files {
        match read_file(path, mime, options) {
            Ok(report) => {
                formatter.output_report(&serde_json::to_value(&report)?, &mut *writer)?;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {:#}", path.display(), e));
                failures += 1;
            }
        }
    }
    writer.flush()?;
    Ok(failures)
}

/// Detect file format
fn command_detect(files: &[PathBuf], formatter: &OutputFormatter) -> Result<usize> {
    let mut failures = 0;
    for path in files {
        match sniff_file(path) {
            Ok(Some(format)) => println!("{}: {} ({})", path.display(), format, format.mime_type()),
            Ok(None) => {
                formatter.print_error(&format!("{}: Unknown format", path.display()));
                failures += 1;
            }
            Err(e) => {
                formatter.print_error(&format!("{}: {:#}", path.display(), e));
                failures += 1;
            }
        }
    }
    Ok(failures)
}

/// Files under `directory` matching `pattern`; a bare name searches recursively
pub fn find_files(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
        directory.join(pattern)
    } else {
        directory.join("**").join(pattern)
    };
    let glob_pattern = glob_pattern
        .to_str()
        .ok_or_else(|| anyhow!("directory is not valid UTF-8"))?
        .to_string();

    let mut files = Vec::new();
    for entry in glob::glob(&glob_pattern).with_context(|| format!("invalid glob pattern {}", glob_pattern))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => debug!("skipping unreadable path: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

/// Batch process directory
fn command_batch(
    directory: &Path,
    pattern: &str,
    options: ParseOptions,
    formatter: &OutputFormatter,
) -> Result<usize> {
    let files: Vec<PathBuf> = find_files(directory, pattern)?
        .into_iter()
        .filter(|path| AudioFormat::from_extension(path).is_some())
        .collect();

    let total = files.len();
    if total == 0 {
        formatter.print_info("No audio files found matching pattern");
        return Ok(0);
    }
    info!(total, directory = %directory.display(), "batch read");

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut error_count = 0;
    for path in &files {
        match read_file(path, None, options) {
            Ok(report) => formatter.output_report(&serde_json::to_value(&report)?, &mut writer)?,
            Err(e) => {
                formatter.print_error(&format!("{}: {:#}", path.display(), e));
                error_count += 1;
            }
        }
    }

    formatter.print_info(&format!(
        "Completed: {} successful, {} errors",
        total - error_count,
        error_count
    ));
    Ok(error_count)
}

/// Export cover art; writes every picture unless `index` picks one
pub fn export_covers(file: &Path, output_dir: &Path, index: Option<usize>) -> Result<Vec<PathBuf>> {
    let report = read_file(file, None, ParseOptions::default())?;
    let artworks = &report.metadata.artworks;
    if artworks.is_empty() {
        bail!("{} has no embedded pictures", file.display());
    }

    let selected: Vec<(usize, &sonotag::Artwork)> = match index {
        Some(index) => {
            let artwork = artworks
                .get(index)
                .ok_or_else(|| anyhow!("cover index {} out of range ({} available)", index, artworks.len()))?;
            vec![(index, artwork)]
        }
        None => artworks.iter().enumerate().collect(),
    };

    fs::create_dir_all(output_dir).with_context(|| format!("failed to create {}", output_dir.display()))?;
    let stem = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cover".to_string());

    let mut written = Vec::new();
    for (position, artwork) in selected {
        let name = if artworks.len() == 1 {
            format!("{}-cover.{}", stem, artwork.format.extension())
        } else {
            format!("{}-cover-{}.{}", stem, position, artwork.format.extension())
        };
        let target = output_dir.join(name);
        fs::write(&target, &artwork.data).with_context(|| format!("failed to write {}", target.display()))?;
        written.push(target);
    }
    Ok(written)
}

fn command_export_cover(
    file: &Path,
    output_dir: &Path,
    index: Option<usize>,
    formatter: &OutputFormatter,
) -> Result<()> {
    for path in export_covers(file, output_dir, index)? {
        formatter.print_success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}
