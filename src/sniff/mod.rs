//! File format sniffing and coordinate file import.

use crate::logging::{self, SharedLogger};
use crate::parser::{CoordinateParser, CoordinateRecord, ParseOptions, Separator};
use encoding_rs::WINDOWS_1252;
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Largest file accepted for import.
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["txt", "csv", "dat", "xyz"];

/// Separators tried by [`detect`], in priority order.
const CANDIDATES: [&str; 4] = [",", "\t", " ", ";"];

const SAMPLE_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct FileFormat {
    pub separator: Separator,
    pub has_id: bool,
    pub field_count: usize,
}

impl FileFormat {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new(Some(self.separator.clone()), self.has_id)
    }
}

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("File is empty")]
    Empty,
    #[error("File is too large (>50MB)")]
    TooLarge,
    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),
    #[error("Error reading file: {0}")]
    Io(#[from] std::io::Error),
}

/// Guess separator and id column from the first data line of `content`.
///
/// `#` comment lines and blank lines are ignored. For each candidate
/// separator the line is split and empty tokens dropped; the first separator
/// leaving at least two tokens whose last two parse as numbers wins.
pub fn detect(content: &str) -> Option<FileFormat> {
    let samples: Vec<&str> = content
        .trim()
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .take(SAMPLE_LINES)
        .collect();

    let first = samples.first()?;

    CANDIDATES.iter().find_map(|sep| {
        let parts: Vec<&str> = first
            .split(sep)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.len() < 2 {
            return None;
        }

        let x = parts[parts.len() - 2].parse::<f64>();
        let y = parts[parts.len() - 1].parse::<f64>();
        if x.is_err() || y.is_err() {
            return None;
        }

        Some(FileFormat {
            separator: Separator::from_literal(sep),
            has_id: parts.len() > 2,
            field_count: parts.len(),
        })
    })
}

/// Gate a file before import: existence, size and extension.
pub fn validate_file(path: &Path) -> Result<(), FileError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(FileError::NotFound(path.display().to_string())),
    };

    if metadata.len() == 0 {
        return Err(FileError::Empty);
    }
    if metadata.len() > MAX_FILE_BYTES {
        return Err(FileError::TooLarge);
    }

    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        let shown = if ext.is_empty() {
            String::new()
        } else {
            format!(".{ext}")
        };
        return Err(FileError::UnsupportedExtension(shown));
    }

    Ok(())
}

pub struct FileImporter {
    parser: CoordinateParser,
    logger: SharedLogger,
}

impl Default for FileImporter {
    fn default() -> Self {
        Self::new(logging::noop())
    }
}

impl FileImporter {
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            parser: CoordinateParser::new(logger.clone()),
            logger,
        }
    }

    /// Read a whole file as text: UTF-8 first, then the single-byte legacy
    /// encoding. Reads at most [`MAX_FILE_BYTES`] + 1 bytes. Line endings
    /// come back as `\n`, whether the file used `\r\n`, `\r` or `\n`.
    pub fn read_file(&self, path: &Path) -> Result<String, FileError> {
        let file = fs::File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(path.display().to_string()),
            _ => FileError::Io(err),
        })?;

        let mut buffer = Vec::new();
        file.take(MAX_FILE_BYTES + 1).read_to_end(&mut buffer)?;
        if buffer.len() as u64 > MAX_FILE_BYTES {
            return Err(FileError::TooLarge);
        }

        let text = match String::from_utf8(buffer) {
            Ok(text) => text,
            Err(err) => {
                self.logger.info(&format!(
                    "{} is not UTF-8, decoding as {}",
                    path.display(),
                    WINDOWS_1252.name()
                ));
                // windows-1252 maps every byte, so this decode cannot fail.
                let bytes = err.into_bytes();
                let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
                decoded.into_owned()
            }
        };

        Ok(normalize_newlines(text))
    }

    /// Read, sniff and parse a coordinate file. A file whose format cannot be
    /// detected yields no records.
    pub fn import_file(&self, path: &Path) -> Result<Vec<CoordinateRecord>, FileError> {
        if !path.exists() {
            return Err(FileError::NotFound(path.display().to_string()));
        }

        let content = self.read_file(path)?;
        match detect(&content) {
            Some(format) => {
                self.logger.debug(&format!(
                    "Detected {} separator, has_id={}, {} field(s)",
                    format.separator, format.has_id, format.field_count
                ));
                Ok(self.parser.parse(&content, &format.parse_options()))
            }
            None => {
                self.logger
                    .warning(&format!("Could not detect format of {}", path.display()));
                Ok(Vec::new())
            }
        }
    }
}

fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

/// First `max_lines` lines of a file, plus `...` when it continues.
pub fn preview_file(path: &Path, max_lines: usize) -> Result<String, FileError> {
    let content = FileImporter::default().read_file(path)?;
    let mut lines = content.lines();
    let mut preview: Vec<&str> = lines.by_ref().take(max_lines).map(str::trim_end).collect();
    if lines.next().is_some() {
        preview.push("...");
    }
    Ok(preview.join("\n"))
}
