//! Coordinate parser: free-form text to ordered coordinate records.
//!
//! Input is split into lines after trimming the whole text. Blank lines are
//! skipped but still count towards line numbers, so a record without an id
//! gets `P<line>` where `<line>` is its 1-based position in the split input.
//! Lines that do not match are skipped and reported through the injected
//! [`Logger`](crate::logging::Logger); they never fail the whole parse.

mod line;
mod record;

use line::LineError;
pub use record::{CoordinateRecord, Separator};

use crate::kind::GeometryKind;
use crate::logging::{self, SharedLogger};
use crate::value::AttrValue;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseOptions {
    /// `None` detects the separator from the first line.
    pub separator: Option<Separator>,
    /// Whether the first column holds point ids.
    pub has_id: bool,
    /// Names for columns after `x y`. Non-empty switches every line to
    /// split parsing so trailing columns can be captured.
    pub extra_columns: Vec<String>,
}

impl ParseOptions {
    pub fn new(separator: Option<Separator>, has_id: bool) -> Self {
        Self {
            separator,
            has_id,
            extra_columns: Vec::new(),
        }
    }
}

/// Structural problems with a parsed coordinate list.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("No coordinates provided")]
    NoCoordinates,
    #[error("{kind} geometry requires at least {required} {}", coordinate_noun(.required))]
    TooFew { kind: GeometryKind, required: usize },
    #[error("Invalid numeric values at position {position}")]
    NonNumeric { position: usize },
}

fn coordinate_noun(count: &usize) -> &'static str {
    if *count == 1 { "coordinate" } else { "coordinates" }
}

#[derive(Clone)]
pub struct CoordinateParser {
    logger: SharedLogger,
}

impl Default for CoordinateParser {
    fn default() -> Self {
        Self {
            logger: logging::noop(),
        }
    }
}

impl std::fmt::Debug for CoordinateParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateParser").finish_non_exhaustive()
    }
}

impl CoordinateParser {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }

    /// Parse `text` into records in input order.
    pub fn parse(&self, text: &str, options: &ParseOptions) -> Vec<CoordinateRecord> {
        let (lines, separator) = prepare(text, options);
        let results: Vec<_> = lines
            .iter()
            .map(|(number, line)| parse_numbered(*number, line, &separator, options))
            .collect();
        self.collect(results, lines.len())
    }

    /// Same result as [`parse`](Self::parse), with lines parsed on the rayon
    /// pool. Line numbers are fixed before dispatch.
    pub fn parse_parallel(&self, text: &str, options: &ParseOptions) -> Vec<CoordinateRecord> {
        let (lines, separator) = prepare(text, options);
        let results: Vec<_> = lines
            .par_iter()
            .map(|(number, line)| parse_numbered(*number, line, &separator, options))
            .collect();
        self.collect(results, lines.len())
    }

    fn collect(
        &self,
        results: Vec<Option<(usize, Result<CoordinateRecord, LineError>)>>,
        total: usize,
    ) -> Vec<CoordinateRecord> {
        let mut records = Vec::with_capacity(results.len());
        for (number, result) in results.into_iter().flatten() {
            match result {
                Ok(record) => records.push(record),
                Err(err) => self.logger.warning(&format!("Line {number}: {err}")),
            }
        }
        self.logger.debug(&format!(
            "Parsed {} coordinate(s) from {} line(s)",
            records.len(),
            total
        ));
        records
    }
}

/// Parse with a silent logger.
pub fn parse_text(text: &str, options: &ParseOptions) -> Vec<CoordinateRecord> {
    CoordinateParser::default().parse(text, options)
}

fn prepare<'a>(text: &'a str, options: &ParseOptions) -> (Vec<(usize, &'a str)>, Separator) {
    let lines: Vec<(usize, &str)> = text
        .trim()
        .split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .collect();

    let separator = options.separator.clone().unwrap_or_else(|| {
        let sample = lines.first().map_or("", |(_, line)| *line);
        Separator::detect(sample)
    });

    (lines, separator)
}

/// `None` for blank lines; otherwise the line number and the outcome.
fn parse_numbered(
    number: usize,
    raw: &str,
    separator: &Separator,
    options: &ParseOptions,
) -> Option<(usize, Result<CoordinateRecord, LineError>)> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }
    Some((number, parse_line(number, line, separator, options)))
}

fn parse_line(
    number: usize,
    line: &str,
    separator: &Separator,
    options: &ParseOptions,
) -> Result<CoordinateRecord, LineError> {
    let matched = if options.extra_columns.is_empty() {
        line::match_line(line, separator, options.has_id)?
    } else {
        line::split_columns(line, separator, options.has_id)?
    };

    let id = matched
        .id
        .map(str::to_string)
        .unwrap_or_else(|| CoordinateRecord::positional_id(number));

    let mut record = CoordinateRecord::new(id, matched.x, matched.y);
    for (name, token) in options.extra_columns.iter().zip(matched.rest) {
        record.extras.insert(name.clone(), AttrValue::String(token.to_string()));
    }
    Ok(record)
}

/// Check a record list can build `kind`.
pub fn validate(records: &[CoordinateRecord], kind: GeometryKind) -> Result<(), ValidationError> {
    if records.is_empty() {
        return Err(ValidationError::NoCoordinates);
    }

    if records.len() < kind.arity_floor() {
        return Err(ValidationError::TooFew {
            kind,
            required: kind.arity_floor(),
        });
    }

    if let Some(idx) = records
        .iter()
        .position(|r| !r.x.is_finite() || !r.y.is_finite())
    {
        return Err(ValidationError::NonNumeric { position: idx + 1 });
    }

    Ok(())
}

/// Short description of what would be built, listing the first five points.
pub fn preview_summary(records: &[CoordinateRecord], kind: GeometryKind) -> String {
    let mut out = format!("Preview: {} with {} points\n", kind, records.len());
    out.push_str("First few coordinates:\n");
    for (i, record) in records.iter().take(5).enumerate() {
        let label = if record.id.is_empty() {
            (i + 1).to_string()
        } else {
            record.id.clone()
        };
        out.push_str(&format!("  {}: ({:?}, {:?})\n", label, record.x, record.y));
    }
    if records.len() > 5 {
        out.push_str(&format!("  ... and {} more points", records.len() - 5));
    }
    out
}
