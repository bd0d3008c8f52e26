//! Per-line grammar for coordinate lists.
//!
//! Recognised separators use fixed-arity patterns:
//!
//! number   = "-"? DIGIT+ ("." DIGIT*)?
//! space    = number WS+ number
//! comma    = number "," WS* number
//! tab      = number TAB number
//! id_space = ID WS+ number WS+ number
//! id_comma = ID "," WS* number "," WS* number
//! id_tab   = ID TAB number TAB number
//!
//! where ID is a run of non-whitespace characters. Every pattern must consume
//! the whole (trimmed) line. Other separators split naively.

use super::record::Separator;
use thiserror::Error;
use winnow::combinator::opt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

type PResult<T> = Result<T, ErrMode<ContextError>>;

/// Why a single line was rejected. Never escapes the parser.
#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("Invalid format: expected {expected}, got '{line}'")]
    Pattern { expected: &'static str, line: String },
    #[error("could not convert '{0}' to a number")]
    Number(String),
}

/// Tokens of a successfully matched line.
#[derive(Debug, PartialEq)]
pub struct LineMatch<'a> {
    pub id: Option<&'a str>,
    pub x: f64,
    pub y: f64,
    /// Columns after `x y`, only collected when splitting.
    pub rest: Vec<&'a str>,
}

fn backtrack<T>() -> PResult<T> {
    Err(ErrMode::Backtrack(ContextError::default()))
}

/// Lex a number: optional minus, digits, optional fraction.
fn number(input: &mut &str) -> PResult<f64> {
    let start = *input;
    opt('-').parse_next(input)?;
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    opt('.').parse_next(input)?;
    take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;

    let text = &start[..start.len() - input.len()];
    text.parse::<f64>().or_else(|_| backtrack())
}

fn whitespace1(input: &mut &str) -> PResult<()> {
    take_while(1.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

fn comma(input: &mut &str) -> PResult<()> {
    ','.parse_next(input)?;
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

fn tab(input: &mut &str) -> PResult<()> {
    '\t'.void().parse_next(input)
}

fn end(input: &mut &str) -> PResult<()> {
    if input.is_empty() { Ok(()) } else { backtrack() }
}

fn id_token<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)
}

/// `number SEP number` to end of input.
fn pair(input: &mut &str, sep: fn(&mut &str) -> PResult<()>) -> PResult<(f64, f64)> {
    let x = number.parse_next(input)?;
    sep(input)?;
    let y = number.parse_next(input)?;
    end(input)?;
    Ok((x, y))
}

/// `SEP number SEP number` to end of input.
fn tail(input: &mut &str, sep: fn(&mut &str) -> PResult<()>) -> PResult<(f64, f64)> {
    sep(input)?;
    pair(input, sep)
}

fn id_space<'a>(input: &mut &'a str) -> PResult<(&'a str, f64, f64)> {
    let id = id_token(input)?;
    let (x, y) = tail(input, whitespace1)?;
    Ok((id, x, y))
}

fn id_tab<'a>(input: &mut &'a str) -> PResult<(&'a str, f64, f64)> {
    let id = id_token(input)?;
    let (x, y) = tail(input, tab)?;
    Ok((id, x, y))
}

/// The id may itself contain commas: try each comma inside the leading
/// non-whitespace run as the start of the `, x, y` tail.
fn id_comma<'a>(input: &mut &'a str) -> PResult<(&'a str, f64, f64)> {
    let line = *input;
    let run = line
        .find(char::is_whitespace)
        .unwrap_or(line.len());

    for (idx, _) in line[..run].match_indices(',').filter(|(idx, _)| *idx > 0) {
        let mut rest = &line[idx..];
        if let Ok((x, y)) = tail(&mut rest, comma) {
            *input = rest;
            return Ok((&line[..idx], x, y));
        }
    }
    backtrack()
}

fn pattern_error(separator: &Separator, has_id: bool, line: &str) -> LineError {
    let expected = match (separator, has_id) {
        (Separator::Space, false) => "X Y",
        (Separator::Comma, false) => "X,Y",
        (Separator::Tab, false) => "X<tab>Y",
        (Separator::Space, true) => "ID X Y",
        (Separator::Comma, true) => "ID,X,Y",
        (Separator::Tab, true) => "ID<tab>X<tab>Y",
        (Separator::Other(_), false) => "X Y",
        (Separator::Other(_), true) => "ID X Y",
    };
    LineError::Pattern {
        expected,
        line: line.to_string(),
    }
}

/// Match a trimmed, non-empty line against the fixed pattern for
/// `separator`, or split it naively for unrecognised separators.
pub fn match_line<'a>(
    line: &'a str,
    separator: &Separator,
    has_id: bool,
) -> Result<LineMatch<'a>, LineError> {
    let mut input = line;
    let result = match (separator, has_id) {
        (Separator::Other(sep), _) => return split_line(line, sep, has_id, false),
        (Separator::Space, false) => pair(&mut input, whitespace1).map(|(x, y)| (None, x, y)),
        (Separator::Comma, false) => pair(&mut input, comma).map(|(x, y)| (None, x, y)),
        (Separator::Tab, false) => pair(&mut input, tab).map(|(x, y)| (None, x, y)),
        (Separator::Space, true) => id_space(&mut input).map(|(id, x, y)| (Some(id), x, y)),
        (Separator::Comma, true) => id_comma(&mut input).map(|(id, x, y)| (Some(id), x, y)),
        (Separator::Tab, true) => id_tab(&mut input).map(|(id, x, y)| (Some(id), x, y)),
    };

    match result {
        Ok((id, x, y)) => Ok(LineMatch {
            id,
            x,
            y,
            rest: Vec::new(),
        }),
        Err(_) => Err(pattern_error(separator, has_id, line)),
    }
}

/// Naive split on `sep`. Requires `[id] x y`; further columns land in `rest`.
/// With `collapse`, empty tokens are dropped first (whitespace runs).
pub fn split_line<'a>(
    line: &'a str,
    sep: &str,
    has_id: bool,
    collapse: bool,
) -> Result<LineMatch<'a>, LineError> {
    split_with(line, sep, has_id, collapse, parse_float)
}

/// Split a line that carries extra columns. Recognised separators keep the
/// `number` grammar for `x y`; other separators fall back to [`split_line`].
pub fn split_columns<'a>(
    line: &'a str,
    separator: &Separator,
    has_id: bool,
) -> Result<LineMatch<'a>, LineError> {
    match separator {
        Separator::Other(sep) => split_line(line, sep, has_id, false),
        Separator::Space => split_with(line, " ", has_id, true, parse_number),
        Separator::Comma | Separator::Tab => {
            split_with(line, separator.as_str(), has_id, false, parse_number)
        }
    }
}

fn split_with<'a>(
    line: &'a str,
    sep: &str,
    has_id: bool,
    collapse: bool,
    parse: fn(&str) -> Result<f64, LineError>,
) -> Result<LineMatch<'a>, LineError> {
    let parts: Vec<&str> = if collapse {
        line.split(sep)
            .flat_map(|part| part.split_whitespace())
            .collect()
    } else {
        line.split(sep).collect()
    };

    let offset = usize::from(has_id);
    if parts.len() < offset + 2 {
        return Err(pattern_error(
            &Separator::Other(sep.to_string()),
            has_id,
            line,
        ));
    }

    let x = parse(parts[offset])?;
    let y = parse(parts[offset + 1])?;
    Ok(LineMatch {
        id: has_id.then(|| parts[0]),
        x,
        y,
        rest: parts[offset + 2..].to_vec(),
    })
}

fn parse_float(token: &str) -> Result<f64, LineError> {
    token
        .trim()
        .parse::<f64>()
        .map_err(|_| LineError::Number(token.to_string()))
}

/// A whole token through the `number` grammar.
fn parse_number(token: &str) -> Result<f64, LineError> {
    let mut input = token.trim();
    match number(&mut input) {
        Ok(value) if input.is_empty() => Ok(value),
        _ => Err(LineError::Number(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy(line: &str, sep: Separator, has_id: bool) -> Option<(Option<String>, f64, f64)> {
        match_line(line, &sep, has_id)
            .ok()
            .map(|m| (m.id.map(str::to_string), m.x, m.y))
    }

    #[test]
    fn space_pattern_accepts_any_whitespace_run() {
        assert_eq!(xy("1.5   -2", Separator::Space, false), Some((None, 1.5, -2.0)));
        assert_eq!(xy("1\t 2", Separator::Space, false), Some((None, 1.0, 2.0)));
    }

    #[test]
    fn comma_pattern_allows_space_after_comma_only() {
        assert_eq!(xy("1, 2", Separator::Comma, false), Some((None, 1.0, 2.0)));
        assert_eq!(xy("1 ,2", Separator::Comma, false), None);
    }

    #[test]
    fn number_forms() {
        assert_eq!(xy("10. 3", Separator::Space, false), Some((None, 10.0, 3.0)));
        assert_eq!(xy("+1 2", Separator::Space, false), None);
        assert_eq!(xy(".5 2", Separator::Space, false), None);
        assert_eq!(xy("1e5 2", Separator::Space, false), None);
    }

    #[test]
    fn fixed_arity_rejects_extra_columns() {
        assert_eq!(xy("1 2 3", Separator::Space, false), None);
        assert_eq!(xy("A 1 2 3", Separator::Space, true), None);
    }

    #[test]
    fn id_patterns() {
        assert_eq!(
            xy("A1 10 20", Separator::Space, true),
            Some((Some("A1".into()), 10.0, 20.0))
        );
        assert_eq!(
            xy("A1\t10\t20", Separator::Tab, true),
            Some((Some("A1".into()), 10.0, 20.0))
        );
        assert_eq!(
            xy("A1, 10,20", Separator::Comma, true),
            Some((Some("A1".into()), 10.0, 20.0))
        );
    }

    #[test]
    fn comma_id_may_contain_commas() {
        assert_eq!(
            xy("a,b,1,2", Separator::Comma, true),
            Some((Some("a,b".into()), 1.0, 2.0))
        );
    }

    #[test]
    fn numeric_id_is_accepted_as_id() {
        assert_eq!(
            xy("7 1 2", Separator::Space, true),
            Some((Some("7".into()), 1.0, 2.0))
        );
    }

    #[test]
    fn other_separator_splits_naively() {
        let m = match_line("1;2;9", &Separator::Other(";".into()), false).unwrap();
        assert_eq!((m.x, m.y), (1.0, 2.0));

        let err = match_line("1", &Separator::Other(";".into()), false).unwrap_err();
        assert!(matches!(err, LineError::Pattern { .. }));

        let err = match_line("P;x;2", &Separator::Other(";".into()), true).unwrap_err();
        assert_eq!(err, LineError::Number("x".into()));
    }

    #[test]
    fn split_collects_trailing_columns() {
        let m = split_line("A 1  2 300 oak", " ", true, true).unwrap();
        assert_eq!(m.id, Some("A"));
        assert_eq!(m.rest, vec!["300", "oak"]);
    }

    #[test]
    fn column_split_keeps_number_grammar() {
        for line in ["1e5 2 x", "+1 2 x", "inf 2 x", "nan 2 x", ".5 2 x"] {
            assert!(split_columns(line, &Separator::Space, false).is_err(), "{line}");
            assert!(match_line(line.trim_end_matches(" x"), &Separator::Space, false).is_err());
        }

        let m = split_columns("7,10.,-3,oak", &Separator::Comma, true).unwrap();
        assert_eq!((m.id, m.x, m.y), (Some("7"), 10.0, -3.0));
        assert_eq!(m.rest, vec!["oak"]);

        let m = split_columns("1;1e2;x", &Separator::Other(";".into()), false).unwrap();
        assert_eq!(m.y, 100.0);
    }
}
