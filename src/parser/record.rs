use crate::value::AttrValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One parsed `[id] x y [extras]` tuple.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub extras: BTreeMap<String, AttrValue>,
}

impl CoordinateRecord {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            extras: BTreeMap::new(),
        }
    }

    /// Placeholder id for a record without one: `P<line>`.
    pub fn positional_id(line_number: usize) -> String {
        format!("P{line_number}")
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn coord(&self) -> geo_types::Coord<f64> {
        geo_types::coord! { x: self.x, y: self.y }
    }

    /// Render back to one input line.
    pub fn to_line(&self, separator: &Separator, with_id: bool) -> String {
        let sep = separator.as_str();
        if with_id {
            format!("{}{sep}{}{sep}{}", self.id, self.x, self.y)
        } else {
            format!("{}{sep}{}", self.x, self.y)
        }
    }
}

/// Column separator of a coordinate list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Separator {
    Space,
    Comma,
    Tab,
    /// Anything else; lines are split naively on this string.
    Other(String),
}

impl Separator {
    pub fn as_str(&self) -> &str {
        match self {
            Separator::Space => " ",
            Separator::Comma => ",",
            Separator::Tab => "\t",
            Separator::Other(sep) => sep,
        }
    }

    /// Guess from a sample line: comma, else tab, else space.
    pub fn detect(sample_line: &str) -> Self {
        if sample_line.contains(',') {
            Separator::Comma
        } else if sample_line.contains('\t') {
            Separator::Tab
        } else {
            Separator::Space
        }
    }

    pub fn from_literal(literal: &str) -> Self {
        match literal {
            " " => Separator::Space,
            "," => Separator::Comma,
            "\t" => Separator::Tab,
            other => Separator::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Separator::Space => f.write_str("space"),
            Separator::Comma => f.write_str("comma"),
            Separator::Tab => f.write_str("tab"),
            Separator::Other(sep) => write!(f, "{sep:?}"),
        }
    }
}

/// Accepts the names `space`, `comma`, `tab` (and `\t`), or a literal
/// separator string.
impl FromStr for Separator {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "" => Err("separator cannot be empty".to_string()),
            "space" => Ok(Separator::Space),
            "comma" => Ok(Separator::Comma),
            "tab" | "\\t" => Ok(Separator::Tab),
            "semicolon" => Ok(Separator::Other(";".to_string())),
            _ => Ok(Separator::from_literal(value)),
        }
    }
}

impl TryFrom<String> for Separator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Separator> for String {
    fn from(value: Separator) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_uses_fixed_priority() {
        assert_eq!(Separator::detect("1,2\t3"), Separator::Comma);
        assert_eq!(Separator::detect("1\t2 3"), Separator::Tab);
        assert_eq!(Separator::detect("1 2"), Separator::Space);
        assert_eq!(Separator::detect(""), Separator::Space);
    }

    #[test]
    fn names_and_literals() {
        assert_eq!("Tab".parse::<Separator>(), Ok(Separator::Tab));
        assert_eq!(",".parse::<Separator>(), Ok(Separator::Comma));
        assert_eq!(" ".parse::<Separator>(), Ok(Separator::Space));
        assert_eq!(
            "|".parse::<Separator>(),
            Ok(Separator::Other("|".to_string()))
        );
    }

    #[test]
    fn renders_line_with_and_without_id() {
        let record = CoordinateRecord::new("A", 1.5, -2.0);
        assert_eq!(record.to_line(&Separator::Comma, true), "A,1.5,-2");
        assert_eq!(record.to_line(&Separator::Tab, false), "1.5\t-2");
    }
}
