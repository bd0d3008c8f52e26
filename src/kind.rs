use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The shapes this crate builds from coordinate records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    #[default]
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    /// Minimum number of coordinate records needed to build one feature.
    pub fn arity_floor(self) -> usize {
        match self {
            GeometryKind::Point => 1,
            GeometryKind::LineString => 2,
            GeometryKind::Polygon => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
        }
    }

    /// Whether a host layer advertising `layer_type` (e.g. "MultiPolygon",
    /// "LineStringZ") can receive features of this kind.
    pub fn matches_layer(self, layer_type: &str) -> bool {
        layer_type
            .to_ascii_lowercase()
            .contains(&self.label().to_ascii_lowercase())
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GeometryKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "point" => Ok(GeometryKind::Point),
            "linestring" | "line" => Ok(GeometryKind::LineString),
            "polygon" => Ok(GeometryKind::Polygon),
            _ => Err(format!("invalid geometry type: {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_floors() {
        assert_eq!(GeometryKind::Point.arity_floor(), 1);
        assert_eq!(GeometryKind::LineString.arity_floor(), 2);
        assert_eq!(GeometryKind::Polygon.arity_floor(), 3);
    }

    #[test]
    fn multi_layers_accept_single_kind() {
        assert!(GeometryKind::Polygon.matches_layer("MultiPolygon"));
        assert!(GeometryKind::Point.matches_layer("Point25D"));
        assert!(!GeometryKind::LineString.matches_layer("Polygon"));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("LINESTRING".parse::<GeometryKind>(), Ok(GeometryKind::LineString));
        assert!("circle".parse::<GeometryKind>().is_err());
    }
}
