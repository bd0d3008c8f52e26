use crate::kind::GeometryKind;
use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};

/// Geometry as assembled. Polygon rings are kept exactly as built, so an
/// unclosed ring stays unclosed until converted with [`Shape::to_geometry`].
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Coord<f64>),
    LineString(Vec<Coord<f64>>),
    Polygon(Vec<Coord<f64>>),
    MultiPoint(Vec<Coord<f64>>),
    MultiLineString(Vec<Vec<Coord<f64>>>),
    MultiPolygon(Vec<Vec<Coord<f64>>>),
}

impl Shape {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Point(_) | Shape::MultiPoint(_) => GeometryKind::Point,
            Shape::LineString(_) | Shape::MultiLineString(_) => GeometryKind::LineString,
            Shape::Polygon(_) | Shape::MultiPolygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Shape::MultiPoint(_) | Shape::MultiLineString(_) | Shape::MultiPolygon(_)
        )
    }

    pub fn num_coords(&self) -> usize {
        match self {
            Shape::Point(_) => 1,
            Shape::LineString(coords) | Shape::Polygon(coords) | Shape::MultiPoint(coords) => {
                coords.len()
            }
            Shape::MultiLineString(parts) | Shape::MultiPolygon(parts) => {
                parts.iter().map(Vec::len).sum()
            }
        }
    }

    /// Convert for hosts. `geo_types` closes polygon rings on construction.
    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Shape::Point(coord) => Geometry::Point(Point::from(*coord)),
            Shape::LineString(coords) => Geometry::LineString(LineString::from(coords.clone())),
            Shape::Polygon(ring) => Geometry::Polygon(polygon(ring)),
            Shape::MultiPoint(coords) => Geometry::MultiPoint(MultiPoint::new(
                coords.iter().copied().map(Point::from).collect(),
            )),
            Shape::MultiLineString(parts) => Geometry::MultiLineString(MultiLineString::new(
                parts.iter().cloned().map(LineString::from).collect(),
            )),
            Shape::MultiPolygon(rings) => Geometry::MultiPolygon(MultiPolygon::new(
                rings.iter().map(|r| polygon(r)).collect(),
            )),
        }
    }
}

fn polygon(ring: &[Coord<f64>]) -> Polygon<f64> {
    Polygon::new(LineString::from(ring.to_vec()), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    #[test]
    fn open_ring_is_closed_on_conversion() {
        let shape = Shape::Polygon(vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 1.0, y: 1.0 },
        ]);
        let Geometry::Polygon(polygon) = shape.to_geometry() else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.exterior().0.len(), 4);
        assert_eq!(shape.num_coords(), 3);
    }

    #[test]
    fn kinds_of_multi_shapes() {
        let shape = Shape::MultiLineString(vec![vec![coord! { x: 0.0, y: 0.0 }]]);
        assert_eq!(shape.kind(), GeometryKind::LineString);
        assert!(shape.is_multi());
        assert!(!Shape::Point(coord! { x: 0.0, y: 0.0 }).is_multi());
    }
}
