//! Geometry assembly: coordinate records to feature records.
//!
//! Points yield one feature per record. Lines and polygons yield a single
//! feature through all records in input order, carrying the attributes of the
//! first record only; attributes of later records are dropped.

mod shape;

pub use shape::Shape;

use crate::kind::GeometryKind;
use crate::parser::CoordinateRecord;
use crate::schema::Schema;
use crate::value::AttrValue;
use geo::{Area, Euclidean, Length};
use geo_types::{Coord, LineString, Polygon};
use std::collections::HashMap;
use thiserror::Error;

/// Fields that receive a record's id, first match wins.
pub const ID_FIELDS: [&str; 6] = ["id", "ID", "fid", "FID", "name", "Name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Append the first vertex to an open polygon ring of 3+ points.
    pub auto_close: bool,
    /// Fill `length`, `area` and `perimeter` fields from the geometry.
    pub measure: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            auto_close: true,
            measure: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub shape: Shape,
    pub attributes: HashMap<String, AttrValue>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AssembleError {
    #[error("No parts provided for multi-part geometry")]
    NoParts,
    #[error("Part {0} has no coordinates")]
    EmptyPart(usize),
}

/// Build feature records for `kind` from `records`, placing attributes into
/// the fields of `schema`.
pub fn assemble(
    records: &[CoordinateRecord],
    kind: GeometryKind,
    schema: &Schema,
    options: AssembleOptions,
) -> Vec<FeatureRecord> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    match kind {
        GeometryKind::Point => records
            .iter()
            .map(|record| FeatureRecord {
                shape: Shape::Point(record.coord()),
                attributes: finish_attributes(place_attributes(record, schema), schema),
            })
            .collect(),

        GeometryKind::LineString => {
            let coords: Vec<Coord<f64>> = records.iter().map(CoordinateRecord::coord).collect();
            let mut attributes = place_attributes(first, schema);
            if options.measure {
                let length = Euclidean.length(&LineString::from(coords.clone()));
                set_measure(&mut attributes, schema, "length", length);
            }
            vec![FeatureRecord {
                shape: Shape::LineString(coords),
                attributes: finish_attributes(attributes, schema),
            }]
        }

        GeometryKind::Polygon => {
            let mut ring: Vec<Coord<f64>> = records.iter().map(CoordinateRecord::coord).collect();
            if options.auto_close {
                close_ring(&mut ring);
            }

            let mut attributes = place_attributes(first, schema);
            if options.measure {
                let polygon = Polygon::new(LineString::from(ring.clone()), vec![]);
                set_measure(&mut attributes, schema, "area", polygon.unsigned_area());
                set_measure(
                    &mut attributes,
                    schema,
                    "perimeter",
                    Euclidean.length(polygon.exterior()),
                );
            }
            vec![FeatureRecord {
                shape: Shape::Polygon(ring),
                attributes: finish_attributes(attributes, schema),
            }]
        }
    }
}

/// Combine groups of records into one multi-part shape. Polygon parts are
/// always closed.
pub fn assemble_multi(
    groups: &[Vec<CoordinateRecord>],
    kind: GeometryKind,
) -> Result<Shape, AssembleError> {
    if groups.is_empty() {
        return Err(AssembleError::NoParts);
    }
    if let Some(idx) = groups.iter().position(Vec::is_empty) {
        return Err(AssembleError::EmptyPart(idx + 1));
    }

    let parts = groups
        .iter()
        .map(|group| group.iter().map(CoordinateRecord::coord).collect::<Vec<_>>());

    let shape = match kind {
        GeometryKind::Point => Shape::MultiPoint(parts.flatten().collect()),
        GeometryKind::LineString => Shape::MultiLineString(parts.collect()),
        GeometryKind::Polygon => Shape::MultiPolygon(
            parts
                .map(|mut ring| {
                    close_ring(&mut ring);
                    ring
                })
                .collect(),
        ),
    };
    Ok(shape)
}

/// Close a ring of at least three vertices whose ends differ.
fn close_ring(ring: &mut Vec<Coord<f64>>) {
    if ring.len() < 3 {
        return;
    }
    let first = ring[0];
    if ring[ring.len() - 1] != first {
        ring.push(first);
    }
}

/// Write a record's id and extras into matching schema fields.
fn place_attributes(record: &CoordinateRecord, schema: &Schema) -> HashMap<String, AttrValue> {
    let mut attributes = HashMap::new();

    if let Some(field) = ID_FIELDS.iter().find_map(|name| schema.get(name)) {
        if let Some(value) = field
            .field_type
            .coerce(&AttrValue::String(record.id.clone()))
        {
            attributes.insert(field.name.clone(), value);
        }
    }

    for (key, value) in &record.extras {
        let Some(field) = schema.get(key) else {
            continue;
        };
        if let Some(value) = field.field_type.coerce(value) {
            attributes.insert(field.name.clone(), value);
        }
    }

    attributes
}

fn set_measure(
    attributes: &mut HashMap<String, AttrValue>,
    schema: &Schema,
    name: &str,
    measure: f64,
) {
    let Some(field) = schema.get(name) else {
        return;
    };
    if attributes.contains_key(name) {
        return;
    }
    if let Some(value) = field.field_type.coerce(&AttrValue::Double(measure)) {
        attributes.insert(field.name.clone(), value);
    }
}

/// Fill fields the record left empty with their schema defaults.
fn finish_attributes(
    mut attributes: HashMap<String, AttrValue>,
    schema: &Schema,
) -> HashMap<String, AttrValue> {
    for field in schema.fields() {
        if attributes.contains_key(&field.name) {
            continue;
        }
        if let Some(value) = field.default_value() {
            attributes.insert(field.name.clone(), value);
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, FieldType, defaults_for};

    fn rec(id: &str, x: f64, y: f64) -> CoordinateRecord {
        CoordinateRecord::new(id, x, y)
    }

    fn triangle() -> Vec<CoordinateRecord> {
        vec![rec("P1", 0.0, 0.0), rec("P2", 1.0, 0.0), rec("P3", 1.0, 1.0)]
    }

    fn schema(fields: Vec<FieldDefinition>) -> Schema {
        Schema::from_fields(fields).unwrap()
    }

    fn opts(auto_close: bool) -> AssembleOptions {
        AssembleOptions {
            auto_close,
            measure: false,
        }
    }

    #[test]
    fn polygon_auto_close_appends_first_vertex() {
        let features = assemble(&triangle(), GeometryKind::Polygon, &Schema::new(), opts(true));
        assert_eq!(features.len(), 1);
        let Shape::Polygon(ring) = &features[0].shape else {
            panic!("expected polygon");
        };
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[3], ring[0]);
    }

    #[test]
    fn polygon_without_auto_close_keeps_ring() {
        let features = assemble(&triangle(), GeometryKind::Polygon, &Schema::new(), opts(false));
        let Shape::Polygon(ring) = &features[0].shape else {
            panic!("expected polygon");
        };
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn closed_ring_is_not_closed_twice() {
        let mut records = triangle();
        records.push(rec("P4", 0.0, 0.0));
        let features = assemble(&records, GeometryKind::Polygon, &Schema::new(), opts(true));
        assert_eq!(features[0].shape.num_coords(), 4);
    }

    #[test]
    fn points_carry_their_own_attributes() {
        let schema = schema(vec![
            FieldDefinition::string("id", 50),
            FieldDefinition::new("elevation", FieldType::Double),
        ]);
        let records = vec![
            rec("A", 1.0, 2.0).with_extra("elevation", 10.5),
            rec("B", 3.0, 4.0).with_extra("elevation", 20.0),
        ];

        let features = assemble(&records, GeometryKind::Point, &schema, opts(true));

        assert_eq!(features.len(), 2);
        assert_eq!(features[1].shape, Shape::Point(geo_types::coord! { x: 3.0, y: 4.0 }));
        assert_eq!(features[0].attributes["id"], AttrValue::String("A".into()));
        assert_eq!(features[1].attributes["id"], AttrValue::String("B".into()));
        assert_eq!(features[1].attributes["elevation"], AttrValue::Double(20.0));
    }

    #[test]
    fn line_takes_first_record_attributes_only() {
        let schema = schema(vec![
            FieldDefinition::string("id", 50),
            FieldDefinition::string("kind", 20),
        ]);
        let records = vec![
            rec("A", 0.0, 0.0).with_extra("kind", "road"),
            rec("B", 1.0, 1.0).with_extra("kind", "path"),
            rec("C", 2.0, 0.0),
        ];

        let line = assemble(&records, GeometryKind::LineString, &schema, opts(true));
        let first_point = assemble(&records[..1], GeometryKind::Point, &schema, opts(true));

        assert_eq!(line.len(), 1);
        assert_eq!(line[0].shape.num_coords(), 3);
        assert_eq!(line[0].attributes, first_point[0].attributes);
    }

    #[test]
    fn id_goes_to_first_available_id_field() {
        let schema = schema(vec![
            FieldDefinition::string("Name", 50),
            FieldDefinition::string("FID", 50),
        ]);
        let features = assemble(&[rec("X9", 0.0, 0.0)], GeometryKind::Point, &schema, opts(true));
        assert_eq!(features[0].attributes.get("FID"), Some(&AttrValue::String("X9".into())));
        assert!(!features[0].attributes.contains_key("Name"));
    }

    #[test]
    fn unknown_extras_are_dropped() {
        let schema = schema(vec![FieldDefinition::string("id", 50)]);
        let records = vec![rec("A", 0.0, 0.0).with_extra("colour", "red")];
        let features = assemble(&records, GeometryKind::Point, &schema, opts(true));
        assert_eq!(features[0].attributes.len(), 1);
    }

    #[test]
    fn extras_keep_their_text_in_string_fields() {
        let schema = schema(vec![
            FieldDefinition::string("code", 10),
            FieldDefinition::new("count", FieldType::Integer),
            FieldDefinition::new("depth", FieldType::Double),
        ]);
        let records = vec![
            rec("A", 0.0, 0.0)
                .with_extra("code", "007")
                .with_extra("count", "007")
                .with_extra("depth", "1.50"),
            rec("B", 1.0, 1.0).with_extra("code", "nan"),
        ];
        let features = assemble(&records, GeometryKind::Point, &schema, opts(true));

        let first = &features[0].attributes;
        assert_eq!(first["code"], AttrValue::String("007".into()));
        assert_eq!(first["count"], AttrValue::Integer(7));
        assert_eq!(first["depth"], AttrValue::Double(1.5));
        assert_eq!(features[1].attributes["code"], AttrValue::String("nan".into()));
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let schema = schema(defaults_for(GeometryKind::Point));
        let features = assemble(&[rec("A", 0.0, 0.0)], GeometryKind::Point, &schema, opts(true));
        assert_eq!(features[0].attributes["elevation"], AttrValue::Double(0.0));
        assert!(!features[0].attributes.contains_key("description"));
    }

    #[test]
    fn measures_fill_length_area_perimeter() {
        let measure = AssembleOptions {
            auto_close: true,
            measure: true,
        };

        let line_schema = schema(defaults_for(GeometryKind::LineString));
        let records = vec![rec("A", 0.0, 0.0), rec("B", 3.0, 4.0)];
        let line = assemble(&records, GeometryKind::LineString, &line_schema, measure);
        assert_eq!(line[0].attributes["length"], AttrValue::Double(5.0));

        let poly_schema = schema(defaults_for(GeometryKind::Polygon));
        let square = vec![
            rec("A", 0.0, 0.0),
            rec("B", 2.0, 0.0),
            rec("C", 2.0, 2.0),
            rec("D", 0.0, 2.0),
        ];
        let poly = assemble(&square, GeometryKind::Polygon, &poly_schema, measure);
        assert_eq!(poly[0].attributes["area"], AttrValue::Double(4.0));
        assert_eq!(poly[0].attributes["perimeter"], AttrValue::Double(8.0));
    }

    #[test]
    fn empty_input_builds_nothing() {
        for kind in [GeometryKind::Point, GeometryKind::LineString, GeometryKind::Polygon] {
            assert!(assemble(&[], kind, &Schema::new(), opts(true)).is_empty());
        }
    }

    #[test]
    fn multi_parts() {
        let groups = vec![
            triangle(),
            vec![rec("Q1", 5.0, 5.0), rec("Q2", 6.0, 5.0), rec("Q3", 6.0, 6.0)],
        ];

        let Shape::MultiPolygon(rings) = assemble_multi(&groups, GeometryKind::Polygon).unwrap()
        else {
            panic!("expected multipolygon");
        };
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.len() == 4 && r[0] == r[3]));

        let Shape::MultiPoint(points) = assemble_multi(&groups, GeometryKind::Point).unwrap() else {
            panic!("expected multipoint");
        };
        assert_eq!(points.len(), 6);

        let Shape::MultiLineString(lines) =
            assemble_multi(&groups, GeometryKind::LineString).unwrap()
        else {
            panic!("expected multilinestring");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 3);
    }

    #[test]
    fn multi_rejects_empty_input() {
        assert_eq!(assemble_multi(&[], GeometryKind::Point), Err(AssembleError::NoParts));
        assert_eq!(
            assemble_multi(&[triangle(), vec![]], GeometryKind::Polygon),
            Err(AssembleError::EmptyPart(2))
        );
    }
}
