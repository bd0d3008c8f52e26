use super::{FeatureStore, to_geojson_feature};
use crate::assemble::FeatureRecord;
use crate::kind::GeometryKind;
use crate::schema::Schema;
use anyhow::{Context, Result, bail};
use geojson::{Feature, GeoJson};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one FeatureCollection per committed transaction. Nothing touches
/// the disk until commit.
pub struct GeoJsonSink {
    path: PathBuf,
    schema: Schema,
    pending: Option<Vec<Feature>>,
}

impl GeoJsonSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema: Schema::new(),
            pending: None,
        }
    }
}

impl FeatureStore for GeoJsonSink {
    fn begin(&mut self, schema: &Schema, _kind: GeometryKind) -> Result<()> {
        self.schema = schema.clone();
        self.pending = Some(Vec::new());
        Ok(())
    }

    fn add_feature(&mut self, feature: FeatureRecord) -> Result<()> {
        let Some(pending) = self.pending.as_mut() else {
            bail!("GeoJSON sink is not in edit mode");
        };
        pending.push(to_geojson_feature(&self.schema, &feature));
        Ok(())
    }

    fn commit(&mut self) -> Result<usize> {
        let Some(features) = self.pending.take() else {
            bail!("GeoJSON sink is not in edit mode");
        };

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {:?}", self.path))?;
        let mut writer = BufWriter::new(file);

        // Write the header of the FeatureCollection
        writeln!(writer, "{{")?;
        writeln!(writer, "  \"type\": \"FeatureCollection\",")?;
        writeln!(writer, "  \"features\": [")?;

        let count = features.len();
        for (idx, feature) in features.into_iter().enumerate() {
            if idx > 0 {
                writeln!(writer, ",")?;
            }
            serde_json::to_writer(&mut writer, &GeoJson::Feature(feature))?;
        }

        // Close the array and object
        writeln!(writer)?;
        writeln!(writer, "  ]")?;
        writeln!(writer, "}}")?;
        writer.flush()?;
        Ok(count)
    }

    fn rollback(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::Shape;
    use crate::schema::FieldDefinition;
    use crate::value::AttrValue;
    use geo_types::coord;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn point_feature(name: &str, x: f64, y: f64) -> FeatureRecord {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), AttrValue::String(name.to_string()));
        FeatureRecord {
            shape: Shape::Point(coord! { x: x, y: y }),
            attributes,
        }
    }

    fn name_schema() -> Schema {
        Schema::from_fields(vec![FieldDefinition::string("name", 50)]).unwrap()
    }

    #[test]
    fn creates_valid_geojson_structure() {
        let temp_file = NamedTempFile::with_suffix(".geojson").unwrap();
        let mut sink = GeoJsonSink::new(temp_file.path());

        sink.begin(&name_schema(), GeometryKind::Point).unwrap();
        sink.add_feature(point_feature("Test", 0.0, 0.0)).unwrap();
        sink.add_feature(point_feature("Second", 1.0, 1.0)).unwrap();
        assert_eq!(sink.commit().unwrap(), 2);

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(parsed["features"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["features"][1]["properties"]["name"], "Second");
    }

    #[test]
    fn writes_closed_polygon_geometry() {
        let temp_file = NamedTempFile::with_suffix(".geojson").unwrap();
        let mut sink = GeoJsonSink::new(temp_file.path());

        let feature = FeatureRecord {
            shape: Shape::Polygon(vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 1.0, y: 0.0 },
                coord! { x: 1.0, y: 1.0 },
            ]),
            attributes: HashMap::new(),
        };
        sink.begin(&Schema::new(), GeometryKind::Polygon).unwrap();
        sink.add_feature(feature).unwrap();
        sink.commit().unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();

        let geometry = &parsed["features"][0]["geometry"];
        assert_eq!(geometry["type"], "Polygon");
        assert_eq!(geometry["coordinates"][0].as_array().unwrap().len(), 4);
    }

    #[test]
    fn rollback_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let mut sink = GeoJsonSink::new(&path);

        sink.begin(&name_schema(), GeometryKind::Point).unwrap();
        sink.add_feature(point_feature("Test", 0.0, 0.0)).unwrap();
        sink.rollback();

        assert!(!path.exists());
    }
}
