use super::{FeatureStore, to_geojson_feature};
use crate::assemble::FeatureRecord;
use crate::kind::GeometryKind;
use crate::schema::Schema;
use anyhow::{Context, Result, bail};
use geojson::{Feature, GeoJson};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

enum Target {
    File(PathBuf),
    Stdout,
}

/// Newline-delimited GeoJSON features, written on commit.
pub struct GeoJsonlSink {
    target: Target,
    schema: Schema,
    pending: Option<Vec<Feature>>,
}

impl GeoJsonlSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_target(Target::File(path.as_ref().to_path_buf()))
    }

    pub fn stdout() -> Self {
        Self::with_target(Target::Stdout)
    }

    fn with_target(target: Target) -> Self {
        Self {
            target,
            schema: Schema::new(),
            pending: None,
        }
    }

    fn open(&self) -> Result<BufWriter<Box<dyn Write>>> {
        let writer: Box<dyn Write> = match &self.target {
            Target::File(path) => Box::new(
                File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
            ),
            Target::Stdout => Box::new(std::io::stdout()),
        };
        Ok(BufWriter::new(writer))
    }
}

impl FeatureStore for GeoJsonlSink {
    fn begin(&mut self, schema: &Schema, _kind: GeometryKind) -> Result<()> {
        self.schema = schema.clone();
        self.pending = Some(Vec::new());
        Ok(())
    }

    fn add_feature(&mut self, feature: FeatureRecord) -> Result<()> {
        let Some(pending) = self.pending.as_mut() else {
            bail!("GeoJSONL sink is not in edit mode");
        };
        pending.push(to_geojson_feature(&self.schema, &feature));
        Ok(())
    }

    fn commit(&mut self) -> Result<usize> {
        let Some(features) = self.pending.take() else {
            bail!("GeoJSONL sink is not in edit mode");
        };

        let mut writer = self.open()?;
        let count = features.len();
        for feature in features {
            serde_json::to_writer(&mut writer, &GeoJson::Feature(feature))?;
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(count)
    }

    fn rollback(&mut self) {
        self.pending = None;
    }
}
