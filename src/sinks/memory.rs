use super::FeatureStore;
use crate::assemble::FeatureRecord;
use crate::kind::GeometryKind;
use crate::schema::Schema;
use anyhow::{Result, bail};

/// In-memory layer of a fixed geometry kind.
pub struct MemoryLayer {
    name: String,
    kind: GeometryKind,
    schema: Schema,
    features: Vec<FeatureRecord>,
    pending: Option<Vec<FeatureRecord>>,
}

impl MemoryLayer {
    pub fn new(name: impl Into<String>, kind: GeometryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            schema: Schema::new(),
            features: Vec::new(),
            pending: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Committed features.
    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    pub fn is_editing(&self) -> bool {
        self.pending.is_some()
    }
}

impl FeatureStore for MemoryLayer {
    fn begin(&mut self, schema: &Schema, kind: GeometryKind) -> Result<()> {
        if self.pending.is_some() {
            bail!("layer '{}' is already being edited", self.name);
        }
        if kind != self.kind {
            bail!(
                "layer '{}' holds {} features, not {}",
                self.name,
                self.kind,
                kind
            );
        }
        self.schema = schema.clone();
        self.pending = Some(Vec::new());
        Ok(())
    }

    fn add_feature(&mut self, feature: FeatureRecord) -> Result<()> {
        let Some(pending) = self.pending.as_mut() else {
            bail!("layer '{}' is not in edit mode", self.name);
        };
        if feature.shape.kind() != self.kind {
            bail!(
                "{} geometry does not fit {} layer '{}'",
                feature.shape.kind(),
                self.kind,
                self.name
            );
        }
        pending.push(feature);
        Ok(())
    }

    fn commit(&mut self) -> Result<usize> {
        let Some(pending) = self.pending.take() else {
            bail!("layer '{}' is not in edit mode", self.name);
        };
        let count = pending.len();
        self.features.extend(pending);
        Ok(count)
    }

    fn rollback(&mut self) {
        self.pending = None;
    }
}
