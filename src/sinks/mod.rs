use crate::assemble::FeatureRecord;
use crate::kind::GeometryKind;
use crate::schema::Schema;
use anyhow::{Context, Result};
use serde_json::{Map, Value};

pub mod geojson;
pub mod geojsonl;
pub mod memory;

pub use self::geojson::GeoJsonSink;
pub use self::geojsonl::GeoJsonlSink;
pub use self::memory::MemoryLayer;

/// A host-side container that accepts features inside an edit transaction.
pub trait FeatureStore: Send {
    fn begin(&mut self, schema: &Schema, kind: GeometryKind) -> Result<()>;
    fn add_feature(&mut self, feature: FeatureRecord) -> Result<()>;
    /// Make the transaction's features permanent; returns how many were added.
    fn commit(&mut self) -> Result<usize>;
    fn rollback(&mut self);
}

/// Insert `features` in one transaction. Any insert or commit failure rolls
/// the transaction back before the error is returned.
pub fn persist(
    store: &mut dyn FeatureStore,
    schema: &Schema,
    kind: GeometryKind,
    features: Vec<FeatureRecord>,
) -> Result<usize> {
    store
        .begin(schema, kind)
        .context("Sink: Failed to start edit session")?;

    let outcome = features
        .into_iter()
        .enumerate()
        .try_for_each(|(idx, feature)| {
            store
                .add_feature(feature)
                .with_context(|| format!("Sink: Failed to add feature {}", idx + 1))
        })
        .and_then(|()| store.commit().context("Sink: Failed to commit features"));

    match outcome {
        Ok(count) => {
            tracing::info!("Committed {} feature(s)", count);
            Ok(count)
        }
        Err(err) => {
            tracing::warn!("Rolling back edit session: {:#}", err);
            store.rollback();
            Err(err)
        }
    }
}

/// GeoJSON properties for a feature, in schema field order. Fields without a
/// value are `null`.
pub fn feature_properties(schema: &Schema, feature: &FeatureRecord) -> Map<String, Value> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let value = feature
                .attributes
                .get(&field.name)
                .map_or(Value::Null, |v| v.to_json());
            (field.name.clone(), value)
        })
        .collect()
}

pub(crate) fn to_geojson_feature(
    schema: &Schema,
    feature: &FeatureRecord,
) -> ::geojson::Feature {
    let geometry = ::geojson::Geometry::from(&feature.shape.to_geometry());
    ::geojson::Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(feature_properties(schema, feature)),
        foreign_members: None,
    }
}
