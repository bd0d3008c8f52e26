use crate::assemble::AssembleOptions;
use crate::kind::GeometryKind;
use crate::parser::{ParseOptions, Separator};
use crate::schema::{self, FieldDefinition, NameError, Schema};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one conversion job, usually read from YAML.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JobConfig {
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub geometry: GeometryKind,
    /// `None` detects the separator from the input.
    #[serde(default)]
    pub separator: Option<Separator>,
    #[serde(default)]
    pub has_id: bool,
    #[serde(default = "default_true")]
    pub auto_close: bool,
    #[serde(default)]
    pub measure: bool,
    /// Attribute fields; empty uses the defaults for `geometry`.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub extra_columns: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            geometry: GeometryKind::default(),
            separator: None,
            has_id: false,
            auto_close: true,
            measure: false,
            fields: Vec::new(),
            extra_columns: Vec::new(),
        }
    }
}

impl JobConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            separator: self.separator.clone(),
            has_id: self.has_id,
            extra_columns: self.extra_columns.clone(),
        }
    }

    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            auto_close: self.auto_close,
            measure: self.measure,
        }
    }

    /// Validated attribute schema for the job.
    pub fn schema(&self) -> Result<Schema, NameError> {
        if self.fields.is_empty() {
            Schema::from_fields(schema::defaults_for(self.geometry))
        } else {
            Schema::from_fields(self.fields.clone())
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RuntimeConfig {
    /// Worker threads for parsing; `None` parses on the calling thread.
    pub threads: Option<usize>,
}

fn default_layer() -> String {
    "coordinates".to_string()
}

fn default_true() -> bool {
    true
}
