//! Turn plain-text coordinate lists into point, line and polygon features.

pub mod app;
pub mod assemble;
pub mod config;
pub mod kind;
pub mod logging;
pub mod parser;
pub mod schema;
pub mod sinks;
pub mod sniff;
pub mod value;

pub use assemble::{AssembleOptions, FeatureRecord, Shape, assemble, assemble_multi};
pub use kind::GeometryKind;
pub use parser::{CoordinateParser, CoordinateRecord, ParseOptions, Separator};
pub use schema::{FieldDefinition, FieldType, Schema};
