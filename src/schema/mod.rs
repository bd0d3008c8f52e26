//! Attribute schema: field definitions, defaults per geometry kind and
//! field-name validation.

use crate::kind::GeometryKind;
use crate::value::{self, AttrValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 63;

/// Names that may only be used once a field of that name is not yet present.
pub const RESERVED_NAMES: [&str; 5] = ["id", "fid", "geom", "geometry", "shape"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Double,
    Date,
    DateTime,
    Boolean,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::String,
        FieldType::Integer,
        FieldType::Double,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Boolean,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Integer => "Integer",
            FieldType::Double => "Double",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Boolean => "Boolean",
        }
    }

    /// Map a host type tag (`QString`, `int4`, `real`, ...) to a field type.
    /// Unknown tags map to `String`.
    pub fn from_host_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "int4" | "int8" | "longlong" | "qlonglong" | "int64" => {
                FieldType::Integer
            }
            "double" | "real" | "float" | "float8" | "numeric" | "decimal" => FieldType::Double,
            "date" | "qdate" => FieldType::Date,
            "datetime" | "qdatetime" | "timestamp" => FieldType::DateTime,
            "bool" | "boolean" => FieldType::Boolean,
            _ => FieldType::String,
        }
    }

    /// Convert `value` to this type. `None` when it cannot be represented.
    pub fn coerce(self, value: &AttrValue) -> Option<AttrValue> {
        match (self, value) {
            (FieldType::String, AttrValue::String(_)) => Some(value.clone()),
            (FieldType::String, other) => Some(AttrValue::String(other.to_string())),

            (FieldType::Integer, AttrValue::Integer(_)) => Some(value.clone()),
            (FieldType::Integer, AttrValue::Double(val)) => {
                // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
                let in_range = (i64::MIN as f64..i64::MAX as f64).contains(val);
                (val.fract() == 0.0 && in_range).then(|| AttrValue::Integer(*val as i64))
            }
            (FieldType::Integer, AttrValue::Boolean(val)) => {
                Some(AttrValue::Integer(i64::from(*val)))
            }
            (FieldType::Integer, AttrValue::String(text)) => {
                text.trim().parse().ok().map(AttrValue::Integer)
            }

            (FieldType::Double, AttrValue::Double(_)) => Some(value.clone()),
            (FieldType::Double, AttrValue::Integer(val)) => Some(AttrValue::Double(*val as f64)),
            (FieldType::Double, AttrValue::String(text)) => {
                text.trim().parse().ok().map(AttrValue::Double)
            }

            (FieldType::Boolean, AttrValue::Boolean(_)) => Some(value.clone()),
            (FieldType::Boolean, AttrValue::Integer(val)) => Some(AttrValue::Boolean(*val != 0)),
            (FieldType::Boolean, AttrValue::String(text)) => {
                value::parse_bool(text).map(AttrValue::Boolean)
            }

            (FieldType::Date, AttrValue::Date(_)) => Some(value.clone()),
            (FieldType::Date, AttrValue::DateTime(val)) => Some(AttrValue::Date(val.date())),
            (FieldType::Date, AttrValue::String(text)) => {
                value::parse_date(text).map(AttrValue::Date)
            }

            (FieldType::DateTime, AttrValue::DateTime(_)) => Some(value.clone()),
            (FieldType::DateTime, AttrValue::Date(val)) => {
                Some(AttrValue::DateTime(val.with_time(time::Time::MIDNIGHT)))
            }
            (FieldType::DateTime, AttrValue::String(text)) => {
                value::parse_datetime(text).map(AttrValue::DateTime)
            }

            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|ty| ty.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("invalid field type: {value}"))
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub precision: usize,
    #[serde(default)]
    pub default: String,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            length: 0,
            precision: 0,
            default: String::new(),
        }
    }

    pub fn string(name: impl Into<String>, length: usize) -> Self {
        Self {
            length,
            ..Self::new(name, FieldType::String)
        }
    }

    pub fn double(name: impl Into<String>, precision: usize) -> Self {
        Self {
            precision,
            default: "0".to_string(),
            ..Self::new(name, FieldType::Double)
        }
    }

    /// The default coerced to the field type; `None` when empty or invalid.
    pub fn default_value(&self) -> Option<AttrValue> {
        if self.default.is_empty() {
            return None;
        }
        self.field_type
            .coerce(&AttrValue::String(self.default.clone()))
    }
}

/// A field as described by a host layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalField {
    pub name: String,
    pub type_tag: String,
    pub length: usize,
    pub precision: usize,
}

/// One row of a user-edited attribute table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub name: String,
    pub type_name: Option<String>,
    pub default: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum NameError {
    #[error("Field name cannot be empty")]
    Empty,
    #[error("Field name too long (max 63 characters)")]
    TooLong,
    #[error("Field name can only contain letters, numbers, and underscores")]
    InvalidCharacters,
    #[error("Field name cannot start with a number")]
    LeadingDigit,
    #[error("'{0}' is already in use")]
    ReservedInUse(String),
    #[error("Field '{0}' already exists")]
    Duplicate(String),
}

/// Check `name` against naming rules and the names already in a schema.
///
/// Reserved names are only refused when a field with that name (ignoring
/// case) already exists; duplicates are checked case-sensitively.
pub fn validate_name<S: AsRef<str>>(name: &str, existing: &[S]) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(NameError::InvalidCharacters);
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(NameError::LeadingDigit);
    }

    let lower = name.to_ascii_lowercase();
    if RESERVED_NAMES.contains(&lower.as_str())
        && existing
            .iter()
            .any(|field| field.as_ref().eq_ignore_ascii_case(name))
    {
        return Err(NameError::ReservedInUse(name.to_string()));
    }

    if existing.iter().any(|field| field.as_ref() == name) {
        return Err(NameError::Duplicate(name.to_string()));
    }

    Ok(())
}

/// Ordered, name-unique list of field definitions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from definitions, validating each name against the ones before it.
    pub fn from_fields(fields: Vec<FieldDefinition>) -> Result<Self, NameError> {
        let mut schema = Schema::new();
        for field in fields {
            schema.push(field)?;
        }
        Ok(schema)
    }

    pub fn push(&mut self, field: FieldDefinition) -> Result<(), NameError> {
        validate_name(&field.name, self.names().as_slice())?;
        self.fields.push(field);
        Ok(())
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.index_of(name).map(|idx| &self.fields[idx])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Mirror a host layer's fields one to one.
pub fn from_existing_fields(fields: &[ExternalField]) -> Vec<FieldDefinition> {
    fields
        .iter()
        .map(|field| FieldDefinition {
            name: field.name.clone(),
            field_type: FieldType::from_host_tag(&field.type_tag),
            length: field.length,
            precision: field.precision,
            default: String::new(),
        })
        .collect()
}

/// Definitions typed into an attribute table. Rows without a name are
/// skipped; a missing or unknown type becomes `String`.
pub fn from_table(rows: &[TableRow]) -> Vec<FieldDefinition> {
    rows.iter()
        .filter_map(|row| {
            let name = row.name.trim();
            if name.is_empty() {
                return None;
            }
            let field_type = row
                .type_name
                .as_deref()
                .and_then(|ty| ty.parse().ok())
                .unwrap_or_default();
            Some(FieldDefinition {
                name: name.to_string(),
                field_type,
                length: if field_type == FieldType::String { 255 } else { 10 },
                precision: if field_type == FieldType::Double { 3 } else { 0 },
                default: row.default.clone(),
            })
        })
        .collect()
}

/// Default attribute fields for a new layer of `kind`.
pub fn defaults_for(kind: GeometryKind) -> Vec<FieldDefinition> {
    let mut fields = vec![
        FieldDefinition::string("id", 50),
        FieldDefinition::string("name", 100),
        FieldDefinition::string("description", 255),
    ];

    match kind {
        GeometryKind::Point => fields.push(FieldDefinition::double("elevation", 2)),
        GeometryKind::LineString => fields.push(FieldDefinition::double("length", 3)),
        GeometryKind::Polygon => {
            fields.push(FieldDefinition::double("area", 3));
            fields.push(FieldDefinition::double("perimeter", 3));
        }
    }

    fields
}
