//! Scalar attribute values carried by coordinate and feature records.

use serde_json::Value;
use std::fmt;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Date(Date),
    DateTime(PrimitiveDateTime),
}

impl AttrValue {
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::String(val) => Value::String(val.clone()),
            AttrValue::Integer(val) => Value::from(*val),
            AttrValue::Double(val) => Value::from(*val),
            AttrValue::Boolean(val) => Value::Bool(*val),
            AttrValue::Date(_) | AttrValue::DateTime(_) => Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(val) => write!(f, "{val}"),
            AttrValue::Integer(val) => write!(f, "{val}"),
            AttrValue::Double(val) => write!(f, "{val}"),
            AttrValue::Boolean(val) => write!(f, "{val}"),
            AttrValue::Date(val) => {
                let text = val.format(DATE_FORMAT).map_err(|_| fmt::Error)?;
                write!(f, "{text}")
            }
            AttrValue::DateTime(val) => {
                let text = val.format(DATETIME_FORMAT).map_err(|_| fmt::Error)?;
                write!(f, "{text}")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Double(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");
const DATETIME_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DATETIME_SPACE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub(crate) fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), DATE_FORMAT).ok()
}

pub(crate) fn parse_datetime(text: &str) -> Option<PrimitiveDateTime> {
    let text = text.trim();
    PrimitiveDateTime::parse(text, DATETIME_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(text, DATETIME_SPACE_FORMAT))
        .ok()
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
