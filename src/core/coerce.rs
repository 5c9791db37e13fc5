//! Type coercion — turns raw property strings into typed frontmatter values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::schema::property::PropertyType;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const TRUTHY: [&str; 3] = ["true", "1", "yes"];

const DATE_TIME_INPUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("'{0}' is not a date")]
    NotADate(String),
    #[error("'{0}' is not a date and time")]
    NotADateTime(String),
    #[error("empty value cannot be a checkbox")]
    EmptyCheckbox,
}

/// A typed property value, tagged by its property kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    /// Link target, without brackets.
    Link(String),
    List(Vec<String>),
    Number(Number),
    Checkbox(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl PropertyValue {
    /// The value as it appears in frontmatter.
    pub fn to_frontmatter(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Link(target) => Value::String(format!("[[{}]]", target)),
            Self::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Checkbox(b) => Value::Bool(*b),
            Self::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            Self::DateTime(dt) => Value::String(dt.format(DATE_TIME_FORMAT).to_string()),
        }
    }
}

/// Coerce a raw value into its declared kind. Pure: the same input always
/// gives the same output.
pub fn coerce(raw: &str, kind: PropertyType) -> Result<PropertyValue, CoercionError> {
    match kind {
        PropertyType::Text => Ok(PropertyValue::Text(raw.to_string())),
        PropertyType::Link => Ok(PropertyValue::Link(raw.to_string())),
        // No delimiter splitting; one raw value is one list item.
        PropertyType::List => Ok(PropertyValue::List(vec![raw.to_string()])),
        PropertyType::Number => parse_number(raw).map(PropertyValue::Number),
        PropertyType::Checkbox => parse_checkbox(raw).map(PropertyValue::Checkbox),
        PropertyType::Date => parse_date(raw).map(PropertyValue::Date),
        PropertyType::DateTime => parse_date_time(raw).map(PropertyValue::DateTime),
    }
}

fn parse_number(raw: &str) -> Result<Number, CoercionError> {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Number::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| CoercionError::NotANumber(raw.to_string()))
}

fn parse_checkbox(raw: &str) -> Result<bool, CoercionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoercionError::EmptyCheckbox);
    }
    Ok(TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(trimmed)))
}

/// Offset timestamps keep the calendar date of their own offset.
fn parse_date(raw: &str) -> Result<NaiveDate, CoercionError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
        .or_else(|| naive_timestamp(trimmed).map(|dt| dt.date()))
        .ok_or_else(|| CoercionError::NotADate(raw.to_string()))
}

fn parse_date_time(raw: &str) -> Result<NaiveDateTime, CoercionError> {
    let trimmed = raw.trim();
    timestamp(trimmed)
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| CoercionError::NotADateTime(raw.to_string()))
}

/// Timestamps with an offset are normalized to UTC.
fn timestamp(input: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    naive_timestamp(input)
}

fn naive_timestamp(input: &str) -> Option<NaiveDateTime> {
    DATE_TIME_INPUTS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
}
