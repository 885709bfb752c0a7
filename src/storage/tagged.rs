//! Typed string scalars for the JSON snapshot.
//!
//! JSON has no decimal, instant or calendar-date type, so those values are
//! written as strings carrying an explicit type tag:
//!
//! ```text
//! ||decimal::150.00
//! ||datetime::2024-05-01 13:00:00+00:00
//! ||date::2024-05-01
//! ```
//!
//! `encode` / `decode` are the discriminated pair; every decoded string is
//! checked for the `||` prefix and strings without it come back as
//! `TaggedScalar::Text`. The `decimal`, `datetime`, `date`, `opt_decimal` and
//! `opt_datetime` submodules plug the pair into `#[serde(with = ...)]` fields.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const TAG_PREFIX: &str = "||";
pub const TAG_SEPARATOR: &str = "::";

pub const TYPE_DECIMAL: &str = "decimal";
pub const TYPE_DATETIME: &str = "datetime";
pub const TYPE_DATE: &str = "date";

const DATETIME_OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];
const DATETIME_NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// ---------------------------------------------------------------------------
// Scalar type
// ---------------------------------------------------------------------------

/// A string scalar after tag inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedScalar {
    Text(String),
    Decimal(Decimal),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

impl TaggedScalar {
    /// Type name used in the tag, or `"text"` for untagged strings.
    pub fn type_name(&self) -> &'static str {
        match self {
            TaggedScalar::Text(_) => "text",
            TaggedScalar::Decimal(_) => TYPE_DECIMAL,
            TaggedScalar::DateTime(_) => TYPE_DATETIME,
            TaggedScalar::Date(_) => TYPE_DATE,
        }
    }
}

impl From<Decimal> for TaggedScalar {
    fn from(value: Decimal) -> Self {
        TaggedScalar::Decimal(value)
    }
}

impl From<DateTime<Utc>> for TaggedScalar {
    fn from(value: DateTime<Utc>) -> Self {
        TaggedScalar::DateTime(value.fixed_offset())
    }
}

impl From<NaiveDate> for TaggedScalar {
    fn from(value: NaiveDate) -> Self {
        TaggedScalar::Date(value)
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TagError {
    #[error("invalid {type_name} payload '{payload}'")]
    InvalidPayload {
        type_name: &'static str,
        payload: String,
    },
    #[error("expected a {expected} value, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Renders a scalar in its tagged string form. Text is returned unchanged.
pub fn encode(value: &TaggedScalar) -> String {
    let payload = match value {
        TaggedScalar::Text(text) => return text.clone(),
        TaggedScalar::Decimal(d) => d.to_string(),
        TaggedScalar::DateTime(dt) => format_datetime(dt),
        TaggedScalar::Date(date) => date.format("%Y-%m-%d").to_string(),
    };
    format!("{}{}{}{}", TAG_PREFIX, value.type_name(), TAG_SEPARATOR, payload)
}

/// Inspects a string scalar and rebuilds the typed value its tag names.
///
/// A tag without `::` has an empty payload. An unknown type name yields the
/// payload as text, dropping the tag.
pub fn decode(raw: &str) -> Result<TaggedScalar, TagError> {
    let Some(tagged) = raw.strip_prefix(TAG_PREFIX) else {
        return Ok(TaggedScalar::Text(raw.to_string()));
    };
    let (type_name, payload) = tagged.split_once(TAG_SEPARATOR).unwrap_or((tagged, ""));

    match type_name {
        TYPE_DECIMAL => parse_decimal(payload)
            .map(TaggedScalar::Decimal)
            .ok_or_else(|| invalid(TYPE_DECIMAL, payload)),
        TYPE_DATETIME => parse_datetime(payload)
            .map(TaggedScalar::DateTime)
            .ok_or_else(|| invalid(TYPE_DATETIME, payload)),
        TYPE_DATE => NaiveDate::parse_from_str(payload, "%Y-%m-%d")
            .map(TaggedScalar::Date)
            .map_err(|_| invalid(TYPE_DATE, payload)),
        _ => Ok(TaggedScalar::Text(payload.to_string())),
    }
}

fn invalid(type_name: &'static str, payload: &str) -> TagError {
    TagError::InvalidPayload {
        type_name,
        payload: payload.to_string(),
    }
}

fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S%:z").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string()
    }
}

fn parse_decimal(payload: &str) -> Option<Decimal> {
    Decimal::from_str(payload)
        .or_else(|_| Decimal::from_scientific(payload))
        .ok()
}

fn parse_datetime(payload: &str) -> Option<DateTime<FixedOffset>> {
    for format in DATETIME_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(payload, format) {
            return Some(dt);
        }
    }
    // Offset-less values are read as UTC.
    for format in DATETIME_NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(payload, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    None
}

impl Serialize for TaggedScalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(self))
    }
}

impl<'de> Deserialize<'de> for TaggedScalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Field adapters
// ---------------------------------------------------------------------------

fn unexpected(expected: &'static str, found: &TaggedScalar) -> TagError {
    TagError::UnexpectedType {
        expected,
        found: found.type_name(),
    }
}

fn expect_decimal(scalar: TaggedScalar) -> Result<Decimal, TagError> {
    match scalar {
        TaggedScalar::Decimal(d) => Ok(d),
        other => Err(unexpected(TYPE_DECIMAL, &other)),
    }
}

fn expect_datetime(scalar: TaggedScalar) -> Result<DateTime<Utc>, TagError> {
    match scalar {
        TaggedScalar::DateTime(dt) => Ok(dt.with_timezone(&Utc)),
        other => Err(unexpected(TYPE_DATETIME, &other)),
    }
}

fn expect_date(scalar: TaggedScalar) -> Result<NaiveDate, TagError> {
    match scalar {
        TaggedScalar::Date(date) => Ok(date),
        other => Err(unexpected(TYPE_DATE, &other)),
    }
}

pub mod decimal {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedScalar::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        expect_decimal(TaggedScalar::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

pub mod datetime {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        TaggedScalar::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        expect_datetime(TaggedScalar::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedScalar::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        expect_date(TaggedScalar::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

pub mod opt_decimal {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(TaggedScalar::from).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        Option::<TaggedScalar>::deserialize(deserializer)?
            .map(expect_decimal)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

pub mod opt_datetime {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(TaggedScalar::from).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<TaggedScalar>::deserialize(deserializer)?
            .map(expect_datetime)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
