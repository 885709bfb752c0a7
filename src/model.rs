/// Site, RawRow, NormalizedRow, SiteStatistics, Snapshot, NwisError
/// core data structures and error handling
///
/// Core data types for the river data service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic and no I/O. The persisted types carry serde field
/// adapters from `storage::tagged` so decimals and timestamps survive the
/// JSON snapshot with their type intact.

use std::collections::BTreeMap;
use std::convert::TryFrom;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::tagged;

// ---------------------------------------------------------------------------
// Parameter codes
// ---------------------------------------------------------------------------

/// USGS parameter code for discharge (streamflow), in cubic feet per second.
pub const PARAM_DISCHARGE: &str = "00060";

/// USGS parameter code for water temperature, in degrees Celsius.
pub const PARAM_TEMPERATURE: &str = "00010";

// ---------------------------------------------------------------------------
// Site metadata
// ---------------------------------------------------------------------------

/// A single USGS gauge station as configured in the site registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// USGS site number, e.g. `"09085100"`.
    pub site_no: String,
    /// Official USGS site name.
    pub name_full: String,
    /// Short label for display.
    pub name_short: String,
    /// State or region code.
    pub region: String,
    /// Canonical IANA timezone of the gauge, e.g. `"America/Denver"`.
    pub timezone: String,
    /// Whether this site reports discharge (00060).
    #[serde(default)]
    pub feature_discharge: bool,
    /// Whether this site reports water temperature (00010).
    #[serde(default)]
    pub feature_temperature: bool,
}

impl Site {
    pub fn reports(&self, quantity: Quantity) -> bool {
        match quantity {
            Quantity::Discharge => self.feature_discharge,
            Quantity::Temperature => self.feature_temperature,
        }
    }
}

/// A measured quantity the service tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Discharge,
    Temperature,
}

impl Quantity {
    pub const ALL: [Quantity; 2] = [Quantity::Discharge, Quantity::Temperature];

    /// USGS parameter code for the quantity.
    pub fn parameter_code(self) -> &'static str {
        match self {
            Quantity::Discharge => PARAM_DISCHARGE,
            Quantity::Temperature => PARAM_TEMPERATURE,
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::Discharge => write!(f, "discharge"),
            Quantity::Temperature => write!(f, "temperature"),
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One tab-delimited RDB record, still as strings.
///
/// Field names follow the translated header names (see
/// `ingest::rdb::HEADER_PATTERNS`). The value and flag columns are `None`
/// when the document does not carry them or the row is short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub agency: String,
    pub site_no: String,
    pub datetime: String, // local time, e.g. "2024-05-01 06:15"
    pub timezone: String, // abbreviation, e.g. "MDT"
    pub discharge: Option<String>,
    pub discharge_provisional: Option<String>,
    pub temperature: Option<String>,
    pub temperature_provisional: Option<String>,
}

/// A typed reading row. `datetime` is always UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub agency: String,
    pub site_no: String,
    pub datetime: DateTime<Utc>,
    /// The site's canonical timezone name, not the row's abbreviation.
    pub timezone: String,
    pub discharge: Option<Decimal>,
    pub temperature: Option<Decimal>,
}

impl NormalizedRow {
    pub fn value(&self, quantity: Quantity) -> Option<Decimal> {
        match quantity {
            Quantity::Discharge => self.discharge,
            Quantity::Temperature => self.temperature,
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction types
// ---------------------------------------------------------------------------

/// Three-valued trend classifier, persisted as -1 / 0 / 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    Falling,
    Flat,
    Rising,
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> i8 {
        match direction {
            Direction::Falling => -1,
            Direction::Flat => 0,
            Direction::Rising => 1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Direction::Falling),
            0 => Ok(Direction::Flat),
            1 => Ok(Direction::Rising),
            other => Err(format!("invalid prediction direction: {}", other)),
        }
    }
}

/// Forecast points (oldest to newest) plus the trend direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub values: Vec<Decimal>,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// Statistics types
// ---------------------------------------------------------------------------

/// Summary of one measured quantity at one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityStats {
    #[serde(with = "tagged::decimal")]
    pub recent_value: Decimal,
    #[serde(with = "tagged::datetime")]
    pub recent_datetime: DateTime<Utc>,
    #[serde(with = "tagged::decimal")]
    pub prediction_value: Decimal,
    pub prediction_direction: Direction,
    #[serde(with = "tagged::decimal")]
    pub high_value: Decimal,
    #[serde(with = "tagged::datetime")]
    pub high_datetime: DateTime<Utc>,
    #[serde(with = "tagged::decimal")]
    pub low_value: Decimal,
    #[serde(with = "tagged::datetime")]
    pub low_datetime: DateTime<Utc>,
}

/// Computed statistics for one site from one pipeline run.
///
/// `discharge` / `temperature` are `None` when the site does not report the
/// quantity or no row carried a value for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStatistics {
    pub site_no: String,
    pub site_name_full: String,
    pub site_name_short: String,
    pub site_region: String,
    pub site_timezone: String,
    pub data_url: String,
    pub rowcount: usize,
    #[serde(with = "tagged::datetime")]
    pub fetch_datetime: DateTime<Utc>,
    #[serde(with = "tagged::date")]
    pub begin_date: NaiveDate,
    pub discharge: Option<QuantityStats>,
    pub temperature: Option<QuantityStats>,
}

impl SiteStatistics {
    pub fn quantity(&self, quantity: Quantity) -> Option<&QuantityStats> {
        match quantity {
            Quantity::Discharge => self.discharge.as_ref(),
            Quantity::Temperature => self.temperature.as_ref(),
        }
    }
}

/// Site number to statistics for one completed run.
pub type Snapshot = BTreeMap<String, SiteStatistics>;

// ---------------------------------------------------------------------------
// Park types
// ---------------------------------------------------------------------------

/// A named park backed by one discharge site and one temperature site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Park {
    pub name: String,
    pub region: String,
    pub timezone: String,
    pub site_no_discharge: String,
    pub site_no_temperature: String,
}

/// Reduced, recent-values-only view of a park.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkStatistics {
    pub park_name: String,
    pub park_region: String,
    pub park_timezone: String,
    #[serde(with = "tagged::opt_decimal")]
    pub discharge_recent_value: Option<Decimal>,
    #[serde(with = "tagged::opt_datetime")]
    pub discharge_recent_datetime: Option<DateTime<Utc>>,
    #[serde(with = "tagged::opt_decimal")]
    pub discharge_prediction_value: Option<Decimal>,
    #[serde(with = "tagged::opt_decimal")]
    pub temp_recent_value: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or processing USGS NWIS data.
#[derive(Debug, thiserror::Error)]
pub enum NwisError {
    /// Network, DNS or TLS failure. Fatal for the whole run.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx HTTP response from the USGS service.
    #[error("HTTP error: {0}")]
    HttpError(u16),
    /// The document or one of its rows could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),
    /// No data rows survived comment and header stripping.
    #[error("No data available for site {0}")]
    NoDataAvailable(String),
}

impl NwisError {
    /// Transport failures abort the run; everything else only costs one site.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NwisError::Transport(_))
    }
}
