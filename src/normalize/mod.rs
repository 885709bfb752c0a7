/// Row normalization: RDB strings to typed readings.
///
/// Timestamps are read as naive local times, placed in the zone chosen by
/// `timezone::resolve_timezone_source` (row label first, site zone as fallback)
/// and converted to UTC. Values become fixed-point decimals with two
/// fractional digits, rounded half-to-even so repeated runs are stable.

pub mod timezone;

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::logging::{self, DataSource};
use crate::model::{NormalizedRow, NwisError, RawRow, Site};
use self::timezone::TimezoneSource;

/// Fractional digits kept on every reading.
pub const VALUE_PLACES: u32 = 2;

const LOCAL_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

// ---------------------------------------------------------------------------
// Decimals
// ---------------------------------------------------------------------------

/// Rounds half-to-even to `places` and pads the scale to exactly `places`.
pub fn quantize(value: Decimal, places: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(places);
    rounded
}

/// Parses an RDB value column.
///
/// Returns `None` for empty cells and for the non-numeric markers USGS
/// writes in place of a value (`Ice`, `Eqp`, `***`, ...).
pub fn parse_reading(raw: Option<&str>) -> Option<Decimal> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty())?;
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .map(|value| quantize(value, VALUE_PLACES))
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parses an RDB local timestamp. A bare date means local midnight.
pub fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, NwisError> {
    let raw = raw.trim();
    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| NwisError::ParseError(format!("invalid timestamp '{}'", raw)))
}

/// Places a naive local time in `tz` and converts it to UTC.
///
/// Repeated local times (DST fall-back) take the earlier instant. Local
/// times inside a spring-forward gap use the offset in force before the gap.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = tz
                .from_local_datetime(&(naive - Duration::hours(1)))
                .earliest()
                .map(|before| before.offset().fix())
                .unwrap_or_else(|| Utc.fix());
            (naive - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
        }
    }
}

/// Resolves the zone for a row and returns the reading time in UTC along
/// with where the zone came from.
///
/// Falling through to UTC is not an error, but it is logged for the site.
pub fn make_utc_datetime(
    site_no: &str,
    raw_datetime: &str,
    row_timezone: &str,
    site_timezone: &str,
) -> Result<(DateTime<Utc>, TimezoneSource), NwisError> {
    let naive = parse_local_datetime(raw_datetime)?;
    let (tz, source) = timezone::resolve_timezone_source(row_timezone, site_timezone);
    if source == TimezoneSource::Utc {
        logging::debug(
            DataSource::Usgs,
            Some(site_no),
            &format!(
                "Unresolved timezone '{}' / '{}', using UTC",
                row_timezone, site_timezone
            ),
        );
    }
    Ok((local_to_utc(naive, tz), source))
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

fn reading_or_log(site: &Site, column: &str, raw: Option<&str>) -> Option<Decimal> {
    let value = parse_reading(raw);
    if value.is_none() {
        if let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) {
            logging::debug(
                DataSource::Usgs,
                Some(&site.site_no),
                &format!("Treating non-numeric {} value '{}' as missing", column, text),
            );
        }
    }
    value
}

/// Converts one raw row. Missing values are `None`, not errors.
pub fn normalize_row(site: &Site, raw: &RawRow) -> Result<NormalizedRow, NwisError> {
    Ok(NormalizedRow {
        agency: raw.agency.clone(),
        site_no: raw.site_no.clone(),
        datetime: make_utc_datetime(&site.site_no, &raw.datetime, &raw.timezone, &site.timezone)?.0,
        timezone: site.timezone.clone(),
        discharge: reading_or_log(site, "discharge", raw.discharge.as_deref()),
        temperature: reading_or_log(site, "temperature", raw.temperature.as_deref()),
    })
}

/// Converts every row, keeping order. Fails on the first bad timestamp.
pub fn normalize_rows(site: &Site, rows: &[RawRow]) -> Result<Vec<NormalizedRow>, NwisError> {
    rows.iter().map(|raw| normalize_row(site, raw)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn site() -> Site {
        Site {
            site_no: "09085100".into(),
            name_full: "COLORADO RIVER BELOW GLENWOOD SPRINGS CO".into(),
            name_short: "Col R / Glenwood".into(),
            region: "CO".into(),
            timezone: "America/Denver".into(),
            feature_discharge: true,
            feature_temperature: false,
        }
    }

    fn raw(datetime: &str, tz: &str, discharge: Option<&str>) -> RawRow {
        RawRow {
            agency: "USGS".into(),
            site_no: "09085100".into(),
            datetime: datetime.into(),
            timezone: tz.into(),
            discharge: discharge.map(String::from),
            discharge_provisional: Some("P".into()),
            temperature: None,
            temperature_provisional: None,
        }
    }

    // --- Decimals -----------------------------------------------------------

    #[test]
    fn test_values_are_quantized_to_two_places() {
        assert_eq!(parse_reading(Some("1520")).unwrap().to_string(), "1520.00");
        assert_eq!(parse_reading(Some("12.3")).unwrap().to_string(), "12.30");
        assert_eq!(parse_reading(Some(" 7.5 ")).unwrap().to_string(), "7.50");
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        assert_eq!(parse_reading(Some("2.345")), Some(dec("2.34")));
        assert_eq!(parse_reading(Some("2.355")), Some(dec("2.36")));
        assert_eq!(parse_reading(Some("-0.125")), Some(dec("-0.12")));
    }

    #[test]
    fn test_missing_and_marker_values_are_none() {
        assert_eq!(parse_reading(None), None);
        assert_eq!(parse_reading(Some("")), None);
        assert_eq!(parse_reading(Some("   ")), None);
        assert_eq!(parse_reading(Some("Ice")), None);
        assert_eq!(parse_reading(Some("Eqp")), None);
    }

    // --- Timestamps ---------------------------------------------------------

    #[test]
    fn test_parse_local_datetime_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(6, 15, 0).unwrap();
        assert_eq!(parse_local_datetime("2024-05-01 06:15").unwrap(), expected);
        assert_eq!(parse_local_datetime("2024-05-01 06:15:00").unwrap(), expected);
        assert_eq!(parse_local_datetime("2024-05-01T06:15").unwrap(), expected);
        assert_eq!(
            parse_local_datetime("2024-05-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_timestamp_is_parse_error() {
        assert!(matches!(
            parse_local_datetime("not-a-datetime"),
            Err(NwisError::ParseError(_))
        ));
        assert!(parse_local_datetime("").is_err());
    }

    #[test]
    fn test_mountain_daylight_time_converts_to_utc() {
        // 06:15 MDT (-06:00) == 12:15 UTC
        let (utc, source) =
            make_utc_datetime("09085100", "2024-05-01 06:15", "MDT", "America/Denver").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 5, 1, 12, 15, 0).unwrap());
        // MDT is not an IANA name; the site zone resolves it
        assert_eq!(source, TimezoneSource::Fallback);
    }

    #[test]
    fn test_winter_reading_uses_standard_offset() {
        let (utc, _) =
            make_utc_datetime("09085100", "2024-01-15 06:00", "MST", "America/Denver").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_unknown_zones_degrade_to_utc() {
        let (utc, source) =
            make_utc_datetime("09085100", "2024-05-01 06:15", "ZZZ", "Nowhere/Special").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 5, 1, 6, 15, 0).unwrap());
        assert_eq!(source, TimezoneSource::Utc);
    }

    #[test]
    fn test_row_label_alias_resolves_when_site_zone_is_bad() {
        let (utc, source) =
            make_utc_datetime("09085100", "2024-05-01 06:15", "PDT", "Nowhere/Special").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 5, 1, 13, 15, 0).unwrap());
        assert_eq!(source, TimezoneSource::Alias);
    }

    #[test]
    fn test_repeated_fall_back_hour_takes_earlier_instant() {
        // 2024-11-03 01:30 happens twice in Denver: MDT first (07:30 UTC).
        let naive = parse_local_datetime("2024-11-03 01:30").unwrap();
        let utc = local_to_utc(naive, chrono_tz::America::Denver);
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 11, 3, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_spring_forward_gap_uses_offset_before_gap() {
        // 2024-03-10 02:30 does not exist in Denver; MST (-07:00) applies.
        let naive = parse_local_datetime("2024-03-10 02:30").unwrap();
        let utc = local_to_utc(naive, chrono_tz::America::Denver);
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap());
    }

    // --- Rows ---------------------------------------------------------------

    #[test]
    fn test_normalize_row_copies_identity_and_site_timezone() {
        let row = normalize_row(&site(), &raw("2024-05-01 06:15", "MDT", Some("1520"))).unwrap();
        assert_eq!(row.agency, "USGS");
        assert_eq!(row.site_no, "09085100");
        assert_eq!(row.timezone, "America/Denver");
        assert_eq!(row.discharge, Some(dec("1520.00")));
        assert_eq!(row.temperature, None);
    }

    #[test]
    fn test_empty_discharge_is_none_not_error() {
        let row = normalize_row(&site(), &raw("2024-05-01 06:15", "MDT", Some(""))).unwrap();
        assert_eq!(row.discharge, None);
    }

    #[test]
    fn test_normalize_rows_keeps_order_and_fails_on_bad_timestamp() {
        let rows = vec![
            raw("2024-05-01 06:30", "MDT", Some("1530")),
            raw("2024-05-01 06:15", "MDT", Some("1520")),
        ];
        let normalized = normalize_rows(&site(), &rows).unwrap();
        assert_eq!(normalized.len(), 2);
        assert!(normalized[0].datetime > normalized[1].datetime);

        let bad = vec![raw("garbage", "MDT", Some("1"))];
        assert!(normalize_rows(&site(), &bad).is_err());
    }
}
