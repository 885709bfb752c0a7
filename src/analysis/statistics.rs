//! Per-site statistics from a normalized, newest-first row set.
//!
//! For each quantity the site reports: the most recent valid reading, the
//! high and low readings, and a trend prediction from the most recent
//! values. A quantity with no valid rows is omitted rather than zeroed.
//!
//! High/low ties are broken explicitly: among rows with the same value the
//! most recent timestamp wins, for both the high and the low.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::analysis::trend::{self, PREDICTION_COUNT, PredictionOptions};
use crate::model::{NormalizedRow, Quantity, QuantityStats, Site, SiteStatistics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsOptions {
    /// Most recent values fed to the fit, and points forecast.
    pub prediction_count: usize,
    pub prediction: PredictionOptions,
}

impl Default for StatisticsOptions {
    fn default() -> Self {
        Self {
            prediction_count: PREDICTION_COUNT,
            prediction: PredictionOptions::default(),
        }
    }
}

/// A row that carries a value for the quantity under consideration.
type Valid<'a> = (Decimal, &'a NormalizedRow);

fn valid_rows(rows: &[NormalizedRow], quantity: Quantity) -> Vec<Valid<'_>> {
    rows.iter()
        .filter_map(|row| row.value(quantity).map(|value| (value, row)))
        .collect()
}

fn high<'a>(valid: &[Valid<'a>]) -> Option<Valid<'a>> {
    valid
        .iter()
        .copied()
        .max_by(|(va, a), (vb, b)| va.cmp(vb).then(a.datetime.cmp(&b.datetime)))
}

fn low<'a>(valid: &[Valid<'a>]) -> Option<Valid<'a>> {
    valid
        .iter()
        .copied()
        .min_by(|(va, a), (vb, b)| va.cmp(vb).then(b.datetime.cmp(&a.datetime)))
}

/// The `count` most recent values, oldest first.
fn recent_series(valid: &[Valid<'_>], count: usize) -> Vec<f64> {
    valid
        .iter()
        .take(count)
        .rev()
        .map(|(value, _)| value.to_f64().unwrap_or_default())
        .collect()
}

/// Summarises one quantity, or `None` when no row carries a value for it.
pub fn build_quantity_stats(
    rows: &[NormalizedRow],
    quantity: Quantity,
    options: &StatisticsOptions,
) -> Option<QuantityStats> {
    let valid = valid_rows(rows, quantity);
    let (recent_value, recent) = *valid.first()?;
    let (high_value, high_row) = high(&valid)?;
    let (low_value, low_row) = low(&valid)?;

    let series = recent_series(&valid, options.prediction_count);
    let prediction = trend::predict(&series, options.prediction_count, options.prediction);

    Some(QuantityStats {
        recent_value,
        recent_datetime: recent.datetime,
        // no representable forecast: hold the last observation
        prediction_value: prediction.values.last().copied().unwrap_or(recent_value),
        prediction_direction: prediction.direction,
        high_value,
        high_datetime: high_row.datetime,
        low_value,
        low_datetime: low_row.datetime,
    })
}

/// Builds the statistics record for one site.
///
/// `rows` must be newest-first. Returns `None` when there are no rows at
/// all; quantities the site does not report are always `None`.
pub fn build_site_statistics(
    site: &Site,
    data_url: &str,
    rows: &[NormalizedRow],
    fetched_at: DateTime<Utc>,
    begin_date: NaiveDate,
    options: &StatisticsOptions,
) -> Option<SiteStatistics> {
    if rows.is_empty() {
        return None;
    }
    let stats_for = |quantity: Quantity| {
        site.reports(quantity)
            .then(|| build_quantity_stats(rows, quantity, options))
            .flatten()
    };

    Some(SiteStatistics {
        site_no: site.site_no.clone(),
        site_name_full: site.name_full.clone(),
        site_name_short: site.name_short.clone(),
        site_region: site.region.clone(),
        site_timezone: site.timezone.clone(),
        data_url: data_url.to_string(),
        rowcount: rows.len(),
        fetch_datetime: fetched_at,
        begin_date,
        discharge: stats_for(Quantity::Discharge),
        temperature: stats_for(Quantity::Temperature),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    /// Newest-first rows, 15 minutes apart, from (discharge, temperature) pairs.
    fn rows(values: &[(Option<&str>, Option<&str>)]) -> Vec<NormalizedRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, (q, t))| NormalizedRow {
                agency: "USGS".into(),
                site_no: "13206000".into(),
                datetime: t0() - Duration::minutes(15 * i as i64),
                timezone: "America/Boise".into(),
                discharge: q.map(dec),
                temperature: t.map(dec),
            })
            .collect()
    }

    fn site(discharge: bool, temperature: bool) -> Site {
        Site {
            site_no: "13206000".into(),
            name_full: "BOISE RIVER AT GLENWOOD BRIDGE NR BOISE ID".into(),
            name_short: "Boise R / Glenwood / Boise".into(),
            region: "ID".into(),
            timezone: "America/Boise".into(),
            feature_discharge: discharge,
            feature_temperature: temperature,
        }
    }

    fn build(site: &Site, rows: &[NormalizedRow]) -> Option<SiteStatistics> {
        build_site_statistics(
            site,
            "https://waterdata.usgs.gov/nwis/uv?site_no=13206000",
            rows,
            t0() + Duration::minutes(5),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            &StatisticsOptions::default(),
        )
    }

    #[test]
    fn test_recent_high_low_for_two_rows() {
        let rows = rows(&[(Some("150.00"), None), (Some("100.00"), None)]);
        let stats = build_quantity_stats(&rows, Quantity::Discharge, &StatisticsOptions::default())
            .expect("discharge present");
        assert_eq!(stats.recent_value, dec("150.00"));
        assert_eq!(stats.recent_datetime, t0());
        assert_eq!(stats.high_value, dec("150.00"));
        assert_eq!(stats.high_datetime, t0());
        assert_eq!(stats.low_value, dec("100.00"));
        assert_eq!(stats.low_datetime, t0() - Duration::minutes(15));
        assert_eq!(stats.prediction_direction, Direction::Rising);
    }

    #[test]
    fn test_null_discharge_rows_skipped_but_counted() {
        let rows = rows(&[
            (None, Some("10.9")),
            (Some("598"), Some("11.7")),
            (Some("640"), Some("12.5")),
            (None, Some("13.3")),
        ]);
        let stats = build(&site(true, true), &rows).unwrap();
        assert_eq!(stats.rowcount, 4);

        let discharge = stats.discharge.expect("discharge present");
        assert_eq!(discharge.recent_value, dec("598"));
        assert_eq!(discharge.recent_datetime, t0() - Duration::minutes(15));
        assert_eq!(discharge.high_value, dec("640"));
        assert_eq!(discharge.low_value, dec("598"));

        let temperature = stats.temperature.expect("temperature present");
        assert_eq!(temperature.recent_value, dec("10.9"));
        assert_eq!(temperature.prediction_direction, Direction::Falling);
    }

    #[test]
    fn test_quantity_without_values_is_none_not_zero() {
        let rows = rows(&[(Some("10"), None), (Some("11"), None)]);
        let stats = build(&site(true, true), &rows).unwrap();
        assert!(stats.discharge.is_some());
        assert!(stats.temperature.is_none());
    }

    #[test]
    fn test_unsupported_quantity_never_built() {
        let rows = rows(&[(Some("10"), Some("8.5")), (Some("11"), Some("8.7"))]);
        let stats = build(&site(true, false), &rows).unwrap();
        assert!(stats.temperature.is_none());
        let stats = build(&site(false, true), &rows).unwrap();
        assert!(stats.discharge.is_none());
        assert!(stats.temperature.is_some());
    }

    #[test]
    fn test_no_rows_means_no_statistics() {
        assert!(build(&site(true, true), &[]).is_none());
    }

    #[test]
    fn test_ties_prefer_most_recent_row() {
        // newest-first: 640 @ t0, 598, 640 @ t0-30m, 598 @ t0-45m
        let rows = rows(&[
            (Some("640"), None),
            (Some("598"), None),
            (Some("640"), None),
            (Some("598"), None),
        ]);
        let stats = build_quantity_stats(&rows, Quantity::Discharge, &StatisticsOptions::default())
            .unwrap();
        assert_eq!(stats.high_datetime, t0());
        assert_eq!(stats.low_datetime, t0() - Duration::minutes(15));
    }

    #[test]
    fn test_prediction_uses_only_most_recent_values() {
        // 8 newest values are flat at 500; older rows climb steeply.
        let mut values: Vec<(Option<&str>, Option<&str>)> = vec![(Some("500"), None); 8];
        values.extend([(Some("100"), None), (Some("50"), None), (Some("10"), None)]);
        let stats = build_quantity_stats(&rows(&values), Quantity::Discharge, &StatisticsOptions::default())
            .unwrap();
        assert_eq!(stats.prediction_value, dec("500.00"));
        assert_eq!(stats.prediction_direction, Direction::Flat);
        assert_eq!(stats.low_value, dec("10"));
    }

    #[test]
    fn test_site_metadata_copied() {
        let rows = rows(&[(Some("10"), None)]);
        let stats = build(&site(true, false), &rows).unwrap();
        assert_eq!(stats.site_no, "13206000");
        assert_eq!(stats.site_name_short, "Boise R / Glenwood / Boise");
        assert_eq!(stats.site_region, "ID");
        assert_eq!(stats.site_timezone, "America/Boise");
        assert_eq!(stats.begin_date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(stats.fetch_datetime, t0() + Duration::minutes(5));
        assert!(stats.data_url.contains("site_no=13206000"));
    }

    #[test]
    fn test_out_of_range_forecast_holds_recent_value() {
        // steep climb near the decimal maximum extrapolates past it
        let rows = rows(&[
            (Some("79000000000000000000000000000"), None),
            (Some("60000000000000000000000000000"), None),
        ]);
        let stats = build_quantity_stats(&rows, Quantity::Discharge, &StatisticsOptions::default())
            .unwrap();
        assert_eq!(stats.prediction_value, dec("79000000000000000000000000000"));
        assert_eq!(stats.prediction_direction, Direction::Flat);
    }
}
