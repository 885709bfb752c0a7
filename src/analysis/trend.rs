//! Short-horizon trend prediction.
//!
//! Fits an ordinary least-squares line of value against index over the most
//! recent observations (oldest first) and extends it `count` steps. The
//! direction compares the last observation with the last forecast point
//! after rounding both to whole units (by default), so drifts below one
//! unit over the horizon read as flat.

use rust_decimal::Decimal;

use crate::logging::{self, DataSource};
use crate::model::{Direction, Prediction};
use crate::normalize::quantize;

/// Observations fed to the fit, and points forecast.
pub const PREDICTION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionOptions {
    /// Fractional digits kept on forecast values.
    pub value_places: u32,
    /// Fractional digits used when comparing for direction.
    pub compare_places: u32,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        Self {
            value_places: 2,
            compare_places: 0,
        }
    }
}

/// Least-squares slope and intercept over indices `0..seq.len()`.
///
/// `None` for an empty sequence. A single point fits a flat line through it.
pub fn fit_line(seq: &[f64]) -> Option<(f64, f64)> {
    if seq.is_empty() {
        return None;
    }
    let n = seq.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = seq.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in seq.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    Some((slope, mean_y - slope * mean_x))
}

/// Evaluates the fitted line at `len..len + count`.
pub fn predict_values(seq: &[f64], count: usize) -> Vec<f64> {
    let Some((slope, intercept)) = fit_line(seq) else {
        return Vec::new();
    };
    (seq.len()..seq.len() + count)
        .map(|x| intercept + slope * x as f64)
        .collect()
}

/// Rounds half-to-even at `places` fractional digits.
pub fn round_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round_ties_even() / factor
}

/// Compares the last observation with the last forecast point.
pub fn direction(observed: &[f64], predicted: &[f64], compare_places: u32) -> Direction {
    let (Some(&last_in), Some(&last_out)) = (observed.last(), predicted.last()) else {
        return Direction::Flat;
    };
    let last_in = round_places(last_in, compare_places);
    let last_out = round_places(last_out, compare_places);
    if last_out > last_in {
        Direction::Rising
    } else if last_out < last_in {
        Direction::Falling
    } else {
        Direction::Flat
    }
}

/// `None` when the value is not finite or outside the decimal range.
fn to_decimal(value: f64, places: u32) -> Option<Decimal> {
    Decimal::from_f64_retain(value).map(|d| quantize(d, places))
}

/// Forecasts `count` points after `seq` (oldest first) and classifies the trend.
///
/// If any forecast point cannot be represented as a decimal, the forecast is
/// dropped: no values and `Flat`. Callers fall back to the last observation.
pub fn predict(seq: &[f64], count: usize, options: PredictionOptions) -> Prediction {
    let predicted = predict_values(seq, count);
    let values: Option<Vec<Decimal>> = predicted
        .iter()
        .map(|v| to_decimal(*v, options.value_places))
        .collect();

    match values {
        Some(values) => Prediction {
            direction: direction(seq, &predicted, options.compare_places),
            values,
        },
        None => {
            logging::warn(
                DataSource::System,
                None,
                &format!("Forecast out of decimal range ({:?}), keeping last observation", predicted.last()),
            );
            Prediction {
                values: Vec::new(),
                direction: Direction::Flat,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
