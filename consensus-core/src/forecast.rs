//! Positional alignment of multi-day forecasts.
//!
//! Series are merged by index, not by calendar date: entry `i` of every series
//! is treated as the same day offset. If providers start their windows at
//! different times the merged date label (taken from the first series) can be
//! wrong for the averaged values.

use crate::{
    aggregate::{MEASUREMENT_DECIMALS, aggregated_label, majority_vote, mean, round_to},
    model::{ForecastEntry, ForecastResult},
};

/// Merge forecast series position by position, truncated to the shortest one.
///
/// A single series is returned unchanged; `None` only for an empty input.
pub fn align_forecasts(series: &[ForecastResult]) -> Option<ForecastResult> {
    let first = series.first()?;
    if series.len() == 1 {
        return Some(first.clone());
    }

    let min_len = series.iter().map(|s| s.forecast.len()).min().unwrap_or(0);

    let forecast = (0..min_len)
        .filter_map(|i| {
            let temperature = mean(series.iter().map(|s| s.forecast[i].temperature))?;
            let description =
                majority_vote(series.iter().map(|s| s.forecast[i].description.as_str()))?;

            Some(ForecastEntry {
                date: first.forecast[i].date.clone(),
                temperature: round_to(temperature, MEASUREMENT_DECIMALS),
                description: description.to_string(),
            })
        })
        .collect();

    Some(ForecastResult {
        city: first.city.clone(),
        forecast,
        source: aggregated_label(series.iter().map(|s| s.source.as_str())),
    })
}
