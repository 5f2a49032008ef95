//! Per-column arithmetic means over a window of readings.

use crate::reading::{Reading, Window, WindowAverage};

/// Mean of the values that are present, or `None` when there are none.
fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Average each sensor column of `rows` independently.
///
/// A reading missing a column is left out of that column's mean only; it
/// still contributes to the others. Returns `None` for an empty slice.
pub fn average(window: Window, rows: &[Reading]) -> Option<WindowAverage> {
    if rows.is_empty() {
        return None;
    }

    let average = WindowAverage {
        window,
        avg_temperature: mean(rows.iter().map(|r| r.temperature)),
        avg_humidity: mean(rows.iter().map(|r| r.humidity)),
        avg_solar_radiation: mean(rows.iter().map(|r| r.solar_radiation)),
        samples: rows.len(),
    };

    log::debug!(
        "[Aggregate] window {} over {} rows: temp={:?} humidity={:?} solar={:?}",
        window.start,
        rows.len(),
        average.avg_temperature,
        average.avg_humidity,
        average.avg_solar_radiation
    );
    Some(average)
}
