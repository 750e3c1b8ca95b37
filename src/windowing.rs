use ndarray::{Array2, Array3};

use crate::features::{FeatureRow, GEO_FEATURES, TIME_FEATURES, WEATHER_FEATURES};

/// Default window width: one day of hourly rows per model input instance.
pub const DEFAULT_WINDOW_WIDTH: usize = 24;

/// The three input tensors for one batch of sequence windows.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceInputs {
    /// Shape (windows, width, 9): the weather block of each window.
    pub weather: Array3<f64>,
    /// Shape (windows, 2): scaled latitude/longitude from each anchor row.
    pub geo: Array2<f64>,
    /// Shape (windows, 6): cyclic month/day/hour features from each anchor
    /// row. The year features never enter this tensor.
    pub time: Array2<f64>,
}

impl SequenceInputs {
    pub fn window_count(&self) -> usize {
        self.weather.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.window_count() == 0
    }
}

/// Slide a fixed-width window over time-ordered feature rows.
///
/// Window `i` covers `rows[i..i + width)`; its static geo and time vectors
/// come from the anchor row `i + width - 1`, the last row of the window,
/// which is the moment the prediction is made for. With `len <= width` the
/// result is a valid zero-window batch, not an error.
pub fn build_windows(rows: &[FeatureRow], width: usize) -> SequenceInputs {
    assert!(width > 0, "window width must be positive");

    let count = rows.len().saturating_sub(width);
    let mut weather = Array3::zeros((count, width, WEATHER_FEATURES.len()));
    let mut geo = Array2::zeros((count, GEO_FEATURES.len()));
    let mut time = Array2::zeros((count, TIME_FEATURES.len()));

    for i in 0..count {
        for t in 0..width {
            let row = &rows[i + t];
            for (k, feature) in WEATHER_FEATURES.iter().enumerate() {
                weather[[i, t, k]] = column(row, feature);
            }
        }
        let anchor = &rows[i + width - 1];
        for (k, feature) in GEO_FEATURES.iter().enumerate() {
            geo[[i, k]] = column(anchor, feature);
        }
        for (k, feature) in TIME_FEATURES.iter().enumerate() {
            time[[i, k]] = column(anchor, feature);
        }
    }

    SequenceInputs { weather, geo, time }
}

fn column(row: &FeatureRow, feature: &str) -> f64 {
    row.get(feature)
        .unwrap_or_else(|| panic!("feature column '{}' missing from row", feature))
}
