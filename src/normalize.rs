use log::debug;
use ndarray::ArrayView1;

use crate::features::{FeatureRow, MINMAX_FEATURES, STANDARD_FEATURES};
use crate::scalers::ScalerSet;

/// Scaling scheme applied to a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Standard,
    MinMax,
}

/// The model's output tensor columns, in order, with the scheme that maps
/// each back to physical units.
///
/// The order is dictated by the trained model's output layout. Permuting it
/// silently corrupts forecasts, so it lives in exactly one place.
pub const OUTPUT_COLUMNS: [(&str, Scheme); 5] = [
    ("temperature_2m_next", Scheme::Standard),
    ("precipitation_next", Scheme::Standard),
    ("relative_humidity_2m_next", Scheme::MinMax),
    ("wind_speed_10m_next", Scheme::Standard),
    ("snowfall_next", Scheme::Standard),
];

/// Applies the two scaling schemes to named feature columns, and the exact
/// algebraic inverse to model outputs.
pub struct Normalizer<'a> {
    scalers: &'a ScalerSet,
}

impl<'a> Normalizer<'a> {
    pub fn new(scalers: &'a ScalerSet) -> Self {
        Self { scalers }
    }

    /// Scale the named standard and min-max feature columns of `row` in
    /// place. Columns outside both lists pass through unchanged.
    ///
    /// A feature named in a scheme but absent from the row is tolerated and
    /// left unscaled: partial rows are valid input. The skip is logged so a
    /// misconfigured feature name does not stay invisible.
    pub fn forward_row(&self, row: &mut FeatureRow) {
        for feature in STANDARD_FEATURES {
            match row.get(feature) {
                Some(v) => {
                    let params = self
                        .scalers
                        .standard(feature)
                        .expect("standard feature set validated at load");
                    row.set(feature, params.forward(v));
                }
                None => debug!("standard feature '{}' absent from row, left unscaled", feature),
            }
        }
        for feature in MINMAX_FEATURES {
            match row.get(feature) {
                Some(v) => {
                    let params = self
                        .scalers
                        .minmax(feature)
                        .expect("minmax feature set validated at load");
                    row.set(feature, params.forward(v));
                }
                None => debug!("minmax feature '{}' absent from row, left unscaled", feature),
            }
        }
    }

    /// Map one raw model output row back to physical units, column by column
    /// in [`OUTPUT_COLUMNS`] order.
    pub fn inverse(&self, prediction: ArrayView1<'_, f64>) -> [f64; 5] {
        assert_eq!(
            prediction.len(),
            OUTPUT_COLUMNS.len(),
            "model output row has {} columns, expected {}",
            prediction.len(),
            OUTPUT_COLUMNS.len()
        );

        let mut physical = [0.0; 5];
        for (i, (feature, scheme)) in OUTPUT_COLUMNS.iter().enumerate() {
            physical[i] = match scheme {
                Scheme::Standard => self
                    .scalers
                    .standard(feature)
                    .expect("standard feature set validated at load")
                    .inverse(prediction[i]),
                Scheme::MinMax => self
                    .scalers
                    .minmax(feature)
                    .expect("minmax feature set validated at load")
                    .inverse(prediction[i]),
            };
        }
        physical
    }
}
