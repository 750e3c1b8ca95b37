use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::features::{synthesize_time_features, FeatureRow, ObservationRow};
use crate::inference::{predict_windows, ForecastModel, InferenceError};
use crate::normalize::Normalizer;
use crate::scalers::ScalerSet;
use crate::utils::round1;

/// One de-normalized forecast row. Field names are the crate's JSON output
/// contract; values are rounded to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// 0-based window index: forecast for the hour following window `hour`.
    pub hour: usize,
    pub temperature_2m_next: f64,
    pub precipitation_next: f64,
    pub relative_humidity_2m_next: f64,
    pub wind_speed_10m_next: f64,
    pub snowfall_next: f64,
}

/// Errors surfaced by a pipeline run.
#[derive(Debug)]
pub enum ForecastError {
    /// The request's coordinates are unusable.
    Validation(String),
    /// The model rejected or failed the batch. Deterministic, never retried.
    Inference(InferenceError),
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::Validation(msg) => write!(f, "Invalid request: {}", msg),
            ForecastError::Inference(err) => write!(f, "Inference failed: {}", err),
        }
    }
}

impl std::error::Error for ForecastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForecastError::Inference(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InferenceError> for ForecastError {
    fn from(error: InferenceError) -> Self {
        ForecastError::Inference(error)
    }
}

/// The forecast pipeline: observations in, de-normalized forecasts out.
///
/// Holds the two process-lifetime resources — the scaler set and the model —
/// behind `Arc`s. Both are immutable, so one pipeline value serves any number
/// of concurrent requests.
pub struct ForecastPipeline<M: ForecastModel> {
    scalers: Arc<ScalerSet>,
    model: Arc<M>,
}

impl<M: ForecastModel> ForecastPipeline<M> {
    pub fn new(scalers: Arc<ScalerSet>, model: Arc<M>) -> Self {
        Self { scalers, model }
    }

    /// Window width of the underlying model; also the minimum number of
    /// observations that yields a non-empty forecast (width + 1).
    pub fn window_width(&self) -> usize {
        self.model.window_width()
    }

    /// Run the full pipeline for one request.
    ///
    /// Observations must be ordered by time ascending; each window of
    /// `window_width` consecutive rows yields one forecast row, tagged with
    /// the window index as `hour`. Fewer than `window_width + 1` observations
    /// produce an empty forecast list, mirroring the windower's zero-window
    /// policy; it is not an error.
    pub fn run(
        &self,
        latitude: f64,
        longitude: f64,
        observations: &[ObservationRow],
    ) -> Result<Vec<Forecast>, ForecastError> {
        validate_coordinates(latitude, longitude)?;

        info!(
            "forecast request: lat={} lon={} observations={}",
            latitude,
            longitude,
            observations.len()
        );

        let (lat_scaled, lon_scaled) = self.scalers.bounds.scale(latitude, longitude);
        let times: Vec<_> = observations.iter().map(|o| o.time).collect();
        let time_features = synthesize_time_features(&times);

        let normalizer = Normalizer::new(&self.scalers);
        let rows: Vec<FeatureRow> = observations
            .iter()
            .zip(&time_features)
            .map(|(obs, tf)| {
                let mut row = FeatureRow::from_observation(obs, tf, lat_scaled, lon_scaled);
                normalizer.forward_row(&mut row);
                row
            })
            .collect();

        let inputs = crate::windowing::build_windows(&rows, self.model.window_width());
        if inputs.is_empty() {
            debug!(
                "{} observations fill no {}-hour window, returning empty forecast",
                observations.len(),
                self.model.window_width()
            );
            return Ok(Vec::new());
        }

        let raw = predict_windows(self.model.as_ref(), &inputs)?;

        let forecasts = raw
            .rows()
            .into_iter()
            .enumerate()
            .map(|(hour, row)| {
                let physical = normalizer.inverse(row);
                Forecast {
                    hour,
                    temperature_2m_next: round1(physical[0]),
                    precipitation_next: round1(physical[1]),
                    relative_humidity_2m_next: round1(physical[2]),
                    wind_speed_10m_next: round1(physical[3]),
                    snowfall_next: round1(physical[4]),
                }
            })
            .collect();
        Ok(forecasts)
    }
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ForecastError> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(ForecastError::Validation(
            "coordinates must be finite numbers".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ForecastError::Validation(format!(
            "latitude {} outside [-90, 90]",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ForecastError::Validation(format!(
            "longitude {} outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}
