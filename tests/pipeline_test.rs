use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use ndarray::{Array2, Array3};
use rand::Rng;
use weathercast::{
    CoordinateBounds, ForecastModel, ForecastPipeline, HybridForecastNetwork, InferenceError,
    MinMaxParams, ObservationRow, ScalerSet, StandardParams, MINMAX_FEATURES, OUTPUT_WIDTH,
    STANDARD_FEATURES,
};

/// Scaling parameters in the ballpark of a Nordic winter training set.
fn scaler_set() -> Arc<ScalerSet> {
    let mut standard = HashMap::new();
    for feature in STANDARD_FEATURES {
        let params = match feature {
            "temperature_2m" | "temperature_2m_next" => StandardParams { mean: 1.5, scale: 7.0 },
            "pressure_msl" => StandardParams { mean: 1010.0, scale: 12.0 },
            "wind_speed_10m" | "wind_speed_10m_next" => StandardParams { mean: 4.0, scale: 2.5 },
            "precipitation" | "precipitation_next" => StandardParams { mean: 0.1, scale: 0.3 },
            "snowfall" | "snowfall_next" => StandardParams { mean: 0.5, scale: 0.2 },
            _ => StandardParams { mean: 0.05, scale: 0.1 }, // snow_depth
        };
        standard.insert(feature.to_string(), params);
    }
    let mut minmax = HashMap::new();
    for feature in MINMAX_FEATURES {
        let params = match feature {
            "relative_humidity_2m" | "relative_humidity_2m_next" => {
                MinMaxParams { min: 20.0, max: 100.0 }
            }
            "cloud_cover" => MinMaxParams { min: 0.0, max: 100.0 },
            _ => MinMaxParams { min: 0.0, max: 360.0 }, // wind_direction_10m
        };
        minmax.insert(feature.to_string(), params);
    }
    let bounds = CoordinateBounds::from([59.0, 70.0, 19.0, 31.0]);
    Arc::new(ScalerSet::from_parts(standard, minmax, bounds).unwrap())
}

/// Generate plausible hourly winter weather with some randomness, in the
/// spirit of a real observation feed.
fn synthetic_observations(hours: usize) -> Vec<ObservationRow> {
    let mut rng = rand::thread_rng();
    let start = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    (0..hours)
        .map(|i| {
            let time = start + Duration::hours(i as i64);
            let daily = (std::f64::consts::TAU * (i % 24) as f64 / 24.0).sin();
            let temperature = -4.0 + 3.0 * daily + rng.gen_range(-1.0..1.0);
            let humidity = (82.0 - 5.0 * daily + rng.gen_range(-4.0..4.0)).clamp(30.0, 100.0);
            let snowing = temperature < -1.0 && rng.gen_bool(0.3);
            ObservationRow {
                time,
                temperature_2m: temperature,
                relative_humidity_2m: humidity,
                precipitation: if snowing { rng.gen_range(0.0..0.8) } else { 0.0 },
                snowfall: if snowing { rng.gen_range(0.0..0.5) } else { 0.0 },
                snow_depth: if i % 7 == 0 { None } else { Some(rng.gen_range(0.0..0.3)) },
                pressure_msl: 1008.0 + rng.gen_range(-6.0..6.0),
                cloud_cover: rng.gen_range(40.0..100.0),
                wind_speed_10m: rng.gen_range(1.0..9.0),
                wind_direction_10m: rng.gen_range(0.0..360.0),
            }
        })
        .collect()
}

/// Returns [1, 2, 3, 4, 5] for every window.
struct FixedModel {
    width: usize,
}

impl ForecastModel for FixedModel {
    fn window_width(&self) -> usize {
        self.width
    }

    fn predict(
        &self,
        weather: &Array3<f64>,
        _geo: &Array2<f64>,
        _time: &Array2<f64>,
    ) -> Result<Array2<f64>, InferenceError> {
        Ok(Array2::from_shape_fn(
            (weather.shape()[0], OUTPUT_WIDTH),
            |(_, k)| (k + 1) as f64,
        ))
    }
}

#[test]
fn test_end_to_end_window_accounting() {
    let pipeline = ForecastPipeline::new(scaler_set(), Arc::new(FixedModel { width: 24 }));
    let forecasts = pipeline
        .run(60.17, 24.94, &synthetic_observations(28))
        .unwrap();

    assert_eq!(forecasts.len(), 4);
    for (i, forecast) in forecasts.iter().enumerate() {
        assert_eq!(forecast.hour, i);
        for value in [
            forecast.temperature_2m_next,
            forecast.precipitation_next,
            forecast.relative_humidity_2m_next,
            forecast.wind_speed_10m_next,
            forecast.snowfall_next,
        ] {
            assert!(value.is_finite());
            // rounded to one decimal place
            assert!((value * 10.0 - (value * 10.0).round()).abs() < 1e-9);
        }
    }
}

#[test]
fn test_end_to_end_output_column_mapping() {
    let pipeline = ForecastPipeline::new(scaler_set(), Arc::new(FixedModel { width: 24 }));
    let forecasts = pipeline
        .run(60.17, 24.94, &synthetic_observations(25))
        .unwrap();

    assert_eq!(forecasts.len(), 1);
    let f = &forecasts[0];
    // inverse of the stub's [1, 2, 3, 4, 5] under the known scaler params
    assert_eq!(f.temperature_2m_next, 8.5); // 1 * 7.0 + 1.5
    assert_eq!(f.precipitation_next, 0.7); // 2 * 0.3 + 0.1
    assert_eq!(f.relative_humidity_2m_next, 260.0); // 3 * 80 + 20
    assert_eq!(f.wind_speed_10m_next, 14.0); // 4 * 2.5 + 4.0
    assert_eq!(f.snowfall_next, 1.5); // 5 * 0.2 + 0.5
}

#[test]
fn test_too_few_observations_yield_empty_forecast() {
    let pipeline = ForecastPipeline::new(scaler_set(), Arc::new(FixedModel { width: 24 }));
    let forecasts = pipeline
        .run(60.17, 24.94, &synthetic_observations(10))
        .unwrap();
    assert!(forecasts.is_empty());
}

#[test]
fn test_exactly_one_window_width_of_rows_is_still_empty() {
    let pipeline = ForecastPipeline::new(scaler_set(), Arc::new(FixedModel { width: 24 }));
    let forecasts = pipeline
        .run(60.17, 24.94, &synthetic_observations(24))
        .unwrap();
    assert!(forecasts.is_empty());
}

#[test]
fn test_end_to_end_with_hybrid_network() {
    let model = Arc::new(HybridForecastNetwork::new(24, 16, 2, 8, 8));
    let pipeline = ForecastPipeline::new(scaler_set(), model);
    let forecasts = pipeline
        .run(60.17, 24.94, &synthetic_observations(30))
        .unwrap();

    assert_eq!(forecasts.len(), 6);
    for forecast in &forecasts {
        assert!(forecast.temperature_2m_next.is_finite());
        assert!(forecast.precipitation_next.is_finite());
        assert!(forecast.relative_humidity_2m_next.is_finite());
        assert!(forecast.wind_speed_10m_next.is_finite());
        assert!(forecast.snowfall_next.is_finite());
    }
}

#[test]
fn test_forecast_json_contract() {
    let pipeline = ForecastPipeline::new(scaler_set(), Arc::new(FixedModel { width: 24 }));
    let forecasts = pipeline
        .run(60.17, 24.94, &synthetic_observations(25))
        .unwrap();
    let json = serde_json::to_string(&forecasts).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed[0]["hour"], 0);
    assert_eq!(parsed[0]["relative_humidity_2m_next"], 260.0);
}
