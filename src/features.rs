use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// The nine hourly weather variables, in the column order the model's
/// weather tensor expects.
pub const WEATHER_FEATURES: [&str; 9] = [
    "temperature_2m",
    "precipitation",
    "relative_humidity_2m",
    "wind_speed_10m",
    "snowfall",
    "snow_depth",
    "pressure_msl",
    "cloud_cover",
    "wind_direction_10m",
];

/// Static geographic context features (coordinate-bound scaled).
pub const GEO_FEATURES: [&str; 2] = ["latitude", "longitude"];

/// Cyclic time features fed to the model. The year features are synthesized
/// as well but stay out of this list: they are carried on the row without
/// ever reaching the time tensor.
pub const TIME_FEATURES: [&str; 6] = [
    "month_sin",
    "month_cos",
    "day_sin",
    "day_cos",
    "hour_sin",
    "hour_cos",
];

/// Prediction target columns. Zero-filled placeholders before inference so
/// normalization can run uniformly over rows that do not know their targets.
pub const TARGET_FEATURES: [&str; 5] = [
    "temperature_2m_next",
    "precipitation_next",
    "relative_humidity_2m_next",
    "wind_speed_10m_next",
    "snowfall_next",
];

/// Features normalized with z-score scaling, targets included.
pub const STANDARD_FEATURES: [&str; 10] = [
    "temperature_2m",
    "pressure_msl",
    "wind_speed_10m",
    "precipitation",
    "snowfall",
    "snow_depth",
    "temperature_2m_next",
    "precipitation_next",
    "wind_speed_10m_next",
    "snowfall_next",
];

/// Features normalized with min-max scaling, targets included.
pub const MINMAX_FEATURES: [&str; 4] = [
    "relative_humidity_2m",
    "cloud_cover",
    "wind_direction_10m",
    "relative_humidity_2m_next",
];

/// One hour of raw weather observations, as delivered by the upstream
/// provider. Rows are expected in ascending time order; window construction
/// depends on that ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    pub time: NaiveDateTime,
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub precipitation: f64,
    pub snowfall: f64,
    /// The only field the provider reports with gaps; missing values become
    /// 0.0 when features are built.
    pub snow_depth: Option<f64>,
    pub pressure_msl: f64,
    pub cloud_cover: f64,
    pub wind_speed_10m: f64,
    pub wind_direction_10m: f64,
}

/// Cyclic encodings derived from one timestamp.
///
/// `days_in_month` is an intermediate of the day encoding and is not a model
/// feature; `year_sin`/`year_cos` are batch-relative (see
/// [`synthesize_time_features`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFeatures {
    pub month_sin: f64,
    pub month_cos: f64,
    pub day_sin: f64,
    pub day_cos: f64,
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub year_sin: f64,
    pub year_cos: f64,
    pub days_in_month: u32,
}

/// Number of days in a Gregorian calendar month, leap years included.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("month comes from a valid chrono date");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("first day of the following month is always valid");
    next.signed_duration_since(first).num_days() as u32
}

/// Derives the cyclic time features for an ordered batch of timestamps.
///
/// The year position is relative to the span of years present in the batch,
/// found in a single pre-pass. When the batch covers one calendar year the
/// divisor is forced to 1, so every row gets year_sin = 0, year_cos = 1.
pub fn synthesize_time_features(times: &[NaiveDateTime]) -> Vec<TimeFeatures> {
    use std::f64::consts::TAU;

    let min_year = times.iter().map(|t| t.year()).min();
    let max_year = times.iter().map(|t| t.year()).max();
    let (min_year, year_span) = match (min_year, max_year) {
        (Some(lo), Some(hi)) if hi > lo => (lo, (hi - lo) as f64),
        (Some(lo), Some(_)) => (lo, 1.0),
        _ => return Vec::new(),
    };

    times
        .iter()
        .map(|t| {
            let dim = days_in_month(t.year(), t.month());
            let month_angle = TAU * t.month() as f64 / 12.0;
            let day_angle = TAU * t.day() as f64 / dim as f64;
            let hour_angle = TAU * t.hour() as f64 / 24.0;
            let year_angle = TAU * (t.year() - min_year) as f64 / year_span;
            TimeFeatures {
                month_sin: month_angle.sin(),
                month_cos: month_angle.cos(),
                day_sin: day_angle.sin(),
                day_cos: day_angle.cos(),
                hour_sin: hour_angle.sin(),
                hour_cos: hour_angle.cos(),
                year_sin: year_angle.sin(),
                year_cos: year_angle.cos(),
                days_in_month: dim,
            }
        })
        .collect()
}

/// A named-column feature row: one observation merged with its synthesized
/// time features, the scaled coordinates, and zeroed target placeholders.
///
/// Columns are stored by name because the normalizer's contract is
/// name-driven: a feature named in a scaling scheme but absent from the row
/// passes through untouched. Typed access would make that case
/// unrepresentable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    columns: BTreeMap<String, f64>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an observation with its time features and the request's scaled
    /// coordinates. `snow_depth` gaps default to 0.0 here.
    pub fn from_observation(
        obs: &ObservationRow,
        time: &TimeFeatures,
        lat_scaled: f64,
        lon_scaled: f64,
    ) -> Self {
        let mut row = Self::new();
        row.set("temperature_2m", obs.temperature_2m);
        row.set("relative_humidity_2m", obs.relative_humidity_2m);
        row.set("precipitation", obs.precipitation);
        row.set("snowfall", obs.snowfall);
        row.set("snow_depth", obs.snow_depth.unwrap_or(0.0));
        row.set("pressure_msl", obs.pressure_msl);
        row.set("cloud_cover", obs.cloud_cover);
        row.set("wind_speed_10m", obs.wind_speed_10m);
        row.set("wind_direction_10m", obs.wind_direction_10m);

        row.set("latitude", lat_scaled);
        row.set("longitude", lon_scaled);

        row.set("month_sin", time.month_sin);
        row.set("month_cos", time.month_cos);
        row.set("day_sin", time.day_sin);
        row.set("day_cos", time.day_cos);
        row.set("hour_sin", time.hour_sin);
        row.set("hour_cos", time.hour_cos);
        row.set("year_sin", time.year_sin);
        row.set("year_cos", time.year_cos);

        for target in TARGET_FEATURES {
            row.set(target, 0.0);
        }
        row
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.columns.get(feature).copied()
    }

    pub fn set(&mut self, feature: &str, value: f64) {
        self.columns.insert(feature.to_string(), value);
    }

    pub fn remove(&mut self, feature: &str) -> Option<f64> {
        self.columns.remove(feature)
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.columns.contains_key(feature)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
