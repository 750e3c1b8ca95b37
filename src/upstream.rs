use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use serde::Deserialize;

use crate::features::{ObservationRow, WEATHER_FEATURES};

/// Default Open-Meteo forecast endpoint (free, no API key).
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Upstream request configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_sec: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_sec: 30,
        }
    }
}

/// Errors from the upstream observation source. The client never retries;
/// retry policy belongs to the caller.
#[derive(Debug)]
pub enum UpstreamError {
    /// Transport-level failure (connect, timeout, body read).
    Http(reqwest::Error),
    /// Non-success HTTP status from the provider.
    Status(u16),
    /// The response deviates from the provider's fixed schema.
    Malformed(String),
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamError::Http(err) => write!(f, "Upstream request failed: {}", err),
            UpstreamError::Status(code) => write!(f, "Upstream returned HTTP {}", code),
            UpstreamError::Malformed(msg) => write!(f, "Malformed upstream response: {}", msg),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpstreamError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        UpstreamError::Http(error)
    }
}

/// Column-oriented hourly block, the provider's fixed response contract.
/// Only `snow_depth` is allowed to carry nulls.
#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    relative_humidity_2m: Vec<f64>,
    precipitation: Vec<f64>,
    snowfall: Vec<f64>,
    snow_depth: Vec<Option<f64>>,
    pressure_msl: Vec<f64>,
    cloud_cover: Vec<f64>,
    wind_speed_10m: Vec<f64>,
    wind_direction_10m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: HourlyBlock,
}

/// Fetches hourly weather observations from Open-Meteo.
pub struct ObservationClient {
    client: reqwest::Client,
    base_url: String,
}

impl ObservationClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_sec))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: config.base_url,
        }
    }

    /// Fetch hourly rows for a coordinate over an inclusive date range,
    /// time-ordered as delivered by the provider.
    pub async fn fetch_hourly(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ObservationRow>, UpstreamError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", start_date.format("%Y-%m-%d").to_string()),
                ("end_date", end_date.format("%Y-%m-%d").to_string()),
                ("hourly", WEATHER_FEATURES.join(",")),
                ("wind_speed_unit", "ms".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: HourlyResponse = response.json().await?;
        let rows = decode_hourly(body.hourly)?;
        debug!(
            "fetched {} hourly rows for lat={} lon={} ({}..={})",
            rows.len(),
            latitude,
            longitude,
            start_date,
            end_date
        );
        Ok(rows)
    }
}

impl Default for ObservationClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The date range the forecaster feeds on: observations from `lookback`
/// days ago up to yesterday, so every fetched hour is a completed one.
pub fn recent_range(lookback_days: i64) -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    (today - Duration::days(lookback_days), today - Duration::days(1))
}

/// Zip the provider's column arrays into observation rows. Column length
/// disagreement and unparseable timestamps are schema violations.
fn decode_hourly(block: HourlyBlock) -> Result<Vec<ObservationRow>, UpstreamError> {
    let n = block.time.len();
    let lengths = [
        block.temperature_2m.len(),
        block.relative_humidity_2m.len(),
        block.precipitation.len(),
        block.snowfall.len(),
        block.snow_depth.len(),
        block.pressure_msl.len(),
        block.cloud_cover.len(),
        block.wind_speed_10m.len(),
        block.wind_direction_10m.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(UpstreamError::Malformed(format!(
            "hourly columns have diverging lengths (time has {}, others {:?})",
            n, lengths
        )));
    }

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let time = parse_hour_stamp(&block.time[i])?;
        rows.push(ObservationRow {
            time,
            temperature_2m: block.temperature_2m[i],
            relative_humidity_2m: block.relative_humidity_2m[i],
            precipitation: block.precipitation[i],
            snowfall: block.snowfall[i],
            snow_depth: block.snow_depth[i],
            pressure_msl: block.pressure_msl[i],
            cloud_cover: block.cloud_cover[i],
            wind_speed_10m: block.wind_speed_10m[i],
            wind_direction_10m: block.wind_direction_10m[i],
        });
    }
    Ok(rows)
}

/// Open-Meteo stamps hours as ISO-8601 to minute precision, e.g.
/// "2024-03-01T13:00".
fn parse_hour_stamp(stamp: &str) -> Result<NaiveDateTime, UpstreamError> {
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M")
        .map_err(|err| UpstreamError::Malformed(format!("bad timestamp '{}': {}", stamp, err)))
}
