use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::features::{MINMAX_FEATURES, STANDARD_FEATURES};

/// z-score parameters for one feature: v' = (v - mean) / scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardParams {
    pub mean: f64,
    pub scale: f64,
}

impl StandardParams {
    pub fn forward(&self, v: f64) -> f64 {
        (v - self.mean) / self.scale
    }

    pub fn inverse(&self, v: f64) -> f64 {
        v * self.scale + self.mean
    }
}

/// Min-max parameters for one feature: v' = (v - min) / (max - min).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxParams {
    pub min: f64,
    pub max: f64,
}

impl MinMaxParams {
    pub fn forward(&self, v: f64) -> f64 {
        (v - self.min) / (self.max - self.min)
    }

    pub fn inverse(&self, v: f64) -> f64 {
        v * (self.max - self.min) + self.min
    }
}

/// Training-time coordinate bounding box, stored on disk as the ordered
/// 4-tuple [min_lat, max_lat, min_lon, max_lon].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct CoordinateBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl From<[f64; 4]> for CoordinateBounds {
    fn from(raw: [f64; 4]) -> Self {
        Self {
            min_lat: raw[0],
            max_lat: raw[1],
            min_lon: raw[2],
            max_lon: raw[3],
        }
    }
}

impl From<CoordinateBounds> for [f64; 4] {
    fn from(b: CoordinateBounds) -> Self {
        [b.min_lat, b.max_lat, b.min_lon, b.max_lon]
    }
}

impl CoordinateBounds {
    /// Rescale a coordinate pair into the unit square the model was trained
    /// on. Coordinates outside the box map outside [0, 1]; the caller decides
    /// whether that is acceptable.
    pub fn scale(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        (
            (latitude - self.min_lat) / (self.max_lat - self.min_lat),
            (longitude - self.min_lon) / (self.max_lon - self.min_lon),
        )
    }
}

/// Errors raised while loading or validating scaling artifacts. All of them
/// are startup-fatal: a process without valid scalers cannot serve forecasts.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    /// A feature the normalizer relies on has no entry in its scheme's
    /// parameter file. The normalizer tolerates features missing from a data
    /// row, never from the artifacts.
    MissingFeature {
        scheme: &'static str,
        feature: &'static str,
    },
    InvalidParams(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
            ConfigError::MissingFeature { scheme, feature } => {
                write!(f, "{} scaler has no parameters for feature '{}'", scheme, feature)
            }
            ConfigError::InvalidParams(msg) => write!(f, "Invalid scaler parameters: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::Io(error)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

/// The three immutable scaling parameter sets the pipeline needs.
///
/// Loaded once at startup and injected (typically as `Arc<ScalerSet>`); the
/// set is never mutated afterwards, so concurrent requests share it without
/// locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerSet {
    standard: HashMap<String, StandardParams>,
    minmax: HashMap<String, MinMaxParams>,
    pub bounds: CoordinateBounds,
}

pub const STANDARD_SCALER_FILE: &str = "scaler_standard.json";
pub const MINMAX_SCALER_FILE: &str = "scaler_minmax.json";
pub const COORDINATE_SCALER_FILE: &str = "scaler_coordinates.json";

impl ScalerSet {
    /// Load the three artifact files from `dir` and validate them.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let standard: HashMap<String, StandardParams> =
            serde_json::from_str(&std::fs::read_to_string(dir.join(STANDARD_SCALER_FILE))?)?;
        let minmax: HashMap<String, MinMaxParams> =
            serde_json::from_str(&std::fs::read_to_string(dir.join(MINMAX_SCALER_FILE))?)?;
        let bounds: CoordinateBounds =
            serde_json::from_str(&std::fs::read_to_string(dir.join(COORDINATE_SCALER_FILE))?)?;

        let set = Self::from_parts(standard, minmax, bounds)?;
        info!(
            "loaded scaler artifacts from {} ({} standard, {} minmax features)",
            dir.display(),
            set.standard.len(),
            set.minmax.len()
        );
        Ok(set)
    }

    /// Assemble a set from already-parsed parameters, applying the same
    /// validation as [`ScalerSet::load`].
    pub fn from_parts(
        standard: HashMap<String, StandardParams>,
        minmax: HashMap<String, MinMaxParams>,
        bounds: CoordinateBounds,
    ) -> Result<Self, ConfigError> {
        for feature in STANDARD_FEATURES {
            let params = standard.get(feature).ok_or(ConfigError::MissingFeature {
                scheme: "standard",
                feature,
            })?;
            if !params.scale.is_finite() || params.scale == 0.0 {
                return Err(ConfigError::InvalidParams(format!(
                    "standard scale for '{}' must be finite and non-zero",
                    feature
                )));
            }
        }
        for feature in MINMAX_FEATURES {
            let params = minmax.get(feature).ok_or(ConfigError::MissingFeature {
                scheme: "minmax",
                feature,
            })?;
            if !(params.max > params.min) {
                return Err(ConfigError::InvalidParams(format!(
                    "minmax range for '{}' is degenerate",
                    feature
                )));
            }
        }
        if !(bounds.max_lat > bounds.min_lat) || !(bounds.max_lon > bounds.min_lon) {
            return Err(ConfigError::InvalidParams(
                "coordinate bounds are degenerate".to_string(),
            ));
        }
        Ok(Self {
            standard,
            minmax,
            bounds,
        })
    }

    pub fn standard(&self, feature: &str) -> Option<StandardParams> {
        self.standard.get(feature).copied()
    }

    pub fn minmax(&self, feature: &str) -> Option<MinMaxParams> {
        self.minmax.get(feature).copied()
    }
}
