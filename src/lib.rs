//! # Weathercast
//!
//! An hourly weather forecasting pipeline: it takes a coordinate and recent
//! hourly observations, engineers cyclic time features, normalizes with the
//! training-time scaling parameters, builds fixed-width sequence windows,
//! runs a three-input sequence model, and returns de-normalized forecasts
//! for five weather variables.
//!
//! ## Core Components
//!
//! - **Scaler Repository**: z-score, min-max and coordinate-bound parameters
//!   loaded once at startup, immutable thereafter
//! - **Time-Feature Synthesizer**: sine/cosine encodings of month, day, hour
//!   and batch-relative year position
//! - **Normalizer**: dual-scheme forward scaling with exact inverses for the
//!   model's output columns
//! - **Sequence Windower**: sliding windows over the feature table, yielding
//!   the model's three input tensors
//! - **Inference Adapter**: shape-checked dispatch to any [`ForecastModel`]
//! - **Hybrid Network**: a concrete LSTM + dense-branch model with
//!   persistence for trained weights
//! - **Upstream Client**: hourly observations from the Open-Meteo API
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use weathercast::{
//!     CoordinateBounds, ForecastPipeline, HybridForecastNetwork, MinMaxParams, ScalerSet,
//!     StandardParams, MINMAX_FEATURES, STANDARD_FEATURES,
//! };
//!
//! // Startup: load scaler artifacts and model weights once, then inject.
//! let standard: HashMap<_, _> = STANDARD_FEATURES
//!     .iter()
//!     .map(|f| (f.to_string(), StandardParams { mean: 0.0, scale: 1.0 }))
//!     .collect();
//! let minmax: HashMap<_, _> = MINMAX_FEATURES
//!     .iter()
//!     .map(|f| (f.to_string(), MinMaxParams { min: 0.0, max: 100.0 }))
//!     .collect();
//! let bounds = CoordinateBounds::from([59.0, 70.0, 19.0, 31.0]);
//! let scalers = Arc::new(ScalerSet::from_parts(standard, minmax, bounds).unwrap());
//! let model = Arc::new(HybridForecastNetwork::new(24, 64, 2, 8, 8));
//!
//! let pipeline = ForecastPipeline::new(scalers, model);
//! // Per request: pipeline.run(lat, lon, &observations)
//! let forecasts = pipeline.run(60.17, 24.94, &[]).unwrap();
//! assert!(forecasts.is_empty()); // fewer rows than one window
//! ```

/// Main library module.
pub mod features;
pub mod inference;
pub mod layers;
pub mod models;
pub mod normalize;
pub mod persistence;
pub mod pipeline;
pub mod scalers;
pub mod upstream;
pub mod utils;
pub mod windowing;

// Re-export commonly used items
pub use features::{
    synthesize_time_features, FeatureRow, ObservationRow, TimeFeatures, GEO_FEATURES,
    MINMAX_FEATURES, STANDARD_FEATURES, TARGET_FEATURES, TIME_FEATURES, WEATHER_FEATURES,
};
pub use inference::{predict_windows, ForecastModel, InferenceError, OUTPUT_WIDTH};
pub use models::hybrid::HybridForecastNetwork;
pub use normalize::{Normalizer, Scheme, OUTPUT_COLUMNS};
pub use persistence::{ModelMetadata, ModelPersistence, PersistenceError, PersistentModel};
pub use pipeline::{Forecast, ForecastError, ForecastPipeline};
pub use scalers::{ConfigError, CoordinateBounds, MinMaxParams, ScalerSet, StandardParams};
pub use upstream::{ObservationClient, UpstreamError};
pub use windowing::{build_windows, SequenceInputs, DEFAULT_WINDOW_WIDTH};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_library_integration() {
        let network = HybridForecastNetwork::new(6, 4, 1, 3, 3);
        let weather = Array3::zeros((2, 6, 9));
        let geo = Array2::zeros((2, 2));
        let time = Array2::zeros((2, 6));

        let outputs = network.predict(&weather, &geo, &time).unwrap();

        assert_eq!(outputs.shape(), &[2, OUTPUT_WIDTH]);
    }
}
