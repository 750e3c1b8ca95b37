use ndarray::{Array2, Array3};

use crate::features::{GEO_FEATURES, TIME_FEATURES, WEATHER_FEATURES};
use crate::normalize::OUTPUT_COLUMNS;
use crate::windowing::SequenceInputs;

/// Number of values in one model output row.
pub const OUTPUT_WIDTH: usize = OUTPUT_COLUMNS.len();

/// Errors from model invocation. Inference is deterministic, so callers must
/// not retry on any of these.
#[derive(Debug)]
pub enum InferenceError {
    /// Input or output tensor dimensions disagree with the model's contract.
    ShapeMismatch(String),
    /// A zero-window batch is not a valid model call; callers short-circuit
    /// this case before invoking.
    EmptyBatch,
    /// The concrete model runtime failed.
    Runtime(String),
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::ShapeMismatch(msg) => write!(f, "Tensor shape mismatch: {}", msg),
            InferenceError::EmptyBatch => write!(f, "Cannot run inference on a zero-window batch"),
            InferenceError::Runtime(msg) => write!(f, "Model runtime error: {}", msg),
        }
    }
}

impl std::error::Error for InferenceError {}

/// Capability contract for the pre-trained forecast model.
///
/// The model consumes three input streams per window (weather sequence,
/// static geo vector, static time vector) and emits one [`OUTPUT_WIDTH`]-wide
/// row per window, in window order. Any runtime satisfying this contract is
/// substitutable, test doubles included. Implementations are shared across
/// concurrent requests, hence the `Send + Sync` bound and `&self` receiver.
pub trait ForecastModel: Send + Sync {
    /// The window width the model was trained with.
    fn window_width(&self) -> usize;

    fn predict(
        &self,
        weather: &Array3<f64>,
        geo: &Array2<f64>,
        time: &Array2<f64>,
    ) -> Result<Array2<f64>, InferenceError>;
}

/// Run the model over one batch of windows, enforcing the tensor contract on
/// both sides of the call.
pub fn predict_windows<M: ForecastModel + ?Sized>(
    model: &M,
    inputs: &SequenceInputs,
) -> Result<Array2<f64>, InferenceError> {
    let windows = inputs.window_count();
    if windows == 0 {
        return Err(InferenceError::EmptyBatch);
    }

    let expected_weather = [windows, model.window_width(), WEATHER_FEATURES.len()];
    if inputs.weather.shape() != &expected_weather[..] {
        return Err(InferenceError::ShapeMismatch(format!(
            "weather tensor is {:?}, model expects {:?}",
            inputs.weather.shape(),
            expected_weather
        )));
    }
    if inputs.geo.shape() != &[windows, GEO_FEATURES.len()] {
        return Err(InferenceError::ShapeMismatch(format!(
            "geo tensor is {:?}, expected [{}, {}]",
            inputs.geo.shape(),
            windows,
            GEO_FEATURES.len()
        )));
    }
    if inputs.time.shape() != &[windows, TIME_FEATURES.len()] {
        return Err(InferenceError::ShapeMismatch(format!(
            "time tensor is {:?}, expected [{}, {}]",
            inputs.time.shape(),
            windows,
            TIME_FEATURES.len()
        )));
    }

    let outputs = model.predict(&inputs.weather, &inputs.geo, &inputs.time)?;
    if outputs.shape() != &[windows, OUTPUT_WIDTH] {
        return Err(InferenceError::ShapeMismatch(format!(
            "model returned {:?}, expected [{}, {}]",
            outputs.shape(),
            windows,
            OUTPUT_WIDTH
        )));
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;
    use crate::windowing::build_windows;
    use crate::features::FeatureRow;

    /// Emits `base + window_index` in every output column.
    struct StubModel {
        width: usize,
        base: f64,
    }

    impl ForecastModel for StubModel {
        fn window_width(&self) -> usize {
            self.width
        }

        fn predict(
            &self,
            weather: &Array3<f64>,
            _geo: &Array2<f64>,
            _time: &Array2<f64>,
        ) -> Result<Array2<f64>, InferenceError> {
            let windows = weather.shape()[0];
            Ok(Array2::from_shape_fn((windows, OUTPUT_WIDTH), |(i, _)| {
                self.base + i as f64
            }))
        }
    }

    /// Always returns a malformed output shape.
    struct BadShapeModel;

    impl ForecastModel for BadShapeModel {
        fn window_width(&self) -> usize {
            4
        }

        fn predict(
            &self,
            weather: &Array3<f64>,
            _geo: &Array2<f64>,
            _time: &Array2<f64>,
        ) -> Result<Array2<f64>, InferenceError> {
            Ok(Array2::zeros((weather.shape()[0], 3)))
        }
    }

    fn rows(n: usize) -> Vec<FeatureRow> {
        (0..n)
            .map(|i| {
                let mut row = FeatureRow::new();
                for feature in WEATHER_FEATURES {
                    row.set(feature, i as f64);
                }
                for feature in GEO_FEATURES {
                    row.set(feature, 0.5);
                }
                for feature in TIME_FEATURES {
                    row.set(feature, 0.0);
                }
                row
            })
            .collect()
    }

    #[test]
    fn test_predict_windows_row_per_window() {
        let model = StubModel { width: 4, base: 10.0 };
        let inputs = build_windows(&rows(7), 4);
        let outputs = predict_windows(&model, &inputs).unwrap();
        assert_eq!(outputs.shape(), &[3, OUTPUT_WIDTH]);
        assert_eq!(outputs[[0, 0]], 10.0);
        assert_eq!(outputs[[2, 4]], 12.0);
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let model = StubModel { width: 24, base: 0.0 };
        let inputs = build_windows(&rows(10), 24);
        assert!(matches!(
            predict_windows(&model, &inputs),
            Err(InferenceError::EmptyBatch)
        ));
    }

    #[test]
    fn test_window_width_mismatch() {
        let model = StubModel { width: 24, base: 0.0 };
        let inputs = build_windows(&rows(10), 6); // windows of the wrong width
        assert!(matches!(
            predict_windows(&model, &inputs),
            Err(InferenceError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_malformed_model_output_rejected() {
        let model = BadShapeModel;
        let inputs = build_windows(&rows(7), 4);
        assert!(matches!(
            predict_windows(&model, &inputs),
            Err(InferenceError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_trait_object_usable() {
        let model: Box<dyn ForecastModel> = Box::new(StubModel { width: 4, base: 1.0 });
        let inputs = build_windows(&rows(6), 4);
        let outputs = predict_windows(model.as_ref(), &inputs).unwrap();
        assert_eq!(outputs.shape(), &[2, OUTPUT_WIDTH]);
    }
}
