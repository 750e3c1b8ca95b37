use ndarray::{concatenate, s, Array2, Array3, ArrayView1, ArrayView2, Axis};

use crate::features::{GEO_FEATURES, TIME_FEATURES, WEATHER_FEATURES};
use crate::inference::{ForecastModel, InferenceError, OUTPUT_WIDTH};
use crate::layers::linear::LinearLayer;
use crate::layers::lstm_cell::LSTMCell;
use crate::utils::relu;

/// Three-input hybrid forecast network.
///
/// An LSTM stack encodes the width×9 weather sequence of each window; two
/// ReLU dense branches embed the static geo and time vectors of the anchor
/// row; a linear head maps the concatenated encodings to the five output
/// variables. Matches the trained artifact's declared tensor contract, so a
/// persisted weight set drops straight in.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridForecastNetwork {
    lstm_layers: Vec<LSTMCell>,
    geo_branch: LinearLayer,
    time_branch: LinearLayer,
    head: LinearLayer,
    window_width: usize,
}

impl HybridForecastNetwork {
    /// Creates an untrained network with random weights. Useful as a
    /// stand-in until a trained artifact is loaded, and in tests.
    pub fn new(
        window_width: usize,
        hidden_size: usize,
        num_lstm_layers: usize,
        geo_units: usize,
        time_units: usize,
    ) -> Self {
        assert!(num_lstm_layers > 0, "network needs at least one LSTM layer");
        let mut lstm_layers = Vec::new();
        for i in 0..num_lstm_layers {
            let input_size = if i == 0 { WEATHER_FEATURES.len() } else { hidden_size };
            lstm_layers.push(LSTMCell::new(input_size, hidden_size));
        }
        Self {
            lstm_layers,
            geo_branch: LinearLayer::new(GEO_FEATURES.len(), geo_units),
            time_branch: LinearLayer::new(TIME_FEATURES.len(), time_units),
            head: LinearLayer::new(hidden_size + geo_units + time_units, OUTPUT_WIDTH),
            window_width,
        }
    }

    /// Reassembles a network from persisted parts (used by deserialization).
    pub fn from_parts(
        lstm_layers: Vec<LSTMCell>,
        geo_branch: LinearLayer,
        time_branch: LinearLayer,
        head: LinearLayer,
        window_width: usize,
    ) -> Self {
        assert!(!lstm_layers.is_empty(), "network needs at least one LSTM layer");
        assert_eq!(
            lstm_layers[0].input_size(),
            WEATHER_FEATURES.len(),
            "first LSTM layer must accept the weather feature columns"
        );
        let hidden_size = lstm_layers.last().map(|c| c.hidden_size).unwrap_or(0);
        assert_eq!(
            head.input_size(),
            hidden_size + geo_branch.output_size() + time_branch.output_size(),
            "head input must match the concatenated branch widths"
        );
        assert_eq!(head.output_size(), OUTPUT_WIDTH, "head must emit one value per target");
        Self {
            lstm_layers,
            geo_branch,
            time_branch,
            head,
            window_width,
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.lstm_layers
            .last()
            .map(|c| c.hidden_size)
            .unwrap_or(0)
    }

    pub fn num_lstm_layers(&self) -> usize {
        self.lstm_layers.len()
    }

    pub fn lstm_layers(&self) -> &[LSTMCell] {
        &self.lstm_layers
    }

    pub fn geo_branch(&self) -> &LinearLayer {
        &self.geo_branch
    }

    pub fn time_branch(&self) -> &LinearLayer {
        &self.time_branch
    }

    pub fn head(&self) -> &LinearLayer {
        &self.head
    }

    /// Runs the LSTM stack over one window's weather block (width, 9) and
    /// returns the final hidden state of the top layer. Each layer keeps its
    /// own recurrent state across the window's time steps.
    fn encode_weather(&self, window: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut states: Vec<(Array2<f64>, Array2<f64>)> = self
            .lstm_layers
            .iter()
            .map(|cell| {
                (
                    Array2::zeros((cell.hidden_size, 1)),
                    Array2::zeros((cell.hidden_size, 1)),
                )
            })
            .collect();

        for t in 0..window.nrows() {
            let mut layer_input = column(window.row(t));
            for (cell, state) in self.lstm_layers.iter().zip(states.iter_mut()) {
                let (hy, cy) = cell.forward(&layer_input, &state.0, &state.1);
                layer_input = hy.clone();
                *state = (hy, cy);
            }
        }

        states
            .pop()
            .map(|(hy, _)| hy)
            .expect("at least one LSTM layer")
    }
}

impl ForecastModel for HybridForecastNetwork {
    fn window_width(&self) -> usize {
        self.window_width
    }

    fn predict(
        &self,
        weather: &Array3<f64>,
        geo: &Array2<f64>,
        time: &Array2<f64>,
    ) -> Result<Array2<f64>, InferenceError> {
        let (windows, width, channels) = weather.dim();
        if width != self.window_width || channels != WEATHER_FEATURES.len() {
            return Err(InferenceError::ShapeMismatch(format!(
                "weather tensor is {:?}, network expects [_, {}, {}]",
                weather.shape(),
                self.window_width,
                WEATHER_FEATURES.len()
            )));
        }
        if geo.dim() != (windows, self.geo_branch.input_size())
            || time.dim() != (windows, self.time_branch.input_size())
        {
            return Err(InferenceError::ShapeMismatch(format!(
                "static tensors are {:?}/{:?} for {} windows",
                geo.shape(),
                time.shape(),
                windows
            )));
        }

        let mut outputs = Array2::zeros((windows, OUTPUT_WIDTH));
        for i in 0..windows {
            let encoded = self.encode_weather(weather.slice(s![i, .., ..]));
            let geo_embed = self.geo_branch.forward(&column(geo.row(i))).map(|&x| relu(x));
            let time_embed = self.time_branch.forward(&column(time.row(i))).map(|&x| relu(x));

            let merged = concatenate(
                Axis(0),
                &[encoded.view(), geo_embed.view(), time_embed.view()],
            )
            .expect("branch encodings are column vectors");
            let out = self.head.forward(&merged);
            outputs.row_mut(i).assign(&out.column(0));
        }
        Ok(outputs)
    }
}

/// Lift a tensor row into the (features, 1) column the layers consume.
fn column(row: ArrayView1<'_, f64>) -> Array2<f64> {
    row.insert_axis(Axis(1)).to_owned()
}
