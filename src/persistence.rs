use ndarray::{Array2, Dimension};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::inference::ForecastModel;
use crate::layers::linear::LinearLayer;
use crate::layers::lstm_cell::LSTMCell;
use crate::models::hybrid::HybridForecastNetwork;

/// Serializable version of Array2<f64> for persistence
#[derive(Serialize, Deserialize)]
struct SerializableArray2 {
    data: Vec<f64>,
    shape: (usize, usize),
}

impl From<&Array2<f64>> for SerializableArray2 {
    fn from(array: &Array2<f64>) -> Self {
        Self {
            data: array.iter().cloned().collect(),
            shape: array.raw_dim().into_pattern(),
        }
    }
}

impl From<SerializableArray2> for Array2<f64> {
    fn from(array: SerializableArray2) -> Self {
        Array2::from_shape_vec(array.shape, array.data)
            .expect("Failed to reconstruct Array2 from serialized data")
    }
}

/// Serializable LSTM cell parameters
#[derive(Serialize, Deserialize)]
struct SerializableLSTMCell {
    w_ih: SerializableArray2,
    w_hh: SerializableArray2,
    b_ih: SerializableArray2,
    b_hh: SerializableArray2,
}

impl From<&LSTMCell> for SerializableLSTMCell {
    fn from(cell: &LSTMCell) -> Self {
        Self {
            w_ih: (&cell.w_ih).into(),
            w_hh: (&cell.w_hh).into(),
            b_ih: (&cell.b_ih).into(),
            b_hh: (&cell.b_hh).into(),
        }
    }
}

impl From<SerializableLSTMCell> for LSTMCell {
    fn from(cell: SerializableLSTMCell) -> Self {
        LSTMCell::from_weights(
            cell.w_ih.into(),
            cell.w_hh.into(),
            cell.b_ih.into(),
            cell.b_hh.into(),
        )
    }
}

/// Serializable dense layer parameters
#[derive(Serialize, Deserialize)]
struct SerializableLinear {
    weight: SerializableArray2,
    bias: SerializableArray2,
}

impl From<&LinearLayer> for SerializableLinear {
    fn from(layer: &LinearLayer) -> Self {
        Self {
            weight: (&layer.weight).into(),
            bias: (&layer.bias).into(),
        }
    }
}

impl From<SerializableLinear> for LinearLayer {
    fn from(layer: SerializableLinear) -> Self {
        LinearLayer::from_weights(layer.weight.into(), layer.bias.into())
    }
}

/// Serializable hybrid forecast network
#[derive(Serialize, Deserialize)]
pub struct SerializableHybridNetwork {
    lstm_layers: Vec<SerializableLSTMCell>,
    geo_branch: SerializableLinear,
    time_branch: SerializableLinear,
    head: SerializableLinear,
    window_width: usize,
}

impl From<&HybridForecastNetwork> for SerializableHybridNetwork {
    fn from(network: &HybridForecastNetwork) -> Self {
        Self {
            lstm_layers: network.lstm_layers().iter().map(|cell| cell.into()).collect(),
            geo_branch: network.geo_branch().into(),
            time_branch: network.time_branch().into(),
            head: network.head().into(),
            window_width: network.window_width(),
        }
    }
}

impl From<SerializableHybridNetwork> for HybridForecastNetwork {
    fn from(network: SerializableHybridNetwork) -> Self {
        HybridForecastNetwork::from_parts(
            network.lstm_layers.into_iter().map(|cell| cell.into()).collect(),
            network.geo_branch.into(),
            network.time_branch.into(),
            network.head.into(),
            network.window_width,
        )
    }
}

/// Model metadata for tracking the provenance of a trained artifact
#[derive(Serialize, Deserialize, Clone)]
pub struct ModelMetadata {
    pub model_name: String,
    pub version: String,
    pub created_at: String,
    pub window_width: usize,
    pub hidden_size: usize,
    pub num_lstm_layers: usize,
    pub description: Option<String>,
}

/// Complete saved model including network and metadata
#[derive(Serialize, Deserialize)]
pub struct SavedModel {
    pub network: SerializableHybridNetwork,
    pub metadata: ModelMetadata,
}

/// Errors that can occur during model persistence operations
#[derive(Debug)]
pub enum PersistenceError {
    IoError(std::io::Error),
    SerializationError(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::IoError(err) => write!(f, "IO error: {}", err),
            PersistenceError::SerializationError(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::IoError(err) => Some(err),
            PersistenceError::SerializationError(_) => None,
        }
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(error: std::io::Error) -> Self {
        PersistenceError::IoError(error)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(error: serde_json::Error) -> Self {
        PersistenceError::SerializationError(error.to_string())
    }
}

impl From<bincode::Error> for PersistenceError {
    fn from(error: bincode::Error) -> Self {
        PersistenceError::SerializationError(error.to_string())
    }
}

/// Model persistence operations
pub struct ModelPersistence;

impl ModelPersistence {
    /// Save model to JSON format (human-readable)
    pub fn save_to_json<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(model)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load model from JSON format
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<SavedModel, PersistenceError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let model = serde_json::from_str(&contents)?;
        Ok(model)
    }

    /// Save model to binary format (compact and fast)
    pub fn save_to_binary<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<(), PersistenceError> {
        let encoded = bincode::serialize(model)?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load model from binary format
    pub fn load_from_binary<P: AsRef<Path>>(path: P) -> Result<SavedModel, PersistenceError> {
        let mut file = File::open(path)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        let model = bincode::deserialize(&contents)?;
        Ok(model)
    }

    /// Create a model with metadata
    pub fn create_saved_model(
        network: &HybridForecastNetwork,
        model_name: String,
        description: Option<String>,
    ) -> SavedModel {
        let metadata = ModelMetadata {
            model_name,
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            window_width: network.window_width(),
            hidden_size: network.hidden_size(),
            num_lstm_layers: network.num_lstm_layers(),
            description,
        };

        SavedModel {
            network: network.into(),
            metadata,
        }
    }
}

/// Convenience trait for easy model saving/loading
pub trait PersistentModel {
    /// Save model to file (format determined by file extension)
    fn save<P: AsRef<Path>>(&self, path: P, metadata: ModelMetadata) -> Result<(), PersistenceError>;

    /// Load model from file (format determined by file extension)
    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata), PersistenceError>
    where
        Self: Sized;
}

impl PersistentModel for HybridForecastNetwork {
    fn save<P: AsRef<Path>>(&self, path: P, metadata: ModelMetadata) -> Result<(), PersistenceError> {
        let saved_model = SavedModel {
            network: self.into(),
            metadata,
        };

        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|s| s.to_str()) {
            Some("json") => ModelPersistence::save_to_json(&saved_model, path),
            _ => ModelPersistence::save_to_binary(&saved_model, path),
        }
    }

    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata), PersistenceError> {
        let path_ref = path.as_ref();
        let saved_model = match path_ref.extension().and_then(|s| s.to_str()) {
            Some("json") => ModelPersistence::load_from_json(path)?,
            _ => ModelPersistence::load_from_binary(path)?,
        };

        Ok((saved_model.network.into(), saved_model.metadata))
    }
}
