/// Module for the inference-only LSTM cell.
pub mod lstm_cell;

/// Module for fully connected layers.
pub mod linear;
