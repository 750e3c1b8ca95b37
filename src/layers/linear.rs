use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

/// A fully connected (linear/dense) layer, inference-only.
///
/// Performs the transformation: output = weight @ input + bias, where weight
/// has shape (output_size, input_size) and bias has shape (output_size, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearLayer {
    pub weight: Array2<f64>, // (output_size, input_size)
    pub bias: Array2<f64>,   // (output_size, 1)
}

impl LinearLayer {
    /// Create a layer with Xavier/Glorot-uniform weights and zero bias.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        let scale = (2.0 / (input_size + output_size) as f64).sqrt();
        Self {
            weight: Array2::random((output_size, input_size), Uniform::new(-scale, scale)),
            bias: Array2::zeros((output_size, 1)),
        }
    }

    /// Reassemble a layer from persisted weights.
    pub fn from_weights(weight: Array2<f64>, bias: Array2<f64>) -> Self {
        assert_eq!(
            bias.dim(),
            (weight.dim().0, 1),
            "bias shape must be (output_size, 1)"
        );
        Self { weight, bias }
    }

    pub fn input_size(&self) -> usize {
        self.weight.dim().1
    }

    pub fn output_size(&self) -> usize {
        self.weight.dim().0
    }

    /// Forward pass over a (input_size, batch) column block.
    pub fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        assert_eq!(
            input.dim().0,
            self.input_size(),
            "input has {} features, layer expects {}",
            input.dim().0,
            self.input_size()
        );
        &self.weight.dot(input) + &self.bias
    }
}
