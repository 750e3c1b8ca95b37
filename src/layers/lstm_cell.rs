use ndarray::{s, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::utils::sigmoid;

/// Inference-only LSTM cell.
///
/// Implements the standard LSTM equations:
/// - i_t = σ(W_xi * x_t + W_hi * h_t-1 + b_i)
/// - f_t = σ(W_xf * x_t + W_hf * h_t-1 + b_f)
/// - g_t = tanh(W_xg * x_t + W_hg * h_t-1 + b_g)
/// - o_t = σ(W_xo * x_t + W_ho * h_t-1 + b_o)
/// - c_t = f_t ⊙ c_t-1 + i_t ⊙ g_t
/// - h_t = o_t ⊙ tanh(c_t)
///
/// Weights come either from a persisted trained artifact or, for untrained
/// instances, from uniform random initialization. The forward pass takes
/// `&self`: a loaded cell is immutable and shareable across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct LSTMCell {
    pub w_ih: Array2<f64>, // input-to-hidden weights (4*hidden_size, input_size)
    pub w_hh: Array2<f64>, // hidden-to-hidden weights (4*hidden_size, hidden_size)
    pub b_ih: Array2<f64>, // input-to-hidden bias (4*hidden_size, 1)
    pub b_hh: Array2<f64>, // hidden-to-hidden bias (4*hidden_size, 1)
    pub hidden_size: usize,
}

impl LSTMCell {
    /// Creates a cell with uniform random weights and zero biases.
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        let dist = Uniform::new(-0.1, 0.1);
        LSTMCell {
            w_ih: Array2::random((4 * hidden_size, input_size), dist),
            w_hh: Array2::random((4 * hidden_size, hidden_size), dist),
            b_ih: Array2::zeros((4 * hidden_size, 1)),
            b_hh: Array2::zeros((4 * hidden_size, 1)),
            hidden_size,
        }
    }

    /// Reassembles a cell from persisted weight matrices.
    pub fn from_weights(
        w_ih: Array2<f64>,
        w_hh: Array2<f64>,
        b_ih: Array2<f64>,
        b_hh: Array2<f64>,
    ) -> Self {
        let hidden_size = w_hh.dim().1;
        assert_eq!(w_ih.dim().0, 4 * hidden_size, "w_ih rows must be 4*hidden_size");
        assert_eq!(w_hh.dim().0, 4 * hidden_size, "w_hh rows must be 4*hidden_size");
        assert_eq!(b_ih.dim(), (4 * hidden_size, 1), "b_ih must be (4*hidden_size, 1)");
        assert_eq!(b_hh.dim(), (4 * hidden_size, 1), "b_hh must be (4*hidden_size, 1)");
        LSTMCell {
            w_ih,
            w_hh,
            b_ih,
            b_hh,
            hidden_size,
        }
    }

    pub fn input_size(&self) -> usize {
        self.w_ih.dim().1
    }

    /// One time step: consumes the input column and previous (h, c) state,
    /// returns the next (h, c).
    pub fn forward(
        &self,
        input: &Array2<f64>,
        hx: &Array2<f64>,
        cx: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>) {
        // All four gates in one matmul: [input_gate, forget_gate, cell_gate, output_gate]
        let gates = &self.w_ih.dot(input) + &self.b_ih + &self.w_hh.dot(hx) + &self.b_hh;

        let input_gate = gates.slice(s![0..self.hidden_size, ..]).map(|&x| sigmoid(x));
        let forget_gate = gates
            .slice(s![self.hidden_size..2 * self.hidden_size, ..])
            .map(|&x| sigmoid(x));
        let cell_gate = gates
            .slice(s![2 * self.hidden_size..3 * self.hidden_size, ..])
            .map(|&x| x.tanh());
        let output_gate = gates
            .slice(s![3 * self.hidden_size..4 * self.hidden_size, ..])
            .map(|&x| sigmoid(x));

        let cy = &forget_gate * cx + &input_gate * &cell_gate;
        let hy = &output_gate * cy.map(|&x| x.tanh());

        (hy, cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_forward_shapes() {
        let cell = LSTMCell::new(3, 2);
        let input = arr2(&[[0.5], [0.1], [-0.3]]);
        let hx = arr2(&[[0.0], [0.0]]);
        let cx = arr2(&[[0.0], [0.0]]);

        let (hy, cy) = cell.forward(&input, &hx, &cx);

        assert_eq!(hy.shape(), &[2, 1]);
        assert_eq!(cy.shape(), &[2, 1]);
    }

    #[test]
    fn test_forward_is_deterministic() {
        let cell = LSTMCell::new(4, 3);
        let input = arr2(&[[0.2], [-0.4], [0.9], [0.0]]);
        let hx = Array2::zeros((3, 1));
        let cx = Array2::zeros((3, 1));

        let (hy1, cy1) = cell.forward(&input, &hx, &cx);
        let (hy2, cy2) = cell.forward(&input, &hx, &cx);
        assert_eq!(hy1, hy2);
        assert_eq!(cy1, cy2);
    }

    #[test]
    fn test_zero_weights_give_zero_hidden() {
        let cell = LSTMCell::from_weights(
            Array2::zeros((8, 3)),
            Array2::zeros((8, 2)),
            Array2::zeros((8, 1)),
            Array2::zeros((8, 1)),
        );
        let (hy, cy) = cell.forward(
            &arr2(&[[1.0], [2.0], [3.0]]),
            &Array2::zeros((2, 1)),
            &Array2::zeros((2, 1)),
        );
        // all gates sit at σ(0)=0.5 and tanh(0)=0, so state stays at zero
        assert!(hy.iter().all(|&x| x == 0.0));
        assert!(cy.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_hidden_state_bounded() {
        let cell = LSTMCell::new(2, 5);
        let mut hx = Array2::zeros((5, 1));
        let mut cx = Array2::zeros((5, 1));
        for i in 0..50 {
            let x = arr2(&[[(i as f64).sin() * 10.0], [100.0]]);
            let (hy, cy) = cell.forward(&x, &hx, &cx);
            hx = hy;
            cx = cy;
        }
        // h = o ⊙ tanh(c) keeps every component in (-1, 1)
        assert!(hx.iter().all(|&x| x.abs() < 1.0));
    }

    #[test]
    #[should_panic(expected = "w_ih rows")]
    fn test_from_weights_rejects_mismatched_shapes() {
        LSTMCell::from_weights(
            Array2::zeros((6, 3)),
            Array2::zeros((8, 2)),
            Array2::zeros((8, 1)),
            Array2::zeros((8, 1)),
        );
    }
}
