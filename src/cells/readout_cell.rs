//! Nonlinear per-step readout
//!
//! Maps a latent state to a predicted observable:
//!
//! ```text
//! ŷ = σ(W₂ · relu(W₁ · x + b₁) + b₂)
//! ```
//!
//! The hidden layer keeps the state width. The sigmoid puts every output in
//! (0, 1), so targets must be normalized to that range by the caller.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Memoryless readout head: linear → ReLU → linear → sigmoid
///
/// The same parameters are applied at every time step. Each decoder in the
/// model is its own `ReadoutCell` instance with independent weights.
#[derive(Module, Debug)]
pub struct ReadoutCell<B: Backend> {
    /// First layer: `state_size -> state_size`
    pub hidden: Linear<B>,
    /// Second layer: `state_size -> output_size`
    pub output: Linear<B>,
    /// Decoded state width
    #[module(skip)]
    state_size: usize,
    /// Prediction width
    #[module(skip)]
    output_size: usize,
}

impl<B: Backend> ReadoutCell<B> {
    /// Create a new readout cell
    ///
    /// # Arguments
    /// * `state_size` - Width of the latent state being decoded
    /// * `output_size` - Width of the predicted signal
    /// * `device` - Device to create the module on
    pub fn new(state_size: usize, output_size: usize, device: &B::Device) -> Self {
        let hidden = LinearConfig::new(state_size, state_size)
            .with_bias(true)
            .init(device);

        let output = LinearConfig::new(state_size, output_size)
            .with_bias(true)
            .init(device);

        Self {
            hidden,
            output,
            state_size,
            output_size,
        }
    }

    /// Get the decoded state width
    pub fn state_size(&self) -> usize {
        self.state_size
    }

    /// Get the prediction width
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Decode a state tensor
    ///
    /// Works on a single step `[batch, state_size]` or on a whole sequence
    /// `[batch, seq_len, state_size]`; only the trailing dimension is mapped.
    pub fn forward<const D: usize>(&self, state: Tensor<B, D>) -> Tensor<B, D> {
        let hidden = activation::relu(self.hidden.forward(state));
        activation::sigmoid(self.output.forward(hidden))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::backend::Backend as BurnBackend;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f64>;
    type TestDevice = <TestBackend as BurnBackend>::Device;

    fn get_test_device() -> TestDevice {
        Default::default()
    }

    #[test]
    fn test_readout_cell_creation() {
        let device = get_test_device();
        let cell = ReadoutCell::<TestBackend>::new(8, 3, &device);

        assert_eq!(cell.state_size(), 8);
        assert_eq!(cell.output_size(), 3);
        assert_eq!(cell.hidden.weight.val().dims(), [8, 8]);
        assert_eq!(cell.output.weight.val().dims(), [8, 3]);
    }

    #[test]
    fn test_readout_forward_step() {
        let device = get_test_device();
        let cell = ReadoutCell::<TestBackend>::new(8, 3, &device);

        let state =
            Tensor::<TestBackend, 2>::random([5, 8], Distribution::Uniform(-1.0, 1.0), &device);
        let out = cell.forward(state);

        assert_eq!(out.dims(), [5, 3]);
    }

    #[test]
    fn test_readout_output_in_open_unit_interval() {
        let device = get_test_device();
        let cell = ReadoutCell::<TestBackend>::new(4, 6, &device);

        let state =
            Tensor::<TestBackend, 3>::random([3, 7, 4], Distribution::Uniform(-5.0, 5.0), &device);
        let out = cell.forward(state);

        let values = out.into_data().to_vec::<f64>().unwrap();
        assert_eq!(values.len(), 3 * 7 * 6);
        for v in values {
            assert!(v > 0.0 && v < 1.0, "readout value {} outside (0, 1)", v);
        }
    }

    #[test]
    fn test_sequence_readout_matches_per_step() {
        let device = get_test_device();
        let cell = ReadoutCell::<TestBackend>::new(4, 2, &device);

        let states =
            Tensor::<TestBackend, 3>::random([2, 5, 4], Distribution::Uniform(-1.0, 1.0), &device);
        let whole = cell.forward(states.clone());

        for t in 0..5 {
            let step = cell.forward(states.clone().narrow(1, t, 1).squeeze::<2>(1));
            let from_whole = whole.clone().narrow(1, t, 1).squeeze::<2>(1);
            let diff: f64 = (step - from_whole).abs().max().into_scalar();
            assert!(diff < 1e-12, "step {} differs by {}", t, diff);
        }
    }
}
