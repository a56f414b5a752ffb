//! Affine state-update cell
//!
//! One step of the linear latent recurrence shared by both stages:
//!
//! ```text
//! x[t+1] = A·x[t] + K·d[t] + B·u[t]
//! ```
//!
//! `d[t]` is the driving observation (the neural signal for Stage 1, the
//! neural signal concatenated with the Stage-1 state for Stage 2) and `u[t]`
//! the exogenous input. Each map carries its own bias. The update has no
//! nonlinearity; all nonlinearity lives in [`ReadoutCell`](super::ReadoutCell).

use burn::module::Module;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Single-timestep affine recurrence cell
///
/// Weight layout follows [`Linear`]: each weight has shape `[d_in, state_size]`.
#[derive(Module, Debug)]
pub struct AffineCell<B: Backend> {
    /// State transition A: `state_size -> state_size`
    pub state_transition: Linear<B>,
    /// Observation gain K: `drive_size -> state_size`
    pub observation_gain: Linear<B>,
    /// Input gain B: `input_size -> state_size`
    pub input_gain: Linear<B>,
    /// Latent state width
    #[module(skip)]
    state_size: usize,
    /// Driving observation width (number of features)
    #[module(skip)]
    drive_size: usize,
    /// Exogenous input width, zero when there is no input
    #[module(skip)]
    input_size: usize,
}

impl<B: Backend> AffineCell<B> {
    /// Create a new affine cell
    ///
    /// # Arguments
    /// * `state_size` - Width of the latent state
    /// * `drive_size` - Width of the driving observation
    /// * `input_size` - Width of the exogenous input, may be zero
    /// * `device` - Device to create the module on
    pub fn new(
        state_size: usize,
        drive_size: usize,
        input_size: usize,
        device: &B::Device,
    ) -> Self {
        let state_transition = LinearConfig::new(state_size, state_size)
            .with_bias(true)
            .init(device);

        let observation_gain = LinearConfig::new(drive_size, state_size)
            .with_bias(true)
            .init(device);

        // A zero-width input still gets a [0, state_size] map so every stage
        // exposes the same parameter groups. Fan-in based init is undefined
        // for it, so it starts at zero.
        let input_gain = if input_size == 0 {
            LinearConfig::new(0, state_size)
                .with_bias(true)
                .with_initializer(Initializer::Zeros)
                .init(device)
        } else {
            LinearConfig::new(input_size, state_size)
                .with_bias(true)
                .init(device)
        };

        Self {
            state_transition,
            observation_gain,
            input_gain,
            state_size,
            drive_size,
            input_size,
        }
    }

    /// Get the latent state width
    pub fn state_size(&self) -> usize {
        self.state_size
    }

    /// Get the driving observation width
    pub fn drive_size(&self) -> usize {
        self.drive_size
    }

    /// Get the exogenous input width
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Compute the next latent state
    ///
    /// # Arguments
    /// * `state` - Current state `[batch, state_size]`
    /// * `drive` - Driving observation `[batch, drive_size]`
    /// * `input` - Exogenous input `[batch, input_size]`
    ///
    /// # Returns
    /// Next state `[batch, state_size]`
    pub fn forward(
        &self,
        state: Tensor<B, 2>,
        drive: Tensor<B, 2>,
        input: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let transition = self.state_transition.forward(state);
        let observation = self.observation_gain.forward(drive);
        let exogenous = self.input_contribution(input);

        transition + observation + exogenous
    }

    /// B·u[t], reduced to the bias alone when the input has no features
    fn input_contribution(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        if self.input_size > 0 {
            return self.input_gain.forward(input);
        }

        let [batch_size, _] = input.dims();
        let zeros = Tensor::zeros([batch_size, self.state_size], &input.device());
        match self.input_gain.bias {
            Some(ref bias) => zeros + bias.val().unsqueeze::<2>(),
            None => zeros,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::module::Param;
    use burn::tensor::backend::Backend as BurnBackend;

    type TestBackend = NdArray<f64>;
    type TestDevice = <TestBackend as BurnBackend>::Device;

    fn get_test_device() -> TestDevice {
        Default::default()
    }

    fn fixed_linear(
        weight: Tensor<TestBackend, 2>,
        bias: Tensor<TestBackend, 1>,
    ) -> Linear<TestBackend> {
        Linear {
            weight: Param::from_tensor(weight),
            bias: Some(Param::from_tensor(bias)),
        }
    }

    #[test]
    fn test_affine_cell_creation() {
        let device = get_test_device();
        let cell = AffineCell::<TestBackend>::new(4, 6, 2, &device);

        assert_eq!(cell.state_size(), 4);
        assert_eq!(cell.drive_size(), 6);
        assert_eq!(cell.input_size(), 2);
        assert_eq!(cell.state_transition.weight.val().dims(), [4, 4]);
        assert_eq!(cell.observation_gain.weight.val().dims(), [6, 4]);
        assert_eq!(cell.input_gain.weight.val().dims(), [2, 4]);
    }

    #[test]
    fn test_affine_cell_forward_shape() {
        let device = get_test_device();
        let cell = AffineCell::<TestBackend>::new(4, 6, 2, &device);

        for batch_size in [1, 3, 8] {
            let state = Tensor::<TestBackend, 2>::zeros([batch_size, 4], &device);
            let drive = Tensor::<TestBackend, 2>::ones([batch_size, 6], &device);
            let input = Tensor::<TestBackend, 2>::ones([batch_size, 2], &device);

            let next = cell.forward(state, drive, input);
            assert_eq!(next.dims(), [batch_size, 4]);
        }
    }

    #[test]
    fn test_zero_width_input_keeps_map_shape() {
        let device = get_test_device();
        let cell = AffineCell::<TestBackend>::new(3, 5, 0, &device);

        assert_eq!(cell.input_size(), 0);
        assert_eq!(cell.input_gain.weight.val().dims(), [0, 3]);

        // Zero-initialised bias, so u contributes nothing
        let input = Tensor::<TestBackend, 2>::zeros([2, 0], &device);
        let contribution = cell.input_contribution(input);
        assert_eq!(contribution.dims(), [2, 3]);
        let total: f64 = contribution.abs().sum().into_scalar();
        assert_eq!(total, 0.0);
    }

    #[test]
    fn test_update_is_affine_sum_of_maps() {
        let device = get_test_device();
        let mut cell = AffineCell::<TestBackend>::new(1, 1, 1, &device);
        cell.state_transition = fixed_linear(
            Tensor::from_floats([[0.5]], &device),
            Tensor::from_floats([0.1], &device),
        );
        cell.observation_gain = fixed_linear(
            Tensor::from_floats([[2.0]], &device),
            Tensor::from_floats([0.2], &device),
        );
        cell.input_gain = fixed_linear(
            Tensor::from_floats([[-1.0]], &device),
            Tensor::from_floats([0.3], &device),
        );

        let state = Tensor::<TestBackend, 2>::from_floats([[4.0]], &device);
        let drive = Tensor::<TestBackend, 2>::from_floats([[1.5]], &device);
        let input = Tensor::<TestBackend, 2>::from_floats([[2.0]], &device);

        // 0.5*4 + 0.1 + 2*1.5 + 0.2 - 1*2 + 0.3
        let next: f64 = cell.forward(state, drive, input).into_scalar();
        assert!((next - 3.6).abs() < 1e-12, "got {}", next);
    }
}
