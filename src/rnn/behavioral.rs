//! Stage 1: behaviorally relevant dynamics
//!
//! The behavioral recurrence is driven by the neural observation `y` and the
//! exogenous input `u`, and trained so that its readout predicts the
//! behavioral target `z`.

use super::sequence::{unroll, unroll_with_readout, SequenceDims};
use crate::cells::{AffineCell, ReadoutCell};
use crate::config::{ensure_double_precision, ensure_positive};
use crate::error::{PsidResult, Stream};
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Output of a Stage-1 forward pass
#[derive(Debug, Clone)]
pub struct BehavioralOutput<B: Backend> {
    /// Predicted behavioral target `[batch, seq_len, z_size]`, in (0, 1)
    pub z_hat: Tensor<B, 3>,
    /// Behavioral latent states `[batch, seq_len, x_behav_size]`
    pub x_behav: Tensor<B, 3>,
}

impl<B: Backend> BehavioralOutput<B> {
    /// Check a behavioral target against this prediction before computing a
    /// loss: same batch, sequence length and width as `z_hat`.
    pub fn check_target(&self, z: &Tensor<B, 3>) -> PsidResult<()> {
        let [batch, seq_len, z_size] = self.z_hat.dims();
        SequenceDims { batch, seq_len }.check_aligned(Stream::Target, z, z_size)
    }
}

/// Stage-1 latent recurrence without a readout
///
/// `x[0] = 0`, `x[t+1] = A·x[t] + K·y[t] + B·u[t]`, returning `x[0..T-1]`.
#[derive(Module, Debug)]
pub struct BehavioralDynamics<B: Backend> {
    pub(crate) cell: AffineCell<B>,
}

impl<B: Backend> BehavioralDynamics<B> {
    /// Create the Stage-1 recurrence
    ///
    /// # Arguments
    /// * `x_behav_size` - Behavioral latent width (Dxb), positive
    /// * `y_size` - Neural observation width (Dy), positive
    /// * `u_size` - Exogenous input width (Du), may be zero
    /// * `device` - Device to create the module on
    pub fn new(
        x_behav_size: usize,
        y_size: usize,
        u_size: usize,
        device: &B::Device,
    ) -> PsidResult<Self> {
        ensure_double_precision::<B>()?;
        ensure_positive("x_behav_size", x_behav_size)?;
        ensure_positive("y_size", y_size)?;

        tracing::debug!(x_behav_size, y_size, u_size, "building behavioral dynamics");

        Ok(Self {
            cell: AffineCell::new(x_behav_size, y_size, u_size, device),
        })
    }

    /// Get the underlying cell
    pub fn cell(&self) -> &AffineCell<B> {
        &self.cell
    }

    /// Get the behavioral latent width
    pub fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    /// Get the neural observation width
    pub fn y_size(&self) -> usize {
        self.cell.drive_size()
    }

    /// Get the exogenous input width
    pub fn u_size(&self) -> usize {
        self.cell.input_size()
    }

    /// Check `y` and `u` against the configured widths and each other.
    pub fn validate(&self, y: &Tensor<B, 3>, u: &Tensor<B, 3>) -> PsidResult<SequenceDims> {
        let dims = SequenceDims::of(Stream::Observation, y, self.y_size())?;
        dims.check_aligned(Stream::Input, u, self.u_size())?;
        Ok(dims)
    }

    /// Run the recurrence
    ///
    /// # Arguments
    /// * `y` - Neural observations `[batch, seq_len, y_size]`
    /// * `u` - Exogenous input `[batch, seq_len, u_size]`
    ///
    /// # Returns
    /// Behavioral latent states `[batch, seq_len, x_behav_size]`
    pub fn forward(&self, y: Tensor<B, 3>, u: Tensor<B, 3>) -> PsidResult<Tensor<B, 3>> {
        let dims = self.validate(&y, &u)?;
        Ok(unroll(&self.cell, y, u, dims))
    }
}

/// Stage 1 end to end: behavioral recurrence plus its behavioral readout
#[derive(Module, Debug)]
pub struct BehavioralStage<B: Backend> {
    pub(crate) dynamics: BehavioralDynamics<B>,
    pub(crate) decoder: ReadoutCell<B>,
}

impl<B: Backend> BehavioralStage<B> {
    /// Create Stage 1
    ///
    /// # Arguments
    /// * `x_behav_size` - Behavioral latent width (Dxb)
    /// * `y_size` - Neural observation width (Dy)
    /// * `u_size` - Exogenous input width (Du), may be zero
    /// * `z_size` - Behavioral target width (Dz)
    /// * `device` - Device to create the module on
    pub fn new(
        x_behav_size: usize,
        y_size: usize,
        u_size: usize,
        z_size: usize,
        device: &B::Device,
    ) -> PsidResult<Self> {
        ensure_positive("z_size", z_size)?;
        let dynamics = BehavioralDynamics::new(x_behav_size, y_size, u_size, device)?;
        let decoder = ReadoutCell::new(x_behav_size, z_size, device);

        Ok(Self { dynamics, decoder })
    }

    /// Get the recurrence
    pub fn dynamics(&self) -> &BehavioralDynamics<B> {
        &self.dynamics
    }

    /// Get the behavioral readout
    pub fn decoder(&self) -> &ReadoutCell<B> {
        &self.decoder
    }

    /// Get the behavioral target width
    pub fn z_size(&self) -> usize {
        self.decoder.output_size()
    }

    /// Run Stage 1, decoding each state `x[t]` into `z_hat[t]` as it is produced.
    pub fn forward(&self, y: Tensor<B, 3>, u: Tensor<B, 3>) -> PsidResult<BehavioralOutput<B>> {
        let dims = self.dynamics.validate(&y, &u)?;
        let (x_behav, z_hat) =
            unroll_with_readout(&self.dynamics.cell, &self.decoder, y, u, dims);

        Ok(BehavioralOutput {
            z_hat,
            x_behav,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PsidError;
    use burn::backend::NdArray;
    use burn::module::Param;
    use burn::nn::Linear;
    use burn::tensor::backend::Backend as BurnBackend;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f64>;
    type TestDevice = <TestBackend as BurnBackend>::Device;

    fn get_test_device() -> TestDevice {
        Default::default()
    }

    fn constant_linear(weight: f64, bias: f64, device: &TestDevice) -> Linear<TestBackend> {
        Linear {
            weight: Param::from_tensor(Tensor::from_floats([[weight]], device)),
            bias: Some(Param::from_tensor(Tensor::from_floats([bias], device))),
        }
    }

    #[test]
    fn test_behavioral_dynamics_creation() {
        let device = get_test_device();
        let dynamics = BehavioralDynamics::<TestBackend>::new(2, 3, 1, &device).unwrap();

        assert_eq!(dynamics.state_size(), 2);
        assert_eq!(dynamics.y_size(), 3);
        assert_eq!(dynamics.u_size(), 1);
    }

    #[test]
    fn test_behavioral_dynamics_rejects_single_precision() {
        let device = Default::default();
        let err = BehavioralDynamics::<NdArray<f32>>::new(2, 3, 1, &device).unwrap_err();
        assert!(matches!(err, PsidError::Precision(_)));
    }

    #[test]
    fn test_input_only_recursion_by_hand() {
        // A = 0, K = 0, B = 2, no biases: x0 = 0, x1 = B·u0, x2 = B·u1
        let device = get_test_device();
        let mut dynamics = BehavioralDynamics::<TestBackend>::new(1, 1, 1, &device).unwrap();
        dynamics.cell.state_transition = constant_linear(0.0, 0.0, &device);
        dynamics.cell.observation_gain = constant_linear(0.0, 0.0, &device);
        dynamics.cell.input_gain = constant_linear(2.0, 0.0, &device);

        let y =
            Tensor::<TestBackend, 3>::random([1, 3, 1], Distribution::Uniform(0.0, 1.0), &device);
        let u = Tensor::<TestBackend, 3>::from_floats([[[0.5], [-1.5], [4.0]]], &device);

        let states = dynamics.forward(y, u).unwrap();
        assert_eq!(states.dims(), [1, 3, 1]);
        assert_eq!(
            states.into_data().to_vec::<f64>().unwrap(),
            vec![0.0, 1.0, -3.0]
        );
    }

    #[test]
    fn test_final_input_never_reaches_states() {
        let device = get_test_device();
        let dynamics = BehavioralDynamics::<TestBackend>::new(3, 2, 1, &device).unwrap();

        let y =
            Tensor::<TestBackend, 3>::random([2, 4, 2], Distribution::Uniform(0.0, 1.0), &device);
        let u =
            Tensor::<TestBackend, 3>::random([2, 4, 1], Distribution::Uniform(0.0, 1.0), &device);

        // Replace the last observation and input with something else entirely
        let y_tail = Tensor::<TestBackend, 3>::full([2, 1, 2], 100.0, &device);
        let u_tail = Tensor::<TestBackend, 3>::full([2, 1, 1], -100.0, &device);
        let y_alt = Tensor::cat(vec![y.clone().narrow(1, 0, 3), y_tail], 1);
        let u_alt = Tensor::cat(vec![u.clone().narrow(1, 0, 3), u_tail], 1);

        let states = dynamics.forward(y, u).unwrap();
        let states_alt = dynamics.forward(y_alt, u_alt).unwrap();

        assert_eq!(
            states.into_data().to_vec::<f64>().unwrap(),
            states_alt.into_data().to_vec::<f64>().unwrap()
        );
    }

    #[test]
    fn test_stage_readout_matches_decoder_on_states() {
        let device = get_test_device();
        let stage = BehavioralStage::<TestBackend>::new(3, 4, 0, 2, &device).unwrap();

        let y =
            Tensor::<TestBackend, 3>::random([2, 6, 4], Distribution::Uniform(0.0, 1.0), &device);
        let u = Tensor::<TestBackend, 3>::zeros([2, 6, 0], &device);

        let out = stage.forward(y, u).unwrap();
        let decoded = stage.decoder().forward(out.x_behav.clone());

        let diff: f64 = (decoded - out.z_hat).abs().max().into_scalar();
        assert!(diff < 1e-12, "readout differs by {}", diff);
    }

    #[test]
    fn test_check_target_against_prediction() {
        let device = get_test_device();
        let stage = BehavioralStage::<TestBackend>::new(2, 3, 0, 1, &device).unwrap();

        let y = Tensor::<TestBackend, 3>::zeros([2, 4, 3], &device);
        let u = Tensor::<TestBackend, 3>::zeros([2, 4, 0], &device);
        let out = stage.forward(y, u).unwrap();

        let z = Tensor::<TestBackend, 3>::zeros([2, 4, 1], &device);
        assert!(out.check_target(&z).is_ok());

        let z_short = Tensor::<TestBackend, 3>::zeros([2, 3, 1], &device);
        let err = out.check_target(&z_short).unwrap_err();
        assert!(matches!(
            err,
            PsidError::SequenceMismatch {
                stream: Stream::Target,
                expected: 4,
                got: 3
            }
        ));
    }

    #[test]
    fn test_stage_rejects_zero_target_width() {
        let device = get_test_device();
        let err = BehavioralStage::<TestBackend>::new(3, 4, 0, 0, &device).unwrap_err();
        assert!(matches!(err, PsidError::InvalidConfig(_)));
    }
}
