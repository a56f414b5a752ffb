//! Stage 2: residual neural dynamics
//!
//! The residual recurrence is driven by the neural observation concatenated
//! with the Stage-1 behavioral state, and trained so that its readout
//! reconstructs the neural signal. It captures structure in `y` that the
//! behavioral state does not explain.

use super::sequence::{unroll, unroll_with_readout, SequenceDims};
use crate::cells::{AffineCell, ReadoutCell};
use crate::config::{ensure_double_precision, ensure_positive};
use crate::error::{PsidResult, Stream};
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Output of a Stage-2 forward pass
#[derive(Debug, Clone)]
pub struct ResidualOutput<B: Backend> {
    /// Predicted neural signal `[batch, seq_len, y_size]`, in (0, 1)
    pub y_hat: Tensor<B, 3>,
    /// Residual latent states `[batch, seq_len, x_neural_size]`
    pub x_neural: Tensor<B, 3>,
}

/// Stage-2 latent recurrence without a readout
///
/// `x[0] = 0`, `x[t+1] = A'·x[t] + K'·[y[t], x_behav[t]] + B'·u[t]`,
/// returning `x[0..T-1]`. The observation gain `K'` has input width
/// `y_size + x_behav_size`, observation features first.
#[derive(Module, Debug)]
pub struct ResidualDynamics<B: Backend> {
    pub(crate) cell: AffineCell<B>,
    /// Neural observation width, the leading part of the drive
    #[module(skip)]
    y_size: usize,
    /// Stage-1 latent width, the trailing part of the drive
    #[module(skip)]
    x_behav_size: usize,
}

impl<B: Backend> ResidualDynamics<B> {
    /// Create the Stage-2 recurrence
    ///
    /// # Arguments
    /// * `x_neural_size` - Residual latent width (Dxn), positive
    /// * `y_size` - Neural observation width (Dy), positive
    /// * `x_behav_size` - Stage-1 latent width (Dxb), positive
    /// * `u_size` - Exogenous input width (Du), may be zero
    /// * `device` - Device to create the module on
    pub fn new(
        x_neural_size: usize,
        y_size: usize,
        x_behav_size: usize,
        u_size: usize,
        device: &B::Device,
    ) -> PsidResult<Self> {
        ensure_double_precision::<B>()?;
        ensure_positive("x_neural_size", x_neural_size)?;
        ensure_positive("y_size", y_size)?;
        ensure_positive("x_behav_size", x_behav_size)?;

        tracing::debug!(
            x_neural_size,
            y_size,
            x_behav_size,
            u_size,
            "building residual dynamics"
        );

        Ok(Self {
            cell: AffineCell::new(x_neural_size, y_size + x_behav_size, u_size, device),
            y_size,
            x_behav_size,
        })
    }

    /// Get the underlying cell
    pub fn cell(&self) -> &AffineCell<B> {
        &self.cell
    }

    /// Get the residual latent width
    pub fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    /// Get the neural observation width
    pub fn y_size(&self) -> usize {
        self.y_size
    }

    /// Get the Stage-1 latent width this recurrence expects
    pub fn x_behav_size(&self) -> usize {
        self.x_behav_size
    }

    /// Get the exogenous input width
    pub fn u_size(&self) -> usize {
        self.cell.input_size()
    }

    /// Get the width of the concatenated drive `[y, x_behav]`
    pub fn drive_size(&self) -> usize {
        self.cell.drive_size()
    }

    /// Check `x_behav`, `y` and `u` against the configured widths and each other.
    pub fn validate(
        &self,
        x_behav: &Tensor<B, 3>,
        y: &Tensor<B, 3>,
        u: &Tensor<B, 3>,
    ) -> PsidResult<SequenceDims> {
        let dims = SequenceDims::of(Stream::Observation, y, self.y_size)?;
        dims.check_aligned(Stream::Input, u, self.u_size())?;
        dims.check_aligned(Stream::BehavioralState, x_behav, self.x_behav_size)?;
        Ok(dims)
    }

    /// Run the recurrence
    ///
    /// # Arguments
    /// * `x_behav` - Stage-1 latent states `[batch, seq_len, x_behav_size]`
    /// * `y` - Neural observations `[batch, seq_len, y_size]`
    /// * `u` - Exogenous input `[batch, seq_len, u_size]`
    ///
    /// # Returns
    /// Residual latent states `[batch, seq_len, x_neural_size]`
    pub fn forward(
        &self,
        x_behav: Tensor<B, 3>,
        y: Tensor<B, 3>,
        u: Tensor<B, 3>,
    ) -> PsidResult<Tensor<B, 3>> {
        let dims = self.validate(&x_behav, &y, &u)?;
        let drive = Tensor::cat(vec![y, x_behav], 2);
        Ok(unroll(&self.cell, drive, u, dims))
    }
}

/// Stage 2 end to end: residual recurrence plus its neural readout
#[derive(Module, Debug)]
pub struct ResidualStage<B: Backend> {
    pub(crate) dynamics: ResidualDynamics<B>,
    pub(crate) decoder: ReadoutCell<B>,
}

impl<B: Backend> ResidualStage<B> {
    /// Create Stage 2
    ///
    /// # Arguments
    /// * `x_neural_size` - Residual latent width (Dxn)
    /// * `y_size` - Neural observation width (Dy), also the readout width
    /// * `x_behav_size` - Stage-1 latent width (Dxb)
    /// * `u_size` - Exogenous input width (Du), may be zero
    /// * `device` - Device to create the module on
    pub fn new(
        x_neural_size: usize,
        y_size: usize,
        x_behav_size: usize,
        u_size: usize,
        device: &B::Device,
    ) -> PsidResult<Self> {
        let dynamics = ResidualDynamics::new(x_neural_size, y_size, x_behav_size, u_size, device)?;
        let decoder = ReadoutCell::new(x_neural_size, y_size, device);

        Ok(Self { dynamics, decoder })
    }

    /// Get the recurrence
    pub fn dynamics(&self) -> &ResidualDynamics<B> {
        &self.dynamics
    }

    /// Get the neural readout
    pub fn decoder(&self) -> &ReadoutCell<B> {
        &self.decoder
    }

    /// Run Stage 2, decoding each state `x[t]` into `y_hat[t]` as it is produced.
    pub fn forward(
        &self,
        x_behav: Tensor<B, 3>,
        y: Tensor<B, 3>,
        u: Tensor<B, 3>,
    ) -> PsidResult<ResidualOutput<B>> {
        let dims = self.dynamics.validate(&x_behav, &y, &u)?;
        let drive = Tensor::cat(vec![y, x_behav], 2);
        let (x_neural, y_hat) =
            unroll_with_readout(&self.dynamics.cell, &self.decoder, drive, u, dims);

        Ok(ResidualOutput {
            y_hat,
            x_neural,
        })
    }
}
