//! Standalone sequence readouts
//!
//! Decoders that run on an already computed latent sequence rather than
//! inside a recurrence: the Stage-1 neural readout (how much of `y` the
//! behavioral state already explains) and the Stage-2 behavioral readout
//! (diagnostic or joint behavioral loss on the residual state).

use super::sequence::SequenceDims;
use crate::cells::ReadoutCell;
use crate::config::{ensure_double_precision, ensure_positive};
use crate::error::{PsidResult, Stream};
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Per-step readout applied over `[batch, seq_len, state_size]`
#[derive(Module, Debug)]
pub struct SequenceReadout<B: Backend> {
    pub(crate) cell: ReadoutCell<B>,
    /// Which latent sequence this readout decodes, for error reporting
    #[module(skip)]
    source: Stream,
}

impl<B: Backend> SequenceReadout<B> {
    /// Create a readout for a latent sequence
    ///
    /// # Arguments
    /// * `source` - The latent stream decoded, used to label shape errors
    /// * `state_size` - Width of that latent state
    /// * `output_size` - Width of the prediction
    /// * `device` - Device to create the module on
    pub fn new(
        source: Stream,
        state_size: usize,
        output_size: usize,
        device: &B::Device,
    ) -> PsidResult<Self> {
        ensure_double_precision::<B>()?;
        ensure_positive("state_size", state_size)?;
        ensure_positive("output_size", output_size)?;

        tracing::debug!(%source, state_size, output_size, "building sequence readout");

        Ok(Self {
            cell: ReadoutCell::new(state_size, output_size, device),
            source,
        })
    }

    /// Get the underlying cell
    pub fn cell(&self) -> &ReadoutCell<B> {
        &self.cell
    }

    /// Get the decoded state width
    pub fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    /// Get the prediction width
    pub fn output_size(&self) -> usize {
        self.cell.output_size()
    }

    /// Get the latent stream this readout decodes
    pub fn source(&self) -> Stream {
        self.source
    }

    /// Decode every time step
    ///
    /// # Arguments
    /// * `states` - Latent states `[batch, seq_len, state_size]`
    ///
    /// # Returns
    /// Predictions `[batch, seq_len, output_size]`, in (0, 1)
    pub fn forward(&self, states: Tensor<B, 3>) -> PsidResult<Tensor<B, 3>> {
        let dims = SequenceDims::of(self.source, &states, self.state_size())?;
        let _span = tracing::debug_span!(
            "read_out",
            source = %self.source,
            batch = dims.batch,
            seq_len = dims.seq_len
        )
        .entered();

        // The readout is memoryless, so the whole sequence goes through at once
        Ok(self.cell.forward(states))
    }
}
