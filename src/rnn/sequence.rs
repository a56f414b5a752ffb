//! Shared time-axis scaffolding
//!
//! Shape validation for `[batch, seq_len, features]` streams and the single
//! sequential unroll used by both stages.

use crate::cells::{AffineCell, ReadoutCell};
use crate::error::{PsidError, PsidResult, Stream};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Batch size and sequence length shared by every stream of one forward pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceDims {
    pub batch: usize,
    pub seq_len: usize,
}

impl SequenceDims {
    /// Take the dims of the reference stream after checking its feature width.
    ///
    /// Empty streams (no batch elements or no time steps) are rejected.
    pub fn of<B: Backend>(
        stream: Stream,
        tensor: &Tensor<B, 3>,
        width: usize,
    ) -> PsidResult<Self> {
        let [batch, seq_len, features] = tensor.dims();

        if batch == 0 || seq_len == 0 {
            return Err(PsidError::EmptyStream {
                stream,
                batch,
                seq_len,
            });
        }
        if features != width {
            return Err(PsidError::FeatureWidth {
                stream,
                expected: width,
                got: features,
            });
        }

        Ok(Self { batch, seq_len })
    }

    /// Check that another stream has the same batch size and sequence length,
    /// and the configured feature width.
    pub fn check_aligned<B: Backend>(
        &self,
        stream: Stream,
        tensor: &Tensor<B, 3>,
        width: usize,
    ) -> PsidResult<()> {
        let [batch, seq_len, features] = tensor.dims();

        if batch != self.batch {
            return Err(PsidError::BatchMismatch {
                stream,
                expected: self.batch,
                got: batch,
            });
        }
        if seq_len != self.seq_len {
            return Err(PsidError::SequenceMismatch {
                stream,
                expected: self.seq_len,
                got: seq_len,
            });
        }
        if features != width {
            return Err(PsidError::FeatureWidth {
                stream,
                expected: width,
                got: features,
            });
        }

        Ok(())
    }
}

/// `sequence[:, t, :]` as a `[batch, features]` tensor
pub(crate) fn time_step<B: Backend>(sequence: &Tensor<B, 3>, t: usize) -> Tensor<B, 2> {
    sequence.clone().narrow(1, t, 1).squeeze(1)
}

/// Run the affine recurrence over the whole sequence and stack `x[0..T-1]`.
///
/// `x[0]` is the zero vector. At step t the cell consumes `drive[t]` and
/// `input[t]` to produce `x[t+1]`. `x[T]` would have no paired target, so the
/// last update is skipped rather than computed and dropped.
///
/// Callers validate shapes beforehand; `dims` must describe `drive` and `input`.
pub(crate) fn unroll<B: Backend>(
    cell: &AffineCell<B>,
    drive: Tensor<B, 3>,
    input: Tensor<B, 3>,
    dims: SequenceDims,
) -> Tensor<B, 3> {
    unroll_visiting(cell, drive, input, dims, |_| {})
}

/// Run the recurrence and decode each state `x[t]` as it is produced.
///
/// Returns `(states, readouts)`, both stacked along the time axis.
pub(crate) fn unroll_with_readout<B: Backend>(
    cell: &AffineCell<B>,
    readout: &ReadoutCell<B>,
    drive: Tensor<B, 3>,
    input: Tensor<B, 3>,
    dims: SequenceDims,
) -> (Tensor<B, 3>, Tensor<B, 3>) {
    let mut readouts: Vec<Tensor<B, 2>> = Vec::with_capacity(dims.seq_len);
    let states = unroll_visiting(cell, drive, input, dims, |state| {
        readouts.push(readout.forward(state.clone()))
    });

    (states, Tensor::stack(readouts, 1))
}

/// The time loop itself. `visit` sees every stacked state `x[t]` in order.
fn unroll_visiting<B, F>(
    cell: &AffineCell<B>,
    drive: Tensor<B, 3>,
    input: Tensor<B, 3>,
    dims: SequenceDims,
    mut visit: F,
) -> Tensor<B, 3>
where
    B: Backend,
    F: FnMut(&Tensor<B, 2>),
{
    let _span = tracing::debug_span!(
        "unroll",
        batch = dims.batch,
        seq_len = dims.seq_len,
        state_size = cell.state_size()
    )
    .entered();

    let device = drive.device();
    let mut state = Tensor::<B, 2>::zeros([dims.batch, cell.state_size()], &device);
    let mut states: Vec<Tensor<B, 2>> = Vec::with_capacity(dims.seq_len);

    for t in 0..dims.seq_len {
        visit(&state);
        states.push(state.clone());

        if t + 1 < dims.seq_len {
            state = cell.forward(state, time_step(&drive, t), time_step(&input, t));
        }
    }

    Tensor::stack(states, 1)
}
