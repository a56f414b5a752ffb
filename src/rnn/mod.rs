//! # Sequence Layers for the Two Stages
//!
//! This module provides the layers that own the time loop: each one starts
//! from the zero state, walks the sequence strictly in order and stacks one
//! state per time step. **These are the primary APIs most users should use**,
//! either directly or through [`Psid`](crate::model::Psid).
//!
//! ## Available Layers
//!
//! | Layer | Stage | Produces |
//! |-------|-------|----------|
//! | [`BehavioralDynamics`] | 1 | `x_behav` |
//! | [`BehavioralStage`] | 1 | `(z_hat, x_behav)` |
//! | [`ResidualDynamics`] | 2 | `x_neural` |
//! | [`ResidualStage`] | 2 | `(y_hat, x_neural)` |
//! | [`SequenceReadout`] | 1 or 2 | a per-step prediction from a finished latent sequence |
//!
//! ## Quick Start
//!
//! ```ignore
//! use psid::rnn::{BehavioralStage, ResidualStage};
//!
//! // Stage 1: Dxb=2, Dy=3, Du=0, Dz=1
//! let stage_one = BehavioralStage::<Backend>::new(2, 3, 0, 1, &device)?;
//! let out = stage_one.forward(y.clone(), u.clone())?;
//! // out.z_hat:   [batch, seq_len, 1]
//! // out.x_behav: [batch, seq_len, 2]
//!
//! // Stage 2: Dxn=4, driven by [y, x_behav] (width 3 + 2)
//! let stage_two = ResidualStage::<Backend>::new(4, 3, 2, 0, &device)?;
//! let res = stage_two.forward(out.x_behav, y, u)?;
//! // res.y_hat:    [batch, seq_len, 3]
//! // res.x_neural: [batch, seq_len, 4]
//! ```
//!
//! ## Tensor Shapes
//!
//! All streams are batch-first: `[batch, seq_len, features]`. `y`, `u` and
//! `x_behav` must agree exactly on batch and sequence length; nothing is
//! broadcast or truncated. `u` may have zero features.
//!
//! ## Time Alignment
//!
//! ```text
//! t:        0        1        2      ...   T-1
//! state:    0        x1       x2           x[T-1]
//! readout:  C(0)     C(x1)    C(x2)        C(x[T-1])
//! consumes: y0,u0 -> y1,u1 -> y2,u2  ...   (y[T-1],u[T-1] unused)
//! ```
//!
//! The readout at t decodes the state at t. The state after the last input
//! would have nothing to be compared with and is never produced.
//!
//! ## No Hidden State Between Calls
//!
//! Every forward starts again from the zero state. Running the same layer on
//! a longer sequence with the same prefix reproduces the shorter run's outputs
//! on that prefix.

pub mod behavioral;
pub mod readout;
pub mod residual;
pub mod sequence;

pub use behavioral::{BehavioralDynamics, BehavioralOutput, BehavioralStage};
pub use readout::SequenceReadout;
pub use residual::{ResidualDynamics, ResidualOutput, ResidualStage};
pub use sequence::SequenceDims;
