//! # Single-Timestep Cells
//!
//! This module provides the per-step building blocks of the two-stage model.
//! They process one timestep at a time and are wrapped by the sequence layers
//! in [`crate::rnn`], which own the time loop and the zero initial state.
//!
//! ## Cell Types
//!
//! | Cell | Role | Used by |
//! |------|------|---------|
//! | [`AffineCell`] | Linear latent recurrence `x[t+1] = A·x[t] + K·d[t] + B·u[t]` | Both stages' dynamics |
//! | [`ReadoutCell`] | Nonlinear readout `σ(W₂·relu(W₁·x))` | All four decoders |
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape | Description |
//! |--------|-------|-------------|
//! | `state` | `[batch, state_size]` | Latent state at time t |
//! | `drive` | `[batch, drive_size]` | Driving observation at time t |
//! | `input` | `[batch, input_size]` | Exogenous input at time t (may be zero-width) |
//! | readout output | `[batch, output_size]` | Prediction at time t, in (0, 1) |
//!
//! ## Example: One Step by Hand
//!
//! ```ignore
//! use psid::cells::{AffineCell, ReadoutCell};
//! use burn::tensor::Tensor;
//!
//! let device = Default::default();
//! let cell = AffineCell::<Backend>::new(2, 3, 0, &device);
//! let readout = ReadoutCell::<Backend>::new(2, 1, &device);
//!
//! let x = Tensor::<Backend, 2>::zeros([batch, 2], &device);
//! let z_hat = readout.forward(x.clone());   // prediction from x[t]
//! let x_next = cell.forward(x, y_t, u_t);   // x[t+1]
//! ```

pub mod affine_cell;
pub mod readout_cell;

pub use affine_cell::AffineCell;
pub use readout_cell::ReadoutCell;
