//! # PSID-RNN - Two-stage recurrent preferential subspace identification
//!
//! Learns latent dynamical states from paired time series on the Burn
//! framework: a neural observation stream `y`, a behavioral target stream `z`,
//! and an optional exogenous input `u`.
//!
//! ## Features
//!
//! - **Stage 1**: affine latent recurrence driven by `y` and `u`, read out
//!   into a prediction of `z` (behaviorally relevant state)
//! - **Stage 2**: second affine recurrence driven by `[y, x_behav]` and `u`,
//!   read out into a prediction of `y` (residual neural state)
//! - **Readouts**: memoryless `linear → ReLU → linear → sigmoid` heads,
//!   four independent instances
//! - **Regimes**: sequential (Stage 1 fixed for Stage 2) or joint gradients
//! - **Double precision**: every component refuses to build on a non-f64 backend
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::{Distribution, Tensor};
//! use psid::prelude::*;
//!
//! type Backend = NdArray<f64>;
//! let device = Default::default();
//!
//! // Dxb=2, Dxn=4, Dy=3, Du=0, Dz=1
//! let model = PsidConfig::new(2, 4, 3, 0, 1).init::<Backend>(&device).unwrap();
//!
//! let y = Tensor::<Backend, 3>::random([2, 10, 3], Distribution::Uniform(0.0, 1.0), &device);
//! let u = Tensor::<Backend, 3>::zeros([2, 10, 0], &device);
//!
//! let out = model.forward(y, u).unwrap();
//! assert_eq!(out.z_hat.dims(), [2, 10, 1]);
//! assert_eq!(out.x_behav.dims(), [2, 10, 2]);
//! assert_eq!(out.y_hat.dims(), [2, 10, 3]);
//! assert_eq!(out.x_neural.dims(), [2, 10, 4]);
//! ```
//!
//! ## Stage-level Usage
//!
//! Each stage can be built and trained on its own:
//!
//! ```ignore
//! use psid::rnn::{BehavioralStage, ResidualStage};
//!
//! let stage_one = BehavioralStage::<Backend>::new(2, 3, 0, 1, &device)?;
//! let out = stage_one.forward(y.clone(), u.clone())?;
//!
//! let stage_two = ResidualStage::<Backend>::new(4, 3, 2, 0, &device)?;
//! let res = stage_two.forward(out.x_behav.detach(), y, u)?;
//! ```

pub mod cells;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod rnn;

pub mod prelude {
    pub use crate::cells::{AffineCell, ReadoutCell};
    pub use crate::config::{PsidConfig, TrainingRegime};
    pub use crate::data::{array3_from_tensor, tensor_from_array3};
    pub use crate::error::{PsidError, PsidResult, Stream};
    pub use crate::model::{Psid, PsidOutput};
    pub use crate::rnn::{
        BehavioralDynamics, BehavioralOutput, BehavioralStage, ResidualDynamics, ResidualOutput,
        ResidualStage, SequenceReadout,
    };
}
