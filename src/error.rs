//! Error types for the two-stage identification model.

use burn::constant;
use burn::tensor::DType;
use std::fmt;
use thiserror::Error;

/// Result type for model construction and forward passes.
pub type PsidResult<T> = Result<T, PsidError>;

/// The signal streams a forward pass consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Neural observation stream `y`
    Observation,
    /// Exogenous input stream `u`
    Input,
    /// Behavioral target stream `z`
    Target,
    /// Stage-1 latent state sequence
    BehavioralState,
    /// Stage-2 latent state sequence
    ResidualState,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stream::Observation => "observation",
            Stream::Input => "input",
            Stream::Target => "target",
            Stream::BehavioralState => "behavioral state",
            Stream::ResidualState => "residual state",
        };
        f.write_str(name)
    }
}

// Lets `Stream` sit in a module as a non-parameter (`#[module(skip)]`) field.
constant!(Stream);

/// Errors raised by the model.
///
/// Shape violations are reported before any computation runs. Numerical
/// blow-up of the affine recurrence is never raised here; it is left for the
/// caller to observe.
#[derive(Debug, Error)]
pub enum PsidError {
    /// Trailing feature dimension disagrees with the configured width
    #[error("{stream} feature width mismatch: expected {expected}, got {got}")]
    FeatureWidth {
        stream: Stream,
        expected: usize,
        got: usize,
    },

    /// Batch size disagrees with the observation stream
    #[error("{stream} batch size mismatch: expected {expected}, got {got}")]
    BatchMismatch {
        stream: Stream,
        expected: usize,
        got: usize,
    },

    /// Sequence length disagrees with the observation stream
    #[error("{stream} sequence length mismatch: expected {expected}, got {got}")]
    SequenceMismatch {
        stream: Stream,
        expected: usize,
        got: usize,
    },

    /// Stream has no batch elements or no time steps
    #[error("{stream} stream is empty: batch={batch}, seq_len={seq_len}")]
    EmptyStream {
        stream: Stream,
        batch: usize,
        seq_len: usize,
    },

    /// Malformed hyperparameters
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backend float element is not double precision
    #[error("parameters must be double precision (f64), backend float element is {0:?}")]
    Precision(DType),

    /// Tensor data could not be read back
    #[error("tensor data error: {0}")]
    Data(String),

    /// ndarray layout error during conversion
    #[error("array layout error: {0}")]
    Layout(#[from] ndarray::ShapeError),
}

impl PsidError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tensor data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// True for the shape-contract violations raised by forward passes.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::FeatureWidth { .. }
                | Self::BatchMismatch { .. }
                | Self::SequenceMismatch { .. }
                | Self::EmptyStream { .. }
        )
    }
}
