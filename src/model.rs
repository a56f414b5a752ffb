//! Two-stage preferential subspace identification model
//!
//! Bundles both stages and the two auxiliary readouts:
//!
//! | Component | Decodes | Predicts |
//! |-----------|---------|----------|
//! | Stage-1 readout | `x_behav` | `z` |
//! | Stage-1 neural readout | `x_behav` | `y` |
//! | Stage-2 readout | `x_neural` | `y` |
//! | Stage-2 behavioral readout | `x_neural` | `z` |

use crate::config::{PsidConfig, TrainingRegime};
use crate::error::{PsidResult, Stream};
use crate::rnn::{
    BehavioralOutput, BehavioralStage, ResidualOutput, ResidualStage, SequenceReadout,
};
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Every prediction and latent sequence of one full forward pass
#[derive(Debug, Clone)]
pub struct PsidOutput<B: Backend> {
    /// Stage-1 behavioral prediction `[batch, seq_len, z_size]`
    pub z_hat: Tensor<B, 3>,
    /// Stage-1 latent states `[batch, seq_len, x_behav_size]`
    pub x_behav: Tensor<B, 3>,
    /// Neural prediction from the behavioral state alone `[batch, seq_len, y_size]`
    pub y_hat_behav: Tensor<B, 3>,
    /// Stage-2 neural prediction `[batch, seq_len, y_size]`
    pub y_hat: Tensor<B, 3>,
    /// Stage-2 latent states `[batch, seq_len, x_neural_size]`
    pub x_neural: Tensor<B, 3>,
    /// Behavioral prediction from the residual state `[batch, seq_len, z_size]`
    pub z_hat_residual: Tensor<B, 3>,
}

/// The full two-stage model
#[derive(Module, Debug)]
pub struct Psid<B: Backend> {
    behavioral: BehavioralStage<B>,
    behavioral_neural: SequenceReadout<B>,
    residual: ResidualStage<B>,
    residual_behavioral: SequenceReadout<B>,
    /// Gradient coupling between the stages
    #[module(skip)]
    regime: TrainingRegime,
}

impl<B: Backend> Psid<B> {
    /// Build every component from a configuration.
    ///
    /// Prefer [`PsidConfig::init`], which validates the configuration first.
    pub fn new(config: &PsidConfig, device: &B::Device) -> PsidResult<Self> {
        let behavioral = BehavioralStage::new(
            config.x_behav_size,
            config.y_size,
            config.u_size,
            config.z_size,
            device,
        )?;
        let behavioral_neural = SequenceReadout::new(
            Stream::BehavioralState,
            config.x_behav_size,
            config.y_size,
            device,
        )?;
        let residual = ResidualStage::new(
            config.x_neural_size,
            config.y_size,
            config.x_behav_size,
            config.u_size,
            device,
        )?;
        let residual_behavioral = SequenceReadout::new(
            Stream::ResidualState,
            config.x_neural_size,
            config.z_size,
            device,
        )?;

        tracing::debug!(regime = ?config.regime, "two-stage model ready");

        Ok(Self {
            behavioral,
            behavioral_neural,
            residual,
            residual_behavioral,
            regime: config.regime,
        })
    }

    /// Get the gradient coupling between the stages
    pub fn regime(&self) -> TrainingRegime {
        self.regime
    }

    /// Get the behavioral latent width
    pub fn x_behav_size(&self) -> usize {
        self.behavioral.dynamics().state_size()
    }

    /// Get the residual latent width
    pub fn x_neural_size(&self) -> usize {
        self.residual.dynamics().state_size()
    }

    /// Get the neural observation width
    pub fn y_size(&self) -> usize {
        self.behavioral.dynamics().y_size()
    }

    /// Get the exogenous input width
    pub fn u_size(&self) -> usize {
        self.behavioral.dynamics().u_size()
    }

    /// Get the behavioral target width
    pub fn z_size(&self) -> usize {
        self.behavioral.z_size()
    }

    /// Get Stage 1
    pub fn behavioral(&self) -> &BehavioralStage<B> {
        &self.behavioral
    }

    /// Get Stage 2
    pub fn residual(&self) -> &ResidualStage<B> {
        &self.residual
    }

    /// Get the Stage-1 neural readout
    pub fn behavioral_neural(&self) -> &SequenceReadout<B> {
        &self.behavioral_neural
    }

    /// Get the Stage-2 behavioral readout
    pub fn residual_behavioral(&self) -> &SequenceReadout<B> {
        &self.residual_behavioral
    }

    /// Stop Stage-1 parameters (recurrence and behavioral readout) from
    /// tracking gradients.
    ///
    /// Under [`TrainingRegime::Joint`] gradients still flow through
    /// `x_behav` into Stage 1, but its parameters no longer receive them.
    pub fn freeze_behavioral(mut self) -> Self {
        if self.regime == TrainingRegime::Joint {
            tracing::warn!(
                "freezing Stage 1 under the joint regime; its parameters will not be updated"
            );
        }
        self.behavioral = self.behavioral.no_grad();
        self
    }

    /// Run Stage 1.
    pub fn forward_behavioral(
        &self,
        y: Tensor<B, 3>,
        u: Tensor<B, 3>,
    ) -> PsidResult<BehavioralOutput<B>> {
        self.behavioral.forward(y, u)
    }

    /// Predict the neural signal from the behavioral state alone.
    pub fn decode_behavioral_neural(&self, x_behav: Tensor<B, 3>) -> PsidResult<Tensor<B, 3>> {
        self.behavioral_neural.forward(x_behav)
    }

    /// Run Stage 2 on a behavioral state sequence.
    ///
    /// Under [`TrainingRegime::Sequential`] the state is detached first, so
    /// Stage-2 losses only update Stage-2 parameters.
    pub fn forward_residual(
        &self,
        x_behav: Tensor<B, 3>,
        y: Tensor<B, 3>,
        u: Tensor<B, 3>,
    ) -> PsidResult<ResidualOutput<B>> {
        let x_behav = match self.regime {
            TrainingRegime::Sequential => x_behav.detach(),
            TrainingRegime::Joint => x_behav,
        };
        self.residual.forward(x_behav, y, u)
    }

    /// Predict the behavioral target from the residual state.
    pub fn decode_residual_behavioral(&self, x_neural: Tensor<B, 3>) -> PsidResult<Tensor<B, 3>> {
        self.residual_behavioral.forward(x_neural)
    }

    /// Run both stages and all four readouts.
    ///
    /// # Arguments
    /// * `y` - Neural observations `[batch, seq_len, y_size]`
    /// * `u` - Exogenous input `[batch, seq_len, u_size]`
    pub fn forward(&self, y: Tensor<B, 3>, u: Tensor<B, 3>) -> PsidResult<PsidOutput<B>> {
        let stage_one = self.forward_behavioral(y.clone(), u.clone())?;
        let y_hat_behav = self.decode_behavioral_neural(stage_one.x_behav.clone())?;

        let stage_two = self.forward_residual(stage_one.x_behav.clone(), y, u)?;
        let z_hat_residual = self.decode_residual_behavioral(stage_two.x_neural.clone())?;

        Ok(PsidOutput {
            z_hat: stage_one.z_hat,
            x_behav: stage_one.x_behav,
            y_hat_behav,
            y_hat: stage_two.y_hat,
            x_neural: stage_two.x_neural,
            z_hat_residual,
        })
    }
}
