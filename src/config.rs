//! Model configuration and construction-time validation.

use crate::error::{PsidError, PsidResult};
use crate::model::Psid;
use burn::config::Config;
use burn::constant;
use burn::tensor::backend::Backend;
use burn::tensor::{DType, Element};
use serde::{Deserialize, Serialize};

/// How Stage 2 treats the Stage-1 latent state it is driven by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrainingRegime {
    /// Stage 2 receives a detached copy of the behavioral state; Stage-2
    /// losses never reach Stage-1 parameters.
    #[default]
    Sequential,
    /// Gradients from Stage-2 losses flow back through the behavioral state
    /// into Stage 1.
    Joint,
}

// Lets `TrainingRegime` sit in a module as a non-parameter (`#[module(skip)]`) field.
impl<B: Backend> burn::module::Module<B> for TrainingRegime {
    constant!(module);
}

impl<B: burn::tensor::backend::AutodiffBackend> burn::module::AutodiffModule<B> for TrainingRegime {
    constant!(ad_module, TrainingRegime);
}

impl burn::module::ModuleDisplayDefault for TrainingRegime {
    fn content(&self, content: burn::module::Content) -> Option<burn::module::Content> {
        content.add_formatted(&format!("{self:?}")).optional()
    }
}

impl burn::module::ModuleDisplay for TrainingRegime {}

/// Hyperparameters of the two-stage model.
///
/// All widths are fixed at construction; changing one requires building a
/// new model. `u_size` may be zero, every other width must be positive.
#[derive(Config, Debug)]
pub struct PsidConfig {
    /// Behavioral latent state width (Dxb)
    pub x_behav_size: usize,
    /// Residual latent state width (Dxn)
    pub x_neural_size: usize,
    /// Neural observation width (Dy)
    pub y_size: usize,
    /// Exogenous input width (Du)
    pub u_size: usize,
    /// Behavioral target width (Dz)
    pub z_size: usize,
    /// Gradient coupling between the stages
    #[config(default = "TrainingRegime::Sequential")]
    pub regime: TrainingRegime,
}

impl PsidConfig {
    /// Check every width against its constraint.
    pub fn validate(&self) -> PsidResult<()> {
        ensure_positive("x_behav_size", self.x_behav_size)?;
        ensure_positive("x_neural_size", self.x_neural_size)?;
        ensure_positive("y_size", self.y_size)?;
        ensure_positive("z_size", self.z_size)?;
        Ok(())
    }

    /// Build the full two-stage model on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> PsidResult<Psid<B>> {
        self.validate()?;
        Psid::new(self, device)
    }
}

/// Reject a zero width for a dimension that must be positive.
pub(crate) fn ensure_positive(name: &str, value: usize) -> PsidResult<()> {
    if value == 0 {
        return Err(PsidError::invalid_config(format!(
            "{} must be positive",
            name
        )));
    }
    Ok(())
}

/// The recurrence is only numerically sound over long sequences in f64.
pub(crate) fn ensure_double_precision<B: Backend>() -> PsidResult<()> {
    let dtype = <B::FloatElem as Element>::dtype();
    if dtype != DType::F64 {
        return Err(PsidError::Precision(dtype));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_config_defaults_to_sequential() {
        let config = PsidConfig::new(2, 3, 4, 0, 1);
        assert_eq!(config.regime, TrainingRegime::Sequential);

        let joint = config.with_regime(TrainingRegime::Joint);
        assert_eq!(joint.regime, TrainingRegime::Joint);
    }

    #[test]
    fn test_validate_allows_zero_input_width() {
        assert!(PsidConfig::new(2, 3, 4, 0, 1).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_widths() {
        for config in [
            PsidConfig::new(0, 3, 4, 1, 1),
            PsidConfig::new(2, 0, 4, 1, 1),
            PsidConfig::new(2, 3, 0, 1, 1),
            PsidConfig::new(2, 3, 4, 1, 0),
        ] {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, PsidError::InvalidConfig(_)), "{}", err);
        }
    }

    #[test]
    fn test_double_precision_check() {
        assert!(ensure_double_precision::<NdArray<f64>>().is_ok());

        let err = ensure_double_precision::<NdArray<f32>>().unwrap_err();
        assert!(matches!(err, PsidError::Precision(DType::F32)));
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = PsidConfig::new(2, 3, 4, 1, 1).with_regime(TrainingRegime::Joint);
        let path = std::env::temp_dir().join("psid_config_round_trip.json");

        config.save(&path).unwrap();
        let loaded = PsidConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.x_behav_size, 2);
        assert_eq!(loaded.x_neural_size, 3);
        assert_eq!(loaded.y_size, 4);
        assert_eq!(loaded.u_size, 1);
        assert_eq!(loaded.z_size, 1);
        assert_eq!(loaded.regime, TrainingRegime::Joint);
    }
}
