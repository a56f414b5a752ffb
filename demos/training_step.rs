//! Sequential two-stage training on synthetic data
//!
//! Stage 1 is fitted to the behavioral target first. Stage 2 is then fitted
//! to the neural signal with Stage 1 frozen.

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::{Distribution, Tensor};
use psid::prelude::*;

type Backend = Autodiff<NdArray<f64>>;

const STEPS: usize = 30;
const LEARNING_RATE: f64 = 0.01;

fn main() -> PsidResult<()> {
    tracing_subscriber::fmt::init();

    println!("=== PSID-RNN Training Example ===\n");

    let device = Default::default();
    let mut model = PsidConfig::new(2, 3, 4, 1, 1).init::<Backend>(&device)?;
    let loss_fn = MseLoss::new();

    // Synthetic recordings in (0, 1): [batch=8, seq=20]
    let y = Tensor::<Backend, 3>::random([8, 20, 4], Distribution::Uniform(0.0, 1.0), &device);
    let u = Tensor::<Backend, 3>::random([8, 20, 1], Distribution::Uniform(0.0, 1.0), &device);
    let z = y.clone().narrow(2, 0, 1).clamp(0.05, 0.95);

    println!("Phase 1: behavioral dynamics");
    let mut optim = AdamConfig::new().init();
    for step in 0..STEPS {
        let out = model.forward_behavioral(y.clone(), u.clone())?;
        out.check_target(&z)?;

        let loss = loss_fn.forward(out.z_hat, z.clone(), Reduction::Mean);
        let loss_value: f64 = loss.clone().into_scalar();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(LEARNING_RATE, model, grads);

        if step % 10 == 0 {
            println!("  Step {:3}: z loss {:.6}", step, loss_value);
        }
    }
    println!();

    println!("Phase 2: residual dynamics (Stage 1 frozen)");
    let mut model = model.freeze_behavioral();
    let mut optim = AdamConfig::new().init();
    for step in 0..STEPS {
        let stage_one = model.forward_behavioral(y.clone(), u.clone())?;
        let stage_two = model.forward_residual(stage_one.x_behav, y.clone(), u.clone())?;

        let loss = loss_fn.forward(stage_two.y_hat, y.clone(), Reduction::Mean);
        let loss_value: f64 = loss.clone().into_scalar();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(LEARNING_RATE, model, grads);

        if step % 10 == 0 {
            println!("  Step {:3}: y loss {:.6}", step, loss_value);
        }
    }
    println!();

    // Inference without gradient tracking
    let model = model.valid();
    let out = model.forward(y.inner(), u.inner())?;
    println!("Final shapes:");
    println!("  z_hat: {:?}", out.z_hat.dims());
    println!("  y_hat: {:?}", out.y_hat.dims());

    println!("\n=== Training completed ===");
    Ok(())
}
