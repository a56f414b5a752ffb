//! Two-stage forward pass walkthrough
//!
//! Builds the full model, runs it on random recordings, and shows what each
//! stage and readout produces.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use ndarray::Array3;
use psid::prelude::*;

fn main() -> PsidResult<()> {
    tracing_subscriber::fmt::init();

    println!("=== PSID-RNN Two-Stage Example ===\n");

    type Backend = NdArray<f64>;
    let device = Default::default();

    // Example 1: Full model, no exogenous input
    println!("Example 1: Full model");
    let config = PsidConfig::new(2, 4, 3, 0, 1);
    let model = config.init::<Backend>(&device)?;

    println!("Created model:");
    println!("  Behavioral latent size: {}", model.x_behav_size());
    println!("  Residual latent size:   {}", model.x_neural_size());
    println!("  Regime:                 {:?}", model.regime());
    println!();

    // Input shape: [batch=2, seq=10, features=3]
    let y = Tensor::<Backend, 3>::random([2, 10, 3], Distribution::Uniform(0.0, 1.0), &device);
    let u = Tensor::<Backend, 3>::zeros([2, 10, 0], &device);

    let out = model.forward(y.clone(), u.clone())?;

    println!("  z_hat:          {:?}", out.z_hat.dims());
    println!("  x_behav:        {:?}", out.x_behav.dims());
    println!("  y_hat_behav:    {:?}", out.y_hat_behav.dims());
    println!("  y_hat:          {:?}", out.y_hat.dims());
    println!("  x_neural:       {:?}", out.x_neural.dims());
    println!("  z_hat_residual: {:?}", out.z_hat_residual.dims());
    println!();

    // Example 2: Stage by stage
    println!("Example 2: Stage by stage");
    let stage_one = model.forward_behavioral(y.clone(), u.clone())?;
    let stage_two = model.forward_residual(stage_one.x_behav.clone(), y, u)?;

    let first_state: f64 = stage_one.x_behav.narrow(1, 0, 1).abs().sum().into_scalar();
    println!("  |x_behav[0]| = {} (always starts at zero)", first_state);
    println!("  Stage 2 output: {:?}", stage_two.y_hat.dims());
    println!();

    // Example 3: Recordings held as ndarray arrays
    println!("Example 3: ndarray recordings with an exogenous input");
    let model = PsidConfig::new(3, 3, 4, 2, 2).init::<Backend>(&device)?;

    let y = Array3::from_shape_fn((1, 6, 4), |(_, t, f)| ((t * 4 + f) as f64).sin());
    let u = Array3::from_shape_fn((1, 6, 2), |(_, t, _)| if t % 2 == 0 { 1.0 } else { 0.0 });

    let out = model.forward(
        tensor_from_array3::<Backend, _>(&y, &device),
        tensor_from_array3::<Backend, _>(&u, &device),
    )?;
    let z_hat = array3_from_tensor(out.z_hat)?;

    println!("  z_hat array shape: {:?}", z_hat.shape());
    println!("  z_hat[0, 5, :] = {}", z_hat.slice(ndarray::s![0, 5, ..]));
    println!();

    // Example 4: Shape errors are reported, not panicked on
    println!("Example 4: Shape validation");
    let bad_y = Tensor::<Backend, 3>::zeros([1, 6, 5], &device);
    let u = Tensor::<Backend, 3>::zeros([1, 6, 2], &device);
    match model.forward(bad_y, u) {
        Ok(_) => println!("  unexpected success"),
        Err(err) => println!("  rejected: {}", err),
    }
    println!();

    println!("=== Examples completed successfully! ===");
    Ok(())
}
