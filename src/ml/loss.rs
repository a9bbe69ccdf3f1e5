// ============================================================
// Layer 5 — β-VAE Loss
// ============================================================
//   loss = BCE_sum(x̂, x) + β · KL(q(z|x) ‖ N(0, I))
//
//   BCE_sum = −Σ [ x·ln x̂ + (1 − x)·ln(1 − x̂) ]   over every pixel
//   KL      = −½ Σ (1 + logvar − mu² − exp(logvar)) over every latent
//
// Both terms are summed over the batch too, so the value grows with
// batch size; the trainer divides by the sample count for logging.
//
// exp(logvar) is left unclamped. Very large logvar overflows to inf
// and the trainer only reports it.

use burn::prelude::*;

/// Probabilities are clamped into [PROB_EPS, 1 − PROB_EPS] before ln.
pub const PROB_EPS: f64 = 1e-7;

/// Loss value together with its two terms (KL unweighted).
pub struct VaeLoss<B: Backend> {
    pub total:          Tensor<B, 1>,
    pub reconstruction: Tensor<B, 1>,
    pub kl:             Tensor<B, 1>,
}

/// Summed binary cross-entropy between a reconstruction and its target.
pub fn reconstruction_loss<B: Backend, const D: usize>(
    reconstruction: Tensor<B, D>,
    target:         Tensor<B, D>,
) -> Tensor<B, 1> {
    let p = reconstruction.clamp(PROB_EPS, 1.0 - PROB_EPS);

    let positive = target.clone() * p.clone().log();
    let negative = target.neg().add_scalar(1.0) * p.neg().add_scalar(1.0).log();

    (positive + negative).sum().neg()
}

/// KL divergence of N(mu, exp(logvar)) from N(0, 1), summed.
pub fn kl_divergence<B: Backend>(mu: Tensor<B, 2>, logvar: Tensor<B, 2>) -> Tensor<B, 1> {
    (logvar.clone().add_scalar(1.0) - mu.powf_scalar(2.0) - logvar.exp())
        .sum()
        .mul_scalar(-0.5)
}

pub fn beta_vae_loss<B: Backend>(
    reconstruction: Tensor<B, 4>,
    target:         Tensor<B, 4>,
    mu:             Tensor<B, 2>,
    logvar:         Tensor<B, 2>,
    beta:           f64,
) -> VaeLoss<B> {
    let reconstruction = reconstruction_loss(reconstruction, target);
    let kl             = kl_divergence(mu, logvar);
    let total          = reconstruction.clone() + kl.clone().mul_scalar(beta);
    VaeLoss { total, reconstruction, kl }
}
