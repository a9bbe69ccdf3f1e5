// ============================================================
// Layer 5 — Reparameterisation Sampler
// ============================================================
//   std = exp(logvar / 2)
//   eps ~ noise distribution, same shape as mu
//   z   = mu + std ⊙ eps
//
// eps is a fresh leaf tensor that never requires a gradient,
// so back-propagation reaches mu and logvar only.

use burn::{
    prelude::*,
    tensor::Distribution,
};

use crate::domain::settings::NoiseDistribution;

/// z = mu + exp(logvar / 2) * eps, element-wise.
pub fn reparameterize<B: Backend, const D: usize>(
    mu:     Tensor<B, D>,
    logvar: Tensor<B, D>,
    eps:    Tensor<B, D>,
) -> Tensor<B, D> {
    let std = logvar.div_scalar(2.0).exp();
    mu + std * eps
}

/// Draws the noise term and applies [`reparameterize`].
///
/// Holds no parameters; it is a module only so it can live inside
/// `BetaVae` and travel with it through `valid()` and records.
#[derive(Module, Clone, Debug)]
pub struct Sampler {
    uniform: bool,
}

impl Sampler {
    pub fn new(noise: NoiseDistribution) -> Self {
        Self { uniform: noise == NoiseDistribution::Uniform }
    }

    pub fn noise(&self) -> NoiseDistribution {
        if self.uniform { NoiseDistribution::Uniform } else { NoiseDistribution::Normal }
    }

    /// Noise shaped like `reference`, on the same device.
    pub fn noise_like<B: Backend, const D: usize>(&self, reference: &Tensor<B, D>) -> Tensor<B, D> {
        let distribution = match self.noise() {
            NoiseDistribution::Normal  => Distribution::Normal(0.0, 1.0),
            NoiseDistribution::Uniform => Distribution::Uniform(0.0, 1.0),
        };
        reference.random_like(distribution)
    }

    pub fn sample<B: Backend, const D: usize>(&self, mu: Tensor<B, D>, logvar: Tensor<B, D>) -> Tensor<B, D> {
        let eps = self.noise_like(&mu);
        reparameterize(mu, logvar, eps)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray;
    type TestAutodiffBackend = Autodiff<NdArray>;

    fn values<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().convert::<f32>().to_vec().unwrap()
    }

    #[test]
    fn test_unit_noise_gives_std_offset() {
        let device = Default::default();
        let mu     = Tensor::<TestBackend, 1>::from_floats([0.0], &device);
        let logvar = Tensor::<TestBackend, 1>::from_floats([0.0], &device);
        let eps    = Tensor::<TestBackend, 1>::from_floats([1.0], &device);
        assert_eq!(values(reparameterize(mu, logvar, eps)), vec![1.0]);
    }

    #[test]
    fn test_literal_values() {
        let device = Default::default();
        let mu     = Tensor::<TestBackend, 1>::from_floats([1.0, -2.0, 0.5], &device);
        let logvar = Tensor::<TestBackend, 1>::from_floats([0.0, 2.0, -2.0], &device);
        let eps    = Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, -1.0], &device);
        let z      = values(reparameterize(mu, logvar, eps));

        let expected = [1.0, -2.0 + 1.0f32.exp(), 0.5 - (-1.0f32).exp()];
        for (got, want) in z.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{got} != {want}");
        }
    }

    #[test]
    fn test_gradients_flow_through_mu_and_logvar() {
        let device = Default::default();
        let mu     = Tensor::<TestAutodiffBackend, 1>::from_floats([0.5, -1.0], &device).require_grad();
        let logvar = Tensor::<TestAutodiffBackend, 1>::from_floats([0.0, 2.0], &device).require_grad();
        let eps    = Tensor::<TestAutodiffBackend, 1>::from_floats([1.0, 0.5], &device);

        let z     = reparameterize(mu.clone(), logvar.clone(), eps);
        let grads = z.sum().backward();

        // dz/dmu = 1
        assert_eq!(values(mu.grad(&grads).unwrap()), vec![1.0, 1.0]);

        // dz/dlogvar = 0.5 * exp(logvar / 2) * eps
        let grad_logvar = values(logvar.grad(&grads).unwrap());
        let expected    = [0.5, 0.5 * 1.0f32.exp() * 0.5];
        for (got, want) in grad_logvar.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{got} != {want}");
        }
    }

    #[test]
    fn test_uniform_noise_stays_in_unit_interval() {
        let device  = Default::default();
        let sampler = Sampler::new(NoiseDistribution::Uniform);
        let mu      = Tensor::<TestBackend, 2>::zeros([8, 16], &device);
        let noise   = values(sampler.noise_like(&mu));
        assert_eq!(noise.len(), 8 * 16);
        assert!(noise.iter().all(|v| (0.0..1.0).contains(v)));
    }

    fn mean_and_variance(values: &[f32]) -> (f64, f64) {
        let n    = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var  = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn test_default_noise_is_standard_normal() {
        let device  = Default::default();
        let sampler = Sampler::new(NoiseDistribution::default());
        let mu      = Tensor::<TestBackend, 2>::zeros([100, 100], &device);
        let noise   = values(sampler.noise_like(&mu));

        let (mean, var) = mean_and_variance(&noise);
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.1, "variance {var}");
        assert!(noise.iter().any(|&v| v < 0.0));
        assert!(noise.iter().any(|&v| v > 1.0));
    }

    #[test]
    fn test_sample_at_prior_returns_the_noise() {
        let device  = Default::default();
        let sampler = Sampler::new(NoiseDistribution::Normal);
        let zeros   = Tensor::<TestBackend, 2>::zeros([100, 100], &device);
        let z       = values(sampler.sample(zeros.clone(), zeros));

        let (mean, var) = mean_and_variance(&z);
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.1, "variance {var}");
        assert!(z.iter().any(|&v| v < 0.0));
    }

    #[test]
    fn test_sample_shifts_and_scales_the_noise() {
        let device  = Default::default();
        let sampler = Sampler::new(NoiseDistribution::Normal);
        let mu      = Tensor::<TestBackend, 2>::full([100, 100], 3.0, &device);
        let logvar  = Tensor::<TestBackend, 2>::full([100, 100], 4.0f32.ln(), &device);
        let z       = values(sampler.sample(mu, logvar));

        let (mean, var) = mean_and_variance(&z);
        assert!((mean - 3.0).abs() < 0.1, "mean {mean}");
        assert!((var - 4.0).abs() < 0.4, "variance {var}");
    }

    #[test]
    fn test_sample_keeps_shape() {
        let device  = Default::default();
        let sampler = Sampler::new(NoiseDistribution::Normal);
        let mu      = Tensor::<TestBackend, 2>::zeros([4, 10], &device);
        let logvar  = Tensor::<TestBackend, 2>::zeros([4, 10], &device);
        assert_eq!(sampler.sample(mu, logvar).dims(), [4, 10]);
        assert_eq!(sampler.noise(), NoiseDistribution::Normal);
    }
}
