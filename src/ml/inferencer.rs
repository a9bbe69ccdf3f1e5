// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds a trained β-VAE from its checkpoint directory and
// runs it forward for visualisation:
//
//   reconstruct: encode, sample, decode
//   reconstruct_mean: encode, decode mu (zero noise)
//   traverse   : walk single latent dimensions around mu
use std::path::PathBuf;

use anyhow::{anyhow, ensure, Result};
use burn::prelude::*;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::FaceBatcher, dataset::FaceItem};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::BetaVae;

pub struct VaeInferencer<B: Backend> {
    model:  BetaVae<B>,
    config: TrainConfig,
    device: B::Device,
}

impl<B: Backend> VaeInferencer<B> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let config = ckpt_manager.load_config()?;
        let model: BetaVae<B> = config.model_config().init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!(
            "Model loaded from '{}' (latent_size={})",
            ckpt_manager.dir().display(),
            config.latent_size
        );
        Ok(Self { model, config, device })
    }

    /// The configuration the checkpoint was trained with.
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Decode and preprocess `paths` the same way the test split is.
    pub fn load_images(&self, paths: &[PathBuf]) -> Result<Tensor<B, 4>> {
        let items: Vec<FaceItem> = paths.iter().cloned().map(|path| FaceItem { path }).collect();
        let batcher = FaceBatcher::<B>::new(self.device.clone(), self.config.transform());
        Ok(batcher.load(&items)?.images)
    }

    /// [n, 3, S, S] → [n, 3, S, S]
    pub fn reconstruct(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.model.forward(images).reconstruction
    }

    /// Deterministic reconstruction: decode(mu), i.e. eps = 0.
    pub fn reconstruct_mean(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let [count, ..] = images.dims();
        let eps = Tensor::<B, 2>::zeros([count, self.config.latent_size], &self.device);
        self.model.forward_with_noise(images, eps).reconstruction
    }

    /// Decode latent traversals of a single image [1, 3, S, S].
    ///
    /// Returns `dims × steps` images, grouped by dimension.
    pub fn traverse(
        &self,
        image: Tensor<B, 4>,
        dims:  usize,
        steps: usize,
        range: f32,
    ) -> Result<Tensor<B, 4>> {
        let [count, ..] = image.dims();
        ensure!(count == 1, "traverse expects exactly one image, got {count}");

        let (mu, _) = self.model.encoder.forward(image);
        let base: Vec<f32> = mu
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read latent code: {e:?}"))?;

        let codes = traversal_codes(&base, dims, steps, range)?;
        let z = Tensor::<B, 2>::from_data(
            TensorData::new(codes, [dims * steps, base.len()]),
            &self.device,
        );
        Ok(self.model.decoder.forward(z))
    }
}

/// Latent codes for a traversal around `base`.
///
/// For each of the first `dims` dimensions, `steps` copies of `base` are
/// emitted with that dimension replaced by evenly spaced values in
/// [-range, range]. Row-major, `dims * steps` rows of `base.len()` values.
pub fn traversal_codes(base: &[f32], dims: usize, steps: usize, range: f32) -> Result<Vec<f32>> {
    ensure!(
        (1..=base.len()).contains(&dims),
        "dims must be between 1 and {} (got {dims})",
        base.len()
    );
    ensure!(steps >= 2, "steps must be at least 2 (got {steps})");
    ensure!(range.is_finite() && range > 0.0, "range must be a positive number");

    let mut codes = Vec::with_capacity(dims * steps * base.len());
    for dim in 0..dims {
        for step in 0..steps {
            let value = -range + 2.0 * range * step as f32 / (steps - 1) as f32;
            codes.extend_from_slice(base);
            let row_start = codes.len() - base.len();
            codes[row_start + dim] = value;
        }
    }
    Ok(codes)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};

    type TestBackend = NdArray;

    #[test]
    fn test_traversal_codes_vary_one_dimension() {
        let codes = traversal_codes(&[0.5, -0.5, 2.0], 2, 3, 1.0).unwrap();
        assert_eq!(
            codes,
            vec![
                -1.0, -0.5, 2.0,
                 0.0, -0.5, 2.0,
                 1.0, -0.5, 2.0,
                 0.5, -1.0, 2.0,
                 0.5,  0.0, 2.0,
                 0.5,  1.0, 2.0,
            ]
        );
    }

    #[test]
    fn test_traversal_codes_reject_bad_arguments() {
        assert!(traversal_codes(&[0.0; 4], 0, 5, 3.0).is_err());
        assert!(traversal_codes(&[0.0; 4], 5, 5, 3.0).is_err());
        assert!(traversal_codes(&[0.0; 4], 2, 1, 3.0).is_err());
        assert!(traversal_codes(&[0.0; 4], 2, 5, 0.0).is_err());
    }

    #[test]
    fn test_inferencer_from_checkpoint() {
        let ckpt = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let cfg  = TrainConfig { latent_size: 3, image_size: 16, ..TrainConfig::default() };

        let manager = CheckpointManager::new(ckpt.path()).unwrap();
        let model: BetaVae<TestBackend> = cfg.model_config().init(&Default::default());
        manager.save_model(&model).unwrap();
        manager.save_config(&cfg).unwrap();

        let face = data.path().join("face.png");
        RgbImage::from_pixel(30, 30, Rgb([200, 100, 50])).save(&face).unwrap();

        let inferencer = VaeInferencer::<TestBackend>::from_checkpoint(&manager, Default::default()).unwrap();
        assert_eq!(inferencer.config().latent_size, 3);

        let images = inferencer.load_images(&[face.clone(), face]).unwrap();
        assert_eq!(inferencer.reconstruct(images.clone()).dims(), [2, 3, 16, 16]);

        let mean_a: Vec<f32> = inferencer.reconstruct_mean(images.clone()).into_data().to_vec().unwrap();
        let mean_b: Vec<f32> = inferencer.reconstruct_mean(images.clone()).into_data().to_vec().unwrap();
        assert_eq!(mean_a.len(), 2 * 3 * 16 * 16);
        assert_eq!(mean_a, mean_b);

        let single = images.clone().slice([0..1]);
        let grid   = inferencer.traverse(single, 3, 4, 2.0).unwrap();
        assert_eq!(grid.dims(), [12, 3, 16, 16]);

        assert!(inferencer.traverse(images, 1, 2, 1.0).is_err());
    }
}
