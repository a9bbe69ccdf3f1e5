// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + test loop using Burn's DataLoader and Adam or SGD.
//
//   - Training uses B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - The test batcher must therefore also use B::InnerBackend
//   - Losses are summed over the batch, so epoch values are
//     divided by the number of samples, not batches
//
// The checkpoint is written once, after the last epoch.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{BatchResult, FaceBatcher},
    dataset::FaceDataset,
};
use crate::domain::settings::OptimizerKind;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    backend::{dispatch, BackendTask},
    loss::VaeLoss,
    model::BetaVae,
};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs:     Vec<EpochMetrics>,
    pub checkpoint: PathBuf,
}

impl TrainReport {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Train on the device named in `cfg`.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: FaceDataset,
    test_dataset:  FaceDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<TrainReport> {
    let task = TrainTask {
        cfg,
        train_dataset,
        test_dataset,
        ckpt_manager,
        metrics: Some(metrics),
    };
    dispatch(cfg.device, task)
}

struct TrainTask<'a> {
    cfg:           &'a TrainConfig,
    train_dataset: FaceDataset,
    test_dataset:  FaceDataset,
    ckpt_manager:  &'a CheckpointManager,
    metrics:       Option<&'a MetricsLogger>,
}

impl BackendTask for TrainTask<'_> {
    type Output = TrainReport;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<TrainReport> {
        train_loop::<B>(
            self.cfg,
            self.train_dataset,
            self.test_dataset,
            self.ckpt_manager,
            self.metrics,
            device,
        )
    }
}

// ─── Running Sums ─────────────────────────────────────────────────────────────
#[derive(Debug, Default, Clone, Copy)]
struct RunningLoss {
    total:          f64,
    reconstruction: f64,
    kl:             f64,
    samples:        usize,
}

impl RunningLoss {
    fn add<B: Backend>(&mut self, loss: &VaeLoss<B>, batch_size: usize) -> f64 {
        let total: f64 = loss.total.clone().into_scalar().elem::<f64>();
        self.total          += total;
        self.reconstruction += loss.reconstruction.clone().into_scalar().elem::<f64>();
        self.kl             += loss.kl.clone().into_scalar().elem::<f64>();
        self.samples        += batch_size;
        total
    }

    fn mean(value: f64, samples: usize) -> f64 {
        if samples > 0 { value / samples as f64 } else { f64::NAN }
    }

    fn mean_total(&self) -> f64 {
        Self::mean(self.total, self.samples)
    }

    fn mean_reconstruction(&self) -> f64 {
        Self::mean(self.reconstruction, self.samples)
    }

    fn mean_kl(&self) -> f64 {
        Self::mean(self.kl, self.samples)
    }
}

struct Loaders<B: AutodiffBackend> {
    train: Arc<dyn DataLoader<BatchResult<B>>>,
    test:  Arc<dyn DataLoader<BatchResult<B::InnerBackend>>>,
}

/// Full training run on backend `B`.
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: FaceDataset,
    test_dataset:  FaceDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       Option<&MetricsLogger>,
    device:        B::Device,
) -> Result<TrainReport> {
    cfg.validate()?;
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let model: BetaVae<B> = cfg.model_config().init(&device);
    tracing::info!(
        "Model ready: latent_size={}, image_size={}, noise={}",
        cfg.latent_size, cfg.image_size, cfg.noise
    );

    // ── Training data loader (AutodiffBackend, shuffled, flipped) ─────────────
    let train_batcher = FaceBatcher::<B>::new(
        device.clone(),
        cfg.transform().with_random_flip(cfg.seed),
    );
    let mut train_builder = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed);
    if cfg.num_workers > 0 {
        train_builder = train_builder.num_workers(cfg.num_workers);
    }

    // ── Test data loader (InnerBackend, no autodiff overhead) ─────────────────
    let test_batcher = FaceBatcher::<B::InnerBackend>::new(device.clone(), cfg.transform());
    let mut test_builder = DataLoaderBuilder::new(test_batcher).batch_size(cfg.batch_size);
    if cfg.num_workers > 0 {
        test_builder = test_builder.num_workers(cfg.num_workers);
    }

    let loaders = Loaders::<B> {
        train: train_builder.build(train_dataset),
        test:  test_builder.build(test_dataset),
    };

    // ── Optimiser ─────────────────────────────────────────────────────────────
    tracing::info!("Optimizer: {} (lr={})", cfg.optimizer, cfg.lr);
    let (model, epochs) = match cfg.optimizer {
        OptimizerKind::Adam => fit(cfg, model, AdamConfig::new().init(), &loaders, metrics)?,
        OptimizerKind::Sgd  => fit(cfg, model, SgdConfig::new().init(), &loaders, metrics)?,
    };

    // ── Checkpoint ────────────────────────────────────────────────────────────
    let checkpoint = ckpt_manager.save_model(&model)?;
    tracing::info!("Training complete, weights at '{}'", checkpoint.display());

    Ok(TrainReport { epochs, checkpoint })
}

fn fit<B, O>(
    cfg:       &TrainConfig,
    mut model: BetaVae<B>,
    mut optim: O,
    loaders:   &Loaders<B>,
    metrics:   Option<&MetricsLogger>,
) -> Result<(BetaVae<B>, Vec<EpochMetrics>)>
where
    B: AutodiffBackend,
    O: Optimizer<BetaVae<B>, B>,
{
    let mut history = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train = RunningLoss::default();

        for (step, batch) in loaders.train.iter().enumerate() {
            let batch      = batch?;
            let batch_size = batch.images.dims()[0];

            let (loss, _) = model.forward_loss(batch.images, cfg.beta);
            let loss_val  = train.add(&loss, batch_size);
            if !loss_val.is_finite() {
                tracing::warn!("Epoch {epoch} batch {step}: non-finite loss {loss_val}");
            }
            tracing::debug!("Epoch {epoch} batch {step}: loss={:.4}", loss_val / batch_size as f64);

            // Backward pass + optimiser update
            let grads = loss.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        // ── Test phase ────────────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut test    = RunningLoss::default();

        for batch in loaders.test.iter() {
            let batch      = batch?;
            let batch_size = batch.images.dims()[0];
            let (loss, _)  = model_valid.forward_loss(batch.images, cfg.beta);
            test.add(&loss, batch_size);
        }

        let row = EpochMetrics::new(
            epoch,
            train.mean_total(),
            test.mean_total(),
            train.mean_reconstruction(),
            train.mean_kl(),
        );
        if !row.train_loss.is_finite() {
            tracing::warn!("Epoch {epoch}: mean training loss is {}", row.train_loss);
        }

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | test_loss={:.4} | recon={:.4} | kl={:.4}",
            epoch, cfg.epochs, row.train_loss, row.test_loss, row.reconstruction, row.kl,
        );

        if let Some(logger) = metrics {
            logger.log(&row)?;
        }
        history.push(row);
    }

    Ok((model, history))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
    use image::{Rgb, RgbImage};
    use std::path::Path;

    type TestBackend = Autodiff<NdArray>;

    fn write_faces(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path  = dir.join(format!("face_{i}.png"));
                let shade = (40 * i + 20) as u8;
                RgbImage::from_fn(20, 20, |x, y| Rgb([shade, (x * 10) as u8, (y * 10) as u8]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    fn tiny_config(ckpt: &Path, optimizer: OptimizerKind) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: ckpt.to_string_lossy().into_owned(),
            batch_size:     2,
            test_size:      1,
            latent_size:    2,
            epochs:         1,
            num_workers:    0,
            image_size:     16,
            optimizer,
            ..TrainConfig::default()
        }
    }

    fn smoke(optimizer: OptimizerKind) {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        let mut paths = write_faces(data.path(), 3);
        let test      = vec![paths.pop().unwrap()];

        let cfg     = tiny_config(ckpt.path(), optimizer);
        let manager = CheckpointManager::new(ckpt.path()).unwrap();
        let metrics = MetricsLogger::new(ckpt.path()).unwrap();

        let report = train_loop::<TestBackend>(
            &cfg,
            FaceDataset::new(paths),
            FaceDataset::new(test),
            &manager,
            Some(&metrics),
            NdArrayDevice::Cpu,
        )
        .unwrap();

        let last = report.last().unwrap();
        assert_eq!(last.epoch, 1);
        assert!(last.train_loss.is_finite() && last.train_loss > 0.0);
        assert!(last.test_loss.is_finite() && last.test_loss > 0.0);
        assert!(report.checkpoint.exists());

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_one_epoch_with_adam() {
        smoke(OptimizerKind::Adam);
    }

    #[test]
    fn test_one_epoch_with_sgd() {
        smoke(OptimizerKind::Sgd);
    }

    #[test]
    fn test_empty_test_split_reports_nan() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(ckpt.path(), OptimizerKind::Adam);

        let report = train_loop::<TestBackend>(
            &cfg,
            FaceDataset::new(write_faces(data.path(), 2)),
            FaceDataset::new(Vec::new()),
            &CheckpointManager::new(ckpt.path()).unwrap(),
            None,
            NdArrayDevice::Cpu,
        )
        .unwrap();

        assert!(report.epochs[0].train_loss.is_finite());
        assert!(report.epochs[0].test_loss.is_nan());
    }

    #[test]
    fn test_corrupt_image_aborts_training() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        let bad  = data.path().join("broken.jpg");
        std::fs::write(&bad, b"not a jpeg").unwrap();

        let cfg = tiny_config(ckpt.path(), OptimizerKind::Adam);
        let err = train_loop::<TestBackend>(
            &cfg,
            FaceDataset::new(vec![bad]),
            FaceDataset::new(Vec::new()),
            &CheckpointManager::new(ckpt.path()).unwrap(),
            None,
            NdArrayDevice::Cpu,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("broken.jpg"));
        assert!(!ckpt.path().join("beta_vae.mpk.gz").exists());
    }

    #[test]
    fn test_running_loss_mean_is_per_sample() {
        let running = RunningLoss { total: 12.0, reconstruction: 9.0, kl: 1.0, samples: 4 };
        assert_eq!(running.mean_total(), 3.0);
        assert_eq!(running.mean_reconstruction(), 2.25);
        assert_eq!(running.mean_kl(), 0.25);
        assert!(RunningLoss::default().mean_total().is_nan());
    }
}
