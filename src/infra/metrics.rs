// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per training epoch.
//
// Metrics recorded per epoch (all are mean per-sample values):
//   - epoch:          the epoch number (1, 2, 3, ...)
//   - train_loss:     β-VAE loss on the training split
//   - test_loss:      β-VAE loss on the held-out split
//   - reconstruction: summed BCE part of train_loss
//   - kl:             unweighted KL part of train_loss
//
// Output file: <checkpoint_dir>/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,test_loss,reconstruction,kl
//   1,5480.112305,5331.804199,5391.907227,29.401693
//   2,5203.553711,5187.026855,5101.228516,34.108398

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

const HEADER: &str = "epoch,train_loss,test_loss,reconstruction,kl";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean per-sample loss over the training split
    pub train_loss: f64,

    /// Mean per-sample loss over the test split (NaN when it is empty)
    pub test_loss: f64,

    /// Mean per-sample reconstruction term on the training split
    pub reconstruction: f64,

    /// Mean per-sample KL term on the training split
    pub kl: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, test_loss: f64, reconstruction: f64, kl: f64) -> Self {
        Self { epoch, train_loss, test_loss, reconstruction, kl }
    }

    fn csv_row(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{:.6}",
            self.epoch, self.train_loss, self.test_loss, self.reconstruction, self.kl,
        )
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger in `dir`.
    /// Writes the CSV header if the file doesn't exist yet,
    /// so consecutive runs append to one log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.csv_row())?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.test_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
