// ============================================================
// Layer 3 — Run Settings
// ============================================================
// Small enums selected once at start-up and threaded through
// the rest of the program as explicit values.
//
// Each enum parses from the lowercase names used on the command
// line ("cpu", "uniform", "sgd", ...) and serialises the same way
// into train_config.json.

use std::{fmt, str::FromStr};

use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};

// ─── ComputeDevice ────────────────────────────────────────────────────────────
/// Where tensors live and kernels run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    /// NdArray backend on the host CPU
    #[default]
    Cpu,
    /// WGPU backend on the default graphics adapter
    Gpu,
}

impl FromStr for ComputeDevice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" | "wgpu" => Ok(Self::Gpu),
            other => bail!("unknown device '{other}' (expected cpu or gpu)"),
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Gpu => write!(f, "gpu"),
        }
    }
}

// ─── NoiseDistribution ────────────────────────────────────────────────────────
/// Distribution of the eps term in z = mu + std * eps.
///
/// `Normal` is N(0, 1), which the reparameterisation trick assumes.
/// `Uniform` draws from U[0, 1) and reproduces the notebook this
/// model was first written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseDistribution {
    #[default]
    Normal,
    Uniform,
}

impl FromStr for NoiseDistribution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" | "gaussian" => Ok(Self::Normal),
            "uniform" => Ok(Self::Uniform),
            other => bail!("unknown noise distribution '{other}' (expected normal or uniform)"),
        }
    }
}

impl fmt::Display for NoiseDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Uniform => write!(f, "uniform"),
        }
    }
}

// ─── OptimizerKind ────────────────────────────────────────────────────────────
/// Gradient-descent rule applied after every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(Self::Adam),
            "sgd" => Ok(Self::Sgd),
            other => bail!("unknown optimizer '{other}' (expected adam or sgd)"),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adam => write!(f, "adam"),
            Self::Sgd => write!(f, "sgd"),
        }
    }
}
