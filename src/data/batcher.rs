// ============================================================
// Layer 4 — Face Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<FaceItem>
// (file paths) into one image tensor.
//
// How batching works here:
//   Input:  N FaceItems
//   Output: FaceBatch with images of shape [N, 3, S, S]
//
//   Every path is decoded and preprocessed into 3·S·S floats,
//   the floats are appended into one flat Vec, and the Vec is
//   wrapped in TensorData with the 4-D shape:
//   [img1_R..., img1_G..., img1_B..., img2_R..., ...] → [N, 3, S, S]
//
// The output type is a Result: a missing or corrupt file fails
// the whole batch and the training loop propagates the error.
// DataLoader outputs must be Clone, so the error is carried as
// its rendered message in a BatchError.

use std::fmt;

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::{dataset::FaceItem, preprocessor::FaceTransform};

// ─── FaceBatch ────────────────────────────────────────────────────────────────
/// A batch of images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct FaceBatch<B: Backend> {
    /// Pixel values in [0, 1]: shape: [batch_size, 3, S, S]
    pub images: Tensor<B, 4>,
}

// ─── BatchError ───────────────────────────────────────────────────────────────
/// A batch that could not be built, with the full error chain as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError(pub String);

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BatchError {}

/// What the DataLoader yields for each mini-batch.
pub type BatchResult<B> = std::result::Result<FaceBatch<B>, BatchError>;

// ─── FaceBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device and the preprocessing transform.
#[derive(Clone, Debug)]
pub struct FaceBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
    transform:  FaceTransform,
}

impl<B: Backend> FaceBatcher<B> {
    /// Create a new batcher for the given device and transform
    pub fn new(device: B::Device, transform: FaceTransform) -> Self {
        Self { device, transform }
    }

    /// Decode and stack `items` without going through a DataLoader.
    pub fn load(&self, items: &[FaceItem]) -> Result<FaceBatch<B>> {
        let size       = self.transform.image_size();
        let mut pixels = Vec::with_capacity(items.len() * self.transform.values_per_image());

        for item in items {
            pixels.extend(self.transform.load(&item.path)?);
            tracing::trace!("Decoded {}", item.path.display());
        }

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [items.len(), 3, size, size]),
            &self.device,
        );
        Ok(FaceBatch { images })
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<FaceItem, BatchResult<B>> for FaceBatcher<B> {
    fn batch(&self, items: Vec<FaceItem>) -> BatchResult<B> {
        self.load(&items).map_err(|e| BatchError(format!("{e:#}")))
    }
}
