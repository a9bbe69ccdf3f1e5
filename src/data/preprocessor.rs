// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns one decoded face photo into the model's input layout.
//
// Steps (applied in order):
//   1. Convert to 8-bit RGB (drops alpha, expands greyscale)
//   2. Center-crop a square of `crop_size` pixels
//      (178 keeps the face of a 178×218 CelebA image)
//   3. Resize to `image_size` × `image_size` (bilinear)
//   4. Mirror left↔right with probability 0.5 (training only)
//   5. Scale bytes to [0, 1] and lay out channel-first:
//        [R plane | G plane | B plane], each row-major
//
// If the photo is smaller than `crop_size` the crop shrinks to the
// shorter side instead of padding.
//
// The flip coin comes from one seeded StdRng shared by every clone
// of the transform (the DataLoader clones its batcher per worker).
// With zero workers the flip sequence is fully reproducible; with
// more, the seed fixes the coin sequence but not which image gets
// which coin.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use image::{imageops, imageops::FilterType, DynamicImage, RgbImage};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Fixed preprocessing transform for face images.
#[derive(Debug, Clone)]
pub struct FaceTransform {
    crop_size:  u32,
    image_size: u32,
    flip_rng:   Option<Arc<Mutex<StdRng>>>,
}

impl FaceTransform {
    /// Create a transform without random flipping.
    pub fn new(crop_size: usize, image_size: usize) -> Self {
        Self {
            crop_size:  crop_size as u32,
            image_size: image_size as u32,
            flip_rng:   None,
        }
    }

    /// Enable the random horizontal flip, drawing coins from `seed`.
    pub fn with_random_flip(mut self, seed: u64) -> Self {
        self.flip_rng = Some(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))));
        self
    }

    /// Side length of the produced square image.
    pub fn image_size(&self) -> usize {
        self.image_size as usize
    }

    /// Number of f32 values produced per image (3 × size × size).
    pub fn values_per_image(&self) -> usize {
        3 * self.image_size() * self.image_size()
    }

    /// Decode the file at `path` and apply the transform.
    pub fn load(&self, path: &Path) -> Result<Vec<f32>> {
        let image = image::open(path)
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
        Ok(self.apply(&image))
    }

    /// Apply the transform to an already decoded image.
    pub fn apply(&self, image: &DynamicImage) -> Vec<f32> {
        self.apply_with_flip(image, self.flip_coin())
    }

    fn flip_coin(&self) -> bool {
        match &self.flip_rng {
            Some(rng) => rng
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .gen_bool(0.5),
            None => false,
        }
    }

    fn apply_with_flip(&self, image: &DynamicImage, flip: bool) -> Vec<f32> {
        let rgb = image.to_rgb8();

        // ── Center crop ───────────────────────────────────────────────────────
        let (width, height) = rgb.dimensions();
        let side = self.crop_size.min(width).min(height);
        let left = ((width  - side) as f64 / 2.0).round() as u32;
        let top  = ((height - side) as f64 / 2.0).round() as u32;
        let cropped = imageops::crop_imm(&rgb, left, top, side, side).to_image();

        // ── Resize ────────────────────────────────────────────────────────────
        let mut resized: RgbImage = imageops::resize(
            &cropped,
            self.image_size,
            self.image_size,
            FilterType::Triangle,
        );

        if flip {
            resized = imageops::flip_horizontal(&resized);
        }

        to_chw(&resized)
    }
}

/// Convert an RGB image to channel-first f32 values in [0, 1].
pub fn to_chw(image: &RgbImage) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut out = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in image.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for (c, &value) in pixel.0.iter().enumerate() {
            out[c * plane + offset] = value as f32 / 255.0;
        }
    }
    out
}
