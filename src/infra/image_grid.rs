// ============================================================
// Layer 6 — Image Grid
// ============================================================
// Lays a batch of channel-first images out on one RGB canvas:
//
//   ┌───┬───┬───┐  `columns` images per row, `GRID_PADDING`
//   │ 0 │ 1 │ 2 │  white pixels around every cell, rows
//   ├───┼───┼───┤  filled left to right
//   │ 3 │ 4 │   │
//   └───┴───┴───┘
//
// The grid is built in memory; save_grid writes it as PNG.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use image::{Rgb, RgbImage};

pub const GRID_PADDING: u32 = 2;

/// Render `pixels` (N × 3 × size × size values in [0, 1]) as a grid.
pub fn render_grid(pixels: &[f32], image_size: usize, columns: usize) -> Result<RgbImage> {
    let per_image = 3 * image_size * image_size;
    ensure!(per_image > 0 && columns > 0, "Grid needs a positive image size and column count");
    ensure!(
        !pixels.is_empty() && pixels.len() % per_image == 0,
        "Pixel buffer of {} values does not hold whole {}×{} RGB images",
        pixels.len(), image_size, image_size
    );

    let count = pixels.len() / per_image;
    let rows  = count.div_ceil(columns);
    let side  = image_size as u32;
    let cell  = side + GRID_PADDING;

    let width  = columns as u32 * cell + GRID_PADDING;
    let height = rows    as u32 * cell + GRID_PADDING;
    let mut grid = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let plane = image_size * image_size;
    for (index, image) in pixels.chunks_exact(per_image).enumerate() {
        let left = GRID_PADDING + (index % columns) as u32 * cell;
        let top  = GRID_PADDING + (index / columns) as u32 * cell;

        for y in 0..image_size {
            for x in 0..image_size {
                let offset = y * image_size + x;
                let rgb = [0, 1, 2].map(|c| to_byte(image[c * plane + offset]));
                grid.put_pixel(left + x as u32, top + y as u32, Rgb(rgb));
            }
        }
    }

    Ok(grid)
}

/// Write `grid` as PNG, creating parent directories.
pub fn save_grid(grid: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    grid.save(path)
        .with_context(|| format!("Cannot write image grid to '{}'", path.display()))?;
    tracing::info!("Wrote {}×{} grid to '{}'", grid.width(), grid.height(), path.display());
    Ok(())
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
