// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting file concerns used by several other layers:
//
//   checkpoint.rs : Saving and loading model weights with
//                    Burn's NamedMpkGzFileRecorder, plus the
//                    TrainConfig JSON needed to rebuild the model.
//
//   metrics.rs    : Epoch-level loss values appended to a CSV
//                    file for plotting learning curves.
//
//   image_grid.rs : Lays reconstructions / traversals out as
//                    one RGB image and writes it as PNG.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Image grids for visual inspection
pub mod image_grid;
