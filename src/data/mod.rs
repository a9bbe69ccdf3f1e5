// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a directory of JPEGs to tensor batches.
//
// The pipeline flows in this order:
//
//   image directory
//       │
//       ▼
//   ImageFolder       → glob + sort file paths
//       │
//       ▼
//   split_holdout     → last `test_size` paths become the test set
//       │
//       ▼
//   FaceDataset       → implements Burn's Dataset trait over paths
//       │
//       ▼
//   FaceBatcher       → decodes, preprocesses, stacks into [N,3,S,S]
//       │             (uses FaceTransform)
//       ▼
//   DataLoader        → feeds batches to the training loop

/// Enumerates image files with a glob pattern
pub mod loader;

/// Crop / resize / flip / to-tensor transform
pub mod preprocessor;

/// Implements Burn's Dataset trait for image paths
pub mod dataset;

/// Implements Burn's Batcher trait to create image batches
pub mod batcher;

/// Holds out the last N items as the test set
pub mod splitter;
