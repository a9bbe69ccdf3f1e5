// ============================================================
// Layer 2 — Application Layer
// ============================================================
// Use cases orchestrate the data, ml and infra layers.
// Neither knows about clap; the CLI converts its arguments
// into plain config values before calling in.

/// Full training pipeline: images → split → train → checkpoint
pub mod train_use_case;

/// Reconstruction and latent traversal grids from a checkpoint
pub mod visualize_use_case;
