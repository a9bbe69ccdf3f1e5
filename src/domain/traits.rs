// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer asks for "the list of training images"
// through this trait and never sees how the list was built.
//
// Implementations:
//   - ImageFolder → glob pattern over a local directory

use std::path::PathBuf;

use anyhow::Result;

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can enumerate image files.
pub trait ImageSource {
    /// Return every image path in a stable order.
    /// The order decides which files end up in the test split.
    fn image_paths(&self) -> Result<Vec<PathBuf>>;
}
