// ============================================================
// Layer 4 — Image Folder
// ============================================================
// Enumerates image files in a directory with a glob pattern,
// e.g. "data/img_align_celeba" + "*.jpg".
//
// The returned list is sorted so that the train/test split is
// the same on every run and on every filesystem.
//
// Nothing is decoded here; decoding happens in the batcher so
// the DataLoader workers share the cost.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};

use crate::domain::traits::ImageSource;

/// A directory of images selected by a glob pattern.
/// Implements the ImageSource trait from Layer 3.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    /// Directory that holds the images
    dir: PathBuf,
    /// File-name pattern relative to `dir`
    pattern: String,
}

impl ImageFolder {
    /// Create a new ImageFolder, e.g. `ImageFolder::new("data/celeba", "*.jpg")`
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self { dir: dir.into(), pattern: pattern.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageSource for ImageFolder {
    fn image_paths(&self) -> Result<Vec<PathBuf>> {
        ensure!(
            self.dir.is_dir(),
            "Image directory '{}' does not exist",
            self.dir.display()
        );

        // The directory is literal text; only `pattern` is glob syntax.
        let dir = self
            .dir
            .to_str()
            .with_context(|| format!("Non UTF-8 path '{}'", self.dir.display()))?;
        let full_pattern = Path::new(&glob::Pattern::escape(dir)).join(&self.pattern);
        let full_pattern = full_pattern
            .to_str()
            .with_context(|| format!("Non UTF-8 pattern '{}'", self.pattern))?;

        let mut paths = Vec::new();
        for entry in glob::glob(full_pattern)
            .with_context(|| format!("Invalid glob pattern '{full_pattern}'"))?
        {
            let path = entry.with_context(|| format!("Cannot read an entry of '{}'", self.dir.display()))?;
            if path.is_file() {
                paths.push(path);
            }
        }

        paths.sort();
        tracing::info!("Found {} images matching '{}'", paths.len(), full_pattern);
        Ok(paths)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lists_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.jpg", "c.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let paths = ImageFolder::new(dir.path(), "*.jpg").image_paths().unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub.jpg")).unwrap();
        fs::write(dir.path().join("face.jpg"), b"x").unwrap();

        let paths = ImageFolder::new(dir.path(), "*.jpg").image_paths().unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_directory_name_with_glob_characters() {
        let root = tempfile::tempdir().unwrap();
        let dir  = root.path().join("faces[1]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a.jpg"), b"x").unwrap();
        fs::write(dir.join("b.png"), b"x").unwrap();

        let paths = ImageFolder::new(&dir, "*.jpg").image_paths().unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("faces[1]/a.jpg"));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(ImageFolder::new(missing, "*.jpg").image_paths().is_err());
    }

    #[test]
    fn test_no_matches_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ImageFolder::new(dir.path(), "*.jpg").image_paths().unwrap();
        assert!(paths.is_empty());
    }
}
