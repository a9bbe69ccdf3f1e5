use std::path::PathBuf;

use burn::data::dataset::Dataset;

/// One dataset element: the path of a single face image.
/// Decoding is deferred to the batcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceItem {
    pub path: PathBuf,
}

/// Ordered, immutable list of image paths.
pub struct FaceDataset {
    items: Vec<FaceItem>,
}

impl FaceDataset {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { items: paths.into_iter().map(|path| FaceItem { path }).collect() }
    }

    pub fn image_count(&self) -> usize { self.items.len() }
}

impl Dataset<FaceItem> for FaceDataset {
    fn get(&self, index: usize) -> Option<FaceItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_order() {
        let ds = FaceDataset::new(vec!["b.jpg".into(), "a.jpg".into()]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.image_count(), 2);
        assert_eq!(ds.get(0).unwrap().path, PathBuf::from("b.jpg"));
        assert!(ds.get(2).is_none());
    }
}
