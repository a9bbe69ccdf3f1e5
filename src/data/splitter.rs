// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Holds out the LAST `test_size` items as the test set:
//
//   [p0, p1, ..., p(n-k-1) | p(n-k), ..., p(n-1)]
//    └──────── train ─────┘ └────── test ──────┘
//
// The boundary itself is never shuffled. Training batches are
// shuffled later by the DataLoader; test batches keep this order.

/// Split `items` into (train, test) with the last `test_size` as test.
///
/// If `test_size` is larger than the input, everything is test data
/// and the training set is empty.
pub fn split_holdout<T>(mut items: Vec<T>, test_size: usize) -> (Vec<T>, Vec<T>) {
    let total    = items.len();
    let split_at = total.saturating_sub(test_size);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let test = items.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test",
        items.len(),
        test.len(),
    );

    (items, test)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_items_are_held_out() {
        let items: Vec<usize> = (0..10).collect();
        let (train, test)     = split_holdout(items, 3);
        assert_eq!(train, (0..7).collect::<Vec<_>>());
        assert_eq!(test,  vec![7, 8, 9]);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, test)     = split_holdout(items, 16);
        assert_eq!(train.len() + test.len(), 50);
    }

    #[test]
    fn test_oversized_holdout_takes_everything() {
        let items: Vec<usize> = (0..4).collect();
        let (train, test)     = split_holdout(items, 16);
        assert!(train.is_empty());
        assert_eq!(test.len(), 4);
    }

    #[test]
    fn test_zero_holdout() {
        let items: Vec<usize> = (0..5).collect();
        let (train, test)     = split_holdout(items, 0);
        assert_eq!(train.len(), 5);
        assert!(test.is_empty());
    }
}
