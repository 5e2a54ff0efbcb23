// ============================================================
// Layer 4 — Cross-Validation Partitions
// ============================================================
// Builds k independent (train, validate) splits of a data set.
//
// Each split is its own shuffle of the full data, so rows can
// appear in the validation part of several splits. With
// fraction = 0.8 and 100 rows every split holds 80 training
// and 20 validation rows.
//
// The shuffles come from one seeded generator: the same seed
// and data always give the same k splits.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::error::DataError;

/// Return `k` shuffled (train, validate) splits of `data`.
///
/// Training receives `round(len * fraction)` items of each split.
pub fn cross_validation_partitions<T: Clone>(
    data:     &[T],
    fraction: f64,
    k:        usize,
    seed:     u64,
) -> Result<Vec<(Vec<T>, Vec<T>)>, DataError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(DataError::InvalidFraction(fraction));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let total   = data.len();
    let split_at = (((total as f64) * fraction).round() as usize).min(total);

    let partitions = (0..k)
        .map(|_| {
            let mut shuffled = data.to_vec();
            shuffled.shuffle(&mut rng);
            let validate = shuffled.split_off(split_at);
            (shuffled, validate)
        })
        .collect();

    tracing::debug!(
        "Created {} partitions: {} training, {} validation",
        k,
        split_at,
        total - split_at
    );

    Ok(partitions)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_pairs, tests::resource, ColumnNames};

    #[test]
    fn test_cross_validate() {
        let train  = load_pairs(resource("train.csv"), &ColumnNames::default(), None).unwrap();
        let splits = cross_validation_partitions(&train, 0.8, 3, 0).unwrap();
        assert_eq!(splits.len(), 3);
        for (train, validate) in &splits {
            assert_eq!(train.len(), 80);
            assert_eq!(validate.len(), 20);
        }
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, validate) = cross_validation_partitions(&items, 0.7, 1, 3)
            .unwrap()
            .remove(0);
        let mut all: Vec<usize> = train.into_iter().chain(validate).collect();
        all.sort_unstable();
        assert_eq!(all, items);
    }

    #[test]
    fn test_same_seed_same_partitions() {
        let items: Vec<usize> = (0..40).collect();
        let a = cross_validation_partitions(&items, 0.5, 4, 11).unwrap();
        let b = cross_validation_partitions(&items, 0.5, 4, 11).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_splits_differ_from_each_other() {
        let items: Vec<usize> = (0..40).collect();
        let splits = cross_validation_partitions(&items, 0.5, 2, 5).unwrap();
        assert_ne!(splits[0].0, splits[1].0);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let splits = cross_validation_partitions(&items, 0.8, 2, 0).unwrap();
        assert!(splits.iter().all(|(t, v)| t.is_empty() && v.is_empty()));
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, validate) = cross_validation_partitions(&items, 1.0, 1, 0)
            .unwrap()
            .remove(0);
        assert_eq!(train.len(), 10);
        assert!(validate.is_empty());
    }

    #[test]
    fn test_invalid_fraction() {
        let items: Vec<usize> = (0..10).collect();
        assert_eq!(
            cross_validation_partitions(&items, 1.5, 1, 0),
            Err(DataError::InvalidFraction(1.5))
        );
    }
}
