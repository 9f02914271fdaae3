//! Difficulty-bucketed question selection.
//!
//! A quiz attempt draws a configured number of questions from the quiz pool,
//! aiming for an even split across the three difficulty levels. A bucket that
//! is smaller than its quota simply contributes what it has; the shortfall is
//! absorbed rather than rebalanced, so the result can be shorter than asked.

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

const BUCKETS: i64 = 3;

/// Select up to `target` items from `pool`, split as evenly as possible across
/// difficulty levels 1-3 (the remainder goes to the easiest buckets first),
/// then shuffled into presentation order.
///
/// `difficulty` maps an item to its 1-3 tag; out-of-range tags are clamped
/// into the nearest bucket.
pub fn select_by_difficulty<T, F, R>(pool: Vec<T>, target: usize, difficulty: F, rng: &mut R) -> Vec<T>
where
    F: Fn(&T) -> i64,
    R: Rng + ?Sized,
{
    // The pool can never yield more than it holds, however large the ask.
    let capacity = target.min(pool.len());
    let mut buckets = pool
        .into_iter()
        .into_group_map_by(|item| difficulty(item).clamp(1, BUCKETS));

    let base = target / BUCKETS as usize;
    let remainder = target % BUCKETS as usize;

    let mut selected = Vec::with_capacity(capacity);
    for tag in 1..=BUCKETS {
        let quota = base + usize::from((tag as usize - 1) < remainder);
        let mut bucket = buckets.remove(&tag).unwrap_or_default();
        bucket.shuffle(rng);
        bucket.truncate(quota);
        selected.append(&mut bucket);
    }

    selected.shuffle(rng);
    selected
}

/// Uniform random permutation, used for answer options as well.
pub fn shuffled<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Q {
        id: usize,
        difficulty: i64,
    }

    fn pool(per_bucket: usize) -> Vec<Q> {
        let mut out = Vec::new();
        for d in 1..=3 {
            for i in 0..per_bucket {
                out.push(Q {
                    id: d as usize * 100 + i,
                    difficulty: d,
                });
            }
        }
        out
    }

    fn counts_by_difficulty(qs: &[Q]) -> BTreeMap<i64, usize> {
        let mut m = BTreeMap::new();
        for q in qs {
            *m.entry(q.difficulty).or_insert(0) += 1;
        }
        m
    }

    #[test]
    fn even_split_when_buckets_are_ample() {
        let mut rng = StdRng::seed_from_u64(7);
        let selected = select_by_difficulty(pool(10), 12, |q| q.difficulty, &mut rng);
        assert_eq!(selected.len(), 12);
        assert_eq!(
            counts_by_difficulty(&selected),
            BTreeMap::from([(1, 4), (2, 4), (3, 4)])
        );
    }

    #[test]
    fn remainder_goes_to_early_buckets() {
        let mut rng = StdRng::seed_from_u64(7);
        let selected = select_by_difficulty(pool(10), 11, |q| q.difficulty, &mut rng);
        assert_eq!(selected.len(), 11);
        assert_eq!(
            counts_by_difficulty(&selected),
            BTreeMap::from([(1, 4), (2, 4), (3, 3)])
        );
    }

    #[test]
    fn short_bucket_is_silently_absorbed() {
        let mut p = pool(4);
        p.retain(|q| q.difficulty != 3 || q.id == 300);
        let mut rng = StdRng::seed_from_u64(7);
        let selected = select_by_difficulty(p, 12, |q| q.difficulty, &mut rng);
        // 4 + 4 + 1: no rebalancing toward the fuller buckets.
        assert_eq!(selected.len(), 9);
        assert_eq!(
            counts_by_difficulty(&selected),
            BTreeMap::from([(1, 4), (2, 4), (3, 1)])
        );
    }

    #[test]
    fn result_is_a_permutation_of_a_pool_subset() {
        let source = pool(5);
        let mut rng = StdRng::seed_from_u64(42);
        let mut selected = select_by_difficulty(source.clone(), 9, |q| q.difficulty, &mut rng);
        selected.sort();
        selected.dedup();
        assert_eq!(selected.len(), 9);
        assert!(selected.iter().all(|q| source.contains(q)));
    }

    #[test]
    fn oversized_target_returns_the_whole_pool() {
        let mut rng = StdRng::seed_from_u64(9);
        let selected = select_by_difficulty(pool(4), usize::MAX, |q| q.difficulty, &mut rng);
        assert_eq!(selected.len(), 12);
    }

    #[test]
    fn empty_pool_yields_empty_selection() {
        let mut rng = StdRng::seed_from_u64(1);
        let selected = select_by_difficulty(Vec::<Q>::new(), 12, |q| q.difficulty, &mut rng);
        assert!(selected.is_empty());
    }

    #[test]
    fn shuffled_preserves_the_multiset() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut out = shuffled(vec![3, 1, 2, 2, 5], &mut rng);
        out.sort_unstable();
        assert_eq!(out, vec![1, 2, 2, 3, 5]);
    }
}
