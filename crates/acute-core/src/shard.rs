//! Shard-range partitioning arithmetic.
//!
//! Splits a serialized snapshot of `total_len` bytes into `shard_count`
//! contiguous, non-overlapping, half-open ranges — one per shard leader —
//! with the remainder distributed to the first `total_len % shard_count`
//! shards so every range differs in size by at most one byte.

use std::ops::Range;

/// The byte range shard `shard_rank` of `shard_count` owns within a buffer
/// of `total_len` bytes.
///
/// # Panics
///
/// Panics if `shard_count` is zero or `shard_rank >= shard_count` — both
/// are programmer errors (role election guarantees `shard_rank` is always
/// in range before this is ever called).
#[must_use]
pub fn shard_range(total_len: usize, shard_rank: usize, shard_count: usize) -> Range<usize> {
    assert!(shard_count > 0, "shard_count must be positive");
    assert!(
        shard_rank < shard_count,
        "shard_rank {shard_rank} out of range for shard_count {shard_count}"
    );

    let quotient = total_len / shard_count;
    let remainder = total_len % shard_count;

    let (lo, hi) = if shard_rank < remainder {
        (shard_rank * (quotient + 1), (shard_rank + 1) * (quotient + 1))
    } else {
        (
            shard_rank * quotient + remainder,
            (shard_rank + 1) * quotient + remainder,
        )
    };
    lo..hi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_tile_the_whole_buffer_with_no_gaps_or_overlap() {
        for total_len in [0usize, 1, 7, 100, 257] {
            for shard_count in 1..=8usize {
                let mut expected_next = 0;
                for rank in 0..shard_count {
                    let range = shard_range(total_len, rank, shard_count);
                    assert_eq!(range.start, expected_next);
                    expected_next = range.end;
                }
                assert_eq!(expected_next, total_len);
            }
        }
    }

    #[test]
    fn every_shard_differs_by_at_most_one_byte() {
        let total_len = 103;
        let shard_count = 7;
        let sizes: Vec<usize> = (0..shard_count)
            .map(|r| shard_range(total_len, r, shard_count).len())
            .collect();
        let (min, max) = (
            *sizes.iter().min().unwrap(),
            *sizes.iter().max().unwrap(),
        );
        assert!(max - min <= 1);
    }

    #[test]
    fn single_shard_owns_everything() {
        assert_eq!(shard_range(42, 0, 1), 0..42);
    }

    #[test]
    #[should_panic(expected = "shard_count must be positive")]
    fn zero_shard_count_panics() {
        shard_range(10, 0, 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_shard_rank_panics() {
        shard_range(10, 3, 3);
    }
}
