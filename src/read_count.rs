use rand::Rng;
use std::ops::RangeInclusive;

/// Multiplicative spread applied to coverage-derived read counts, mimicking
/// sequencing-depth differences between replicates.
pub const DEPTH_JITTER: RangeInclusive<f64> = 0.8..=1.2;

/// Reads needed to cover `total_utr_length` bases `coverage` times.
pub fn base_read_count(total_utr_length: u64, read_length: u32, coverage: u32) -> u64 {
    if read_length == 0 {
        return 0;
    }
    // Real-valued division, floored once at the end: 149 bp at 50 bp and 20x gives 59,
    // not the 40 a truncating `len / rl` would give.
    (total_utr_length as f64 / read_length as f64 * coverage as f64).floor() as u64
}

/// Target read count for one sample: `explicit` when positive, otherwise the
/// coverage-derived count scaled by a draw from [`DEPTH_JITTER`].
pub fn target_read_count(
    total_utr_length: u64,
    read_length: u32,
    coverage: u32,
    explicit: u64,
    rng: &mut impl Rng,
) -> u64 {
    if explicit > 0 {
        return explicit;
    }
    let base = base_read_count(total_utr_length, read_length, coverage);
    let jitter = rng.gen_range(DEPTH_JITTER);
    (base as f64 * jitter).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::seeded_rng;

    #[test]
    fn coverage_count_matches_formula() {
        assert_eq!(base_read_count(100_000, 50, 20), 40_000);
        assert_eq!(base_read_count(99, 50, 1), 1);
        assert_eq!(base_read_count(149, 50, 20), 59);
    }

    #[test]
    fn jittered_count_stays_within_twenty_percent() {
        let mut rng = seeded_rng(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1_000 {
            let n = target_read_count(100_000, 50, 20, 0, &mut rng);
            assert!((32_000..=48_000).contains(&n), "count {n} outside ±20%");
            seen.insert(n);
        }
        assert!(seen.len() > 100, "jitter should vary the count");
    }

    #[test]
    fn explicit_count_is_used_verbatim() {
        let mut rng = seeded_rng(1);
        assert_eq!(target_read_count(100_000, 50, 20, 500, &mut rng), 500);
        assert_eq!(target_read_count(0, 50, 20, 500, &mut rng), 500);
    }

    #[test]
    fn empty_annotation_yields_no_reads() {
        let mut rng = seeded_rng(1);
        assert_eq!(target_read_count(0, 50, 20, 0, &mut rng), 0);
    }
}
