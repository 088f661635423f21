//! Constant-time comparison

use subtle::ConstantTimeEq;

/// Compare two byte strings without leaking the position of the first
/// mismatch.
///
/// Differing lengths return `false` immediately; for hex-encoded SHA-256
/// digests the length is public anyway (64 chars).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_equal() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abcdef", b"abcdef"));
    }

    #[test]
    fn test_not_equal() {
        assert!(!constant_time_eq(b"abcdef", b"abcdeg"));
        assert!(!constant_time_eq(b"abcdef", b"Abcdef"));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"a"));
    }

    /// Median time to compare `expected` against a candidate that first
    /// differs at `pos`.
    fn median_compare_time(expected: &[u8], pos: usize, rounds: usize) -> Duration {
        let mut candidate = expected.to_vec();
        candidate[pos] ^= 0x01;

        let mut samples: Vec<Duration> = (0..rounds)
            .map(|_| {
                let start = Instant::now();
                for _ in 0..64 {
                    std::hint::black_box(constant_time_eq(
                        std::hint::black_box(expected),
                        std::hint::black_box(&candidate),
                    ));
                }
                start.elapsed()
            })
            .collect();
        samples.sort();
        samples[samples.len() / 2]
    }

    /// Early and late mismatches should cost the same. Wall-clock based, so
    /// run explicitly: `cargo test -p sigil-signature -- --ignored`.
    #[test]
    #[ignore]
    fn test_timing_independent_of_mismatch_position() {
        let expected = [b'a'; 64];
        let rounds = 2001;

        // warm up
        median_compare_time(&expected, 0, rounds);

        let early = median_compare_time(&expected, 0, rounds).as_nanos() as f64;
        let late = median_compare_time(&expected, 63, rounds).as_nanos() as f64;

        let ratio = early.max(late) / early.min(late).max(1.0);
        assert!(
            ratio < 1.5,
            "mismatch position changed compare time: early={early}ns late={late}ns"
        );
    }
}
