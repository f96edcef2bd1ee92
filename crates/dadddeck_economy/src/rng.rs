//! # Seeded PRNG
//!
//! Mulberry32: a 32-bit state advanced by a Weyl increment and finished
//! with an integer mixing function. Not cryptographic. Its job is fairness
//! under test: the same seed always replays the same packs.
//!
//! ## Modes
//!
//! - **Seeded** ([`SeededPrng::new`], [`SeededPrng::from_str_seed`]) - tests, replays
//! - **Wall clock** ([`SeededPrng::from_wall_clock`]) - production
//!
//! Every instance owns its state. There is no global generator.

use rand::{Error as RandError, RngCore, SeedableRng};

/// Weyl sequence increment used by Mulberry32.
const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;

/// Scale factor mapping a `u32` to `[0, 1)`.
const U32_RANGE: f64 = 4_294_967_296.0;

/// DJB2 starting value.
const DJB2_OFFSET: u32 = 5381;

/// Deterministic pseudo-random generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededPrng {
    state: u32,
    seed: u32,
}

impl SeededPrng {
    /// Creates a generator from a 32-bit seed.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed, seed }
    }

    /// Creates a generator from a string seed hashed with DJB2.
    #[must_use]
    pub fn from_str_seed(seed: &str) -> Self {
        Self::new(djb2(seed))
    }

    /// Creates a generator seeded from the current wall-clock milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_wall_clock() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        // Fold the high word in so consecutive days differ in more than the low bits.
        let folded = (millis as u64 ^ ((millis as u64) >> 32)) as u32;
        Self::new(folded)
    }

    /// The seed this generator started from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Current internal state, for replay diagnostics.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> u32 {
        self.state
    }

    /// Advances the state and returns the next raw 32-bit output.
    #[inline]
    pub fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform double in `[0, 1)`.
    #[inline]
    pub fn next(&mut self) -> f64 {
        f64::from(self.next_raw()) / U32_RANGE
    }

    /// Uniform integer in `[min, max]` (inclusive). Returns `min` when `max <= min`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let gap = max.abs_diff(min);
        let span = gap as f64 + 1.0;
        let offset = ((self.next() * span).floor() as u64).min(gap);
        min.wrapping_add_unsigned(offset)
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() on an empty range");
        let idx = (self.next() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Picks a uniformly random element. `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.index(items.len());
        items.get(idx)
    }

    /// Bernoulli trial: `true` with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f64) -> bool {
        self.next() < p.clamp(0.0, 1.0)
    }

    /// Normally distributed sample via the Box-Muller transform.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - next() is in (0, 1], keeping ln() finite.
        let u1 = 1.0 - self.next();
        let u2 = self.next();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + z * std_dev
    }
}

impl Default for SeededPrng {
    fn default() -> Self {
        Self::from_wall_clock()
    }
}

impl RngCore for SeededPrng {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_raw());
        let low = u64::from(self.next_raw());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SeededPrng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// DJB2 string hash (`h = h * 33 + byte`), wrapping in 32 bits.
#[must_use]
pub fn djb2(input: &str) -> u32 {
    input
        .bytes()
        .fold(DJB2_OFFSET, |h, b| h.wrapping_mul(33).wrapping_add(u32::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededPrng::new(42);
        let mut b = SeededPrng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_raw(), b.next_raw());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SeededPrng::new(1);
        let mut b = SeededPrng::new(2);
        let same = (0..100).filter(|_| a.next_raw() == b.next_raw()).count();
        assert!(same < 5, "sequences should differ, {same}/100 matched");
    }

    #[test]
    fn test_known_mulberry32_output() {
        // Reference values from the canonical JavaScript implementation, seed 0.
        let mut prng = SeededPrng::new(0);
        assert_eq!(prng.next_raw(), 1_144_304_738);
        assert_eq!(prng.next_raw(), 1_416_247);
    }

    #[test]
    fn test_next_in_unit_interval() {
        let mut prng = SeededPrng::new(7);
        for _ in 0..100_000 {
            let x = prng.next();
            assert!((0.0..1.0).contains(&x), "{x} out of [0, 1)");
        }
    }

    #[test]
    fn test_range_inclusive_bounds() {
        let mut prng = SeededPrng::new(99);
        let mut seen = [false; 6];
        for _ in 0..10_000 {
            let v = prng.range(1, 6);
            assert!((1..=6).contains(&v));
            seen[(v - 1) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "every face should appear: {seen:?}");
        assert_eq!(prng.range(5, 5), 5);
        assert_eq!(prng.range(9, 3), 9);
    }

    #[test]
    fn test_range_full_i64_span() {
        let mut prng = SeededPrng::new(7);
        let draws: Vec<i64> = (0..1_000).map(|_| prng.range(i64::MIN, i64::MAX)).collect();
        assert!(draws.iter().any(|&v| v < 0) && draws.iter().any(|&v| v > 0));
        for _ in 0..1_000 {
            let v = prng.range(i64::MAX - 2, i64::MAX);
            assert!(v >= i64::MAX - 2);
        }
        for _ in 0..1_000 {
            let v = prng.range(i64::MIN, i64::MIN + 1);
            assert!(v <= i64::MIN + 1);
        }
    }

    #[test]
    fn test_pick_empty_and_nonempty() {
        let mut prng = SeededPrng::new(3);
        let empty: [u8; 0] = [];
        assert!(prng.pick(&empty).is_none());
        let items = ["a", "b", "c"];
        for _ in 0..100 {
            assert!(items.contains(prng.pick(&items).unwrap()));
        }
    }

    #[test]
    fn test_normal_distribution_moments() {
        let mut prng = SeededPrng::new(2024);
        let n = 50_000;
        let samples: Vec<f64> = (0..n).map(|_| prng.normal(10.0, 2.0)).collect();
        let mean = samples.iter().sum::<f64>() / f64::from(n);
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / f64::from(n);
        assert!((mean - 10.0).abs() < 0.05, "mean {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.05, "std dev {}", var.sqrt());
    }

    #[test]
    fn test_string_seed_uses_djb2() {
        assert_eq!(djb2(""), 5381);
        assert_eq!(djb2("a"), 5381 * 33 + 97);
        let mut a = SeededPrng::from_str_seed("dad-joke");
        let mut b = SeededPrng::new(djb2("dad-joke"));
        assert_eq!(a.next_raw(), b.next_raw());
    }

    #[test]
    fn test_rng_core_fill_bytes_is_deterministic() {
        let mut a = SeededPrng::from_seed(42u32.to_le_bytes());
        let mut b = SeededPrng::new(42);
        let mut buf_a = [0u8; 10];
        let mut buf_b = [0u8; 10];
        a.fill_bytes(&mut buf_a);
        b.fill_bytes(&mut buf_b);
        assert_eq!(buf_a, buf_b);
        assert_ne!(buf_a, [0u8; 10]);
    }
}
