//! # Weighted Selection
//!
//! Generic weighted choice over a fixed-order list of outcomes. Weights do
//! not need to be normalized. Iteration order is the insertion order, so a
//! given PRNG state always maps to the same outcome.

use crate::error::{EconomyError, EconomyResult};
use crate::rng::SeededPrng;

/// A weighted table of outcomes.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedSelector<T> {
    entries: Vec<(T, f64)>,
    total_weight: f64,
}

impl<T> WeightedSelector<T> {
    /// Builds a selector from `(outcome, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] if any weight is negative or
    /// non-finite, or if every weight is zero.
    pub fn new(entries: impl IntoIterator<Item = (T, f64)>) -> EconomyResult<Self> {
        let entries: Vec<(T, f64)> = entries.into_iter().collect();

        if let Some((_, w)) = entries.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(EconomyError::InvalidConfig(format!(
                "weight {w} must be finite and non-negative"
            )));
        }

        let total_weight: f64 = entries.iter().map(|(_, w)| w).sum();
        if total_weight <= 0.0 {
            return Err(EconomyError::InvalidConfig(
                "weighted table has no positive weight".to_string(),
            ));
        }

        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// Sum of all weights.
    #[inline]
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// The `(outcome, weight)` pairs in selection order.
    #[must_use]
    pub fn entries(&self) -> &[(T, f64)] {
        &self.entries
    }

    /// Draws one outcome.
    ///
    /// `r = prng.next() * total`; the first entry whose cumulative weight is
    /// `>= r` wins. Zero-weight entries are skipped so they can never be
    /// returned, even when `r == 0`.
    pub fn select(&self, prng: &mut SeededPrng) -> &T {
        let r = prng.next() * self.total_weight;
        let mut cumulative = 0.0;
        let mut last_positive = None;

        for (outcome, weight) in &self.entries {
            if *weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_positive = Some(outcome);
            if cumulative >= r {
                return outcome;
            }
        }

        // Floating-point rounding left r above the final cumulative sum.
        match last_positive {
            Some(outcome) => outcome,
            None => unreachable!("constructor guarantees a positive weight"),
        }
    }
}

impl<T: PartialEq> WeightedSelector<T> {
    /// Long-run probability of an outcome (`weight / total`).
    #[must_use]
    pub fn probability(&self, outcome: &T) -> f64 {
        self.entries
            .iter()
            .filter(|(o, _)| o == outcome)
            .map(|(_, w)| w / self.total_weight)
            .sum()
    }
}

impl<T: Clone> WeightedSelector<T> {
    /// Draws one outcome and returns an owned copy.
    pub fn select_cloned(&self, prng: &mut SeededPrng) -> T {
        self.select(prng).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_rejects_bad_weights() {
        assert!(WeightedSelector::new(vec![("a", -1.0)]).is_err());
        assert!(WeightedSelector::new(vec![("a", f64::NAN)]).is_err());
        assert!(WeightedSelector::new(vec![("a", 0.0), ("b", 0.0)]).is_err());
        assert!(WeightedSelector::<&str>::new(Vec::new()).is_err());
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let selector = WeightedSelector::new(vec![("zero", 0.0), ("one", 1.0), ("tail", 0.0)]).unwrap();
        let mut prng = SeededPrng::new(11);
        for _ in 0..10_000 {
            assert_eq!(*selector.select(&mut prng), "one");
        }
    }

    #[test]
    fn test_frequencies_match_weights() {
        let selector = WeightedSelector::new(vec![("a", 1.0), ("b", 3.0), ("c", 6.0)]).unwrap();
        let mut prng = SeededPrng::new(123);
        let mut counts: HashMap<&str, u32> = HashMap::new();
        let n = 100_000;
        for _ in 0..n {
            *counts.entry(*selector.select(&mut prng)).or_insert(0) += 1;
        }

        for (outcome, expected) in [("a", 0.1), ("b", 0.3), ("c", 0.6)] {
            let observed = f64::from(counts[outcome]) / f64::from(n);
            assert!(
                (observed - expected).abs() < 0.01,
                "{outcome}: observed {observed:.4}, expected {expected}"
            );
            assert!((selector.probability(&outcome) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unnormalized_weights() {
        let selector = WeightedSelector::new(vec![(1u8, 250.0), (2u8, 750.0)]).unwrap();
        assert!((selector.total_weight() - 1000.0).abs() < f64::EPSILON);
        assert!((selector.probability(&2) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_choices() {
        let selector = WeightedSelector::new(vec![("x", 1.0), ("y", 1.0), ("z", 1.0)]).unwrap();
        let mut a = SeededPrng::new(5);
        let mut b = SeededPrng::new(5);
        let left: Vec<&str> = (0..50).map(|_| *selector.select(&mut a)).collect();
        let right: Vec<&str> = (0..50).map(|_| *selector.select(&mut b)).collect();
        assert_eq!(left, right);
    }
}
