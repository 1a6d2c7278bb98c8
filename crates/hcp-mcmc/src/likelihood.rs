//! Beta(1,1)-Bernoulli marginal likelihood over pair buckets.
//!
//! For a bucket of `p` pairs of which `e` are edges, integrating the unknown
//! connection probability against a uniform prior gives
//! `e! (p - e)! / (p + 1)!`. The sampler works with its logarithm, looked up
//! from a precomputed `ln(n!)` table so that scoring a state costs one table
//! read per counter.

use serde::{Deserialize, Serialize};

/// Table of `ln(n!)` for `n` in `0..len`.
#[derive(Debug, Clone)]
pub struct LogFactorialTable {
    values: Vec<f64>,
}

impl LogFactorialTable {
    /// Builds the table for every argument up to and including `max_arg`.
    pub fn new(max_arg: u64) -> Self {
        assert!(
            max_arg < usize::MAX as u64,
            "log-factorial table size exceeds the address space"
        );
        let len = max_arg as usize + 1;
        let mut values = Vec::with_capacity(len);
        let mut acc = 0.0f64;
        values.push(acc);
        for n in 1..len {
            acc += (n as f64).ln();
            values.push(acc);
        }
        Self { values }
    }

    /// Table sized for a graph with `num_pairs` unordered node pairs.
    pub fn for_pairs(num_pairs: u64) -> Self {
        Self::new(num_pairs + 1)
    }

    /// Largest argument covered by the table.
    pub fn max_arg(&self) -> u64 {
        (self.values.len() - 1) as u64
    }

    /// `ln(n!)`. Panics if `n` lies outside the table.
    #[inline]
    pub fn ln_factorial(&self, n: u64) -> f64 {
        assert!(
            n <= self.max_arg(),
            "log-factorial argument {n} exceeds table bound {}",
            self.max_arg()
        );
        self.values[n as usize]
    }

    /// Marginal log-likelihood of one bucket with `edges` edges among `pairs` pairs.
    #[inline]
    pub fn term(&self, edges: u64, pairs: u64) -> f64 {
        debug_assert!(edges <= pairs, "bucket holds more edges than pairs");
        self.ln_factorial(edges) + self.ln_factorial(pairs - edges) - self.ln_factorial(pairs + 1)
    }

    /// Sum of [`term`](Self::term) over all levels.
    pub fn log_likelihood(&self, edges: &[u64], pairs: &[u64]) -> f64 {
        debug_assert_eq!(edges.len(), pairs.len());
        edges
            .iter()
            .zip(pairs)
            .map(|(&e, &p)| self.term(e, p))
            .sum()
    }
}

/// Per-level breakdown of a log-likelihood evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodBreakdown {
    /// Contribution of each level.
    pub terms: Vec<f64>,
    /// Sum of the terms.
    pub total: f64,
}

impl LikelihoodBreakdown {
    /// Evaluates every level term separately.
    pub fn evaluate(table: &LogFactorialTable, edges: &[u64], pairs: &[u64]) -> Self {
        let terms: Vec<f64> = edges
            .iter()
            .zip(pairs)
            .map(|(&e, &p)| table.term(e, p))
            .collect();
        let total = terms.iter().sum();
        Self { terms, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_direct_sums() {
        let table = LogFactorialTable::new(10);
        assert_eq!(table.ln_factorial(0), 0.0);
        assert_eq!(table.ln_factorial(1), 0.0);
        let direct: f64 = (1..=10).map(|k| (k as f64).ln()).sum();
        assert!((table.ln_factorial(10) - direct).abs() < 1e-12);
    }

    #[test]
    fn empty_and_saturated_buckets() {
        let table = LogFactorialTable::for_pairs(6);
        assert_eq!(table.term(0, 0), 0.0);
        // e! (p - e)! / (p + 1)! with e = p is 1 / (p + 1)
        assert!((table.term(6, 6) + 7f64.ln()).abs() < 1e-12);
        assert!((table.term(0, 6) + 7f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn breakdown_sums_to_total() {
        let table = LogFactorialTable::for_pairs(6);
        let breakdown = LikelihoodBreakdown::evaluate(&table, &[3, 1], &[5, 1]);
        assert_eq!(breakdown.terms.len(), 2);
        assert!((breakdown.total - table.log_likelihood(&[3, 1], &[5, 1])).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "exceeds table bound")]
    fn out_of_range_lookup_panics() {
        LogFactorialTable::new(4).ln_factorial(5);
    }
}
