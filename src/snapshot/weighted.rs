use serde::Serialize;

use super::sealed::Quantile;
use super::Snapshot;
use crate::error::{MetricsError, Result};

/// One value retained by a weighted reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedSample {
    pub value: u64,
    pub weight: f64,
}

impl WeightedSample {
    pub fn new(value: u64, weight: f64) -> Self {
        Self { value, weight }
    }
}

impl From<(u64, f64)> for WeightedSample {
    fn from((value, weight): (u64, f64)) -> Self {
        Self { value, weight }
    }
}

/// Snapshot of a weighted sample.
///
/// Weights are normalized to sum to one, and `quantiles[i]` holds the
/// cumulative weight of `values[..=i]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightedSnapshot {
    values: Vec<u64>,
    weights: Vec<f64>,
    quantiles: Vec<f64>,
}

impl WeightedSnapshot {
    /// Creates a snapshot from an unordered set of samples.
    ///
    /// A set whose weights sum to zero (or overflow) carries no usable
    /// distribution and produces an empty snapshot.
    pub fn new(mut samples: Vec<WeightedSample>) -> Self {
        samples.sort_by_key(|s| s.value);

        let sum: f64 = samples.iter().map(|s| s.weight).sum();
        if sum <= 0.0 || !sum.is_finite() {
            return Self::default();
        }

        let mut values = Vec::with_capacity(samples.len());
        let mut weights = Vec::with_capacity(samples.len());
        let mut quantiles = Vec::with_capacity(samples.len());

        let mut cumulative = 0.0;
        for sample in &samples {
            let weight = sample.weight / sum;
            cumulative += weight;

            values.push(sample.value);
            weights.push(weight);
            quantiles.push(cumulative);
        }

        Self {
            values,
            weights,
            quantiles,
        }
    }

    /// Normalized weights, aligned with [`Snapshot::values`].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Inverse of [`Snapshot::value`]: the weighted proportion of samples at
    /// or below `value`, in `[0, 1]`.
    ///
    /// Values below the smallest sample report half of its weight, since
    /// their position inside that first interval is unknown.
    pub fn phi(&self, value: f64) -> Result<f64> {
        if value.is_nan() {
            return Err(MetricsError::invalid("phi of NaN is undefined"));
        }
        if self.values.is_empty() {
            return Ok(0.0);
        }

        let idx = self.values.partition_point(|&v| v as f64 <= value);

        if idx == self.values.len() {
            return Ok(1.0);
        }
        if idx == 0 {
            return Ok(self.quantiles[0] / 2.0);
        }

        let lower = self.values[idx - 1] as f64;
        let upper = self.values[idx] as f64;
        let q_lower = self.quantiles[idx - 1];
        let q_upper = self.quantiles[idx];

        let position = (value - lower) / (upper - lower);
        Ok(q_lower + position * (q_upper - q_lower))
    }
}

impl Quantile for WeightedSnapshot {
    fn value_at(&self, quantile: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        // First cumulative weight strictly above the quantile.
        let idx = self.quantiles.partition_point(|&q| q <= quantile);

        match self.values.get(idx) {
            Some(&v) => v as f64,
            None => self.max() as f64,
        }
    }
}

impl Snapshot for WeightedSnapshot {
    fn values(&self) -> &[u64] {
        &self.values
    }

    fn mean(&self) -> f64 {
        self.values
            .iter()
            .zip(&self.weights)
            .map(|(&v, &w)| v as f64 * w)
            .sum()
    }

    fn stddev(&self) -> f64 {
        if self.values.len() <= 1 {
            return 0.0;
        }

        let mean = self.mean();
        let variance: f64 = self
            .values
            .iter()
            .zip(&self.weights)
            .map(|(&v, &w)| {
                let diff = v as f64 - mean;
                w * diff * diff
            })
            .sum();

        variance.sqrt()
    }
}
