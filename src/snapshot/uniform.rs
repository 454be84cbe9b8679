use super::sealed::Quantile;
use super::Snapshot;

/// Snapshot of an unweighted sample.
///
/// Quantiles interpolate linearly between neighbouring order statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformSnapshot {
    values: Vec<u64>,
}

impl UniformSnapshot {
    /// Creates a snapshot from an unordered set of values.
    pub fn new(mut values: Vec<u64>) -> Self {
        values.sort_unstable();
        Self { values }
    }
}

impl Quantile for UniformSnapshot {
    fn value_at(&self, quantile: f64) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }

        let pos = quantile * (n + 1) as f64;
        let id = pos.floor() as usize;

        if id < 1 {
            return self.values[0] as f64;
        }
        if id >= n {
            return self.values[n - 1] as f64;
        }

        let lower = self.values[id - 1] as f64;
        let upper = self.values[id] as f64;

        lower + pos.fract() * (upper - lower)
    }
}

impl Snapshot for UniformSnapshot {
    fn values(&self) -> &[u64] {
        &self.values
    }

    fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|&v| v as f64).sum();
        sum / self.values.len() as f64
    }

    fn stddev(&self) -> f64 {
        let n = self.values.len();
        if n <= 1 {
            return 0.0;
        }

        let mean = self.mean();
        let sum: f64 = self
            .values
            .iter()
            .map(|&v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum();

        (sum / (n - 1) as f64).sqrt()
    }
}
