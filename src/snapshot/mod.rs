//! Immutable statistical views materialized from a reservoir.

pub mod uniform;
pub mod weighted;

use serde::Serialize;

use crate::error::{check_quantile, Result};

pub use uniform::UniformSnapshot;
pub use weighted::{WeightedSample, WeightedSnapshot};

pub(crate) mod sealed {
    /// Unchecked quantile lookup. Only reachable through
    /// [`Snapshot::value`](super::Snapshot::value) and the fixed percentiles.
    pub trait Quantile {
        /// `quantile` has already been checked to lie in `[0, 1]`.
        fn value_at(&self, quantile: f64) -> f64;
    }
}

/// A statistical snapshot of sampled values.
///
/// Implementations sort their values on construction and never change
/// afterwards; every statistic is a pure function of the contents.
///
/// Arbitrary quantiles are only available through the checked
/// [`value`](Snapshot::value):
///
/// ```compile_fail
/// use tagged_metrics::{Snapshot, UniformSnapshot};
///
/// UniformSnapshot::new(vec![1, 2, 3]).value_at(f64::NAN);
/// ```
pub trait Snapshot: sealed::Quantile {
    /// The sampled values, ascending.
    fn values(&self) -> &[u64];

    /// Arithmetic mean of the values, 0 when empty.
    fn mean(&self) -> f64;

    /// Standard deviation of the values, 0 with fewer than two values.
    fn stddev(&self) -> f64;

    fn size(&self) -> usize {
        self.values().len()
    }

    /// Lowest value, 0 when empty.
    fn min(&self) -> u64 {
        self.values().first().copied().unwrap_or(0)
    }

    /// Highest value, 0 when empty.
    fn max(&self) -> u64 {
        self.values().last().copied().unwrap_or(0)
    }

    /// Returns the value at `quantile`, failing when it is outside `[0, 1]`
    /// or NaN.
    fn value(&self, quantile: f64) -> Result<f64> {
        check_quantile(quantile)?;
        Ok(self.value_at(quantile))
    }

    fn median(&self) -> f64 {
        self.value_at(0.5)
    }

    fn p75(&self) -> f64 {
        self.value_at(0.75)
    }

    fn p90(&self) -> f64 {
        self.value_at(0.90)
    }

    fn p95(&self) -> f64 {
        self.value_at(0.95)
    }

    fn p98(&self) -> f64 {
        self.value_at(0.98)
    }

    fn p99(&self) -> f64 {
        self.value_at(0.99)
    }
}

/// A complete percentile breakdown of one snapshot.
/// Feeds the timer fields of the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    pub size: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
}

impl Percentiles {
    /// Extract the full set from any snapshot.
    /// Empty snapshots yield all zeroes.
    pub fn from_snapshot<S: Snapshot + ?Sized>(snapshot: &S) -> Self {
        Self {
            size: snapshot.size(),
            min: snapshot.min(),
            max: snapshot.max(),
            mean: snapshot.mean(),
            stddev: snapshot.stddev(),
            p50: snapshot.median(),
            p75: snapshot.p75(),
            p90: snapshot.p90(),
            p95: snapshot.p95(),
            p98: snapshot.p98(),
            p99: snapshot.p99(),
        }
    }

    /// Is this set backed by at least one value?
    pub fn has_data(&self) -> bool {
        self.size > 0
    }
}
