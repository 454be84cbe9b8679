//! Bounded sample stores feeding histograms and timers.

pub mod decaying;
pub mod uniform;

use crate::snapshot::Snapshot;

pub use decaying::DecayingReservoir;
pub use uniform::UniformReservoir;

/// A bounded reservoir of observed values.
///
/// `update` is called on the hot path from any thread and never fails;
/// values evicted under capacity pressure are simply lost.
pub trait Accumulator: Send + Sync {
    type Snapshot: Snapshot;

    /// Records a value.
    fn update(&self, value: u64);

    /// Materializes the currently held values.
    fn snapshot(&self) -> Self::Snapshot;

    /// Number of values currently held, never above the capacity.
    fn size(&self) -> usize;
}
