use std::sync::atomic::{AtomicU64, Ordering};

use crate::accumulator::{Accumulator, UniformReservoir};

/// Distribution of values backed by any [`Accumulator`].
///
/// `count` is the total number of updates, while the reservoir only holds
/// up to its capacity.
#[derive(Debug, Default)]
pub struct Histogram<A = UniformReservoir> {
    count: AtomicU64,
    accumulator: A,
}

impl<A: Accumulator> Histogram<A> {
    pub fn new(accumulator: A) -> Self {
        Self {
            count: AtomicU64::new(0),
            accumulator,
        }
    }

    pub fn update(&self, value: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.accumulator.update(value);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn size(&self) -> usize {
        self.accumulator.size()
    }

    pub fn snapshot(&self) -> A::Snapshot {
        self.accumulator.snapshot()
    }

    pub fn accumulator(&self) -> &A {
        &self.accumulator
    }
}
