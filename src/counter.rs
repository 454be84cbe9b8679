use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Integer types a [`Counter`] can hold, paired with their atomic cell.
pub trait CounterValue: Copy + fmt::Debug + Send + Sync + 'static {
    type Cell: Default + fmt::Debug + Send + Sync;

    const ONE: Self;

    fn load(cell: &Self::Cell) -> Self;
    fn store(cell: &Self::Cell, value: Self);
    fn fetch_add(cell: &Self::Cell, delta: Self) -> Self;
    fn fetch_sub(cell: &Self::Cell, delta: Self) -> Self;
}

macro_rules! counter_value {
    ($ty:ty, $cell:ty) => {
        impl CounterValue for $ty {
            type Cell = $cell;

            const ONE: Self = 1;

            fn load(cell: &Self::Cell) -> Self {
                cell.load(Ordering::Relaxed)
            }

            fn store(cell: &Self::Cell, value: Self) {
                cell.store(value, Ordering::Relaxed)
            }

            fn fetch_add(cell: &Self::Cell, delta: Self) -> Self {
                cell.fetch_add(delta, Ordering::Relaxed)
            }

            fn fetch_sub(cell: &Self::Cell, delta: Self) -> Self {
                cell.fetch_sub(delta, Ordering::Relaxed)
            }
        }
    };
}

counter_value!(i64, AtomicI64);
counter_value!(u64, AtomicU64);

/// A counter updated with lock-free atomics, signed by default.
///
/// The mutating methods return the value held before the change. Arithmetic
/// wraps on overflow, so decrementing an unsigned counter at zero yields
/// `u64::MAX`.
#[derive(Debug, Default)]
pub struct Counter<T: CounterValue = i64> {
    value: T::Cell,
}

impl<T: CounterValue> Counter<T> {
    pub fn new() -> Self {
        Self {
            value: T::Cell::default(),
        }
    }

    pub fn get(&self) -> T {
        T::load(&self.value)
    }

    pub fn set(&self, value: T) {
        T::store(&self.value, value);
    }

    pub fn inc(&self) -> T {
        self.add(T::ONE)
    }

    pub fn add(&self, delta: T) -> T {
        T::fetch_add(&self.value, delta)
    }

    pub fn dec(&self) -> T {
        self.sub(T::ONE)
    }

    /// Decreases by `delta`; a positive `delta` results in subtraction.
    pub fn sub(&self, delta: T) -> T {
        T::fetch_sub(&self.value, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(Counter::<i64>::new().get(), 0);
        assert_eq!(Counter::<u64>::new().get(), 0);
    }

    #[test]
    fn unsigned_counts_past_the_signed_range() {
        let counter = Counter::<u64>::new();
        counter.set(i64::MAX as u64);
        assert_eq!(counter.inc(), i64::MAX as u64);
        assert_eq!(counter.get(), i64::MAX as u64 + 1);

        counter.set(u64::MAX - 1);
        counter.inc();
        assert_eq!(counter.get(), u64::MAX);
    }

    #[test]
    fn unsigned_dec_at_zero_wraps() {
        let counter = Counter::<u64>::new();
        assert_eq!(counter.dec(), 0);
        assert_eq!(counter.get(), u64::MAX);
    }

    #[test]
    fn inc_returns_previous() {
        let counter: Counter = Counter::new();
        assert_eq!(counter.inc(), 0);
        assert_eq!(counter.inc(), 1);
        assert_eq!(counter.get(), 2);

        assert_eq!(counter.add(40), 2);
        assert_eq!(counter.get(), 42);
    }

    #[test]
    fn dec_below_zero() {
        let counter: Counter = Counter::new();
        counter.dec();
        assert_eq!(counter.get(), -1);

        assert_eq!(counter.sub(42), -1);
        assert_eq!(counter.get(), -43);
    }

    #[test]
    fn set_overrides() {
        let counter: Counter = Counter::new();
        counter.add(10);
        counter.set(3);
        assert_eq!(counter.get(), 3);
    }
}
