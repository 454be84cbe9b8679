use parking_lot::Mutex;

use super::Accumulator;
use crate::config::DEFAULT_CAPACITY;
use crate::error::{MetricsError, Result};
use crate::snapshot::UniformSnapshot;

/// Fixed-capacity reservoir keeping the most recent values.
///
/// Insertions overwrite slots round-robin, so the buffer always holds the
/// last `min(count, capacity)` values. Slot order is meaningless; the
/// snapshot sorts anyway.
#[derive(Debug)]
pub struct UniformReservoir {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    values: Vec<u64>,
    count: u64,
}

impl UniformReservoir {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MetricsError::invalid("sample reservoir can't be of zero size"));
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                values: Vec::with_capacity(capacity),
                count: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for UniformReservoir {
    fn default() -> Self {
        Self::build(DEFAULT_CAPACITY)
    }
}

impl Accumulator for UniformReservoir {
    type Snapshot = UniformSnapshot;

    fn update(&self, value: u64) {
        let mut inner = self.inner.lock();

        let slot = (inner.count % self.capacity as u64) as usize;
        if slot < inner.values.len() {
            inner.values[slot] = value;
        } else {
            inner.values.push(value);
        }
        inner.count = inner.count.wrapping_add(1);
    }

    fn snapshot(&self) -> UniformSnapshot {
        let values = self.inner.lock().values.clone();
        UniformSnapshot::new(values)
    }

    fn size(&self) -> usize {
        self.inner.lock().values.len()
    }
}
