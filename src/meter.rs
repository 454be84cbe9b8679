use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::clock::{saturating_nanos, Clock, SystemClock};
use crate::ewma::{Ewma, TICK_INTERVAL};

const TICK_NANOS: u64 = TICK_INTERVAL.as_nanos() as u64;

/// Measures the rate at which a set of events occur.
///
/// Keeps a total count, the mean rate since creation and 1/5/15 minute
/// moving averages. The averages are ticked lazily: every `mark` and rate
/// query first catches up on the 5 second ticks missed since the last one.
#[derive(Debug)]
pub struct Meter<C: Clock = SystemClock> {
    clock: C,
    birth: Instant,
    count: AtomicU64,
    // Nanoseconds since `birth`, always a multiple of the tick interval.
    last_tick: AtomicU64,
    rates: [Ewma; 3],
}

impl Meter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Meter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Meter<C> {
    pub fn with_clock(clock: C) -> Self {
        let birth = clock.now();
        Self {
            clock,
            birth,
            count: AtomicU64::new(0),
            last_tick: AtomicU64::new(0),
            rates: [Ewma::m01(), Ewma::m05(), Ewma::m15()],
        }
    }

    /// Marks the occurrence of one event.
    pub fn mark_once(&self) {
        self.mark(1);
    }

    /// Marks the occurrence of `n` events.
    pub fn mark(&self, n: u64) {
        self.tick_if_necessary();

        self.count.fetch_add(n, Ordering::Relaxed);
        for rate in &self.rates {
            rate.update(n);
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Mean rate per second since the meter was created.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }

        let elapsed = self.clock.now().saturating_duration_since(self.birth).as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }

        count as f64 / elapsed
    }

    /// One minute moving average rate per second.
    pub fn m01rate(&self) -> f64 {
        self.rate_of(0)
    }

    /// Five minute moving average rate per second.
    pub fn m05rate(&self) -> f64 {
        self.rate_of(1)
    }

    /// Fifteen minute moving average rate per second.
    pub fn m15rate(&self) -> f64 {
        self.rate_of(2)
    }

    fn rate_of(&self, idx: usize) -> f64 {
        self.tick_if_necessary();
        self.rates[idx].rate_per_second()
    }

    fn tick_if_necessary(&self) {
        let old = self.last_tick.load(Ordering::Acquire);
        let now = saturating_nanos(self.clock.now().saturating_duration_since(self.birth));
        let age = now.saturating_sub(old);
        if age <= TICK_NANOS {
            return;
        }

        // Advance in whole ticks so boundaries stay aligned to creation.
        let ticks = age / TICK_NANOS;
        let new_tick = old + ticks * TICK_NANOS;
        if self
            .last_tick
            .compare_exchange(old, new_tick, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            for _ in 0..ticks {
                for rate in &self.rates {
                    rate.tick();
                }
            }
        }
    }
}
