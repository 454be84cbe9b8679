//! Duration statistics plus throughput.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::accumulator::{Accumulator, UniformReservoir};
use crate::clock::{saturating_nanos, Clock, SystemClock};
use crate::histogram::Histogram;
use crate::meter::Meter;

/// Aggregates durations (in nanoseconds) into a histogram and marks a meter
/// once per recorded duration.
#[derive(Debug)]
pub struct Timer<A = UniformReservoir, C: Clock = SystemClock> {
    clock: C,
    meter: Meter<C>,
    histogram: Histogram<A>,
}

impl<A: Accumulator> Timer<A, SystemClock> {
    pub fn new(accumulator: A) -> Self {
        Self::with_clock(accumulator, SystemClock)
    }
}

impl Default for Timer<UniformReservoir, SystemClock> {
    fn default() -> Self {
        Self::new(UniformReservoir::default())
    }
}

impl<A: Accumulator, C: Clock + Clone> Timer<A, C> {
    pub fn with_clock(accumulator: A, clock: C) -> Self {
        Self {
            meter: Meter::with_clock(clock.clone()),
            clock,
            histogram: Histogram::new(accumulator),
        }
    }
}

impl<A: Accumulator, C: Clock> Timer<A, C> {
    /// Current time according to the timer's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Adds a manually measured duration.
    pub fn update(&self, duration: Duration) {
        self.histogram.update(saturating_nanos(duration));
        self.meter.mark_once();
    }

    /// Times `f`, recording the duration even if it returns an error or
    /// panics. The result is passed through untouched.
    pub fn measure<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _context = self.context();
        f()
    }

    /// Times a future until it resolves.
    ///
    /// A future dropped before completion still records the time it ran.
    pub async fn measure_async<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        let _context = self.context();
        future.await
    }

    /// Starts a measurement that is recorded when the returned context is
    /// released or dropped.
    pub fn context(&self) -> TimerContext<'_, A, C> {
        TimerContext {
            timer: Some(self),
            started: self.now(),
        }
    }

    /// Number of recorded durations.
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }

    pub fn m01rate(&self) -> f64 {
        self.meter.m01rate()
    }

    pub fn m05rate(&self) -> f64 {
        self.meter.m05rate()
    }

    pub fn m15rate(&self) -> f64 {
        self.meter.m15rate()
    }

    /// Duration statistics in nanoseconds.
    pub fn snapshot(&self) -> A::Snapshot {
        self.histogram.snapshot()
    }

    pub fn histogram(&self) -> &Histogram<A> {
        &self.histogram
    }

    pub fn meter(&self) -> &Meter<C> {
        &self.meter
    }
}

/// An in-flight measurement.
///
/// Records the elapsed time exactly once: on [`release`](Self::release) or
/// when dropped. [`discard`](Self::discard) drops it without recording.
/// Moving the context moves the pending measurement with it.
#[must_use = "dropping the context immediately records a near-zero duration"]
#[derive(Debug)]
pub struct TimerContext<'a, A: Accumulator, C: Clock> {
    timer: Option<&'a Timer<A, C>>,
    started: Instant,
}

impl<A: Accumulator, C: Clock> TimerContext<'_, A, C> {
    /// Time since the measurement started.
    pub fn elapsed(&self) -> Duration {
        match self.timer {
            Some(timer) => timer.now().saturating_duration_since(self.started),
            None => Duration::ZERO,
        }
    }

    /// Records the measurement now.
    pub fn release(mut self) {
        self.record();
    }

    /// Abandons the measurement.
    pub fn discard(mut self) {
        self.timer = None;
    }

    fn record(&mut self) {
        if let Some(timer) = self.timer.take() {
            let elapsed = timer.now().saturating_duration_since(self.started);
            timer.update(elapsed);
        }
    }
}

impl<A: Accumulator, C: Clock> Drop for TimerContext<'_, A, C> {
    fn drop(&mut self) {
        self.record();
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::snapshot::Snapshot;

    fn timer() -> (Arc<ManualClock>, Timer<UniformReservoir, Arc<ManualClock>>) {
        let clock = Arc::new(ManualClock::new());
        let timer = Timer::with_clock(UniformReservoir::new(16).unwrap(), clock.clone());
        (clock, timer)
    }

    #[test]
    fn update_records_nanoseconds_and_marks_meter() {
        let (_, timer) = timer();
        timer.update(Duration::from_millis(5));

        assert_eq!(timer.count(), 1);
        assert_eq!(timer.meter().count(), 1);
        assert_eq!(timer.snapshot().values(), &[5_000_000]);
    }

    #[test]
    fn measure_passes_result_through() {
        let (clock, timer) = timer();
        let value = timer.measure(|| {
            clock.advance(Duration::from_millis(3));
            42
        });

        assert_eq!(value, 42);
        assert_eq!(timer.snapshot().values(), &[3_000_000]);
    }

    #[test]
    fn measure_records_on_error() {
        let (clock, timer) = timer();
        let result: Result<(), &str> = timer.measure(|| {
            clock.advance(Duration::from_millis(1));
            Err("boom")
        });

        assert_eq!(result, Err("boom"));
        assert_eq!(timer.count(), 1);
        assert_eq!(timer.snapshot().values(), &[1_000_000]);
    }

    #[test]
    fn measure_records_on_panic() {
        let (_, timer) = timer();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            timer.measure(|| panic!("inner failure"));
        }));

        assert!(outcome.is_err());
        assert_eq!(timer.count(), 1);
    }

    #[test]
    fn context_records_on_drop() {
        let (clock, timer) = timer();
        {
            let _context = timer.context();
            clock.advance(Duration::from_micros(700));
        }

        assert_eq!(timer.snapshot().values(), &[700_000]);
    }

    #[test]
    fn context_release_records_once() {
        let (clock, timer) = timer();
        let context = timer.context();
        clock.advance(Duration::from_millis(2));
        assert_eq!(context.elapsed(), Duration::from_millis(2));
        context.release();

        assert_eq!(timer.count(), 1);
        assert_eq!(timer.snapshot().values(), &[2_000_000]);
    }

    #[test]
    fn discarded_context_records_nothing() {
        let (clock, timer) = timer();
        let context = timer.context();
        clock.advance(Duration::from_millis(2));
        context.discard();

        assert_eq!(timer.count(), 0);
        assert_eq!(timer.meter().count(), 0);
    }

    #[test]
    fn moved_context_records_once() {
        let (clock, timer) = timer();
        let contexts = {
            let context = timer.context();
            clock.advance(Duration::from_millis(4));
            vec![context]
        };
        assert_eq!(timer.count(), 0);

        drop(contexts);
        assert_eq!(timer.count(), 1);
        assert_eq!(timer.snapshot().values(), &[4_000_000]);
    }

    #[test]
    fn rates_delegate_to_meter() {
        let (clock, timer) = timer();
        clock.advance(Duration::from_secs(10));
        for _ in 0..3 {
            timer.update(Duration::from_millis(1));
        }

        assert!((timer.mean_rate() - 0.3).abs() < 1e-9);
        clock.advance(Duration::from_secs(6));
        assert!(timer.m01rate() > 0.0);
        assert!(timer.m05rate() > 0.0);
        assert!(timer.m15rate() > 0.0);
    }

    #[tokio::test]
    async fn measure_async_records_future_duration() {
        let (clock, timer) = timer();
        let value = timer
            .measure_async(async {
                clock.advance(Duration::from_millis(9));
                7
            })
            .await;

        assert_eq!(value, 7);
        assert_eq!(timer.snapshot().values(), &[9_000_000]);
    }
}
