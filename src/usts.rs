//! Moving average over an unequally spaced time series.
//!
//! Each observation decays the previous average by `exp(-delta / tau)`, where
//! `delta` is the time since the previous observation. Unlike [`Ewma`], there
//! is no fixed tick: points may arrive at any time.
//!
//! [`Ewma`]: crate::ewma::Ewma

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::clock::{saturating_nanos, Clock, SystemClock};
use crate::error::{MetricsError, Result};

/// Number of windows after which the first observation no longer dominates.
const WARMUP_WINDOWS: f64 = 35.0;

#[derive(Debug)]
pub struct UnevenEwma<C: Clock = SystemClock> {
    clock: C,
    /// Window in nanoseconds.
    tau: f64,
    state: Mutex<Option<State>>,
}

#[derive(Debug, Clone, Copy)]
struct State {
    birth: Instant,
    prev: Instant,
    average: f64,
}

impl UnevenEwma<SystemClock> {
    pub fn new(window: Duration) -> Result<Self> {
        Self::with_clock(window, SystemClock)
    }
}

impl<C: Clock> UnevenEwma<C> {
    pub fn with_clock(window: Duration, clock: C) -> Result<Self> {
        if window.is_zero() {
            return Err(MetricsError::invalid("window can not be zero"));
        }

        Ok(Self {
            clock,
            tau: saturating_nanos(window) as f64,
            state: Mutex::new(None),
        })
    }

    /// Adds an observation stamped with the current time.
    ///
    /// The clock is read under the lock, so concurrent callers are applied in
    /// time order.
    pub fn add(&self, value: f64) {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let time = state.map_or(now, |s| now.max(s.prev));
        self.apply(&mut state, time, value);
    }

    /// Adds an observation at `time`, which must not precede the previous one.
    pub fn add_at(&self, time: Instant, value: f64) -> Result<()> {
        let mut state = self.state.lock();
        if state.is_some_and(|s| time < s.prev) {
            return Err(MetricsError::invalid(
                "time argument must monotonically increase",
            ));
        }
        self.apply(&mut state, time, value);
        Ok(())
    }

    fn apply(&self, state: &mut Option<State>, time: Instant, value: f64) {
        match state {
            None => {
                *state = Some(State {
                    birth: time,
                    prev: time,
                    average: value,
                });
            }
            Some(s) => {
                let delta = saturating_nanos(time.saturating_duration_since(s.prev)) as f64;
                let mu = (-delta / self.tau).exp();
                s.average = mu * s.average + (1.0 - mu) * value;
                s.prev = time;
            }
        }
    }

    /// The current average, 0 before the first observation.
    pub fn get(&self) -> f64 {
        self.state.lock().map_or(0.0, |s| s.average)
    }

    /// Whether enough time has been observed for the seed value to have
    /// decayed away.
    pub fn warmed_up(&self) -> bool {
        self.state.lock().is_some_and(|s| {
            saturating_nanos(s.prev - s.birth) as f64 >= WARMUP_WINDOWS * self.tau
        })
    }

    pub fn window(&self) -> Duration {
        Duration::from_nanos(self.tau as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::clock::ManualClock;

    const EPS: f64 = 1e-9;

    #[test]
    fn zero_window_is_rejected() {
        assert!(matches!(
            UnevenEwma::new(Duration::ZERO),
            Err(MetricsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn first_point_seeds_average() {
        let ewma = UnevenEwma::new(Duration::from_secs(1)).unwrap();
        assert_eq!(ewma.get(), 0.0);

        ewma.add(42.0);
        assert_eq!(ewma.get(), 42.0);
    }

    #[test]
    fn decays_by_elapsed_windows() {
        let start = Instant::now();
        let ewma = UnevenEwma::new(Duration::from_secs(1)).unwrap();

        ewma.add_at(start, 1.0).unwrap();
        ewma.add_at(start + Duration::from_secs(1), 3.0).unwrap();

        let mu = (-1.0f64).exp();
        assert!((ewma.get() - (mu + (1.0 - mu) * 3.0)).abs() < EPS);

        // Same time point: nothing decays.
        let before = ewma.get();
        ewma.add_at(start + Duration::from_secs(1), 100.0).unwrap();
        assert!((ewma.get() - before).abs() < EPS);
    }

    #[test]
    fn long_gap_forgets_history() {
        let start = Instant::now();
        let ewma = UnevenEwma::new(Duration::from_millis(100)).unwrap();

        ewma.add_at(start, 1000.0).unwrap();
        ewma.add_at(start + Duration::from_secs(100), 6.0).unwrap();
        assert!((ewma.get() - 6.0).abs() < EPS);
    }

    #[test]
    fn constant_series_stays_constant() {
        let start = Instant::now();
        let ewma = UnevenEwma::new(Duration::from_secs(1)).unwrap();

        for ms in [0, 100, 250, 1000, 1100, 7000, 7001] {
            ewma.add_at(start + Duration::from_millis(ms), 5.0).unwrap();
        }
        assert!((ewma.get() - 5.0).abs() < EPS);
    }

    #[test]
    fn going_back_in_time_is_rejected() {
        let start = Instant::now() + Duration::from_secs(10);
        let ewma = UnevenEwma::new(Duration::from_secs(1)).unwrap();

        ewma.add_at(start, 2.0).unwrap();
        let err = ewma.add_at(start - Duration::from_millis(1), 8.0);
        assert!(matches!(err, Err(MetricsError::InvalidArgument(_))));
        assert_eq!(ewma.get(), 2.0);
    }

    #[test]
    fn warms_up_after_35_windows() {
        let clock = Arc::new(ManualClock::new());
        let ewma = UnevenEwma::with_clock(Duration::from_secs(1), clock.clone()).unwrap();
        assert!(!ewma.warmed_up());

        ewma.add(1.0);
        clock.advance(Duration::from_secs(34));
        ewma.add(1.0);
        assert!(!ewma.warmed_up());

        clock.advance(Duration::from_secs(1));
        ewma.add(1.0);
        assert!(ewma.warmed_up());
    }

    /// Hands out `base + 1s`, `base + 2s`, ... and stalls on the first read.
    struct StallingClock {
        base: Instant,
        calls: AtomicU64,
    }

    impl Clock for StallingClock {
        fn now(&self) -> Instant {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                thread::sleep(Duration::from_millis(200));
            }
            self.base + Duration::from_secs(n)
        }
    }

    #[test]
    fn concurrent_adds_keep_every_point() {
        let clock = StallingClock {
            base: Instant::now(),
            calls: AtomicU64::new(0),
        };
        let ewma = Arc::new(UnevenEwma::with_clock(Duration::from_secs(1), clock).unwrap());

        let slow = {
            let ewma = ewma.clone();
            thread::spawn(move || ewma.add(1000.0))
        };
        thread::sleep(Duration::from_millis(50));
        ewma.add(5.0);
        slow.join().unwrap();

        // 1000 at +1s, then 5 one window later.
        let mu = (-1.0f64).exp();
        assert!((ewma.get() - (mu * 1000.0 + (1.0 - mu) * 5.0)).abs() < 1e-6, "{}", ewma.get());
    }

    #[test]
    fn follows_a_ramp() {
        let start = Instant::now();
        let ewma = UnevenEwma::new(Duration::from_secs(1)).unwrap();

        let points = [
            (1000, 1.0),
            (1100, 2.0),
            (1200, 3.0),
            (1300, 2.0),
            (1400, 1.0),
            (1500, 0.0),
            (2000, 1.0),
            (2100, 2.0),
            (3000, 3.0),
            (4000, 4.0),
            (5000, 5.0),
            (6000, 6.0),
        ];
        for (ms, v) in points {
            ewma.add_at(start + Duration::from_millis(ms), v).unwrap();
        }

        // Lags behind a rising series but stays within its range.
        let avg = ewma.get();
        assert!(avg > 3.0 && avg < 6.0, "{avg}");
    }
}
