//! Exponentially-weighted moving average of an event rate.
//!
//! See "UNIX Load Average Part 1: How It Works" and "Part 2" for the origin of
//! the 1/5/15 minute constants.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::clock::saturating_nanos;
use crate::error::{MetricsError, Result};

/// Expected interval between ticks of the preset averages.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// `alpha = 1 - exp(-interval / window)` for a 5 second tick.
fn preset_alpha(window_minutes: f64) -> f64 {
    -(-5.0 / 60.0 / window_minutes).exp_m1()
}

/// A single moving average.
///
/// `update` only accumulates; the rate changes on `tick`, which the owner
/// is expected to call once per tick interval.
#[derive(Debug)]
pub struct Ewma {
    alpha: f64,
    interval_nanos: f64,
    uncounted: AtomicU64,
    // f64 bits of the per-nanosecond rate.
    rate: AtomicU64,
    initialized: AtomicBool,
}

impl Ewma {
    /// Creates an average with smoothing constant `alpha` in `(0, 1]`,
    /// ticked every `interval`.
    pub fn new(alpha: f64, interval: Duration) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(MetricsError::invalid(format!(
                "alpha must be in (0; 1] range, got {alpha}"
            )));
        }
        if interval.is_zero() {
            return Err(MetricsError::invalid("tick interval can not be zero"));
        }
        Ok(Self::with_alpha(alpha, interval))
    }

    fn with_alpha(alpha: f64, interval: Duration) -> Self {
        Self {
            alpha,
            interval_nanos: saturating_nanos(interval) as f64,
            uncounted: AtomicU64::new(0),
            rate: AtomicU64::new(0f64.to_bits()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Equivalent to the UNIX one minute load average, ticked every 5 seconds.
    pub fn m01() -> Self {
        Self::with_alpha(preset_alpha(1.0), TICK_INTERVAL)
    }

    /// Equivalent to the UNIX five minute load average, ticked every 5 seconds.
    pub fn m05() -> Self {
        Self::with_alpha(preset_alpha(5.0), TICK_INTERVAL)
    }

    /// Equivalent to the UNIX fifteen minute load average, ticked every 5 seconds.
    pub fn m15() -> Self {
        Self::with_alpha(preset_alpha(15.0), TICK_INTERVAL)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn update(&self, n: u64) {
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Marks the passage of one tick interval and decays the rate.
    pub fn tick(&self) {
        let count = self.uncounted.swap(0, Ordering::AcqRel);
        let instant_rate = count as f64 / self.interval_nanos;

        let rate = if self.initialized.swap(true, Ordering::AcqRel) {
            let current = f64::from_bits(self.rate.load(Ordering::Acquire));
            current + self.alpha * (instant_rate - current)
        } else {
            instant_rate
        };

        self.rate.store(rate.to_bits(), Ordering::Release);
    }

    /// Current rate in events per `unit`.
    pub fn rate(&self, unit: Duration) -> f64 {
        f64::from_bits(self.rate.load(Ordering::Acquire)) * unit.as_nanos() as f64
    }

    /// Current rate in events per second.
    pub fn rate_per_second(&self) -> f64 {
        self.rate(Duration::from_secs(1))
    }
}
