//! Forward-decaying priority reservoir.
//!
//! Each update gets weight `w = exp(alpha * (t - L))`, where `L` is the
//! current landmark, and priority `w / u` for a uniform draw `u`. The
//! reservoir keeps the `capacity` highest priorities, which biases the sample
//! towards recent values while staying a proper random sample within each
//! weight class.
//!
//! Since `w` grows without bound, the landmark is periodically moved to "now"
//! and every stored priority and weight is scaled down accordingly.
//!
//! See Cormode et al. "Forward Decay: A Practical Time Decay Model for
//! Streaming Systems" (ICDE '09).

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::Accumulator;
use crate::clock::{saturating_micros, signed_secs, Clock, SystemClock};
use crate::config::DecayingConfig;
use crate::error::Result;
use crate::snapshot::{WeightedSample, WeightedSnapshot};

#[derive(Debug)]
pub struct DecayingReservoir<C: Clock = SystemClock> {
    capacity: usize,
    alpha: f64,
    rescale_period: Duration,
    clock: C,

    // Anchor for the integer deadline below.
    origin: Instant,
    // Microseconds since `origin`; only the CAS winner rescales.
    next_rescale_us: AtomicU64,

    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    // Landmark `L`.
    start_time: Instant,
    samples: BTreeMap<Priority, WeightedSample>,
    rng: StdRng,
}

/// Totally ordered priority key.
#[derive(Debug, Clone, Copy)]
struct Priority(f64);

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.0.total_cmp(&other.0)
    }
}

impl DecayingReservoir<SystemClock> {
    /// Creates a reservoir holding `capacity` samples with decay factor
    /// `alpha` and the default one hour rescale period.
    pub fn new(capacity: usize, alpha: f64) -> Result<Self> {
        Self::with_config(&DecayingConfig::new(capacity, alpha))
    }

    pub fn with_config(config: &DecayingConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for DecayingReservoir<SystemClock> {
    fn default() -> Self {
        Self::build(&DecayingConfig::default(), SystemClock)
    }
}

impl<C: Clock> DecayingReservoir<C> {
    pub fn with_clock(config: &DecayingConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: &DecayingConfig, clock: C) -> Self {
        let origin = clock.now();
        let rescale_period = config.rescale_period_duration();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            capacity: config.capacity,
            alpha: config.alpha,
            rescale_period,
            clock,
            origin,
            next_rescale_us: AtomicU64::new(saturating_micros(rescale_period)),
            inner: Mutex::new(Inner {
                start_time: origin,
                samples: BTreeMap::new(),
                rng,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Records `value` as observed at `timestamp`.
    ///
    /// The age relative to the landmark is measured in whole seconds.
    pub fn update_at(&self, value: u64, timestamp: Instant) {
        self.rescale_if_needed(self.clock.now());

        let mut inner = self.inner.lock();

        let u: f64 = inner.rng.gen_range(0.0..=1.0);
        if u == 0.0 {
            return;
        }

        let weight = (self.alpha * signed_secs(inner.start_time, timestamp)).exp();
        let priority = weight / u;

        inner
            .samples
            .insert(Priority(priority), WeightedSample::new(value, weight));

        if inner.samples.len() > self.capacity {
            inner.samples.pop_first();
        }
    }

    fn rescale_if_needed(&self, now: Instant) {
        let deadline = self.next_rescale_us.load(Ordering::Acquire);
        let now_us = saturating_micros(now.saturating_duration_since(self.origin));
        if now_us <= deadline {
            return;
        }

        let next = now_us.saturating_add(saturating_micros(self.rescale_period));
        // Losers skip this round; the winner rescales for everyone.
        if self
            .next_rescale_us
            .compare_exchange(deadline, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.rescale(now);
        }
    }

    fn rescale(&self, now: Instant) {
        let mut inner = self.inner.lock();

        let old = std::mem::replace(&mut inner.start_time, now);
        let scale = (-self.alpha * signed_secs(old, now)).exp();

        let samples = std::mem::take(&mut inner.samples);
        inner.samples = samples
            .into_iter()
            .map(|(priority, sample)| {
                (
                    Priority(priority.0 * scale),
                    WeightedSample::new(sample.value, sample.weight * scale),
                )
            })
            .collect();

        trace!(scale, samples = inner.samples.len(), "decaying reservoir rescaled");
    }
}

impl<C: Clock> Accumulator for DecayingReservoir<C> {
    type Snapshot = WeightedSnapshot;

    fn update(&self, value: u64) {
        self.update_at(value, self.clock.now());
    }

    fn snapshot(&self) -> WeightedSnapshot {
        let samples: Vec<WeightedSample> = self.inner.lock().samples.values().copied().collect();
        WeightedSnapshot::new(samples)
    }

    fn size(&self) -> usize {
        self.inner.lock().samples.len().min(self.capacity)
    }
}
