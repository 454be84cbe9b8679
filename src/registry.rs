//! Named, tagged metric instances.
//!
//! One map per metric kind, each keyed by [`Tags`]. Lookups take a read lock;
//! only the first request for a metric takes the write lock to create it.

use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::accumulator::{DecayingReservoir, UniformReservoir};
use crate::config::RegistryConfig;
use crate::counter::Counter;
use crate::error::{MetricsError, Result};
use crate::gauge::{Gauge, GaugeValue};
use crate::meter::Meter;
use crate::tags::Tags;
use crate::timer::Timer;

/// Timer over the most recent durations.
pub type UniformTimer = Timer<UniformReservoir>;
/// Timer biased towards recent durations.
pub type DecayingTimer = Timer<DecayingReservoir>;

/// Any registered metric, as walked by exporters.
#[derive(Debug, Clone)]
pub enum Metric {
    Gauge(Arc<Gauge>),
    Counter(Arc<Counter>),
    UnsignedCounter(Arc<Counter<u64>>),
    Meter(Arc<Meter>),
    Timer(Arc<UniformTimer>),
    DecayingTimer(Arc<DecayingTimer>),
}

impl Metric {
    pub fn kind(&self) -> &'static str {
        match self {
            Metric::Gauge(_) => "gauge",
            Metric::Counter(_) | Metric::UnsignedCounter(_) => "counter",
            Metric::Meter(_) => "meter",
            Metric::Timer(_) | Metric::DecayingTimer(_) => "timer",
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    config: RegistryConfig,
    gauges: RwLock<HashMap<Tags, Arc<Gauge>>>,
    counters: RwLock<HashMap<Tags, Arc<Counter>>>,
    unsigned_counters: RwLock<HashMap<Tags, Arc<Counter<u64>>>>,
    meters: RwLock<HashMap<Tags, Arc<Meter>>>,
    timers: RwLock<HashMap<Tags, Arc<UniformTimer>>>,
    decaying_timers: RwLock<HashMap<Tags, Arc<DecayingTimer>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a gauge whose value is read from `read`, replacing any gauge
    /// already registered under the same tags.
    pub fn register_gauge<T, F>(&self, tags: impl Into<Tags>, read: F) -> Arc<Gauge>
    where
        T: Into<GaugeValue>,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let tags = tags.into();
        let gauge = Arc::new(Gauge::new(read));
        debug!(metric = %tags, "registered gauge");
        self.gauges.write().insert(tags, gauge.clone());
        gauge
    }

    /// Returns a previously registered gauge.
    pub fn gauge(&self, tags: impl Into<Tags>) -> Result<Arc<Gauge>> {
        let tags = tags.into();
        self.gauges
            .read()
            .get(&tags)
            .cloned()
            .ok_or_else(|| MetricsError::NotFound(tags.to_string()))
    }

    /// Returns the counter for `tags`, creating it on first use.
    pub fn counter(&self, tags: impl Into<Tags>) -> Arc<Counter> {
        get_or_create(&self.counters, tags.into(), "counter", || {
            Ok::<_, Infallible>(Counter::new())
        })
        .unwrap_or_else(|never| match never {})
    }

    /// Returns the unsigned counter for `tags`, creating it on first use.
    ///
    /// Unsigned and signed counters live side by side: the same tags may name
    /// one of each.
    pub fn unsigned_counter(&self, tags: impl Into<Tags>) -> Arc<Counter<u64>> {
        get_or_create(&self.unsigned_counters, tags.into(), "unsigned counter", || {
            Ok::<_, Infallible>(Counter::new())
        })
        .unwrap_or_else(|never| match never {})
    }

    /// Returns the meter for `tags`, creating it on first use.
    pub fn meter(&self, tags: impl Into<Tags>) -> Arc<Meter> {
        get_or_create(&self.meters, tags.into(), "meter", || Ok::<_, Infallible>(Meter::new()))
            .unwrap_or_else(|never| match never {})
    }

    /// Returns the uniform timer for `tags`, creating it on first use.
    pub fn timer(&self, tags: impl Into<Tags>) -> Result<Arc<UniformTimer>> {
        let capacity = self.config.uniform_capacity;
        get_or_create(&self.timers, tags.into(), "timer", || {
            Ok(Timer::new(UniformReservoir::new(capacity)?))
        })
    }

    /// Returns the decaying timer for `tags`, creating it on first use.
    pub fn decaying_timer(&self, tags: impl Into<Tags>) -> Result<Arc<DecayingTimer>> {
        let config = &self.config.decaying;
        get_or_create(&self.decaying_timers, tags.into(), "decaying timer", || {
            Ok(Timer::new(DecayingReservoir::with_config(config)?))
        })
    }

    pub fn gauges(&self) -> Vec<(Tags, Arc<Gauge>)> {
        sorted(&self.gauges)
    }

    pub fn counters(&self) -> Vec<(Tags, Arc<Counter>)> {
        sorted(&self.counters)
    }

    pub fn unsigned_counters(&self) -> Vec<(Tags, Arc<Counter<u64>>)> {
        sorted(&self.unsigned_counters)
    }

    pub fn meters(&self) -> Vec<(Tags, Arc<Meter>)> {
        sorted(&self.meters)
    }

    pub fn timers(&self) -> Vec<(Tags, Arc<UniformTimer>)> {
        sorted(&self.timers)
    }

    pub fn decaying_timers(&self) -> Vec<(Tags, Arc<DecayingTimer>)> {
        sorted(&self.decaying_timers)
    }

    /// Every metric whose tags satisfy `predicate`, ordered by tags.
    pub fn select<P>(&self, predicate: P) -> Vec<(Tags, Metric)>
    where
        P: Fn(&Tags) -> bool,
    {
        let mut out: Vec<(Tags, Metric)> = Vec::new();

        collect(&self.gauges, &predicate, Metric::Gauge, &mut out);
        collect(&self.counters, &predicate, Metric::Counter, &mut out);
        collect(&self.unsigned_counters, &predicate, Metric::UnsignedCounter, &mut out);
        collect(&self.meters, &predicate, Metric::Meter, &mut out);
        collect(&self.timers, &predicate, Metric::Timer, &mut out);
        collect(&self.decaying_timers, &predicate, Metric::DecayingTimer, &mut out);

        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Every registered metric.
    pub fn select_all(&self) -> Vec<(Tags, Metric)> {
        self.select(|_| true)
    }
}

fn get_or_create<T, E, F>(
    map: &RwLock<HashMap<Tags, Arc<T>>>,
    tags: Tags,
    kind: &'static str,
    create: F,
) -> std::result::Result<Arc<T>, E>
where
    F: FnOnce() -> std::result::Result<T, E>,
{
    if let Some(existing) = map.read().get(&tags) {
        return Ok(existing.clone());
    }

    let mut map = map.write();
    // Somebody may have won the race between the two locks.
    if let Some(existing) = map.get(&tags) {
        return Ok(existing.clone());
    }

    let metric = Arc::new(create()?);
    debug!(metric = %tags, kind, "created metric");
    map.insert(tags, metric.clone());
    Ok(metric)
}

fn sorted<K: Clone + Ord + Hash, V>(map: &RwLock<HashMap<K, Arc<V>>>) -> Vec<(K, Arc<V>)> {
    let mut out: Vec<_> = map
        .read()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

fn collect<V, P>(
    map: &RwLock<HashMap<Tags, Arc<V>>>,
    predicate: &P,
    wrap: fn(Arc<V>) -> Metric,
    out: &mut Vec<(Tags, Metric)>,
) where
    P: Fn(&Tags) -> bool,
{
    out.extend(
        map.read()
            .iter()
            .filter(|(tags, _)| predicate(*tags))
            .map(|(tags, metric)| (tags.clone(), wrap(metric.clone()))),
    );
}
