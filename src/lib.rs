//! In-process application metrics.
//!
//! Counters, gauges, meters and timers live in a [`Registry`] keyed by
//! [`Tags`]. Timers combine a [`Meter`] for throughput with a [`Histogram`]
//! for latency distribution, backed by either a [`UniformReservoir`] (the
//! most recent values) or a [`DecayingReservoir`] (a sample biased towards
//! the last few minutes).
//!
//! ```no_run
//! use std::time::Duration;
//! use tagged_metrics::{Registry, Tags};
//!
//! let registry = Registry::new();
//! let timer = registry.timer(Tags::with_tags("rpc.latency", [("method", "get")]))?;
//! timer.measure(|| std::thread::sleep(Duration::from_millis(1)));
//!
//! println!("{}", tagged_metrics::format::to_string_pretty(&registry.select_all()));
//! # Ok::<(), tagged_metrics::MetricsError>(())
//! ```

pub mod accumulator;
pub mod clock;
pub mod config;
pub mod counter;
pub mod error;
pub mod ewma;
pub mod format;
pub mod gauge;
pub mod histogram;
pub mod meter;
pub mod registry;
pub mod reporter;
pub mod snapshot;
pub mod tags;
pub mod timer;
pub mod usts;

pub use accumulator::{Accumulator, DecayingReservoir, UniformReservoir};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MetricsConfig;
pub use counter::{Counter, CounterValue};
pub use error::{MetricsError, Result};
pub use ewma::Ewma;
pub use gauge::{Gauge, GaugeValue};
pub use histogram::Histogram;
pub use meter::Meter;
pub use registry::{Metric, Registry};
pub use reporter::{report_stream, Report};
pub use snapshot::{Percentiles, Snapshot, UniformSnapshot, WeightedSnapshot};
pub use tags::Tags;
pub use timer::{Timer, TimerContext};
pub use usts::UnevenEwma;
