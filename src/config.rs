//! Serde-backed configuration for reservoirs, the registry and the reporter.
//!
//! Every section has defaults, so an empty JSON object is a valid config.

use std::time::Duration;

use serde::Deserialize;

use crate::clock::saturating_micros;
use crate::error::{MetricsError, Result};

pub const DEFAULT_CAPACITY: usize = 1024;
pub const DEFAULT_ALPHA: f64 = 0.015;
pub const DEFAULT_RESCALE_PERIOD_US: u64 = 60 * 60 * 1_000_000;
pub const DEFAULT_REPORT_PERIOD_MS: u64 = 5_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub reporter: ReporterConfig,
}

impl MetricsConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: MetricsConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.registry.validate()?;
        self.reporter.validate()?;
        Ok(())
    }
}

/// Reservoir parameters for metrics the registry creates on demand.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default = "default_capacity")]
    pub uniform_capacity: usize,

    #[serde(default)]
    pub decaying: DecayingConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            uniform_capacity: default_capacity(),
            decaying: DecayingConfig::default(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.uniform_capacity == 0 {
            return Err(MetricsError::invalid("sample reservoir can't be of zero size"));
        }
        self.decaying.validate()
    }
}

/// Parameters of a forward-decaying reservoir.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecayingConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Exponential decay factor; higher values bias the sample harder
    /// towards recent updates.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// How often weights are rescaled, in microseconds.
    #[serde(default = "default_rescale_period_us")]
    pub rescale_period_us: u64,

    /// Fixed RNG seed, mostly for reproducible tests.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DecayingConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            alpha: default_alpha(),
            rescale_period_us: default_rescale_period_us(),
            seed: None,
        }
    }
}

impl DecayingConfig {
    pub fn new(capacity: usize, alpha: f64) -> Self {
        Self {
            capacity,
            alpha,
            ..Self::default()
        }
    }

    pub fn rescale_period(mut self, period: Duration) -> Self {
        let micros = saturating_micros(period);
        // Round sub-microsecond periods up; only a zero period is invalid.
        self.rescale_period_us = if micros == 0 && !period.is_zero() { 1 } else { micros };
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn rescale_period_duration(&self) -> Duration {
        Duration::from_micros(self.rescale_period_us)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(MetricsError::invalid("sample reservoir can't be of zero size"));
        }
        // Written negated so NaN is rejected too.
        if !(self.alpha > 0.0) {
            return Err(MetricsError::invalid("alpha should be greater than zero"));
        }
        if self.rescale_period_us == 0 {
            return Err(MetricsError::invalid("can't manage empty rescale interval"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    #[serde(default = "default_report_period_ms")]
    pub period_ms: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            period_ms: default_report_period_ms(),
        }
    }
}

impl ReporterConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_ms == 0 {
            return Err(MetricsError::invalid("reporter.period_ms must be positive"));
        }
        Ok(())
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}
fn default_rescale_period_us() -> u64 {
    DEFAULT_RESCALE_PERIOD_US
}
fn default_report_period_ms() -> u64 {
    DEFAULT_REPORT_PERIOD_MS
}
