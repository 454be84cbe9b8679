use std::fmt;

use serde::Serialize;

/// A reading produced by a [`Gauge`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GaugeValue {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl From<i64> for GaugeValue {
    fn from(v: i64) -> Self {
        GaugeValue::Int(v)
    }
}

impl From<u64> for GaugeValue {
    fn from(v: u64) -> Self {
        GaugeValue::Uint(v)
    }
}

impl From<f64> for GaugeValue {
    fn from(v: f64) -> Self {
        GaugeValue::Float(v)
    }
}

impl fmt::Display for GaugeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GaugeValue::Int(v) => write!(f, "{v}"),
            GaugeValue::Uint(v) => write!(f, "{v}"),
            GaugeValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// An instantaneous value computed on demand.
///
/// The callback runs on every read, from whichever thread reads it.
pub struct Gauge {
    read: Box<dyn Fn() -> GaugeValue + Send + Sync>,
}

impl Gauge {
    pub fn new<T, F>(read: F) -> Self
    where
        T: Into<GaugeValue>,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            read: Box::new(move || read().into()),
        }
    }

    pub fn get(&self) -> GaugeValue {
        (self.read)()
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge").finish_non_exhaustive()
    }
}
