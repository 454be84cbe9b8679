//! Periodic reports of every metric in a registry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::format::json::as_json;
use crate::registry::Registry;

/// One point-in-time reading of a registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub metrics: serde_json::Value,
}

impl Report {
    pub fn collect(registry: &Registry) -> Self {
        Self {
            timestamp: Utc::now(),
            metrics: as_json(&registry.select_all()),
        }
    }
}

// ─── Stream ──────────────────────────────────────────────────────
/// Yields a [`Report`] of `registry` every `period`, the first one
/// immediately. Must be polled inside a tokio runtime.

pub fn report_stream(
    registry: Arc<Registry>,
    period: Duration,
) -> Result<impl Stream<Item = Report>> {
    if period.is_zero() {
        return Err(MetricsError::invalid("report period must be positive"));
    }

    debug!(period_ms = period.as_millis() as u64, "starting reporter");
    let interval = tokio::time::interval(period);

    Ok(IntervalStream::new(interval).map(move |_| Report::collect(&registry)))
}
