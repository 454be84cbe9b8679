//! Nested JSON document of metric readings.
//!
//! Metric names are split on `.` into a path, so `node.queue.depth` lands at
//! `{"node": {"queue": {"depth": ...}}}`.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::accumulator::Accumulator;
use crate::registry::Metric;
use crate::snapshot::Percentiles;
use crate::tags::Tags;
use crate::timer::Timer;

/// Builds the document for `metrics`.
///
/// Metrics sharing a name (but not tags) overwrite each other; the last one
/// in `metrics` wins.
pub fn as_json(metrics: &[(Tags, Metric)]) -> Value {
    let mut root = Map::new();

    for (tags, metric) in metrics {
        let value = match metric {
            Metric::Gauge(gauge) => json!(gauge.get()),
            Metric::Counter(counter) => json!(counter.get()),
            Metric::UnsignedCounter(counter) => json!(counter.get()),
            Metric::Meter(meter) => json!({
                "count":   meter.count(),
                "m01rate": meter.m01rate(),
                "m05rate": meter.m05rate(),
                "m15rate": meter.m15rate(),
            }),
            Metric::Timer(timer) => timer_json(timer),
            Metric::DecayingTimer(timer) => timer_json(timer),
        };

        insert_path(&mut root, tags, value);
    }

    Value::Object(root)
}

/// Pretty-printed [`as_json`].
pub fn to_string_pretty(metrics: &[(Tags, Metric)]) -> String {
    format!("{:#}", as_json(metrics))
}

fn timer_json<A: Accumulator>(timer: &Timer<A>) -> Value {
    let p = Percentiles::from_snapshot(&timer.snapshot());

    json!({
        "count":   timer.count(),
        "m01rate": timer.m01rate(),
        "m05rate": timer.m05rate(),
        "m15rate": timer.m15rate(),
        "p50":     p.p50,
        "p75":     p.p75,
        "p90":     p.p90,
        "p95":     p.p95,
        "p98":     p.p98,
        "p99":     p.p99,
        "mean":    p.mean,
        "stddev":  p.stddev,
    })
}

fn insert_path(root: &mut Map<String, Value>, tags: &Tags, value: Value) {
    let segments: Vec<&str> = tags.name().split('.').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        warn!(metric = %tags, "skipping metric with an empty name");
        return;
    };

    let mut node = root;
    for segment in parents {
        let entry = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            warn!(metric = %tags, segment, "metric path shadows a scalar, replacing it");
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        node = next;
    }

    if node.insert(last.to_string(), value).is_some() {
        warn!(metric = %tags, "metric path already taken, overwriting");
    }
}
