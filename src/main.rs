use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tagged_metrics::{report_stream, MetricsConfig, MetricsError, Registry, Result, Tags};

const WORKERS: u64 = 8;
const RUN_FOR: Duration = Duration::from_secs(12);

/// Usage: `metrics-demo [config.json]`
///
/// Runs a synthetic request workload against a registry and prints a JSON
/// report every reporter period until the run ends.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 1. Load config ───────────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| MetricsError::Config(format!("{path}: {e}")))?;
            MetricsConfig::from_json_str(&raw)?
        }
        None => MetricsConfig::default(),
    };

    // ── 2. Build registry ────────────────────────────────────────
    let registry = Arc::new(Registry::with_config(config.registry.clone())?);

    let in_flight = Arc::new(AtomicU64::new(0));
    {
        let in_flight = in_flight.clone();
        registry.register_gauge("demo.requests.in_flight", move || {
            in_flight.load(Ordering::Relaxed)
        });
    }

    // ── 3. Spawn workers ─────────────────────────────────────────
    let deadline = Instant::now() + RUN_FOR;
    let mut handles = Vec::with_capacity(WORKERS as usize);

    for worker_id in 0..WORKERS {
        let registry = registry.clone();
        let in_flight = in_flight.clone();

        handles.push(tokio::spawn(async move {
            if let Err(e) = worker(worker_id, registry, in_flight, deadline).await {
                warn!(worker_id, error = %e, "worker stopped");
            }
        }));
    }

    info!(workers = WORKERS, run_for_s = RUN_FOR.as_secs(), "workload started");

    // ── 4. Print reports ─────────────────────────────────────────
    let period = config.reporter.period();
    let reports = (RUN_FOR.as_millis() / period.as_millis().max(1)) as usize + 1;
    let stream = report_stream(registry.clone(), period)?.take(reports);
    tokio::pin!(stream);

    while let Some(report) = stream.next().await {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "failed to encode report"),
        }
    }

    for h in handles {
        let _ = h.await;
    }

    Ok(())
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(
    id: u64,
    registry: Arc<Registry>,
    in_flight: Arc<AtomicU64>,
    deadline: Instant,
) -> Result<()> {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id);

    let reads = registry.timer(Tags::with_tags("demo.requests.latency", [("op", "read")]))?;
    let writes = registry.timer(Tags::with_tags("demo.requests.latency", [("op", "write")]))?;
    let recent = registry.decaying_timer("demo.requests.recent")?;
    let throughput = registry.meter("demo.requests.rate");
    let failures = registry.counter("demo.requests.failed");

    while Instant::now() < deadline {
        let is_read = rng.gen_bool(0.8);
        let latency = Duration::from_micros(if is_read {
            rng.gen_range(200..2_000)
        } else {
            rng.gen_range(1_000..8_000)
        });

        in_flight.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        let timer = if is_read { &reads } else { &writes };
        timer.measure_async(tokio::time::sleep(latency)).await;
        recent.update(started.elapsed());
        in_flight.fetch_sub(1, Ordering::Relaxed);

        throughput.mark_once();
        if rng.gen_bool(0.02) {
            failures.inc();
        }
    }

    Ok(())
}
