use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tagged_metrics::config::DecayingConfig;
use tagged_metrics::{
    Accumulator, DecayingReservoir, Histogram, ManualClock, Meter, Registry, Snapshot, Timer,
    UniformReservoir,
};

const THREADS: u64 = 8;
const PER_THREAD: u64 = 10_000;

fn hammer<F>(f: F)
where
    F: Fn(u64, u64) + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let f = f.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    f(t, i);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn uniform_reservoir_stays_bounded() {
    let histogram = Arc::new(Histogram::new(UniformReservoir::new(100).unwrap()));
    let h = histogram.clone();
    hammer(move |t, i| h.update(t * PER_THREAD + i));

    assert_eq!(histogram.count(), THREADS * PER_THREAD);
    assert_eq!(histogram.size(), 100);

    let snapshot = histogram.snapshot();
    assert_eq!(snapshot.size(), 100);
    assert!(snapshot.max() < THREADS * PER_THREAD);
}

#[test]
fn decaying_reservoir_stays_bounded() {
    let reservoir = Arc::new(DecayingReservoir::new(64, 0.015).unwrap());
    let r = reservoir.clone();
    hammer(move |_, i| r.update(i));

    assert_eq!(reservoir.size(), 64);

    let snapshot = reservoir.snapshot();
    assert_eq!(snapshot.size(), 64);
    assert!(snapshot.max() < PER_THREAD);
    let total: f64 = snapshot.weights().iter().sum();
    assert!((total - 1.0).abs() < 1e-9, "{total}");
}

#[test]
fn decaying_reservoir_rescales_under_contention() {
    let clock = Arc::new(ManualClock::new());
    let config = DecayingConfig::new(64, 1.0)
        .rescale_period(Duration::from_secs(1))
        .seed(3);
    let reservoir = Arc::new(DecayingReservoir::with_clock(&config, clock.clone()).unwrap());

    let r = reservoir.clone();
    let c = clock.clone();
    hammer(move |t, i| {
        // One thread drives time forward; weights would reach e^1000 = inf
        // without rescaling.
        if t == 0 && i % 1_000 == 0 {
            c.advance(Duration::from_secs(100));
        }
        r.update(i);
    });

    let snapshot = reservoir.snapshot();
    assert_eq!(snapshot.size(), 64);
    assert!(snapshot.weights().iter().all(|w| w.is_finite()));
    let total: f64 = snapshot.weights().iter().sum();
    assert!((total - 1.0).abs() < 1e-9, "{total}");
}

#[test]
fn meter_counts_every_mark() {
    let meter = Arc::new(Meter::new());
    let m = meter.clone();
    hammer(move |_, _| m.mark(2));

    assert_eq!(meter.count(), 2 * THREADS * PER_THREAD);
    assert!(meter.mean_rate() > 0.0);
}

#[test]
fn timer_counts_every_measurement() {
    let timer = Arc::new(Timer::default());
    let t = timer.clone();
    hammer(move |_, i| {
        if i % 2 == 0 {
            t.update(Duration::from_micros(i));
        } else {
            t.measure(|| ());
        }
    });

    assert_eq!(timer.count(), THREADS * PER_THREAD);
    assert_eq!(timer.meter().count(), THREADS * PER_THREAD);
    assert_eq!(timer.snapshot().size(), 1024);
}

#[test]
fn registry_hands_out_one_instance_per_tag_set() {
    let registry = Arc::new(Registry::new());
    let r = registry.clone();
    hammer(move |t, _| {
        r.counter("jobs.done").inc();
        r.timer(format!("jobs.worker{}", t % 2))
            .unwrap()
            .update(Duration::from_nanos(1));
    });

    assert_eq!(registry.counter("jobs.done").get(), (THREADS * PER_THREAD) as i64);
    assert_eq!(registry.counters().len(), 1);

    let timers = registry.timers();
    assert_eq!(timers.len(), 2);
    let total: u64 = timers.iter().map(|(_, timer)| timer.count()).sum();
    assert_eq!(total, THREADS * PER_THREAD);
}
