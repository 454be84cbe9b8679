use hdrhistogram::Histogram as HdrHistogram;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tagged_metrics::{Accumulator, Snapshot, UniformReservoir, UniformSnapshot};

fn check(values: &[u64]) {
    let mut hdr = HdrHistogram::<u64>::new(3).unwrap();
    for &v in values {
        hdr.record(v).unwrap();
    }
    let snapshot = UniformSnapshot::new(values.to_vec());

    for q in [0.5, 0.75, 0.9, 0.95, 0.98, 0.99] {
        let ours = snapshot.value(q).unwrap();
        let theirs = hdr.value_at_quantile(q) as f64;
        let err = (ours - theirs).abs() / theirs;
        assert!(err < 0.01, "q={q}: {ours} vs {theirs}");
    }

    assert!((snapshot.mean() - hdr.mean()).abs() / hdr.mean() < 0.01);
    assert!((snapshot.min() as f64 - hdr.min() as f64).abs() / (hdr.min() as f64) < 0.001);
    assert!((snapshot.max() as f64 - hdr.max() as f64).abs() / (hdr.max() as f64) < 0.001);
}

#[test]
fn uniform_distribution_matches_hdr() {
    let mut rng = StdRng::seed_from_u64(42);
    let values: Vec<u64> = (0..50_000).map(|_| rng.gen_range(1_000..100_000)).collect();
    check(&values);
}

#[test]
fn skewed_latencies_match_hdr() {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<u64> = (0..50_000)
        .map(|_| {
            let base = rng.gen_range(200..2_000u64);
            if rng.gen_bool(0.05) {
                base * 20
            } else {
                base
            }
        })
        .collect();
    check(&values);
}

#[test]
fn full_reservoir_keeps_the_latest_window() {
    let reservoir = UniformReservoir::new(1_000).unwrap();
    for v in 1..=10_000u64 {
        reservoir.update(v);
    }

    let snapshot = reservoir.snapshot();
    assert_eq!(snapshot.min(), 9_001);
    assert_eq!(snapshot.max(), 10_000);

    let mut hdr = HdrHistogram::<u64>::new(3).unwrap();
    for &v in snapshot.values() {
        hdr.record(v).unwrap();
    }
    let median = snapshot.median();
    assert!((median - hdr.value_at_quantile(0.5) as f64).abs() / median < 0.01);
}
