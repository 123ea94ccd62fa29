//! Distribution bucketing and count semantics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use spanstats_core::error::ErrorCode;
use spanstats_core::stats::{Aggregation, BucketBoundaries};
use spanstats_core::Telemetry;

const LATENCY_BOUNDS: [f64; 9] = [0.0, 5.0, 10.0, 25.0, 100.0, 200.0, 400.0, 800.0, 10000.0];

fn latency_bounds() -> BucketBoundaries {
    BucketBoundaries::new(LATENCY_BOUNDS.to_vec()).unwrap()
}

#[test]
fn value_lands_in_first_bucket_with_greater_boundary() {
    let b = latency_bounds();
    assert_eq!(b.bucket_count(), 10);

    // below the first boundary: underflow bucket
    assert_eq!(b.bucket_index(-0.5), 0);
    // a value equal to a boundary belongs to the bucket that starts there
    assert_eq!(b.bucket_index(0.0), 1);
    assert_eq!(b.bucket_index(4.9), 1);
    assert_eq!(b.bucket_index(5.0), 2);
    assert_eq!(b.bucket_index(24.0), 3);
    assert_eq!(b.bucket_index(799.0), 7);
    assert_eq!(b.bucket_index(9999.0), 8);
    // at or beyond the last boundary: overflow bucket
    assert_eq!(b.bucket_index(10000.0), 9);
    assert_eq!(b.bucket_index(1.0e7), 9);
}

#[test]
fn each_value_is_counted_in_exactly_one_bucket() {
    let t = Telemetry::default();
    let m = t.define_double("app/write_latency", "w", "ms").unwrap();
    t.register_view(
        "views/write_latency",
        "w",
        m.measure(),
        Aggregation::Distribution(latency_bounds()),
        vec![],
    )
    .unwrap();

    let values = [0.0, 3.0, 7.0, 12.0, 150.0, 450.0, 20000.0];
    for v in values {
        assert!(t.recorder().new_measure_map().put_double(&m, v).record());
    }

    let data = t.views().view_data("views/write_latency").unwrap();
    let d = data.row(&[]).unwrap().as_distribution().unwrap();
    assert_eq!(d.count, values.len() as u64);
    assert_eq!(d.bucket_counts.iter().sum::<u64>(), values.len() as u64);
    assert_eq!(d.bucket_counts, vec![0, 2, 1, 1, 0, 1, 0, 1, 0, 1]);
    assert_eq!(d.min, 0.0);
    assert_eq!(d.max, 20000.0);
    assert!((d.sum - values.iter().sum::<f64>()).abs() < 1e-9);
    assert!((d.mean - d.sum / d.count as f64).abs() < 1e-9);
}

#[test]
fn sum_of_squared_deviation_matches_direct_computation() {
    let t = Telemetry::default();
    let m = t.define_double("app/latency", "l", "ms").unwrap();
    t.register_view("views/l", "l", m.measure(), Aggregation::distribution(vec![10.0]).unwrap(), vec![])
        .unwrap();

    let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    for v in values {
        assert!(t.recorder().new_measure_map().put_double(&m, v).record());
    }
    let data = t.views().view_data("views/l").unwrap();
    let d = data.row(&[]).unwrap().as_distribution().unwrap();
    assert!((d.mean - 5.0).abs() < 1e-9);
    assert!((d.sum_of_squared_deviation - 32.0).abs() < 1e-9);
}

#[test]
fn count_is_monotonic_and_matches_record_calls() {
    let t = Telemetry::default();
    let m = t.define_long("app/tx", "tx", "1").unwrap();
    t.register_view("views/tx", "tx", m.measure(), Aggregation::Count, vec![]).unwrap();

    let mut last = 0;
    for i in 1..=10u64 {
        // the recorded value does not matter for a count
        assert!(t.recorder().new_measure_map().put_long(&m, (i * 7) as i64).record());
        let now = t.views().view_data("views/tx").unwrap().total_count();
        assert!(now >= last);
        assert_eq!(now, i);
        last = now;
    }
}

#[test]
fn boundaries_must_be_ascending_and_finite() {
    for bad in [vec![], vec![1.0, 1.0], vec![5.0, 1.0], vec![0.0, f64::INFINITY]] {
        let err = BucketBoundaries::new(bad).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::InvalidAggregation);
    }
}
