use billbench_loadgen::metrics::{mean, percentile, population_stdev, round2, sorted};

fn one_to_ten() -> Vec<f64> {
    (1..=10).map(f64::from).collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// --- percentile ---

#[test]
fn test_percentile_interpolates_between_ranks() {
    assert!(close(percentile(&one_to_ten(), 40.0), 4.6));
}

#[test]
fn test_percentile_p90_of_five() {
    assert!(close(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 90.0), 4.6));
}

#[test]
fn test_percentile_hits_exact_rank() {
    // (5 - 1) * 0.5 = 2, no interpolation needed.
    assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 50.0), 3.0);
}

#[test]
fn test_percentile_bounds_are_min_and_max() {
    let values = one_to_ten();
    assert_eq!(percentile(&values, 0.0), 1.0);
    assert_eq!(percentile(&values, -5.0), 1.0);
    assert_eq!(percentile(&values, 100.0), 10.0);
    assert_eq!(percentile(&values, 150.0), 10.0);
}

#[test]
fn test_percentile_of_empty_is_zero() {
    assert_eq!(percentile(&[], 50.0), 0.0);
    assert_eq!(percentile(&[], 99.0), 0.0);
}

#[test]
fn test_percentile_of_single_sample() {
    for p in [0.0, 1.0, 50.0, 99.0, 100.0] {
        assert_eq!(percentile(&[7.5], p), 7.5);
    }
}

#[test]
fn test_percentile_is_monotonic_in_p() {
    let values = sorted([12.0, 3.5, 99.0, 42.0, 7.25, 18.0, 1.0]);
    let mut prev = f64::MIN;
    for step in 0..=100 {
        let v = percentile(&values, step as f64);
        assert!(v >= prev, "p{step} = {v} < {prev}");
        assert!(v >= values[0] && v <= values[values.len() - 1]);
        prev = v;
    }
}

#[test]
fn test_percentile_of_constant_samples() {
    let values = vec![12.5; 20];
    for p in [1.0, 50.0, 90.0, 99.0] {
        assert_eq!(percentile(&values, p), 12.5);
    }
}

// --- mean / stdev ---

#[test]
fn test_mean() {
    assert_eq!(mean(&[]), 0.0);
    assert_eq!(mean(&[2.0, 4.0, 9.0]), 5.0);
}

#[test]
fn test_population_stdev() {
    let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert!(close(population_stdev(&values), 2.0));
}

#[test]
fn test_stdev_needs_two_samples() {
    assert_eq!(population_stdev(&[]), 0.0);
    assert_eq!(population_stdev(&[42.0]), 0.0);
}

// --- helpers ---

#[test]
fn test_round2() {
    assert_eq!(round2(1.234), 1.23);
    assert_eq!(round2(1.235_1), 1.24);
    assert_eq!(round2(-0.004), -0.0);
    assert_eq!(round2(10.0), 10.0);
}

#[test]
fn test_sorted_is_ascending() {
    assert_eq!(sorted([3.0, 1.0, 2.0]), vec![1.0, 2.0, 3.0]);
    assert!(sorted(std::iter::empty()).is_empty());
}
