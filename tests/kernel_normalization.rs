use corrfilter::lowlevel::NORMALIZE_EPSILON;
use corrfilter::{BoundaryMode, Buffer, Correlator, Kernel};

#[test]
fn normalization_is_idempotent() {
    for seed in 0..8 {
        let once = Kernel::random(5, seed).unwrap().normalized();
        assert!(once.is_normalized());
        let twice = once.clone().normalized();
        for (a, b) in once.weights().iter().zip(twice.weights()) {
            assert!((a - b).abs() <= 1e-12, "seed={seed}");
        }
    }
}

#[test]
fn degenerate_sum_is_returned_unchanged() {
    let zero_sum = Kernel::new(3, vec![1.0, -1.0, 0.0, 2.0, -2.0, 0.0, 0.5, -0.5, 0.0]).unwrap();
    assert_eq!(zero_sum.clone().normalized(), zero_sum);

    let tiny = Kernel::new(1, vec![NORMALIZE_EPSILON / 2.0]).unwrap();
    assert_eq!(tiny.clone().normalized(), tiny);

    let all_zero = Kernel::new(3, vec![0.0; 9]).unwrap();
    assert_eq!(all_zero.clone().normalized(), all_zero);
}

#[test]
fn negative_sum_normalizes_to_one() {
    let kernel = Kernel::new(3, vec![-1.0; 9]).unwrap().normalized();
    assert!(kernel.is_normalized());
    assert!(kernel.weights().iter().all(|&w| (w - 1.0 / 9.0).abs() < 1e-15));
}

#[test]
fn normalized_box_preserves_flat_images() {
    let mut src = Buffer::<u8>::new(12, 9).unwrap();
    src.fill(77);
    let kernel = Kernel::random(5, 3).unwrap().normalized();
    let out = Correlator::new()
        .unwrap()
        .correlate(src.view(), &kernel, BoundaryMode::Clamped)
        .unwrap()
        .output;
    assert!(out.as_slice().iter().all(|&v| v == 77));
}
