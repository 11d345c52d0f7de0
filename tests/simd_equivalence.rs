#![cfg(feature = "simd")]

use corrfilter::{BoundaryMode, Buffer, CorrelateConfig, Correlator, Element, Kernel, Shape};

fn run<T: Element>(
    src: &Buffer<T>,
    kernel: &Kernel,
    mode: BoundaryMode,
    vectorize: bool,
) -> Buffer<T> {
    Correlator::with_config(CorrelateConfig {
        workers: Some(2),
        vectorize,
        ..CorrelateConfig::default()
    })
    .unwrap()
    .correlate(src.view(), kernel, mode)
    .unwrap()
    .output
}

#[test]
fn vectorized_rows_match_scalar_bit_for_bit() {
    for (rows, cols) in [(5, 5), (17, 23), (40, 9), (3, 64)] {
        let mut src = Buffer::<f64>::new(rows, cols).unwrap();
        src.fill_random((rows * cols) as u64);
        for k in [1usize, 3, 5] {
            let kernel = Kernel::random(k, 1).unwrap().normalized();
            for mode in [BoundaryMode::Valid, BoundaryMode::Clamped] {
                if mode == BoundaryMode::Valid && k > rows.min(cols) {
                    continue;
                }
                let scalar = run(&src, &kernel, mode, false);
                let simd = run(&src, &kernel, mode, true);
                let same = scalar
                    .as_slice()
                    .iter()
                    .zip(simd.as_slice())
                    .all(|(a, b)| a.to_bits() == b.to_bits());
                assert!(same, "{rows}x{cols} k={k} mode={mode}");
            }
        }
    }
}

#[test]
fn vectorized_multichannel_u8_matches_scalar() {
    let mut src = Buffer::<u8>::with_shape(Shape::new(21, 19).unwrap(), 4).unwrap();
    src.fill_random(8);
    let kernel = Kernel::box_filter(3).unwrap();
    assert_eq!(
        run(&src, &kernel, BoundaryMode::Clamped, true),
        run(&src, &kernel, BoundaryMode::Clamped, false)
    );
}
