use corrfilter::lowlevel::{clamp_sample, correlate_cell, sample};
use corrfilter::{BoundaryMode, Buffer, CorrFilterError, CorrelateConfig, Correlator, Kernel, Shape};

fn correlator() -> Correlator {
    Correlator::with_config(CorrelateConfig {
        workers: Some(2),
        ..CorrelateConfig::default()
    })
    .unwrap()
}

fn index_buffer(rows: usize, cols: usize) -> Buffer<f64> {
    let mut buf = Buffer::<f64>::new(rows, cols).unwrap();
    buf.fill_index_pattern();
    buf
}

#[test]
fn output_shapes_follow_mode() {
    for rows in 1..=9 {
        for cols in 1..=9 {
            let src = Buffer::<u8>::new(rows, cols).unwrap();
            for k in [1usize, 3, 5, 7] {
                let kernel = Kernel::box_filter(k).unwrap();
                let clamped = correlator()
                    .correlate(src.view(), &kernel, BoundaryMode::Clamped)
                    .unwrap();
                assert_eq!(clamped.output.shape(), src.shape());

                let valid = correlator().correlate(src.view(), &kernel, BoundaryMode::Valid);
                if k <= rows.min(cols) {
                    let out = valid.unwrap().output;
                    assert_eq!((out.rows(), out.cols()), (rows - k + 1, cols - k + 1));
                } else {
                    assert_eq!(
                        valid.unwrap_err(),
                        CorrFilterError::KernelTooLarge {
                            kernel: k,
                            rows,
                            cols
                        }
                    );
                }
            }
        }
    }
}

#[test]
fn clamped_box_over_index_pattern() {
    let src = index_buffer(7, 7);
    let kernel = Kernel::box_filter(3).unwrap();
    let out = correlator()
        .correlate(src.view(), &kernel, BoundaryMode::Clamped)
        .unwrap()
        .output;
    let centre = out.get(3, 3).unwrap();
    assert!((centre - 24.0).abs() < 1e-12, "got {centre}");

    let as_u8 = {
        let mut buf = Buffer::<u8>::new(7, 7).unwrap();
        buf.fill_index_pattern();
        correlator()
            .correlate(buf.view(), &kernel, BoundaryMode::Clamped)
            .unwrap()
            .output
    };
    assert_eq!(as_u8.get(3, 3), Some(24));
}

#[test]
fn valid_cell_is_window_dot_product() {
    let src = index_buffer(7, 7);
    let kernel = Kernel::random(3, 5).unwrap();
    let out = correlator()
        .correlate(src.view(), &kernel, BoundaryMode::Valid)
        .unwrap()
        .output;
    assert_eq!(out.shape(), Shape::new(5, 5).unwrap());

    let mut expected = 0.0;
    for ky in 0..3 {
        for kx in 0..3 {
            expected += src.get(ky, kx).unwrap() * kernel.get(ky, kx).unwrap();
        }
    }
    assert_eq!(out.get(0, 0), Some(expected));
}

#[test]
fn corner_clamps_to_edge_cells() {
    let src = index_buffer(4, 5);
    let weights: Vec<f64> = (1..=9).map(f64::from).collect();
    let kernel = Kernel::new(3, weights).unwrap();

    let mut expected = 0.0;
    for ky in 0..3 {
        for kx in 0..3 {
            let (y, x) = clamp_sample(ky as isize - 1, kx as isize - 1, src.shape());
            expected += src.get(y, x).unwrap() * kernel.get(ky, kx).unwrap();
        }
    }
    // rows and columns above/left of the corner replicate row 0 / column 0
    let by_hand = 1.0 * 0.0
        + 2.0 * 0.0
        + 3.0 * 1.0
        + 4.0 * 0.0
        + 5.0 * 0.0
        + 6.0 * 1.0
        + 7.0 * 5.0
        + 8.0 * 5.0
        + 9.0 * 6.0;
    assert_eq!(expected, by_hand);

    let out = correlator()
        .correlate(src.view(), &kernel, BoundaryMode::Clamped)
        .unwrap()
        .output;
    assert_eq!(out.get(0, 0), Some(expected));
    assert_eq!(
        correlate_cell(src.view(), &kernel, BoundaryMode::Clamped, 0, 0, 0),
        Some(expected)
    );
}

#[test]
fn sampler_replicates_edges_only() {
    let shape = Shape::new(3, 4).unwrap();
    assert_eq!(clamp_sample(-5, -1, shape), (0, 0));
    assert_eq!(clamp_sample(3, 4, shape), (2, 3));
    assert_eq!(clamp_sample(1, 2, shape), (1, 2));
    assert_eq!(sample(BoundaryMode::Clamped, shape, 1, 0, 3, 0, 2), (0, 3));
    assert_eq!(sample(BoundaryMode::Valid, shape, 1, 0, 1, 2, 2), (2, 3));
}

#[test]
fn clamped_matches_cellwise_reference_everywhere() {
    let mut src = Buffer::<f64>::new(9, 11).unwrap();
    src.fill_random(7);
    for k in [1usize, 3, 5] {
        let kernel = Kernel::random(k, k as u64).unwrap().normalized();
        for mode in [BoundaryMode::Valid, BoundaryMode::Clamped] {
            let out = correlator().correlate(src.view(), &kernel, mode).unwrap().output;
            for i in 0..out.rows() {
                for j in 0..out.cols() {
                    let want = correlate_cell(src.view(), &kernel, mode, i, j, 0).unwrap();
                    assert_eq!(out.get(i, j), Some(want), "mode={mode} k={k} ({i},{j})");
                }
            }
        }
    }
}

#[test]
fn integer_output_rounds_and_saturates() {
    let src = Buffer::<u8>::from_vec(vec![200, 200, 200, 200], 2, 2).unwrap();
    let double = Kernel::new(1, vec![2.0]).unwrap();
    let out = correlator()
        .correlate(src.view(), &double, BoundaryMode::Valid)
        .unwrap()
        .output;
    assert!(out.as_slice().iter().all(|&v| v == 255));

    let negative = Kernel::new(1, vec![-1.0]).unwrap();
    let out = correlator()
        .correlate(src.view(), &negative, BoundaryMode::Valid)
        .unwrap()
        .output;
    assert!(out.as_slice().iter().all(|&v| v == 0));

    let src = Buffer::<u8>::from_vec(vec![5], 1, 1).unwrap();
    let half = Kernel::new(1, vec![0.5]).unwrap();
    let out = correlator()
        .correlate(src.view(), &half, BoundaryMode::Clamped)
        .unwrap()
        .output;
    assert_eq!(out.get(0, 0), Some(3));
}
