use corrfilter::{BoundaryMode, Buffer, CorrelateConfig, Correlator, Kernel};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    rows: usize,
    cols: usize,
    source: Vec<f64>,
    kernel_size: usize,
    weights: Vec<f64>,
    mode: String,
    out_rows: usize,
    out_cols: usize,
    expected: Vec<f64>,
}

const CASES: &str = r#"[
  {
    "name": "identity_clamped",
    "rows": 3, "cols": 4,
    "source": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    "kernel_size": 1, "weights": [1],
    "mode": "clamped",
    "out_rows": 3, "out_cols": 4,
    "expected": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]
  },
  {
    "name": "ones_valid",
    "rows": 3, "cols": 3,
    "source": [1, 2, 3, 4, 5, 6, 7, 8, 9],
    "kernel_size": 3, "weights": [1, 1, 1, 1, 1, 1, 1, 1, 1],
    "mode": "valid",
    "out_rows": 1, "out_cols": 1,
    "expected": [45]
  },
  {
    "name": "ones_clamped",
    "rows": 3, "cols": 3,
    "source": [1, 2, 3, 4, 5, 6, 7, 8, 9],
    "kernel_size": 3, "weights": [1, 1, 1, 1, 1, 1, 1, 1, 1],
    "mode": "clamped",
    "out_rows": 3, "out_cols": 3,
    "expected": [21, 27, 33, 39, 45, 51, 57, 63, 69]
  },
  {
    "name": "laplacian_clamped",
    "rows": 4, "cols": 4,
    "source": [0, 0, 0, 0, 0, 8, 8, 0, 0, 8, 8, 0, 0, 0, 0, 0],
    "kernel_size": 3, "weights": [0, 1, 0, 1, -4, 1, 0, 1, 0],
    "mode": "clamped",
    "out_rows": 4, "out_cols": 4,
    "expected": [0, 8, 8, 0, 8, -16, -16, 8, 8, -16, -16, 8, 0, 8, 8, 0]
  },
  {
    "name": "scaled_valid",
    "rows": 2, "cols": 5,
    "source": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
    "kernel_size": 1, "weights": [3],
    "mode": "valid",
    "out_rows": 2, "out_cols": 5,
    "expected": [3, 6, 9, 12, 15, 18, 21, 24, 27, 30]
  },
  {
    "name": "bottom_right_tap_valid",
    "rows": 4, "cols": 3,
    "source": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    "kernel_size": 3, "weights": [0, 0, 0, 0, 0, 0, 0, 0, 1],
    "mode": "valid",
    "out_rows": 2, "out_cols": 1,
    "expected": [8, 11]
  }
]"#;

fn cases() -> Vec<Case> {
    serde_json::from_str(CASES).expect("golden cases parse")
}

fn correlator() -> Correlator {
    Correlator::with_config(CorrelateConfig {
        workers: Some(2),
        ..CorrelateConfig::default()
    })
    .unwrap()
}

#[test]
fn golden_cases_f64() {
    for case in cases() {
        let mode: BoundaryMode = case.mode.parse().unwrap();
        let src = Buffer::from_vec(case.source.clone(), case.rows, case.cols).unwrap();
        let kernel = Kernel::new(case.kernel_size, case.weights.clone()).unwrap();
        let out = correlator()
            .correlate(src.view(), &kernel, mode)
            .unwrap()
            .output;
        assert_eq!((out.rows(), out.cols()), (case.out_rows, case.out_cols), "{}", case.name);
        assert_eq!(out.as_slice(), case.expected.as_slice(), "{}", case.name);
    }
}

#[test]
fn golden_cases_u8_saturate() {
    for case in cases() {
        let mode: BoundaryMode = case.mode.parse().unwrap();
        let data: Vec<u8> = case.source.iter().map(|&v| v as u8).collect();
        let src = Buffer::from_vec(data, case.rows, case.cols).unwrap();
        let kernel = Kernel::new(case.kernel_size, case.weights.clone()).unwrap();
        let out = correlator()
            .correlate(src.view(), &kernel, mode)
            .unwrap()
            .output;
        let expected: Vec<u8> = case
            .expected
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        assert_eq!(out.as_slice(), expected.as_slice(), "{}", case.name);
    }
}
