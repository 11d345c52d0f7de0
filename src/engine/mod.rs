//! Windowed correlation engine.
//!
//! A [`Job`] pairs a source view with a [`Kernel`] and a [`BoundaryMode`].
//! A [`Correlator`] owns the worker pool and runs jobs either into a freshly
//! allocated buffer or into a caller-supplied destination. Destination shape
//! and channel checks happen before any cell is written.

use crate::buffer::{Buffer, BufferView, BufferViewMut, Element, Shape};
use crate::kernel::Kernel;
use crate::trace::{trace_event, trace_span};
use crate::util::{CorrFilterError, CorrFilterResult};
use std::time::{Duration, Instant};

pub mod executor;
pub mod sampler;
pub(crate) mod scalar;

#[cfg(feature = "simd")]
pub(crate) mod simd;

pub use executor::Executor;
pub use sampler::BoundaryMode;
use scalar::RowContext;

/// Engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorrelateConfig {
    /// Worker count; `None` uses one worker per logical core.
    pub workers: Option<usize>,
    /// Copy the last channel of multi-channel buffers through unfiltered.
    pub passthrough_last_channel: bool,
    /// Use the vectorized row kernel when the `simd` feature is enabled.
    pub vectorize: bool,
}

impl Default for CorrelateConfig {
    fn default() -> Self {
        Self {
            workers: None,
            passthrough_last_channel: false,
            vectorize: true,
        }
    }
}

/// Source, kernel and boundary mode of one correlation.
#[derive(Clone, Copy, Debug)]
pub struct Job<'a, T> {
    source: BufferView<'a, T>,
    kernel: &'a Kernel,
    mode: BoundaryMode,
    output_shape: Shape,
}

impl<'a, T: Element> Job<'a, T> {
    /// Validates that the kernel fits the source for `mode`.
    pub fn new(
        source: BufferView<'a, T>,
        kernel: &'a Kernel,
        mode: BoundaryMode,
    ) -> CorrFilterResult<Self> {
        let output_shape = mode.output_shape(source.shape(), kernel.size())?;
        Ok(Self {
            source,
            kernel,
            mode,
            output_shape,
        })
    }

    /// Returns the source view.
    pub fn source(&self) -> BufferView<'a, T> {
        self.source
    }

    /// Returns the kernel.
    pub fn kernel(&self) -> &'a Kernel {
        self.kernel
    }

    /// Returns the boundary mode.
    pub fn mode(&self) -> BoundaryMode {
        self.mode
    }

    /// Returns the mode-determined output shape.
    pub fn output_shape(&self) -> Shape {
        self.output_shape
    }

    /// Checks that `shape` and `channels` describe a valid destination.
    pub fn check_destination(&self, shape: Shape, channels: usize) -> CorrFilterResult<()> {
        if shape != self.output_shape {
            return Err(CorrFilterError::DimensionMismatch {
                expected_rows: self.output_shape.rows(),
                expected_cols: self.output_shape.cols(),
                got_rows: shape.rows(),
                got_cols: shape.cols(),
            });
        }
        if channels != self.source.channels() {
            return Err(CorrFilterError::ChannelMismatch {
                expected: self.source.channels(),
                got: channels,
            });
        }
        Ok(())
    }
}

/// Timing and partitioning of a completed job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobReport {
    /// Shape of the written destination.
    pub output_shape: Shape,
    /// Interleaved channels per cell.
    pub channels: usize,
    /// Workers available to the job.
    pub workers: usize,
    /// Row chunks dispatched.
    pub chunks: usize,
    /// Wall time of the correlation call.
    pub elapsed: Duration,
}

/// Freshly allocated output of a job.
#[derive(Clone, Debug)]
pub struct Correlation<T> {
    pub output: Buffer<T>,
    pub report: JobReport,
}

/// Runs correlation jobs on a fixed worker pool.
#[derive(Debug)]
pub struct Correlator {
    config: CorrelateConfig,
    executor: Executor,
}

impl Correlator {
    /// Creates a correlator with the default configuration.
    pub fn new() -> CorrFilterResult<Self> {
        Self::with_config(CorrelateConfig::default())
    }

    /// Creates a correlator and its worker pool from `config`.
    pub fn with_config(config: CorrelateConfig) -> CorrFilterResult<Self> {
        let executor = Executor::new(config.workers)?;
        Ok(Self { config, executor })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CorrelateConfig {
        &self.config
    }

    /// Returns the worker count.
    pub fn workers(&self) -> usize {
        self.executor.workers()
    }

    /// Runs `job` into a newly allocated buffer.
    pub fn run<T: Element>(&self, job: &Job<'_, T>) -> CorrFilterResult<Correlation<T>> {
        let mut output = Buffer::with_shape(job.output_shape(), job.source().channels())?;
        let report = self.run_into(job, output.view_mut())?;
        Ok(Correlation { output, report })
    }

    /// Runs `job` into `dst`, which must have the job's output shape and the
    /// source's channel count.
    ///
    /// On error nothing has been written to `dst`.
    pub fn run_into<T: Element>(
        &self,
        job: &Job<'_, T>,
        dst: BufferViewMut<'_, T>,
    ) -> CorrFilterResult<JobReport> {
        job.check_destination(dst.shape(), dst.channels())?;

        let out = job.output_shape();
        let channels = dst.channels();
        let _span = trace_span!(
            "correlate",
            mode = job.mode().as_str(),
            rows = out.rows(),
            cols = out.cols(),
            kernel = job.kernel().size(),
            workers = self.workers()
        )
        .entered();

        let ctx = RowContext {
            src: job.source(),
            kernel: job.kernel(),
            mode: job.mode(),
            passthrough: self.config.passthrough_last_channel,
            out_cols: out.cols(),
        };
        let row_len = dst.row_len();
        let vectorize = self.config.vectorize;

        let start = Instant::now();
        let chunks = self
            .executor
            .run_rows(dst.into_slice(), row_len, |i, row| {
                correlate_row_dispatch(&ctx, i, row, vectorize)
            });
        let elapsed = start.elapsed();

        trace_event!(
            "job_complete",
            chunks = chunks,
            elapsed_us = elapsed.as_micros() as u64
        );

        Ok(JobReport {
            output_shape: out,
            channels,
            workers: self.workers(),
            chunks,
            elapsed,
        })
    }

    /// Builds and runs a job in one call.
    pub fn correlate<T: Element>(
        &self,
        source: BufferView<'_, T>,
        kernel: &Kernel,
        mode: BoundaryMode,
    ) -> CorrFilterResult<Correlation<T>> {
        let job = Job::new(source, kernel, mode)?;
        self.run(&job)
    }
}

#[inline]
fn correlate_row_dispatch<T: Element>(
    ctx: &RowContext<'_, T>,
    i: usize,
    row: &mut [T],
    vectorize: bool,
) {
    #[cfg(feature = "simd")]
    {
        if vectorize {
            simd::correlate_row_simd(ctx, i, row);
            return;
        }
    }
    #[cfg(not(feature = "simd"))]
    let _ = vectorize;
    scalar::correlate_row(ctx, i, row);
}
