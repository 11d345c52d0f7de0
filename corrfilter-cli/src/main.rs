use clap::{Parser, ValueEnum};
use corrfilter::{
    run_scoped, BoundaryMode, BufferLifecycle, BufferPool, CorrelateConfig, Correlator, Element,
    FreshAllocator, Kernel, LifecycleStats, PinnedAllocator, Shape, StrategyKind,
    UnmanagedAllocator,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "CorrFilter CLI (synthetic correlation runs)")]
struct Cli {
    /// Source rows.
    #[arg(long, default_value_t = 512)]
    rows: usize,
    /// Source columns.
    #[arg(long, default_value_t = 512)]
    cols: usize,
    /// Interleaved channels per cell.
    #[arg(long, default_value_t = 1)]
    channels: usize,
    /// Copy the last channel through unfiltered.
    #[arg(long)]
    passthrough: bool,
    /// Kernel side length (odd).
    #[arg(long, default_value_t = 5)]
    kernel_size: usize,
    /// Kernel weights.
    #[arg(long, value_enum, default_value_t = KernelChoice::Random)]
    kernel: KernelChoice,
    /// Seed for the source fill and random kernels.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Boundary mode: valid or clamped.
    #[arg(long, default_value = "clamped")]
    mode: BoundaryMode,
    /// Element type.
    #[arg(long, value_enum, default_value_t = ElementChoice::U8)]
    element: ElementChoice,
    /// Worker count; defaults to one per logical core.
    #[arg(long)]
    workers: Option<usize>,
    /// Buffer lifecycle strategy: fresh, pool, pinned or unmanaged.
    #[arg(long, default_value = "pool")]
    strategy: StrategyKind,
    /// Number of correlation runs.
    #[arg(long, default_value_t = 5)]
    iterations: usize,
    /// Retained buffers for the pool strategy.
    #[arg(long, default_value_t = 2)]
    pool_capacity: usize,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KernelChoice {
    /// Uniform box filter.
    Box,
    /// Seeded random weights, normalized.
    Random,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ElementChoice {
    U8,
    F64,
}

#[derive(Debug, Serialize)]
struct StatsRecord {
    acquired: usize,
    allocated: usize,
    reused: usize,
    released: usize,
    discarded: usize,
    freed: usize,
    released_on_drop: usize,
}

impl From<LifecycleStats> for StatsRecord {
    fn from(value: LifecycleStats) -> Self {
        Self {
            acquired: value.acquired,
            allocated: value.allocated,
            reused: value.reused,
            released: value.released,
            discarded: value.discarded,
            freed: value.freed,
            released_on_drop: value.released_on_drop,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    element: &'static str,
    strategy: String,
    mode: String,
    rows: usize,
    cols: usize,
    channels: usize,
    kernel_size: usize,
    workers: usize,
    output_rows: usize,
    output_cols: usize,
    elapsed_ms: Vec<f64>,
    checksum: f64,
    source_stats: StatsRecord,
    destination_stats: StatsRecord,
}

struct Run<'a> {
    cli: &'a Cli,
    correlator: &'a Correlator,
    kernel: &'a Kernel,
}

impl Run<'_> {
    fn execute<T, S, D>(
        &self,
        source: &S,
        destination: &D,
    ) -> Result<Output, Box<dyn std::error::Error>>
    where
        T: Element,
        S: BufferLifecycle<T>,
        D: BufferLifecycle<T>,
    {
        let cli = self.cli;
        let mut elapsed_ms = Vec::with_capacity(cli.iterations);
        let mut checksum = 0.0;
        let mut output_shape = destination.shape();

        for _ in 0..cli.iterations {
            let (sum, report) = run_scoped(
                source,
                destination,
                self.correlator,
                self.kernel,
                cli.mode,
                |mut src| src.fill_random(cli.seed),
                |dst| dst.as_slice().iter().map(|v| v.to_acc()).sum::<f64>(),
            )?;
            elapsed_ms.push(report.elapsed.as_secs_f64() * 1e3);
            checksum = sum;
            output_shape = report.output_shape;
        }

        Ok(Output {
            element: T::NAME,
            strategy: source.kind().to_string(),
            mode: cli.mode.to_string(),
            rows: cli.rows,
            cols: cli.cols,
            channels: cli.channels,
            kernel_size: self.kernel.size(),
            workers: self.correlator.workers(),
            output_rows: output_shape.rows(),
            output_cols: output_shape.cols(),
            elapsed_ms,
            checksum,
            source_stats: source.stats().into(),
            destination_stats: destination.stats().into(),
        })
    }

    fn with_strategy<T: Element>(
        &self,
        src_shape: Shape,
        dst_shape: Shape,
    ) -> Result<Output, Box<dyn std::error::Error>> {
        let (cli, ch) = (self.cli, self.cli.channels);
        match cli.strategy {
            StrategyKind::Fresh => self.execute::<T, _, _>(
                &FreshAllocator::<T>::with_channels(src_shape, ch),
                &FreshAllocator::<T>::with_channels(dst_shape, ch),
            ),
            StrategyKind::Pool => self.execute::<T, _, _>(
                &BufferPool::<T>::with_channels(src_shape, ch, cli.pool_capacity),
                &BufferPool::<T>::with_channels(dst_shape, ch, cli.pool_capacity),
            ),
            StrategyKind::Pinned => self.execute::<T, _, _>(
                &PinnedAllocator::<T>::with_channels(src_shape, ch),
                &PinnedAllocator::<T>::with_channels(dst_shape, ch),
            ),
            StrategyKind::Unmanaged => self.execute::<T, _, _>(
                &UnmanagedAllocator::<T>::with_channels(src_shape, ch),
                &UnmanagedAllocator::<T>::with_channels(dst_shape, ch),
            ),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("corrfilter=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.iterations == 0 {
        return Err("iterations must be at least 1".into());
    }

    let kernel = match cli.kernel {
        KernelChoice::Box => Kernel::box_filter(cli.kernel_size)?,
        KernelChoice::Random => Kernel::random(cli.kernel_size, cli.seed)?.normalized(),
    };
    let correlator = Correlator::with_config(CorrelateConfig {
        workers: cli.workers,
        passthrough_last_channel: cli.passthrough,
        ..CorrelateConfig::default()
    })?;

    let src_shape = Shape::new(cli.rows, cli.cols)?;
    let dst_shape = cli.mode.output_shape(src_shape, kernel.size())?;
    let run = Run {
        cli: &cli,
        correlator: &correlator,
        kernel: &kernel,
    };
    let output = match cli.element {
        ElementChoice::U8 => run.with_strategy::<u8>(src_shape, dst_shape)?,
        ElementChoice::F64 => run.with_strategy::<f64>(src_shape, dst_shape)?,
    };

    let json = serde_json::to_string_pretty(&output)?;
    println!("{json}");
    Ok(())
}
