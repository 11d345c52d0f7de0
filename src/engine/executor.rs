//! Row-partitioned parallel executor.
//!
//! The output rows `[0, rows)` are split into at most `workers` contiguous
//! chunks. Each chunk is a disjoint `&mut` slice of the destination, so
//! workers never share mutable state and the result does not depend on the
//! worker count or on scheduling order. `run_rows` returns only after every
//! chunk has finished.

use crate::util::math::div_ceil;
use crate::util::{CorrFilterError, CorrFilterResult};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Returns the number of logical execution units, at least 1.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Fixed-size worker pool for row-partitioned jobs.
#[derive(Debug)]
pub struct Executor {
    workers: usize,
    #[cfg(feature = "rayon")]
    pool: rayon::ThreadPool,
}

impl Executor {
    /// Creates an executor with `workers` threads, or one per logical core
    /// when `None`.
    pub fn new(workers: Option<usize>) -> CorrFilterResult<Self> {
        let workers = match workers {
            Some(0) => {
                return Err(CorrFilterError::InvalidConfig {
                    reason: "workers must be at least 1",
                })
            }
            Some(n) => n,
            None => default_workers(),
        };

        #[cfg(feature = "rayon")]
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|idx| format!("corrfilter-worker-{idx}"))
                .build()
                .map_err(|err| CorrFilterError::ThreadPool {
                    reason: err.to_string(),
                })?;
            Ok(Self { workers, pool })
        }

        #[cfg(not(feature = "rayon"))]
        {
            Ok(Self { workers })
        }
    }

    /// Returns the configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the rows per chunk used for `rows` output rows.
    pub fn rows_per_chunk(&self, rows: usize) -> usize {
        div_ceil(rows.max(1), self.workers)
    }

    /// Runs `f(row_index, row)` for every row of `dst` and returns the number
    /// of chunks dispatched.
    ///
    /// `dst.len()` must be a multiple of `row_len`.
    pub fn run_rows<T, F>(&self, dst: &mut [T], row_len: usize, f: F) -> usize
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        if row_len == 0 || dst.is_empty() {
            return 0;
        }
        debug_assert_eq!(dst.len() % row_len, 0);
        let rows = dst.len() / row_len;
        let rows_per_chunk = self.rows_per_chunk(rows);
        let chunk_len = rows_per_chunk * row_len;
        let chunks = div_ceil(rows, rows_per_chunk);

        let run_chunk = |chunk_idx: usize, chunk: &mut [T]| {
            let first_row = chunk_idx * rows_per_chunk;
            for (offset, row) in chunk.chunks_mut(row_len).enumerate() {
                f(first_row + offset, row);
            }
        };

        #[cfg(feature = "rayon")]
        {
            if chunks > 1 {
                self.pool.install(|| {
                    dst.par_chunks_mut(chunk_len)
                        .enumerate()
                        .for_each(|(idx, chunk)| run_chunk(idx, chunk));
                });
                return chunks;
            }
        }

        for (idx, chunk) in dst.chunks_mut(chunk_len).enumerate() {
            run_chunk(idx, chunk);
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::Executor;
    use crate::CorrFilterError;

    #[test]
    fn zero_workers_is_rejected() {
        assert_eq!(
            Executor::new(Some(0)).unwrap_err(),
            CorrFilterError::InvalidConfig {
                reason: "workers must be at least 1"
            }
        );
    }

    #[test]
    fn default_uses_available_parallelism() {
        let exec = Executor::new(None).unwrap();
        assert_eq!(exec.workers(), super::default_workers());
    }

    #[test]
    fn every_row_is_visited_once_with_its_index() {
        for workers in [1, 2, 3, 8] {
            let exec = Executor::new(Some(workers)).unwrap();
            let mut dst = vec![0usize; 10 * 4];
            let chunks = exec.run_rows(&mut dst, 4, |row, out| {
                for v in out.iter_mut() {
                    *v += row + 1;
                }
            });
            assert!(chunks <= workers);
            for (row, chunk) in dst.chunks(4).enumerate() {
                assert!(chunk.iter().all(|&v| v == row + 1));
            }
        }
    }

    #[test]
    fn chunks_cover_rows_contiguously() {
        let exec = Executor::new(Some(4)).unwrap();
        assert_eq!(exec.rows_per_chunk(10), 3);
        let mut dst = vec![0u8; 10];
        assert_eq!(exec.run_rows(&mut dst, 1, |_, _| {}), 4);
    }
}
