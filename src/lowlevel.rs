//! Low-level building blocks for custom correlation pipelines.
//!
//! These expose the coordinate sampler, single-cell evaluation and the row
//! executor for hosts that schedule work themselves. Most users should prefer
//! [`Correlator`](crate::Correlator).

pub use crate::engine::executor::{default_workers, Executor};
pub use crate::engine::sampler::{clamp_sample, sample};
pub use crate::engine::scalar::correlate_cell;
pub use crate::kernel::NORMALIZE_EPSILON;
pub use crate::lifecycle::{FreshLease, PoolLease};
