//! # argreduce
//!
//! **Tiled argmin/argmax reduction on a simulated manycore accelerator.**
//!
//! argreduce finds, for every kept position of a tensor, the position (and
//! optionally the value) of the extremum along one axis. The work is planned
//! on the host and executed by a fixed set of cores that share no cache and
//! stage every tile through a small per-core scratch buffer.
//!
//! ## Pipeline
//!
//! - **Planning**: [`tiling::TilingPlanner`] views the input as
//!   `(A, R, nextA)` around the reduced axis, chooses one of eight tiling
//!   modes and sizes the tiles to the scratch budget.
//! - **Execution**: every core runs the kernel selected by the tiling on the
//!   unit range it owns. `GroupReduce` splits the reduced axis itself and
//!   merges per-core partials through a global workspace after a barrier.
//! - **Semantics**: ties keep the lowest position; NaN never beats a number,
//!   so an all-NaN run yields index 0.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use argreduce::prelude::*;
//!
//! let client = AccelClient::with_config(DeviceConfig::default())?;
//! let a = Tensor::from_slice(&[1.0f32, 9.0, 3.0, 9.0], &[2, 2]);
//!
//! let idx = client.argmax(&a, 1, false)?;
//! assert_eq!(idx.to_vec::<i64>(), vec![1, 1]);
//! ```
//!
//! ## Configuration
//!
//! - `ARGREDUCE_CORE_NUM`: number of simulated cores (default 48)
//! - `ARGREDUCE_UB_SIZE`: per-core scratch bytes (default 196608)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub(crate) mod kernels;
pub mod ops;
pub mod runtime;
pub mod tensor;
pub mod tiling;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::ops::{ArgReduceOps, ArgReduceOutput, ArgReduceParams, ReduceDirection};
    pub use crate::runtime::{AccelClient, AccelDevice, Device, DeviceConfig, PlatformInfo};
    pub use crate::tensor::Tensor;
    pub use crate::tiling::{PlannerOptions, TilingMode};
}
