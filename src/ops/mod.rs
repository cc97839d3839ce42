//! Operations on tensors
//!
//! [`ArgReduceOps`] describes the operations; the accelerator client
//! implements it by planning a tiling and launching kernels on its cores.

mod accel;
mod dispatch;
mod traits;

pub use traits::{ArgReduceOps, ArgReduceOutput, ArgReduceParams, ReduceDirection};
