//! Tensor types
//!
//! This module provides the host-side `Tensor` type: a contiguous, row-major,
//! dtype-erased array whose storage stands in for device global memory.

mod core;
mod storage;

pub use core::Tensor;
pub(crate) use storage::Storage;
