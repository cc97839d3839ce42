//! Accelerator implementations of operation traits.

mod arg_reduce;
