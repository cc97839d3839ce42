//! Operation traits

mod arg_reduce;

pub use arg_reduce::{ArgReduceOps, ArgReduceOutput, ArgReduceParams, ReduceDirection};
