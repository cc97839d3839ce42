//! DType dispatch utilities for arg-reduction launches
//!
//! Kernels are generic over the value type and the index type; these macros
//! turn runtime [`DType`](crate::dtype::DType) values into concrete types.
//!
//! # Usage
//!
//! ```ignore
//! fn launch(dtype: DType, index_dtype: DType) -> Result<()> {
//!     dispatch_arg_dtype!(dtype, T => {
//!         dispatch_index_dtype!(index_dtype, I => {
//!             run::<T, I>()
//!         }, "arg_reduce")
//!     }, "arg_reduce")
//! }
//! ```
//!
//! ## Supported Value Types
//!
//! - `F32` -> `f32`
//! - `F16` -> `half::f16`
//! - `BF16` -> `half::bf16`
//! - `I64` -> `i64`
//! - `I32` -> `i32`
//! - `I16` -> `i16`
//! - `I8` -> `i8`
//! - `U8` -> `u8`
//!
//! Every other dtype returns `UnsupportedDType`.

/// Dispatch a value dtype to a concrete [`ArgElement`](crate::dtype::ArgElement) type
#[macro_export]
macro_rules! dispatch_arg_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                type $T = half::f16;
                $body
            }
            $crate::dtype::DType::BF16 => {
                type $T = half::bf16;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            other => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: other,
                    op: $error_op,
                })
            }
        }
    };
}

/// Dispatch an index dtype to a concrete [`IndexElement`](crate::dtype::IndexElement) type
#[macro_export]
macro_rules! dispatch_index_dtype {
    ($dtype:expr, $I:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::I64 => {
                type $I = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $I = i32;
                $body
            }
            other => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: other,
                    op: $error_op,
                })
            }
        }
    };
}
