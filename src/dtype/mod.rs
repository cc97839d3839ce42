//! Data type system for argreduce tensors
//!
//! This module provides the `DType` enum describing the element type of a
//! tensor at runtime, the `Element` trait tying Rust types to it, and the
//! narrower traits the reduction kernels are generic over.

mod arg;
mod element;

pub use arg::{ArgElement, IndexElement, Lane};
pub use element::Element;

use std::fmt;

// ============================================================================
// DType Enum
// ============================================================================

/// Data types a tensor can hold
///
/// Only a subset of these is accepted by the arg-reduction engine (see
/// [`DType::is_arg_value`] and [`DType::is_arg_index`]); the remaining
/// variants exist so that unsupported inputs are described precisely in
/// errors instead of being unrepresentable.
///
/// # Discriminant Values (Serialization Stability)
///
/// - Floats: 0-9 (F64=0, F32=1, F16=2, BF16=3)
/// - Signed ints: 10-19 (I64=10, I32=11, I16=12, I8=13)
/// - Unsigned ints: 20-29 (U64=20, U32=21, U16=22, U8=23)
/// - Bool: 30
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum DType {
    // Floating point types (0-9)
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point
    F32 = 1,
    /// 16-bit floating point (IEEE 754)
    F16 = 2,
    /// 16-bit brain floating point
    BF16 = 3,

    // Integer types
    /// 64-bit signed integer
    I64 = 10,
    /// 32-bit signed integer
    I32 = 11,
    /// 16-bit signed integer
    I16 = 12,
    /// 8-bit signed integer
    I8 = 13,

    // Unsigned integer types
    /// 64-bit unsigned integer
    U64 = 20,
    /// 32-bit unsigned integer
    U32 = 21,
    /// 16-bit unsigned integer
    U16 = 22,
    /// 8-bit unsigned integer
    U8 = 23,

    /// Boolean type
    Bool = 30,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 | Self::U64 => 8,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F16 | Self::BF16 | Self::I16 | Self::U16 => 2,
            Self::I8 | Self::U8 | Self::Bool => 1,
        }
    }

    /// Returns true if tensors of this dtype can be arg-reduced
    #[inline]
    pub const fn is_arg_value(self) -> bool {
        matches!(
            self,
            Self::F32
                | Self::F16
                | Self::BF16
                | Self::I64
                | Self::I32
                | Self::I16
                | Self::I8
                | Self::U8
        )
    }

    /// Returns true if this dtype may hold the indices an arg-reduction returns
    #[inline]
    pub const fn is_arg_index(self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    /// Size in bytes of the lane type values of this dtype are reduced in
    ///
    /// Narrow types are widened to a 32-bit lane; 64-bit integers keep a
    /// 64-bit lane.
    #[inline]
    pub const fn compute_size_in_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 | Self::U64 => 8,
            _ => 4,
        }
    }

    /// Short name for display (e.g., "f32", "i64")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::I16 => "i16",
            Self::I8 => "i8",
            Self::U64 => "u64",
            Self::U32 => "u32",
            Self::U16 => "u16",
            Self::U8 => "u8",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_sizes() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::BF16.size_in_bytes(), 2);
        assert_eq!(DType::U8.size_in_bytes(), 1);
        assert_eq!(DType::I64.compute_size_in_bytes(), 8);
        assert_eq!(DType::F16.compute_size_in_bytes(), 4);
        assert_eq!(DType::I8.compute_size_in_bytes(), 4);
    }

    #[test]
    fn test_arg_support() {
        for dtype in [DType::F32, DType::F16, DType::BF16, DType::I8, DType::U8, DType::I64] {
            assert!(dtype.is_arg_value(), "{dtype} should be reducible");
        }
        for dtype in [DType::F64, DType::U32, DType::U64, DType::Bool, DType::U16] {
            assert!(!dtype.is_arg_value(), "{dtype} should be rejected");
        }
        assert!(DType::I32.is_arg_index());
        assert!(DType::I64.is_arg_index());
        assert!(!DType::U64.is_arg_index());
        assert!(!DType::Bool.is_arg_index());
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::BF16.to_string(), "bf16");
        assert_eq!(format!("{}", DType::I8), "i8");
    }
}
