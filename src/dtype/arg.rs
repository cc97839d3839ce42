//! Element traits used by the reduction kernels

use super::Element;
use bytemuck::Pod;
use half::{bf16, f16};
use std::fmt::Debug;

/// A vector-register lane type the reduce primitives compute in
pub trait Lane: Copy + Send + Sync + PartialOrd + Pod + Debug + 'static {
    /// NaN test (always false for integer lanes)
    fn is_nan(self) -> bool;
}

impl Lane for f32 {
    #[inline]
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
}

impl Lane for i32 {
    #[inline]
    fn is_nan(self) -> bool {
        false
    }
}

impl Lane for i64 {
    #[inline]
    fn is_nan(self) -> bool {
        false
    }
}

/// Value types accepted by the arg-reduction engine
///
/// Each type names the lane type it is widened to before reduction. The
/// round trip `narrow(widen(x))` is exact for every implementor, so reduced
/// values are bit-for-bit elements of the input (NaN payloads aside).
pub trait ArgElement: Element {
    /// Lane type values are compared in
    type Compute: Lane;

    /// Widen a stored value to its compute lane
    fn widen(self) -> Self::Compute;

    /// Narrow a compute lane back to the stored type
    fn narrow(v: Self::Compute) -> Self;
}

impl ArgElement for f32 {
    type Compute = f32;

    #[inline]
    fn widen(self) -> f32 {
        self
    }

    #[inline]
    fn narrow(v: f32) -> Self {
        v
    }
}

impl ArgElement for f16 {
    type Compute = f32;

    #[inline]
    fn widen(self) -> f32 {
        self.to_f32()
    }

    #[inline]
    fn narrow(v: f32) -> Self {
        f16::from_f32(v)
    }
}

impl ArgElement for bf16 {
    type Compute = f32;

    #[inline]
    fn widen(self) -> f32 {
        self.to_f32()
    }

    #[inline]
    fn narrow(v: f32) -> Self {
        bf16::from_f32(v)
    }
}

macro_rules! impl_int_arg_element {
    ($($ty:ty => $lane:ty),* $(,)?) => {
        $(
            impl ArgElement for $ty {
                type Compute = $lane;

                #[inline]
                fn widen(self) -> $lane {
                    self as $lane
                }

                #[inline]
                fn narrow(v: $lane) -> Self {
                    v as $ty
                }
            }
        )*
    };
}

impl_int_arg_element! {
    i8 => i32,
    u8 => i32,
    i16 => i32,
    i32 => i32,
    i64 => i64,
}

/// Index types an arg-reduction can return
///
/// Kernels track positions as `u32`; the conversion to the declared index
/// type happens when results are copied out.
pub trait IndexElement: Element {
    /// Convert an internal position
    fn from_index(index: u32) -> Self;
}

impl IndexElement for i32 {
    #[inline]
    fn from_index(index: u32) -> Self {
        index as i32
    }
}

impl IndexElement for i64 {
    #[inline]
    fn from_index(index: u32) -> Self {
        index as i64
    }
}
