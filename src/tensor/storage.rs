//! Storage: host memory standing in for device global memory, with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Dtype-erased storage for tensor data
///
/// Bytes are kept in `u64` words so that any element type up to eight bytes
/// wide can be viewed in place without realignment. Cloning a `Storage` shares
/// the buffer.
#[derive(Clone)]
pub struct Storage {
    words: Arc<Vec<u64>>,
    /// Number of elements (not bytes)
    len: usize,
    dtype: DType,
}

impl Storage {
    /// Create storage holding a copy of `data`
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut words = vec![0u64; bytes.len().div_ceil(8)];
        bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);
        Self {
            words: Arc::new(words),
            len: data.len(),
            dtype: T::DTYPE,
        }
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the storage holds no elements
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Size of the data in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len * self.dtype.size_in_bytes()
    }

    /// View the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.size_in_bytes()]
    }

    /// View the data as a typed slice
    ///
    /// Fails with `DTypeMismatch` if `T` is not the stored dtype.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        if T::DTYPE != self.dtype {
            return Err(Error::DTypeMismatch {
                expected: self.dtype,
                got: T::DTYPE,
            });
        }
        Ok(bytemuck::cast_slice(self.as_bytes()))
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len)
            .field("dtype", &self.dtype)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_roundtrip_narrow() {
        let data = [1u8, 2, 3, 4, 5];
        let storage = Storage::from_slice(&data);
        assert_eq!(storage.len(), 5);
        assert_eq!(storage.size_in_bytes(), 5);
        assert_eq!(storage.as_slice::<u8>().unwrap(), &data);
    }

    #[test]
    fn test_half_view() {
        let data = [f16::from_f32(0.5), f16::from_f32(-2.0), f16::NAN];
        let storage = Storage::from_slice(&data);
        let view = storage.as_slice::<f16>().unwrap();
        assert_eq!(view[0], data[0]);
        assert_eq!(view[1], data[1]);
        assert!(view[2].is_nan());
    }

    #[test]
    fn test_dtype_mismatch() {
        let storage = Storage::from_slice(&[1.0f32, 2.0]);
        let err = storage.as_slice::<i32>().unwrap_err();
        assert!(matches!(
            err,
            Error::DTypeMismatch {
                expected: DType::F32,
                got: DType::I32
            }
        ));
    }

    #[test]
    fn test_empty() {
        let storage = Storage::from_slice::<i64>(&[]);
        assert!(storage.is_empty());
        assert!(storage.as_slice::<i64>().unwrap().is_empty());
    }
}
