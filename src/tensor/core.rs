//! Core Tensor type

use super::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};

/// N-dimensional contiguous row-major tensor
///
/// `Tensor` is dtype-erased: the element type is carried at runtime as a
/// [`DType`] and recovered with [`Tensor::as_slice`] or [`Tensor::to_vec`].
/// A tensor with an empty shape is a scalar holding one element.
#[derive(Clone, Debug)]
pub struct Tensor {
    storage: Storage,
    shape: Vec<usize>,
}

impl Tensor {
    /// Create a tensor from a slice of data
    ///
    /// # Panics
    /// Panics if `data.len()` does not match the product of `shape`.
    /// Use [`Tensor::try_from_slice`] for a fallible version.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape)
            .unwrap_or_else(|e| panic!("Tensor::from_slice failed: {e}"))
    }

    /// Create a tensor from a slice of data, checking the shape
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::shape_mismatch(&[expected], &[data.len()]));
        }
        Ok(Self {
            storage: Storage::from_slice(data),
            shape: shape.to_vec(),
        })
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Borrow the data as a typed slice
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        self.storage.as_slice()
    }

    /// Copy the data out as a `Vec`
    ///
    /// # Panics
    /// Panics if `T` is not this tensor's dtype.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        match self.as_slice::<T>() {
            Ok(data) => data.to_vec(),
            Err(e) => panic!("Tensor::to_vec failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice() {
        let t = Tensor::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3]);
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.numel(), 6);
        assert_eq!(t.dtype(), DType::I32);
        assert_eq!(t.to_vec::<i32>(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_scalar() {
        let t = Tensor::from_slice(&[7.5f32], &[]);
        assert!(t.shape().is_empty());
        assert_eq!(t.numel(), 1);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = Tensor::try_from_slice(&[1.0f32, 2.0, 3.0], &[2, 2]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_tensor() {
        let t = Tensor::from_slice::<f32>(&[], &[3, 0]);
        assert_eq!(t.numel(), 0);
        assert_eq!(t.shape(), &[3, 0]);
    }
}
