//! Arg-reduction operations trait.

use crate::dtype::DType;
use crate::error::Result;
use crate::tensor::Tensor;

/// Which extremum an arg-reduction selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceDirection {
    /// Position of the maximum
    Max,
    /// Position of the minimum
    Min,
}

/// Parameters of one arg-reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgReduceParams {
    /// Extremum to select
    pub direction: ReduceDirection,
    /// Axis to reduce; negative values count from the end
    pub dim: isize,
    /// Keep the reduced axis with size 1
    pub keepdim: bool,
    /// Also return the selected values
    pub with_value: bool,
    /// Index output dtype, `I32` or `I64`
    pub index_dtype: DType,
}

impl ArgReduceParams {
    /// Index-only reduction along `dim` with `I64` indices
    pub fn new(direction: ReduceDirection, dim: isize) -> Self {
        Self {
            direction,
            dim,
            keepdim: false,
            with_value: false,
            index_dtype: DType::I64,
        }
    }

    /// Argmax along `dim`
    pub fn argmax(dim: isize) -> Self {
        Self::new(ReduceDirection::Max, dim)
    }

    /// Argmin along `dim`
    pub fn argmin(dim: isize) -> Self {
        Self::new(ReduceDirection::Min, dim)
    }

    /// Set whether the reduced axis is kept
    pub fn keepdim(mut self, keepdim: bool) -> Self {
        self.keepdim = keepdim;
        self
    }

    /// Set whether values are returned alongside indices
    pub fn with_value(mut self, with_value: bool) -> Self {
        self.with_value = with_value;
        self
    }

    /// Set the index output dtype
    pub fn index_dtype(mut self, dtype: DType) -> Self {
        self.index_dtype = dtype;
        self
    }
}

/// Result of an arg-reduction
#[derive(Debug, Clone)]
pub struct ArgReduceOutput {
    /// Positions along the reduced axis
    pub indices: Tensor,
    /// Selected values, present when requested
    pub values: Option<Tensor>,
}

/// Arg-reduction operations
///
/// Ties resolve to the lowest position. A NaN is selected only when every
/// element along the axis is NaN, in which case the index is 0.
pub trait ArgReduceOps {
    /// Reduce `a` along `params.dim` to the positions of its extrema
    ///
    /// # Errors
    ///
    /// - `UnsupportedDType` if the value or index dtype is not supported
    /// - `InvalidDimension` if `dim` is out of range
    /// - `InvalidArgument` if the reduced axis is empty or the planner
    ///   cannot honour a forced mode
    fn arg_reduce(&self, a: &Tensor, params: &ArgReduceParams) -> Result<ArgReduceOutput>;

    /// Argmax: returns I64 indices of maximum values along a dimension.
    ///
    /// The output shape is the input shape with `dim` removed (or kept as size
    /// 1 if `keepdim` is true).
    fn argmax(&self, a: &Tensor, dim: isize, keepdim: bool) -> Result<Tensor> {
        let out = self.arg_reduce(a, &ArgReduceParams::argmax(dim).keepdim(keepdim))?;
        Ok(out.indices)
    }

    /// Argmin: returns I64 indices of minimum values along a dimension.
    fn argmin(&self, a: &Tensor, dim: isize, keepdim: bool) -> Result<Tensor> {
        let out = self.arg_reduce(a, &ArgReduceParams::argmin(dim).keepdim(keepdim))?;
        Ok(out.indices)
    }

    /// Maximum values and their I64 indices along a dimension
    fn max_with_indices(&self, a: &Tensor, dim: isize, keepdim: bool) -> Result<(Tensor, Tensor)> {
        let params = ArgReduceParams::argmax(dim).keepdim(keepdim).with_value(true);
        split_values(self.arg_reduce(a, &params)?)
    }

    /// Minimum values and their I64 indices along a dimension
    fn min_with_indices(&self, a: &Tensor, dim: isize, keepdim: bool) -> Result<(Tensor, Tensor)> {
        let params = ArgReduceParams::argmin(dim).keepdim(keepdim).with_value(true);
        split_values(self.arg_reduce(a, &params)?)
    }
}

fn split_values(out: ArgReduceOutput) -> Result<(Tensor, Tensor)> {
    match out.values {
        Some(values) => Ok((values, out.indices)),
        None => Err(crate::error::Error::Internal(
            "value output requested but not produced".to_string(),
        )),
    }
}
