//! Accelerator implementation of arg-reduction operations.

use crate::dtype::{ArgElement, IndexElement};
use crate::error::{Error, Result};
use crate::kernels::{self, KernelArgs};
use crate::ops::{ArgReduceOps, ArgReduceOutput, ArgReduceParams, ReduceDirection};
use crate::runtime::{AccelClient, GlobalTensor, GlobalTensorMut, Workspace};
use crate::tensor::Tensor;
use crate::tiling::{normalize_dim, ArgReduceRequest, TilingData, TilingPlanner};
use crate::{dispatch_arg_dtype, dispatch_index_dtype};

const OP: &str = "arg_reduce";

/// ArgReduceOps implementation for the simulated accelerator.
impl ArgReduceOps for AccelClient {
    fn arg_reduce(&self, a: &Tensor, params: &ArgReduceParams) -> Result<ArgReduceOutput> {
        let request = ArgReduceRequest {
            shape: a.shape(),
            dim: params.dim,
            dtype: a.dtype(),
            index_dtype: params.index_dtype,
            is_min: params.direction == ReduceDirection::Min,
            with_value: params.with_value,
        };
        let tiling = TilingPlanner::new(self.device(), *self.options()).plan(&request)?;
        let out_shape = reduce_dim_output_shape(a.shape(), params.dim, params.keepdim)?;

        let _span = tracing::debug_span!(
            "arg_reduce",
            dtype = %a.dtype(),
            shape = ?a.shape(),
            dim = params.dim,
            mode = tiling.tiling_key,
        )
        .entered();

        dispatch_arg_dtype!(a.dtype(), T => {
            dispatch_index_dtype!(params.index_dtype, I => {
                self.launch_arg_reduce::<T, I>(a, &tiling, &out_shape, params.with_value)
            }, OP)
        }, OP)
    }
}

impl AccelClient {
    fn launch_arg_reduce<T: ArgElement, I: IndexElement>(
        &self,
        a: &Tensor,
        tiling: &TilingData,
        out_shape: &[usize],
        with_value: bool,
    ) -> Result<ArgReduceOutput> {
        let x = a.as_slice::<T>()?;
        let out_len = tiling.shape().out_size();
        let real_core_num = tiling.real_core_num as usize;

        let mut indices = vec![I::zeroed(); out_len];
        let mut values = if with_value {
            vec![T::zeroed(); out_len]
        } else {
            Vec::new()
        };

        let slots = real_core_num * tiling.out_a_align as usize;
        let mut words = vec![0u64; (tiling.workspace_size as usize).div_ceil(8)];
        let workspace = if slots > 0 {
            Workspace::<T::Compute>::split(&mut words, slots).ok_or_else(|| {
                Error::Internal(format!(
                    "workspace of {} bytes cannot hold {slots} partial results",
                    tiling.workspace_size
                ))
            })?
        } else {
            Workspace::empty()
        };

        if real_core_num > 0 {
            let bytes = tiling.to_bytes();
            let args = KernelArgs {
                x: GlobalTensor::new(x),
                values: GlobalTensorMut::new(&mut values),
                indices: GlobalTensorMut::new(&mut indices),
                workspace,
            };
            self.device()
                .launch(real_core_num, |core| kernels::arg_reduce::<T, I>(core, &args, &bytes))?;
        }

        let indices = Tensor::try_from_slice(&indices, out_shape)?;
        let values = if with_value {
            Some(Tensor::try_from_slice(&values, out_shape)?)
        } else {
            None
        };
        Ok(ArgReduceOutput { indices, values })
    }
}

/// Output shape of reducing `shape` along `dim`
///
/// A scalar input reduces to a scalar.
fn reduce_dim_output_shape(shape: &[usize], dim: isize, keepdim: bool) -> Result<Vec<usize>> {
    if shape.is_empty() {
        return Ok(Vec::new());
    }
    let dim = normalize_dim(dim, shape.len())?;
    let mut out = shape.to_vec();
    if keepdim {
        out[dim] = 1;
    } else {
        out.remove(dim);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_dim_output_shape() {
        assert_eq!(reduce_dim_output_shape(&[2, 3, 4], 1, false).unwrap(), vec![2, 4]);
        assert_eq!(reduce_dim_output_shape(&[2, 3, 4], -1, true).unwrap(), vec![2, 3, 1]);
        assert_eq!(reduce_dim_output_shape(&[5], 0, false).unwrap(), Vec::<usize>::new());
        assert!(reduce_dim_output_shape(&[], 0, true).unwrap().is_empty());
        assert!(reduce_dim_output_shape(&[2, 3], 2, false).is_err());
    }
}
