//! Common test utilities
#![allow(dead_code)]

use argreduce::dtype::{DType, Element};
use argreduce::runtime::{AccelClient, DeviceConfig};
use argreduce::tensor::Tensor;
use argreduce::tiling::PlannerOptions;
use half::{bf16, f16};

/// Create a client with `core_num` cores and `ub_size` scratch bytes
pub fn create_client(core_num: usize, ub_size: usize) -> AccelClient {
    AccelClient::with_config(DeviceConfig::new(core_num, ub_size)).unwrap()
}

/// Create a client with explicit planner options
pub fn create_client_with(core_num: usize, ub_size: usize, options: PlannerOptions) -> AccelClient {
    create_client(core_num, ub_size).with_options(options)
}

/// Deterministic pseudo-random integers in `-8..=8`, stored as f64
///
/// The narrow range makes ties along every axis likely.
pub fn pattern(len: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % 17) as f64 - 8.0
        })
        .collect()
}

/// Replace every `every`-th element with NaN
pub fn sprinkle_nan(data: &mut [f64], every: usize) {
    for v in data.iter_mut().step_by(every) {
        *v = f64::NAN;
    }
}

fn typed<T: Element>(data: &[f64], shape: &[usize]) -> Tensor {
    let values: Vec<T> = data.iter().map(|&v| T::from_f64(v)).collect();
    Tensor::from_slice(&values, shape)
}

/// [`pattern`] shifted into the range `dtype` can hold
pub fn test_data(dtype: DType, len: usize, seed: u64) -> Vec<f64> {
    let data = pattern(len, seed);
    if dtype == DType::U8 {
        data.into_iter().map(|v| v + 8.0).collect()
    } else {
        data
    }
}

/// Build a tensor of `dtype` from f64 values
pub fn make_tensor(dtype: DType, data: &[f64], shape: &[usize]) -> Tensor {
    match dtype {
        DType::F32 => typed::<f32>(data, shape),
        DType::F16 => typed::<f16>(data, shape),
        DType::BF16 => typed::<bf16>(data, shape),
        DType::I64 => typed::<i64>(data, shape),
        DType::I32 => typed::<i32>(data, shape),
        DType::I16 => typed::<i16>(data, shape),
        DType::I8 => typed::<i8>(data, shape),
        DType::U8 => typed::<u8>(data, shape),
        DType::F64 => typed::<f64>(data, shape),
        other => panic!("no test tensor for {other}"),
    }
}

/// Read any supported tensor back as f64 values
pub fn values_f64(t: &Tensor) -> Vec<f64> {
    fn read<T: Element>(t: &Tensor) -> Vec<f64> {
        t.to_vec::<T>().into_iter().map(Element::to_f64).collect()
    }
    match t.dtype() {
        DType::F32 => read::<f32>(t),
        DType::F16 => read::<f16>(t),
        DType::BF16 => read::<bf16>(t),
        DType::I64 => read::<i64>(t),
        DType::I32 => read::<i32>(t),
        DType::I16 => read::<i16>(t),
        DType::I8 => read::<i8>(t),
        DType::U8 => read::<u8>(t),
        other => panic!("no reader for {other}"),
    }
}

/// Read an index tensor of either index dtype as i64
pub fn indices_i64(t: &Tensor) -> Vec<i64> {
    match t.dtype() {
        DType::I64 => t.to_vec::<i64>(),
        DType::I32 => t.to_vec::<i32>().into_iter().map(i64::from).collect(),
        other => panic!("not an index dtype: {other}"),
    }
}

/// Scalar arg-reduction with first-occurrence ties and NaN as the loser
///
/// Returns `(values, indices)` over the kept positions in row-major order.
pub fn reference_arg_reduce(
    data: &[f64],
    shape: &[usize],
    dim: usize,
    is_min: bool,
) -> (Vec<f64>, Vec<i64>) {
    let (a, r, next_a) = if shape.is_empty() {
        (1, 1, 1)
    } else {
        (
            shape[..dim].iter().product::<usize>(),
            shape[dim],
            shape[dim + 1..].iter().product::<usize>(),
        )
    };
    let mut values = Vec::with_capacity(a * next_a);
    let mut indices = Vec::with_capacity(a * next_a);
    for i in 0..a {
        for j in 0..next_a {
            let at = |k: usize| data[(i * r + k) * next_a + j];
            let mut best = at(0);
            let mut best_idx = 0;
            for k in 1..r {
                let v = at(k);
                let wins = if is_min { v < best } else { v > best };
                if wins || (best.is_nan() && !v.is_nan()) {
                    best = v;
                    best_idx = k;
                }
            }
            values.push(best);
            indices.push(best_idx as i64);
        }
    }
    (values, indices)
}

/// Element-wise equality treating NaN as equal to NaN
pub fn assert_same_values(got: &[f64], expected: &[f64], msg: &str) {
    assert_eq!(got.len(), expected.len(), "{msg}: length mismatch");
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!(
            g == e || (g.is_nan() && e.is_nan()),
            "{msg}: element {i} differs: {g} vs {e}"
        );
    }
}
