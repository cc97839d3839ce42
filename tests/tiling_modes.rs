//! Every tiling mode, forced, against the scalar reference
//!
//! Each mode runs on shapes it accepts with one core and with several, and
//! with a scratch budget small enough to force chunking of R.

mod common;

use argreduce::dtype::DType;
use argreduce::error::Error;
use argreduce::ops::{ArgReduceOps, ArgReduceParams};
use argreduce::runtime::AccelClient;
use argreduce::tiling::{PlannerOptions, TilingMode};
use common::{
    assert_same_values, create_client_with, indices_i64, make_tensor, reference_arg_reduce,
    sprinkle_nan, test_data, values_f64,
};

const BUDGETS: [usize; 2] = [192 * 1024, 4 * 1024];
const CORES: [usize; 3] = [1, 3, 8];

fn forced(mode: TilingMode) -> PlannerOptions {
    PlannerOptions::forced(mode).with_single_core_threshold(0)
}

/// Run `mode` on `shape` along `dim` for every core count and budget
fn check_mode(mode: TilingMode, shape: &[usize], dim: usize, dtype: DType, with_nan: bool) {
    let numel: usize = shape.iter().product();
    let mut data = test_data(dtype, numel, numel as u64 + dim as u64);
    if with_nan {
        sprinkle_nan(&mut data, 5);
    }
    let a = make_tensor(dtype, &data, shape);

    for cores in CORES {
        for ub in BUDGETS {
            let client = create_client_with(cores, ub, forced(mode));
            for is_min in [false, true] {
                let params = if is_min {
                    ArgReduceParams::argmin(dim as isize)
                } else {
                    ArgReduceParams::argmax(dim as isize)
                };
                let out = client
                    .arg_reduce(&a, &params.with_value(true).index_dtype(DType::I32))
                    .unwrap();
                let (ref_v, ref_i) = reference_arg_reduce(&data, shape, dim, is_min);
                let msg = format!(
                    "{mode} {dtype} shape={shape:?} dim={dim} cores={cores} ub={ub} min={is_min}"
                );
                assert_eq!(indices_i64(&out.indices), ref_i, "{msg}");
                assert_same_values(&values_f64(out.values.as_ref().unwrap()), &ref_v, &msg);
            }
        }
    }
}

#[test]
fn test_copy_only() {
    check_mode(TilingMode::CopyOnly, &[4, 1, 64], 1, DType::F32, true);
    check_mode(TilingMode::CopyOnly, &[3000, 1], 1, DType::I16, false);
}

#[test]
fn test_ar_cut_a() {
    check_mode(TilingMode::ArCutA, &[37, 300], 1, DType::F32, true);
    check_mode(TilingMode::ArCutA, &[5, 5000], 1, DType::I64, false);
    check_mode(TilingMode::ArCutA, &[2, 3, 100], 2, DType::BF16, false);
}

#[test]
fn test_ar_gather() {
    check_mode(TilingMode::ArGather, &[500, 7], 1, DType::F32, true);
    check_mode(TilingMode::ArGather, &[130, 70], 1, DType::I8, false);
    check_mode(TilingMode::ArGather, &[10, 2000], 1, DType::I32, false);
}

#[test]
fn test_ra_cut_a() {
    check_mode(TilingMode::RaCutA, &[300, 70], 0, DType::F32, true);
    check_mode(TilingMode::RaCutA, &[1, 2000, 3], 1, DType::F16, false);
    check_mode(TilingMode::RaCutA, &[40, 1500], 0, DType::U8, false);
}

#[test]
fn test_ara_cut_a() {
    // full load with narrow and wide nextA
    check_mode(TilingMode::AraCutA, &[64, 20, 3], 1, DType::F32, true);
    check_mode(TilingMode::AraCutA, &[16, 10, 40], 1, DType::I32, false);
    // tiled, R and nextA cut
    check_mode(TilingMode::AraCutA, &[3, 400, 50], 1, DType::F32, true);
    // one kept position per unit
    check_mode(TilingMode::AraCutA, &[2, 3000, 3], 1, DType::F32, false);
    check_mode(TilingMode::AraCutA, &[2, 3000, 3], 1, DType::I64, false);
}

#[test]
fn test_ara_cut_a_and_next_a() {
    check_mode(TilingMode::AraCutAAndNextA, &[4, 30, 200], 1, DType::F32, true);
    check_mode(TilingMode::AraCutAAndNextA, &[2, 900, 100], 1, DType::I16, false);
    check_mode(TilingMode::AraCutAAndNextA, &[9, 5, 1], 1, DType::F32, false);
}

#[test]
fn test_ara_gather() {
    // short R: whole slabs, one lane per kept position
    check_mode(TilingMode::AraGather, &[50, 6, 5], 1, DType::F32, true);
    // long R: transposed tiles
    check_mode(TilingMode::AraGather, &[3, 700, 20], 1, DType::F32, true);
    check_mode(TilingMode::AraGather, &[2, 1000, 300], 1, DType::I32, false);
}

#[test]
fn test_group_reduce() {
    check_mode(TilingMode::GroupReduce, &[2, 5000], 1, DType::F32, true);
    check_mode(TilingMode::GroupReduce, &[3, 900, 7], 1, DType::I64, false);
    check_mode(TilingMode::GroupReduce, &[20_000], 0, DType::BF16, false);
    check_mode(TilingMode::GroupReduce, &[2, 8], 1, DType::I8, false);
}

#[test]
fn test_group_reduce_matches_single_core() {
    let a = make_tensor(
        DType::F32,
        &[5.0, 3.0, 5.0, 1.0, 9.0, 9.0, 2.0, 0.0, -1.0, -1.0, -2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        &[2, 8],
    );
    let single = create_client_with(1, 192 * 1024, forced(TilingMode::GroupReduce));
    let grouped = create_client_with(8, 192 * 1024, forced(TilingMode::GroupReduce));

    let run = |client: &AccelClient, is_min: bool| {
        let (values, indices) = if is_min {
            client.min_with_indices(&a, 1, false).unwrap()
        } else {
            client.max_with_indices(&a, 1, false).unwrap()
        };
        let bits: Vec<u32> = values.to_vec::<f32>().iter().map(|v| v.to_bits()).collect();
        (bits, indices.to_vec::<i64>())
    };

    for (is_min, expected) in [(false, vec![4i64, 3]), (true, vec![7, 2])] {
        let one = run(&single, is_min);
        let eight = run(&grouped, is_min);
        assert_eq!(one, eight, "min={is_min}");
        assert_eq!(one.1, expected);
    }
}

#[test]
fn test_forced_mode_must_fit_shape() {
    let a = make_tensor(DType::F32, &test_data(DType::F32, 60, 1), &[3, 4, 5]);
    let cases = [
        (TilingMode::CopyOnly, 1),
        (TilingMode::ArCutA, 1),
        (TilingMode::ArGather, 0),
        (TilingMode::RaCutA, 1),
    ];
    for (mode, dim) in cases {
        let client = create_client_with(4, 192 * 1024, forced(mode));
        let err = client.argmax(&a, dim, false).unwrap_err();
        assert!(
            matches!(err, Error::InvalidArgument { arg: "forced_mode", .. }),
            "{mode}: {err}"
        );
    }

    let wide = make_tensor(DType::F32, &test_data(DType::F32, 2 * 2000, 1), &[2000, 2]);
    let client = create_client_with(4, 192 * 1024, forced(TilingMode::GroupReduce));
    assert!(matches!(
        client.argmax(&wide, 1, false),
        Err(Error::InvalidArgument { arg: "forced_mode", .. })
    ));
}
