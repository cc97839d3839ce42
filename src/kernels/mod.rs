//! Core-local arg-reduction kernels
//!
//! A launch runs [`arg_reduce`] once per core. The tiling block selects the
//! variant, and the direction and value-output flag are resolved to
//! monomorphized code before any data is touched.
//!
//! ```text
//! arg_reduce
//! ├── CopyOnly          R == 1
//! ├── ArReduce          nextA == 1, rows split over cores (optionally gathered)
//! ├── RaReduce          A == 1, columns split over cores
//! ├── AraReduce         general case, A (and nextA tiles) split over cores
//! ├── AraCutANextA      two-level grid over A and nextA
//! ├── AraGather         short or strided R, gather / transpose loads
//! └── GroupReduce       R split over cores, merged through the workspace
//! ```

mod ar;
mod ara;
mod ara_cut_a_next_a;
mod base;
mod copy_only;
mod gather;
mod group_reduce;
mod merge;
mod ra;
mod reduce;
mod simd;

pub(crate) use base::KernelArgs;
use merge::{Direction, Max, Min};

use ar::ArReduce;
use ara::AraReduce;
use ara_cut_a_next_a::AraCutANextA;
use copy_only::CopyOnly;
use gather::AraGather;
use group_reduce::GroupReduce;
use ra::RaReduce;

use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::CoreContext;
use crate::tiling::{TilingData, TilingMode};

/// Kernel entry point for one core
///
/// `tiling` is the serialized [`TilingData`] produced by the planner.
pub(crate) fn arg_reduce<T: ArgElement, I: IndexElement>(
    core: &CoreContext<'_>,
    args: &KernelArgs<'_, T, I>,
    tiling: &[u8],
) {
    let tiling = match TilingData::from_bytes(tiling) {
        Ok(tiling) => tiling,
        Err(e) => {
            tracing::error!(block_idx = core.block_idx(), error = %e, "bad tiling block");
            return;
        }
    };
    if core.block_idx() as u64 >= tiling.real_core_num {
        return;
    }

    match (tiling.is_min != 0, tiling.with_value != 0) {
        (false, false) => run::<T, I, Max, false>(core, args, &tiling),
        (false, true) => run::<T, I, Max, true>(core, args, &tiling),
        (true, false) => run::<T, I, Min, false>(core, args, &tiling),
        (true, true) => run::<T, I, Min, true>(core, args, &tiling),
    }
}

fn run<T, I, D, const W: bool>(
    core: &CoreContext<'_>,
    args: &KernelArgs<'_, T, I>,
    tiling: &TilingData,
) where
    T: ArgElement,
    I: IndexElement,
    D: Direction,
{
    let Some(mode) = tiling.mode() else {
        tracing::error!(key = tiling.tiling_key, "unknown tiling key");
        return;
    };
    tracing::trace!(
        block_idx = core.block_idx(),
        mode = %mode,
        is_min = D::IS_MIN,
        with_value = W,
        "core start"
    );
    match mode {
        TilingMode::CopyOnly => CopyOnly::<T, I, W>::new(core, tiling, args).process(),
        TilingMode::ArCutA => ArReduce::<T, I, D, W, false>::new(core, tiling, args).process(),
        TilingMode::ArGather => ArReduce::<T, I, D, W, true>::new(core, tiling, args).process(),
        TilingMode::RaCutA => RaReduce::<T, I, D, W>::new(core, tiling, args).process(),
        TilingMode::AraCutA => AraReduce::<T, I, D, W>::new(core, tiling, args).process(),
        TilingMode::AraCutAAndNextA => {
            AraCutANextA::<T, I, D, W>::new(core, tiling, args).process()
        }
        TilingMode::AraGather => AraGather::<T, I, D, W>::new(core, tiling, args).process(),
        TilingMode::GroupReduce => GroupReduce::<T, I, D, W>::new(core, tiling, args).process(core),
    }
}
