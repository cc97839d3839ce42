//! Host-side tiling planner

use super::{
    normalize_dim, AraMode, ReduceShape, TilingData, TilingMode,
    AR_BLOCK_NUM_FACTOR, BLOCK_SIZE, MAX_NEXTA_SIZE, MIN_CUT_SIZE, PROCESS_SIZE,
    SINGLE_CORE_THRESHOLD, WORKSPACE_ALIGN,
};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{PlatformInfo, DOUBLE_BUFFER};

const OP: &str = "arg_reduce";

/// Bytes per internal index
const INNER_INDEX_BYTES: usize = 4;

/// Planner knobs carried by a client
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannerOptions {
    /// Run this mode instead of the heuristic choice
    ///
    /// Planning fails if the mode cannot execute the input shape.
    pub forced_mode: Option<TilingMode>,
    /// Inputs smaller than this many bytes run on a single core
    pub single_core_threshold: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            forced_mode: None,
            single_core_threshold: SINGLE_CORE_THRESHOLD,
        }
    }
}

impl PlannerOptions {
    /// Options forcing `mode`
    pub fn forced(mode: TilingMode) -> Self {
        Self {
            forced_mode: Some(mode),
            ..Self::default()
        }
    }

    /// Set the single-core threshold
    pub fn with_single_core_threshold(mut self, bytes: usize) -> Self {
        self.single_core_threshold = bytes;
        self
    }
}

/// One arg-reduction to plan
#[derive(Clone, Copy, Debug)]
pub struct ArgReduceRequest<'a> {
    /// Input shape
    pub shape: &'a [usize],
    /// Reduction axis; negative values count from the end
    pub dim: isize,
    /// Input value dtype
    pub dtype: DType,
    /// Output index dtype
    pub index_dtype: DType,
    /// Reduce to the minimum instead of the maximum
    pub is_min: bool,
    /// Write values alongside indices
    pub with_value: bool,
}

/// Computes the [`TilingData`] for an arg-reduction
pub struct TilingPlanner<'p, P: PlatformInfo + ?Sized> {
    platform: &'p P,
    options: PlannerOptions,
}

impl<'p, P: PlatformInfo + ?Sized> TilingPlanner<'p, P> {
    /// Create a planner querying `platform`
    pub fn new(platform: &'p P, options: PlannerOptions) -> Self {
        Self { platform, options }
    }

    /// Validate the request and compute its tiling
    ///
    /// An input with no kept positions yields `real_core_num == 0`: nothing
    /// is launched.
    pub fn plan(&self, req: &ArgReduceRequest<'_>) -> Result<TilingData> {
        if !req.dtype.is_arg_value() {
            return Err(Error::unsupported_dtype(req.dtype, OP));
        }
        if !req.index_dtype.is_arg_index() {
            return Err(Error::unsupported_dtype(req.index_dtype, OP));
        }
        let core_num = self.platform.core_num()?;
        let ub_size = self.platform.ub_size()?;
        let vreg_size = self.platform.vreg_size();

        let dim = normalize_dim(req.dim, req.shape.len())?;
        let shape = ReduceShape::new(req.shape, dim);
        if shape.r == 0 {
            return Err(Error::invalid_argument(
                "dim",
                format!("cannot reduce over empty dimension {dim}"),
            ));
        }
        if shape.r > i32::MAX as usize {
            return Err(Error::invalid_argument(
                "dim",
                format!("reduction length {} exceeds the index range", shape.r),
            ));
        }

        let mut tiling = TilingData {
            a_size: shape.a as u64,
            r_size: shape.r as u64,
            next_a_size: shape.next_a as u64,
            ub_size: ub_size as u64,
            is_min: req.is_min as u64,
            with_value: req.with_value as u64,
            ..TilingData::default()
        };

        let value_bytes = req.dtype.size_in_bytes();
        let core = if shape.numel() * value_bytes < self.options.single_core_threshold {
            1
        } else {
            core_num
        };
        let ctx = PlanContext::new(shape, core, ub_size, vreg_size, req);

        let mode = match self.options.forced_mode {
            Some(mode) if !mode.applies_to(&shape) => {
                return Err(Error::invalid_argument(
                    "forced_mode",
                    format!("{mode} cannot reduce shape {:?} along dim {dim}", req.shape),
                ));
            }
            Some(mode) => mode,
            None => ctx.select_mode(),
        };
        tiling.tiling_key = mode.key();

        if shape.out_size() == 0 {
            tracing::debug!(mode = %mode, "empty output, nothing to launch");
            return Ok(tiling);
        }

        ctx.fill(mode, &mut tiling);
        tracing::debug!(
            mode = %mode,
            ara_mode = tiling.ara_mode,
            real_core_num = tiling.real_core_num,
            cut_a = tiling.cut_a_size,
            cut_r = tiling.cut_r_size,
            cut_next_a = tiling.cut_next_a_size,
            ?tiling,
            "planned arg-reduction"
        );
        Ok(tiling)
    }
}

/// Units split over cores: `(real, factor, tail)`
fn split(units: usize, core: usize) -> (usize, usize, usize) {
    let real = units.min(core).max(1);
    (real, units / real, units % real)
}

fn align_up(v: usize, align: usize) -> usize {
    v.div_ceil(align) * align
}

struct PlanContext {
    shape: ReduceShape,
    core: usize,
    ub: usize,
    vl: usize,
    /// Stored value bytes
    t: usize,
    /// Compute lane bytes
    c: usize,
    /// Scratch bytes per staged input element
    in_cost: usize,
    /// Scratch bytes per staged kept position
    out_cost: usize,
}

impl PlanContext {
    fn new(
        shape: ReduceShape,
        core: usize,
        ub: usize,
        vl: usize,
        req: &ArgReduceRequest<'_>,
    ) -> Self {
        let t = req.dtype.size_in_bytes();
        let c = req.dtype.compute_size_in_bytes();
        let idx = req.index_dtype.size_in_bytes();
        Self {
            shape,
            core,
            ub,
            vl,
            t,
            c,
            // double-buffered input plus its widened copy
            in_cost: DOUBLE_BUFFER * t + c,
            // double-buffered outputs plus running and chunk results
            out_cost: DOUBLE_BUFFER * (t + idx) + 2 * (c + INNER_INDEX_BYTES),
        }
    }

    fn lanes(&self) -> usize {
        (self.vl / self.c).max(1)
    }

    fn select_mode(&self) -> TilingMode {
        let ReduceShape { a, r, next_a } = self.shape;
        let (t, core, vl) = (self.t, self.core, self.vl);

        if r == 1 {
            return TilingMode::CopyOnly;
        }

        let mut mode = if next_a == 1 {
            TilingMode::ArCutA
        } else {
            TilingMode::AraCutA
        };

        if a == 1 && next_a > 1 {
            if next_a >= core * vl || r < vl {
                mode = TilingMode::RaCutA;
            }
        } else if next_a == 1 {
            if r * t < vl && a * t >= core * vl {
                mode = TilingMode::ArGather;
            }
        } else if a * next_a * t >= core * vl
            && (r * t < vl || (r * next_a * t >= self.ub / 2 && r < u16::MAX as usize))
        {
            mode = TilingMode::AraGather;
        }

        let group = r * t >= core * vl
            && r < i32::MAX as usize
            && self.shape.out_size() <= PROCESS_SIZE
            && ((next_a == 1 && a < core) || (next_a > 1 && a * next_a < 2 * core));
        if group {
            mode = TilingMode::GroupReduce;
        }

        if mode == TilingMode::AraCutA
            && a * next_a * t >= core * MIN_CUT_SIZE
            && next_a * t >= MIN_CUT_SIZE
        {
            mode = TilingMode::AraCutAAndNextA;
        }

        if mode == TilingMode::GroupReduce
            && next_a == 1
            && a as f64 > AR_BLOCK_NUM_FACTOR * core as f64
        {
            mode = TilingMode::ArCutA;
        }

        mode
    }

    fn fill(&self, mode: TilingMode, tiling: &mut TilingData) {
        match mode {
            TilingMode::CopyOnly => self.fill_copy_only(tiling),
            TilingMode::ArCutA | TilingMode::ArGather => self.fill_ar(tiling),
            TilingMode::RaCutA => self.fill_ra(tiling),
            TilingMode::AraCutA => self.fill_ara(tiling),
            TilingMode::AraCutAAndNextA => self.fill_ara_cut_a_next_a(tiling),
            TilingMode::AraGather => self.fill_ara_gather(tiling),
            TilingMode::GroupReduce => self.fill_group_reduce(tiling),
        }
    }

    fn set_split(tiling: &mut TilingData, (real, factor, tail): (usize, usize, usize)) {
        tiling.real_core_num = real as u64;
        tiling.blk_factor = factor as u64;
        tiling.blk_tail_factor = tail as u64;
    }

    fn set_cuts(tiling: &mut TilingData, cut_a: usize, cut_r: usize, cut_next_a: usize) {
        tiling.cut_a_size = cut_a as u64;
        tiling.cut_r_size = cut_r as u64;
        tiling.cut_next_a_size = cut_next_a as u64;
    }

    /// Largest unit count a core owns under a split
    fn max_units((_, factor, tail): (usize, usize, usize)) -> usize {
        factor + usize::from(tail > 0)
    }

    /// Column tile and R chunk for column-wise tiles
    fn cut_columns(&self, want: usize) -> (usize, usize) {
        let per_col = self.in_cost + self.out_cost;
        let cols = want.min(PROCESS_SIZE).min(self.ub / per_col).max(1);
        let cut_r = (self.ub.saturating_sub(cols * self.out_cost) / (cols * self.in_cost))
            .clamp(1, self.shape.r);
        (cols, cut_r)
    }

    /// Row tile and R chunk for tiles of `width` contiguous columns per row
    fn cut_rows(&self, max_rows: usize, width: usize) -> (usize, usize) {
        let r = self.shape.r;
        let full_row = r * width * self.in_cost + width * self.out_cost;
        if full_row <= self.ub {
            let rows = max_rows
                .min((PROCESS_SIZE / width).max(1))
                .min(self.ub / full_row)
                .max(1);
            (rows, r)
        } else {
            let mut cut_r =
                self.ub.saturating_sub(width * self.out_cost) / (width * self.in_cost);
            let lanes = self.lanes();
            if cut_r > lanes {
                cut_r -= cut_r % lanes;
            }
            (1, cut_r.clamp(1, r))
        }
    }

    fn fill_copy_only(&self, tiling: &mut TilingData) {
        let units = self.shape.out_size();
        let sp = split(units, self.core);
        Self::set_split(tiling, sp);
        let cut = Self::max_units(sp)
            .min(PROCESS_SIZE)
            .min(self.ub / (self.in_cost + self.out_cost))
            .max(1);
        Self::set_cuts(tiling, cut, 1, 1);
    }

    fn fill_ar(&self, tiling: &mut TilingData) {
        let sp = split(self.shape.a * self.shape.next_a, self.core);
        Self::set_split(tiling, sp);
        let (cut_a, cut_r) = self.cut_rows(Self::max_units(sp), 1);
        Self::set_cuts(tiling, cut_a, cut_r, 1);
    }

    fn fill_ra(&self, tiling: &mut TilingData) {
        let sp = split(self.shape.next_a, self.core);
        Self::set_split(tiling, sp);
        let (cols, cut_r) = self.cut_columns(Self::max_units(sp));
        Self::set_cuts(tiling, 1, cut_r, cols);
    }

    fn fill_ara(&self, tiling: &mut TilingData) {
        let ReduceShape { a, r, next_a } = self.shape;
        let full_row = r * next_a * self.in_cost + next_a * self.out_cost;

        if a >= self.core && full_row <= self.ub && next_a <= PROCESS_SIZE {
            let sp = split(a, self.core);
            Self::set_split(tiling, sp);
            let (rows, _) = self.cut_rows(Self::max_units(sp), next_a);
            Self::set_cuts(tiling, rows, r, next_a);
            let sub = if next_a * self.t < MAX_NEXTA_SIZE {
                AraMode::FullLoadGather
            } else {
                AraMode::FullLoadColumns
            };
            tiling.ara_mode = sub as u64;
            return;
        }

        let want = if a >= self.core || next_a * self.t < MAX_NEXTA_SIZE {
            next_a
        } else {
            next_a.div_ceil(self.core.div_ceil(a))
        };
        let (cols, cut_r) = self.cut_columns(want);

        if cut_r < r && cols * self.t < MAX_NEXTA_SIZE && a < self.core {
            // one kept position per unit, staged in blocks
            let sp = split(a * next_a, self.core);
            Self::set_split(tiling, sp);
            let block = Self::max_units(sp)
                .min(PROCESS_SIZE)
                .min((self.ub / (2 * self.out_cost)).max(1));
            let cut_r = (self.ub.saturating_sub(block * self.out_cost) / self.in_cost)
                .clamp(1, r);
            Self::set_cuts(tiling, block, cut_r, 1);
            tiling.ara_mode = AraMode::CutRFallback as u64;
            return;
        }

        let tiles = next_a.div_ceil(cols);
        Self::set_split(tiling, split(a * tiles, self.core));
        Self::set_cuts(tiling, 1, cut_r, cols);
        let sub = if cut_r >= r {
            AraMode::CutNextA
        } else if cols >= next_a {
            AraMode::CutR
        } else {
            AraMode::CutRAndNextA
        };
        tiling.ara_mode = sub as u64;
    }

    fn fill_ara_cut_a_next_a(&self, tiling: &mut TilingData) {
        let ReduceShape { a, r, next_a } = self.shape;
        let core_a = a.min(self.core).max(1);
        let min_cols = (MIN_CUT_SIZE / self.t).max(1);
        let core_n = (self.core / core_a)
            .min(next_a.div_ceil(min_cols))
            .max(1);

        let sp_a = split(a, core_a);
        let sp_n = split(next_a, core_n);
        tiling.real_core_num = (sp_a.0 * sp_n.0) as u64;
        tiling.blk_factor = sp_a.1 as u64;
        tiling.blk_tail_factor = sp_a.2 as u64;
        tiling.blk_num_2nd = sp_n.0 as u64;
        tiling.blk_factor_2nd = sp_n.1 as u64;
        tiling.blk_tail_factor_2nd = sp_n.2 as u64;

        let (cols, cut_r) = self.cut_columns(Self::max_units(sp_n));
        let rows = if cut_r >= r {
            let per_row = r * cols * self.in_cost + cols * self.out_cost;
            Self::max_units(sp_a)
                .min((PROCESS_SIZE / cols).max(1))
                .min(self.ub / per_row)
                .max(1)
        } else {
            1
        };
        Self::set_cuts(tiling, rows, cut_r, cols);
    }

    fn fill_ara_gather(&self, tiling: &mut TilingData) {
        let ReduceShape { a, r, next_a } = self.shape;
        let gather_fits = next_a <= PROCESS_SIZE
            && next_a * (self.in_cost + self.out_cost) <= self.ub;

        if r * self.t < self.vl && gather_fits {
            let sp = split(a, self.core);
            Self::set_split(tiling, sp);
            let (rows, cut_r) = self.cut_rows(Self::max_units(sp), next_a);
            Self::set_cuts(tiling, rows, cut_r, next_a);
            tiling.ara_mode = AraMode::GatherCutA as u64;
            return;
        }

        let want = if a >= self.core {
            next_a
        } else {
            next_a.div_ceil(self.core.div_ceil(a))
        };
        let (cols, cut_r) = self.cut_columns(want);
        let tiles = next_a.div_ceil(cols);
        Self::set_split(tiling, split(a * tiles, self.core));
        Self::set_cuts(tiling, 1, cut_r, cols);
        tiling.ara_mode = AraMode::GatherTransposed as u64;
    }

    fn fill_group_reduce(&self, tiling: &mut TilingData) {
        let ReduceShape { r, .. } = self.shape;
        let out = self.shape.out_size();
        let sp = split(r, self.core);
        Self::set_split(tiling, sp);
        let cut_r = (self.ub.saturating_sub(out * self.out_cost) / (out * self.in_cost))
            .clamp(1, Self::max_units(sp));
        Self::set_cuts(tiling, 1, cut_r, 1);

        let slot = align_up(out, (BLOCK_SIZE / self.c).max(1));
        let elems = sp.0 * slot;
        let bytes = align_up(elems * self.c, 8) + align_up(elems * INNER_INDEX_BYTES, 8);
        tiling.out_a_align = slot as u64;
        tiling.workspace_size = align_up(bytes, WORKSPACE_ALIGN) as u64;
    }
}
