//! Two-level core grid: cores split A on one level and nextA on the other

use super::base::{ArgReduceBase, KernelArgs};
use super::merge::{Direction, PartialResult};
use super::reduce::reduce_cols;
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::{CopyBox, CoreContext};
use crate::tiling::TilingData;
use std::marker::PhantomData;
use std::ops::Range;

pub(crate) struct AraCutANextA<'k, 'a, T, I, D, const W: bool>
where
    T: ArgElement,
    I: IndexElement,
    D: Direction,
{
    base: ArgReduceBase<'k, 'a, T, I, W>,
    best: PartialResult<T::Compute>,
    part: PartialResult<T::Compute>,
    rows: Range<usize>,
    cols: Range<usize>,
    r_size: usize,
    next_a: usize,
    cut_a: usize,
    cut_r: usize,
    cut_next_a: usize,
    _dir: PhantomData<D>,
}

impl<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool>
    AraCutANextA<'k, 'a, T, I, D, W>
{
    pub fn new(
        core: &CoreContext<'_>,
        tiling: &TilingData,
        args: &'k KernelArgs<'a, T, I>,
    ) -> Self {
        let cut_a = tiling.cut_a_size as usize;
        let cut_r = tiling.cut_r_size as usize;
        let cut_next_a = tiling.cut_next_a_size as usize;
        let grid_cols = (tiling.blk_num_2nd as usize).max(1);
        let idx = core.block_idx();

        let base = ArgReduceBase::new(args, tiling, cut_a * cut_r * cut_next_a, cut_a * cut_next_a);
        let best = base.partial(cut_a * cut_next_a);
        let part = base.partial(cut_a * cut_next_a);
        Self {
            base,
            best,
            part,
            rows: tiling.core_range(idx / grid_cols),
            cols: tiling.core_range_2nd(idx % grid_cols),
            r_size: tiling.r_size as usize,
            next_a: tiling.next_a_size as usize,
            cut_a,
            cut_r,
            cut_next_a,
            _dir: PhantomData,
        }
    }

    pub fn process(&mut self) {
        let mut j0 = self.cols.start;
        while j0 < self.cols.end {
            let jl = self.cut_next_a.min(self.cols.end - j0);
            let mut a0 = self.rows.start;
            while a0 < self.rows.end {
                let rows = self.cut_a.min(self.rows.end - a0);
                self.reduce_tile(a0, rows, j0, jl);
                // 2-D copy-out: one run of `jl` per row of A
                for k in 0..rows {
                    let span = k * jl..(k + 1) * jl;
                    self.base.copy_out(
                        (a0 + k) * self.next_a + j0,
                        &self.best.values[span.clone()],
                        &self.best.indices[span],
                    );
                }
                a0 += rows;
            }
            j0 += jl;
        }
    }

    fn reduce_tile(&mut self, a0: usize, rows: usize, j0: usize, jl: usize) {
        let slab = self.r_size * self.next_a;
        let mut r0 = 0;
        while r0 < self.r_size {
            let rl = self.cut_r.min(self.r_size - r0);
            self.base.copy_in_box(&CopyBox {
                offset: a0 * slab + r0 * self.next_a + j0,
                outer: rows,
                outer_stride: slab,
                rows: rl,
                row_stride: self.next_a,
                len: jl,
            });

            let target = if r0 == 0 { &mut self.best } else { &mut self.part };
            for k in 0..rows {
                let (out_v, out_i) = target.slots_mut(k * jl, jl);
                let src = &self.base.calc[k * rl * jl..(k + 1) * rl * jl];
                reduce_cols::<_, D>(src, rl, jl, r0, out_v, out_i);
            }
            if r0 > 0 {
                self.best.merge_from::<D>(&self.part, rows * jl);
            }
            r0 += rl;
        }
    }
}
