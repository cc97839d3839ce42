//! Row reduction (`nextA == 1`): cores split the rows of A
//!
//! With `GATHER` set, a tile of short rows is reduced with one lane per row
//! instead of one row at a time.

use super::base::{ArgReduceBase, KernelArgs};
use super::merge::{Direction, PartialResult};
use super::reduce::{reduce_gather, reduce_rows, GatherLayout};
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::{CopyBox, CoreContext};
use crate::tiling::TilingData;
use std::marker::PhantomData;
use std::ops::Range;

pub(crate) struct ArReduce<'k, 'a, T, I, D, const W: bool, const GATHER: bool>
where
    T: ArgElement,
    I: IndexElement,
    D: Direction,
{
    base: ArgReduceBase<'k, 'a, T, I, W>,
    best: PartialResult<T::Compute>,
    part: PartialResult<T::Compute>,
    rows: Range<usize>,
    r_size: usize,
    cut_a: usize,
    cut_r: usize,
    _dir: PhantomData<D>,
}

impl<'k, 'a, T, I, D, const W: bool, const GATHER: bool> ArReduce<'k, 'a, T, I, D, W, GATHER>
where
    T: ArgElement,
    I: IndexElement,
    D: Direction,
{
    pub fn new(
        core: &CoreContext<'_>,
        tiling: &TilingData,
        args: &'k KernelArgs<'a, T, I>,
    ) -> Self {
        let cut_a = tiling.cut_a_size as usize;
        let cut_r = tiling.cut_r_size as usize;
        let base = ArgReduceBase::new(args, tiling, cut_a * cut_r, cut_a);
        let best = base.partial(cut_a);
        let part = base.partial(cut_a);
        Self {
            base,
            best,
            part,
            rows: tiling.core_range(core.block_idx()),
            r_size: tiling.r_size as usize,
            cut_a,
            cut_r,
            _dir: PhantomData,
        }
    }

    pub fn process(&mut self) {
        let mut a0 = self.rows.start;
        while a0 < self.rows.end {
            let rows = self.cut_a.min(self.rows.end - a0);
            self.reduce_tile(a0, rows);
            self.base
                .copy_out(a0, &self.best.values[..rows], &self.best.indices[..rows]);
            a0 += rows;
        }
    }

    fn reduce_tile(&mut self, a0: usize, rows: usize) {
        let mut r0 = 0;
        while r0 < self.r_size {
            let rl = self.cut_r.min(self.r_size - r0);
            self.base
                .copy_in_box(&CopyBox::rows(a0 * self.r_size + r0, rows, self.r_size, rl));

            let target = if r0 == 0 { &mut self.best } else { &mut self.part };
            let (out_v, out_i) = target.slots_mut(0, rows);
            if GATHER {
                let layout = GatherLayout {
                    count: rows,
                    inner: 1,
                    outer_stride: rl,
                    r_stride: 1,
                    r_len: rl,
                };
                reduce_gather::<_, D>(&self.base.calc, &layout, r0, out_v, out_i);
            } else {
                reduce_rows::<_, D>(&self.base.calc, rows, rl, r0, out_v, out_i);
            }

            if r0 > 0 {
                self.best.merge_from::<D>(&self.part, rows);
            }
            r0 += rl;
        }
    }
}
