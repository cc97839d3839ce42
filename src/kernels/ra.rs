//! Column reduction (`A == 1`): cores split nextA

use super::base::{ArgReduceBase, KernelArgs};
use super::merge::{Direction, PartialResult};
use super::reduce::reduce_cols;
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::{CopyBox, CoreContext};
use crate::tiling::TilingData;
use std::marker::PhantomData;
use std::ops::Range;

pub(crate) struct RaReduce<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool> {
    base: ArgReduceBase<'k, 'a, T, I, W>,
    best: PartialResult<T::Compute>,
    part: PartialResult<T::Compute>,
    cols: Range<usize>,
    r_size: usize,
    next_a: usize,
    cut_r: usize,
    cut_next_a: usize,
    _dir: PhantomData<D>,
}

impl<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool>
    RaReduce<'k, 'a, T, I, D, W>
{
    pub fn new(
        core: &CoreContext<'_>,
        tiling: &TilingData,
        args: &'k KernelArgs<'a, T, I>,
    ) -> Self {
        let cut_r = tiling.cut_r_size as usize;
        let cut_next_a = tiling.cut_next_a_size as usize;
        let base = ArgReduceBase::new(args, tiling, cut_r * cut_next_a, cut_next_a);
        let best = base.partial(cut_next_a);
        let part = base.partial(cut_next_a);
        Self {
            base,
            best,
            part,
            cols: tiling.core_range(core.block_idx()),
            r_size: tiling.r_size as usize,
            next_a: tiling.next_a_size as usize,
            cut_r,
            cut_next_a,
            _dir: PhantomData,
        }
    }

    pub fn process(&mut self) {
        let mut j0 = self.cols.start;
        while j0 < self.cols.end {
            let jl = self.cut_next_a.min(self.cols.end - j0);
            let mut r0 = 0;
            while r0 < self.r_size {
                let rl = self.cut_r.min(self.r_size - r0);
                self.base
                    .copy_in_box(&CopyBox::rows(r0 * self.next_a + j0, rl, self.next_a, jl));
                let target = if r0 == 0 { &mut self.best } else { &mut self.part };
                let (out_v, out_i) = target.slots_mut(0, jl);
                reduce_cols::<_, D>(&self.base.calc, rl, jl, r0, out_v, out_i);
                if r0 > 0 {
                    self.best.merge_from::<D>(&self.part, jl);
                }
                r0 += rl;
            }
            self.base
                .copy_out(j0, &self.best.values[..jl], &self.best.indices[..jl]);
            j0 += jl;
        }
    }
}
