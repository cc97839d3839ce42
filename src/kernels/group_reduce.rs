//! Cross-core reduction: cores split R, then core 0 merges their partials
//!
//! Each core reduces its slice of R for every kept position and publishes
//! the partial result to its workspace slot. After the barrier, core 0 folds
//! the slots in core order, which keeps the lowest index on ties.

use super::base::{ArgReduceBase, KernelArgs};
use super::merge::{Direction, PartialResult};
use super::reduce::{reduce_cols, reduce_rows};
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::{CopyBox, CoreContext};
use crate::tiling::TilingData;
use std::marker::PhantomData;
use std::ops::Range;

pub(crate) struct GroupReduce<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool> {
    base: ArgReduceBase<'k, 'a, T, I, W>,
    best: PartialResult<T::Compute>,
    part: PartialResult<T::Compute>,
    block_idx: usize,
    real_core_num: usize,
    steps: Range<usize>,
    a_size: usize,
    r_size: usize,
    next_a: usize,
    cut_r: usize,
    out: usize,
    slot: usize,
    _dir: PhantomData<D>,
}

impl<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool>
    GroupReduce<'k, 'a, T, I, D, W>
{
    pub fn new(
        core: &CoreContext<'_>,
        tiling: &TilingData,
        args: &'k KernelArgs<'a, T, I>,
    ) -> Self {
        let shape = tiling.shape();
        let out = shape.out_size();
        let cut_r = tiling.cut_r_size as usize;
        let base = ArgReduceBase::new(args, tiling, cut_r * out, out);
        let best = base.partial(out);
        let part = base.partial(out);
        Self {
            base,
            best,
            part,
            block_idx: core.block_idx(),
            real_core_num: tiling.real_core_num as usize,
            steps: tiling.core_range(core.block_idx()),
            a_size: shape.a,
            r_size: shape.r,
            next_a: shape.next_a,
            cut_r,
            out,
            slot: tiling.out_a_align as usize,
            _dir: PhantomData,
        }
    }

    pub fn process(&mut self, core: &CoreContext<'_>) {
        self.reduce_local();
        self.publish();
        core.sync_all();
        if self.block_idx == 0 {
            self.combine();
        }
    }

    /// Reduce this core's R slice for every kept position into `best`
    fn reduce_local(&mut self) {
        let Range { start, end } = self.steps;
        let mut r0 = start;
        while r0 < end {
            let rl = self.cut_r.min(end - r0);
            let target = if r0 == start { &mut self.best } else { &mut self.part };

            if self.next_a == 1 {
                self.base
                    .copy_in_box(&CopyBox::rows(r0, self.a_size, self.r_size, rl));
                let (out_v, out_i) = target.slots_mut(0, self.a_size);
                reduce_rows::<_, D>(&self.base.calc, self.a_size, rl, r0, out_v, out_i);
            } else {
                self.base.copy_in_box(&CopyBox {
                    offset: r0 * self.next_a,
                    outer: self.a_size,
                    outer_stride: self.r_size * self.next_a,
                    rows: rl,
                    row_stride: self.next_a,
                    len: self.next_a,
                });
                let chunk = rl * self.next_a;
                for k in 0..self.a_size {
                    let (out_v, out_i) = target.slots_mut(k * self.next_a, self.next_a);
                    let src = &self.base.calc[k * chunk..(k + 1) * chunk];
                    reduce_cols::<_, D>(src, rl, self.next_a, r0, out_v, out_i);
                }
            }

            if r0 > start {
                self.best.merge_from::<D>(&self.part, self.out);
            }
            r0 += rl;
        }
    }

    fn publish(&self) {
        let ws = &self.base.args.workspace;
        let at = self.block_idx * self.slot;
        // SAFETY: slot `block_idx` is written by this core only, and read by
        // core 0 after the barrier.
        unsafe {
            ws.values.write(at, &self.best.values[..self.out]);
            ws.indices.write(at, &self.best.indices[..self.out]);
        }
    }

    fn combine(&mut self) {
        let args = self.base.args;
        let ws = &args.workspace;
        for s in 1..self.real_core_num {
            let at = s * self.slot;
            // SAFETY: every slot was written before the barrier and no core
            // writes the workspace after it.
            unsafe {
                ws.values.read(at, &mut self.part.values[..self.out]);
                ws.indices.read(at, &mut self.part.indices[..self.out]);
            }
            self.best.merge_from::<D>(&self.part, self.out);
        }
        self.base.copy_out(
            0,
            &self.best.values[..self.out],
            &self.best.indices[..self.out],
        );
    }
}
