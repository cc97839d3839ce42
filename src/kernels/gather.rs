//! Gather-based `(A, R, nextA)` reduction for short or strided reduction axes
//!
//! `GatherCutA` loads whole `R × nextA` slabs and reduces every kept position
//! of the tile with one lane each. `GatherTransposed` loads an `R × nextA`
//! block transposed so each kept position's run along R is contiguous.

use super::base::{ArgReduceBase, KernelArgs};
use super::merge::{Direction, PartialResult};
use super::reduce::{reduce_gather, reduce_rows, GatherLayout};
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::{CopyBox, CoreContext};
use crate::tiling::{AraMode, TilingData};
use std::marker::PhantomData;
use std::ops::Range;

pub(crate) struct AraGather<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool> {
    base: ArgReduceBase<'k, 'a, T, I, W>,
    best: PartialResult<T::Compute>,
    part: PartialResult<T::Compute>,
    transposed: bool,
    units: Range<usize>,
    r_size: usize,
    next_a: usize,
    cut_a: usize,
    cut_r: usize,
    cut_next_a: usize,
    _dir: PhantomData<D>,
}

impl<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool>
    AraGather<'k, 'a, T, I, D, W>
{
    pub fn new(
        core: &CoreContext<'_>,
        tiling: &TilingData,
        args: &'k KernelArgs<'a, T, I>,
    ) -> Self {
        let transposed = tiling.ara() == Some(AraMode::GatherTransposed);
        let next_a = tiling.next_a_size as usize;
        let cut_a = tiling.cut_a_size as usize;
        let cut_r = tiling.cut_r_size as usize;
        let cut_next_a = tiling.cut_next_a_size as usize;
        let (in_len, out_len) = if transposed {
            (cut_r * cut_next_a, cut_next_a)
        } else {
            (cut_a * cut_r * next_a, cut_a * next_a)
        };
        let base = ArgReduceBase::new(args, tiling, in_len, out_len);
        let best = base.partial(out_len);
        let part = base.partial(out_len);
        Self {
            base,
            best,
            part,
            transposed,
            units: tiling.core_range(core.block_idx()),
            r_size: tiling.r_size as usize,
            next_a,
            cut_a,
            cut_r,
            cut_next_a,
            _dir: PhantomData,
        }
    }

    pub fn process(&mut self) {
        if self.transposed {
            self.process_transposed();
        } else {
            self.process_cut_a();
        }
    }

    fn process_cut_a(&mut self) {
        let slab = self.r_size * self.next_a;
        let mut a0 = self.units.start;
        while a0 < self.units.end {
            let rows = self.cut_a.min(self.units.end - a0);
            let out = rows * self.next_a;

            let mut r0 = 0;
            while r0 < self.r_size {
                let rl = self.cut_r.min(self.r_size - r0);
                let chunk = rl * self.next_a;
                self.base.copy_in_box(&CopyBox {
                    offset: a0 * slab + r0 * self.next_a,
                    outer: rows,
                    outer_stride: slab,
                    rows: 1,
                    row_stride: 0,
                    len: chunk,
                });
                let layout = GatherLayout {
                    count: out,
                    inner: self.next_a,
                    outer_stride: chunk,
                    r_stride: self.next_a,
                    r_len: rl,
                };
                let target = if r0 == 0 { &mut self.best } else { &mut self.part };
                let (out_v, out_i) = target.slots_mut(0, out);
                reduce_gather::<_, D>(&self.base.calc, &layout, r0, out_v, out_i);
                if r0 > 0 {
                    self.best.merge_from::<D>(&self.part, out);
                }
                r0 += rl;
            }

            self.base.copy_out(
                a0 * self.next_a,
                &self.best.values[..out],
                &self.best.indices[..out],
            );
            a0 += rows;
        }
    }

    fn process_transposed(&mut self) {
        let tiles = self.next_a.div_ceil(self.cut_next_a);
        for unit in self.units.clone() {
            let a = unit / tiles;
            let j0 = (unit % tiles) * self.cut_next_a;
            let jl = self.cut_next_a.min(self.next_a - j0);
            let row_base = a * self.r_size * self.next_a + j0;

            let mut r0 = 0;
            while r0 < self.r_size {
                let rl = self.cut_r.min(self.r_size - r0);
                // rl × jl block lands as jl contiguous runs of rl
                self.base
                    .copy_in_transposed(row_base + r0 * self.next_a, rl, self.next_a, jl);
                let target = if r0 == 0 { &mut self.best } else { &mut self.part };
                let (out_v, out_i) = target.slots_mut(0, jl);
                reduce_rows::<_, D>(&self.base.calc, jl, rl, r0, out_v, out_i);
                if r0 > 0 {
                    self.best.merge_from::<D>(&self.part, jl);
                }
                r0 += rl;
            }

            self.base.copy_out(
                a * self.next_a + j0,
                &self.best.values[..jl],
                &self.best.indices[..jl],
            );
        }
    }
}
