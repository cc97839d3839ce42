//! General `(A, R, nextA)` reduction with cores splitting A
//!
//! The sub-mode picks the unit a core iterates over:
//! - full load: whole `R × nextA` slabs of several rows of A at once;
//! - tiled: one `(a, nextA tile)` pair, R optionally chunked;
//! - fallback: one kept position, walking R with a strided copy.

use super::base::{ArgReduceBase, KernelArgs};
use super::merge::{merge, Direction, PartialResult};
use super::reduce::{reduce_cols, reduce_gather, reduce_rows, GatherLayout};
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::{CopyBox, CoreContext};
use crate::tiling::{AraMode, TilingData};
use std::marker::PhantomData;
use std::ops::Range;

pub(crate) struct AraReduce<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool> {
    base: ArgReduceBase<'k, 'a, T, I, W>,
    best: PartialResult<T::Compute>,
    part: PartialResult<T::Compute>,
    mode: AraMode,
    units: Range<usize>,
    r_size: usize,
    next_a: usize,
    cut_a: usize,
    cut_r: usize,
    cut_next_a: usize,
    _dir: PhantomData<D>,
}

impl<'k, 'a, T: ArgElement, I: IndexElement, D: Direction, const W: bool>
    AraReduce<'k, 'a, T, I, D, W>
{
    pub fn new(
        core: &CoreContext<'_>,
        tiling: &TilingData,
        args: &'k KernelArgs<'a, T, I>,
    ) -> Self {
        let mode = tiling.ara().unwrap_or(AraMode::CutRAndNextA);
        let r_size = tiling.r_size as usize;
        let next_a = tiling.next_a_size as usize;
        let cut_a = tiling.cut_a_size as usize;
        let cut_r = tiling.cut_r_size as usize;
        let cut_next_a = tiling.cut_next_a_size as usize;
        let (in_len, out_len) = match mode {
            AraMode::FullLoadGather | AraMode::FullLoadColumns => {
                (cut_a * r_size * next_a, cut_a * next_a)
            }
            AraMode::CutRFallback => (cut_r, cut_a),
            _ => (cut_r * cut_next_a, cut_next_a),
        };
        let base = ArgReduceBase::new(args, tiling, in_len, out_len);
        let best = base.partial(out_len);
        let part = base.partial(out_len);
        Self {
            base,
            best,
            part,
            mode,
            units: tiling.core_range(core.block_idx()),
            r_size,
            next_a,
            cut_a,
            cut_r,
            cut_next_a,
            _dir: PhantomData,
        }
    }

    pub fn process(&mut self) {
        match self.mode {
            AraMode::FullLoadGather | AraMode::FullLoadColumns => self.process_full_load(),
            AraMode::CutRFallback => self.process_fallback(),
            _ => self.process_tiled(),
        }
    }

    /// Units are rows of A; a tile is `rows × R × nextA`, loaded contiguously
    fn process_full_load(&mut self) {
        let slab = self.r_size * self.next_a;
        let mut a0 = self.units.start;
        while a0 < self.units.end {
            let rows = self.cut_a.min(self.units.end - a0);
            let out = rows * self.next_a;
            self.base.copy_in(a0 * slab, rows * slab);

            if self.mode == AraMode::FullLoadGather {
                let layout = GatherLayout {
                    count: out,
                    inner: self.next_a,
                    outer_stride: slab,
                    r_stride: self.next_a,
                    r_len: self.r_size,
                };
                let (out_v, out_i) = self.best.slots_mut(0, out);
                reduce_gather::<_, D>(&self.base.calc, &layout, 0, out_v, out_i);
            } else {
                for k in 0..rows {
                    let (out_v, out_i) = self.best.slots_mut(k * self.next_a, self.next_a);
                    let src = &self.base.calc[k * slab..(k + 1) * slab];
                    reduce_cols::<_, D>(src, self.r_size, self.next_a, 0, out_v, out_i);
                }
            }

            self.base.copy_out(
                a0 * self.next_a,
                &self.best.values[..out],
                &self.best.indices[..out],
            );
            a0 += rows;
        }
    }

    /// Units are `(a, nextA tile)` pairs
    fn process_tiled(&mut self) {
        let tiles = self.next_a.div_ceil(self.cut_next_a);
        for unit in self.units.clone() {
            let a = unit / tiles;
            let j0 = (unit % tiles) * self.cut_next_a;
            let jl = self.cut_next_a.min(self.next_a - j0);
            let row_base = a * self.r_size * self.next_a + j0;

            let mut r0 = 0;
            while r0 < self.r_size {
                let rl = self.cut_r.min(self.r_size - r0);
                self.base.copy_in_box(&CopyBox::rows(
                    row_base + r0 * self.next_a,
                    rl,
                    self.next_a,
                    jl,
                ));
                let target = if r0 == 0 { &mut self.best } else { &mut self.part };
                let (out_v, out_i) = target.slots_mut(0, jl);
                reduce_cols::<_, D>(&self.base.calc, rl, jl, r0, out_v, out_i);
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

    /// Units are kept positions, staged in blocks of `cut_a`
    fn process_fallback(&mut self) {
        let mut p0 = self.units.start;
        while p0 < self.units.end {
            let block = self.cut_a.min(self.units.end - p0);
            for k in 0..block {
                let p = p0 + k;
                let start = (p / self.next_a) * self.r_size * self.next_a + p % self.next_a;

                let mut r0 = 0;
                while r0 < self.r_size {
                    let rl = self.cut_r.min(self.r_size - r0);
                    self.base.copy_in_box(&CopyBox::rows(
                        start + r0 * self.next_a,
                        rl,
                        self.next_a,
                        1,
                    ));
                    let (out_v, out_i) = self.part.slots_mut(0, 1);
                    reduce_rows::<_, D>(&self.base.calc, 1, rl, r0, out_v, out_i);
                    if r0 == 0 {
                        self.best.values[k] = self.part.values[0];
                        self.best.indices[k] = self.part.indices[0];
                    } else {
                        let (best_v, best_i) = self.best.slots_mut(k, 1);
                        merge::<_, D>(
                            best_v,
                            best_i,
                            &self.part.values[..1],
                            &self.part.indices[..1],
                        );
                    }
                    r0 += rl;
                }
            }
            self.base.copy_out(
                p0,
                &self.best.values[..block],
                &self.best.indices[..block],
            );
            p0 += block;
        }
    }
}
