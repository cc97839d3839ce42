//! Reduction axis of length one: every index is zero

use super::base::{ArgReduceBase, KernelArgs};
use super::merge::PartialResult;
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::CoreContext;
use crate::tiling::TilingData;
use std::ops::Range;

pub(crate) struct CopyOnly<'k, 'a, T: ArgElement, I: IndexElement, const W: bool> {
    base: ArgReduceBase<'k, 'a, T, I, W>,
    best: PartialResult<T::Compute>,
    range: Range<usize>,
    tile: usize,
}

impl<'k, 'a, T: ArgElement, I: IndexElement, const W: bool> CopyOnly<'k, 'a, T, I, W> {
    pub fn new(
        core: &CoreContext<'_>,
        tiling: &TilingData,
        args: &'k KernelArgs<'a, T, I>,
    ) -> Self {
        let tile = tiling.cut_a_size as usize;
        let base = ArgReduceBase::new(args, tiling, tile, tile);
        let best = base.partial(tile);
        Self {
            base,
            best,
            range: tiling.core_range(core.block_idx()),
            tile,
        }
    }

    pub fn process(&mut self) {
        let mut start = self.range.start;
        while start < self.range.end {
            let n = self.tile.min(self.range.end - start);
            self.base.copy_in(start, n);
            self.best.values[..n].copy_from_slice(&self.base.calc[..n]);
            self.best.indices[..n].fill(0);
            self.base
                .copy_out(start, &self.best.values[..n], &self.best.indices[..n]);
            start += n;
        }
    }
}
