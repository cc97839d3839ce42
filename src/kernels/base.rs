//! State shared by every core-local arg-reduction variant

use super::merge::PartialResult;
use crate::dtype::{ArgElement, IndexElement};
use crate::runtime::{
    BufferQueue, CopyBox, GlobalTensor, GlobalTensorMut, ScratchPool, Workspace, DOUBLE_BUFFER,
};
use crate::tiling::TilingData;

/// Global memory bound to one launch
pub struct KernelArgs<'a, T: ArgElement, I> {
    /// Input tensor
    pub x: GlobalTensor<'a, T>,
    /// Value output (empty when values are not requested)
    pub values: GlobalTensorMut<'a, T>,
    /// Index output
    pub indices: GlobalTensorMut<'a, I>,
    /// Cross-core workspace (empty unless the mode needs one)
    pub workspace: Workspace<'a, T::Compute>,
}

/// Scratch queues plus copy-in/copy-out for one core
///
/// `W` selects whether values are written alongside indices.
pub struct ArgReduceBase<'k, 'a, T: ArgElement, I: IndexElement, const W: bool> {
    pub(crate) args: &'k KernelArgs<'a, T, I>,
    pub(crate) scratch: ScratchPool,
    in_que: BufferQueue<T>,
    value_que: BufferQueue<T>,
    index_que: BufferQueue<I>,
    /// Widened copy of the current input tile
    pub(crate) calc: Vec<T::Compute>,
}

impl<'k, 'a, T: ArgElement, I: IndexElement, const W: bool> ArgReduceBase<'k, 'a, T, I, W> {
    /// Set up queues for input tiles of `in_len` and output tiles of `out_len`
    pub fn new(
        args: &'k KernelArgs<'a, T, I>,
        tiling: &TilingData,
        in_len: usize,
        out_len: usize,
    ) -> Self {
        let scratch = ScratchPool::new(tiling.ub_size as usize);
        let in_que = scratch.queue(DOUBLE_BUFFER, in_len);
        let value_que = scratch.queue(DOUBLE_BUFFER, if W { out_len } else { 0 });
        let index_que = scratch.queue(DOUBLE_BUFFER, out_len);
        let calc = scratch.calc_buffer(in_len);
        Self {
            args,
            scratch,
            in_que,
            value_que,
            index_que,
            calc,
        }
    }

    /// Scratch-backed result buffer for `len` positions
    pub fn partial(&self, len: usize) -> PartialResult<T::Compute> {
        PartialResult::new(&self.scratch, len)
    }

    /// Load `len` contiguous elements at `offset` into [`Self::calc`]
    ///
    /// The transfer completes before this returns.
    pub fn copy_in(&mut self, offset: usize, len: usize) {
        let mut tile = self.in_que.alloc_tensor();
        self.args.x.read(offset, &mut tile[..len]);
        self.in_que.enque(tile);
        self.widen(len);
    }

    /// Load a strided box densely into [`Self::calc`]
    pub fn copy_in_box(&mut self, b: &CopyBox) {
        let len = b.volume();
        let mut tile = self.in_que.alloc_tensor();
        self.args.x.read_box(b, &mut tile[..len]);
        self.in_que.enque(tile);
        self.widen(len);
    }

    /// Load a `rows × cols` block transposed into [`Self::calc`]
    pub fn copy_in_transposed(
        &mut self,
        offset: usize,
        rows: usize,
        row_stride: usize,
        cols: usize,
    ) {
        let len = rows * cols;
        let mut tile = self.in_que.alloc_tensor();
        self.args
            .x
            .read_transposed(offset, rows, row_stride, cols, &mut tile[..len]);
        self.in_que.enque(tile);
        self.widen(len);
    }

    fn widen(&mut self, len: usize) {
        let tile = self.in_que.deque();
        for (dst, &src) in self.calc[..len].iter_mut().zip(&tile[..len]) {
            *dst = src.widen();
        }
        self.in_que.free_tensor(tile);
    }

    /// Write results for output positions `offset..offset + values.len()`
    pub fn copy_out(&mut self, offset: usize, values: &[T::Compute], indices: &[u32]) {
        let len = indices.len();

        let mut idx = self.index_que.alloc_tensor();
        for (dst, &i) in idx[..len].iter_mut().zip(indices) {
            *dst = I::from_index(i);
        }
        self.index_que.enque(idx);
        let idx = self.index_que.deque();
        // SAFETY: the tiling gives each core a disjoint output range.
        unsafe { self.args.indices.write(offset, &idx[..len]) };
        self.index_que.free_tensor(idx);

        if W {
            let mut val = self.value_que.alloc_tensor();
            for (dst, &v) in val[..len].iter_mut().zip(values) {
                *dst = T::narrow(v);
            }
            self.value_que.enque(val);
            let val = self.value_que.deque();
            // SAFETY: as above.
            unsafe { self.args.values.write(offset, &val[..len]) };
            self.value_que.free_tensor(val);
        }
    }
}
