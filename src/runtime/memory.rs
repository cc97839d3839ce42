//! Global memory views handed to kernels
//!
//! Input tensors are shared read-only by every core. Outputs and the
//! workspace are written through raw views that many cores hold at once;
//! soundness rests on every core writing only the disjoint range its tiling
//! assigns to it.

use bytemuck::Pod;
use std::marker::PhantomData;
use std::ptr;

/// A strided box transfer from global memory into a dense scratch tile
///
/// Copies `outer × rows × len` elements. Element `(o, r, k)` is read from
/// `offset + o * outer_stride + r * row_stride + k` and written densely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyBox {
    /// First element of the box
    pub offset: usize,
    /// Number of outer blocks
    pub outer: usize,
    /// Distance between outer blocks
    pub outer_stride: usize,
    /// Rows per outer block
    pub rows: usize,
    /// Distance between rows
    pub row_stride: usize,
    /// Contiguous run length
    pub len: usize,
}

impl CopyBox {
    /// A 2-D box of `rows` runs of `len` elements, `row_stride` apart
    pub fn rows(offset: usize, rows: usize, row_stride: usize, len: usize) -> Self {
        Self {
            offset,
            outer: 1,
            outer_stride: 0,
            rows,
            row_stride,
            len,
        }
    }

    /// Number of elements transferred
    #[inline]
    pub fn volume(&self) -> usize {
        self.outer * self.rows * self.len
    }
}

/// Read-only view of a tensor in global memory
#[derive(Clone, Copy, Debug)]
pub struct GlobalTensor<'a, T> {
    data: &'a [T],
}

impl<'a, T: Pod> GlobalTensor<'a, T> {
    /// Wrap a slice
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }

    /// Contiguous copy of `dst.len()` elements starting at `offset`
    #[inline]
    pub fn read(&self, offset: usize, dst: &mut [T]) {
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
    }

    /// Strided box copy; `dst` must hold at least `b.volume()` elements
    pub fn read_box(&self, b: &CopyBox, dst: &mut [T]) {
        let mut out = 0;
        for o in 0..b.outer {
            let block = b.offset + o * b.outer_stride;
            for r in 0..b.rows {
                let start = block + r * b.row_stride;
                dst[out..out + b.len].copy_from_slice(&self.data[start..start + b.len]);
                out += b.len;
            }
        }
    }

    /// Transposing copy of a `rows × cols` block
    ///
    /// Element `(r, c)` at `offset + r * row_stride + c` lands at
    /// `dst[c * rows + r]`, so each column becomes contiguous.
    pub fn read_transposed(
        &self,
        offset: usize,
        rows: usize,
        row_stride: usize,
        cols: usize,
        dst: &mut [T],
    ) {
        for r in 0..rows {
            let src = &self.data[offset + r * row_stride..offset + r * row_stride + cols];
            for (c, &v) in src.iter().enumerate() {
                dst[c * rows + r] = v;
            }
        }
    }
}

/// Writable view of a tensor in global memory shared by all cores
pub struct GlobalTensorMut<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: the view is only written through `unsafe` methods whose callers
// guarantee that concurrent writers touch disjoint ranges.
unsafe impl<T: Send> Send for GlobalTensorMut<'_, T> {}
unsafe impl<T: Send> Sync for GlobalTensorMut<'_, T> {}

impl<'a, T: Pod> GlobalTensorMut<'a, T> {
    /// Wrap a mutable slice
    pub fn new(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// Copy `src` into global memory at `offset`
    ///
    /// # Safety
    /// No other core may read or write `offset..offset + src.len()`
    /// concurrently.
    #[inline]
    pub unsafe fn write(&self, offset: usize, src: &[T]) {
        assert!(offset + src.len() <= self.len, "global write out of bounds");
        ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.add(offset), src.len());
    }

    /// Copy `dst.len()` elements starting at `offset` out of global memory
    ///
    /// # Safety
    /// No other core may write `offset..offset + dst.len()` concurrently, and
    /// earlier writes by other cores must be ordered before this read by a
    /// synchronization point.
    #[inline]
    pub unsafe fn read(&self, offset: usize, dst: &mut [T]) {
        assert!(offset + dst.len() <= self.len, "global read out of bounds");
        ptr::copy_nonoverlapping(self.ptr.add(offset), dst.as_mut_ptr(), dst.len());
    }
}

/// Global scratch used by the cross-core reduction
///
/// Holds a value region of lane type `C` followed by an index region, each
/// `slots * slot_len` long. Slot `s` belongs to core `s`.
pub struct Workspace<'a, C> {
    /// Per-slot partial values
    pub values: GlobalTensorMut<'a, C>,
    /// Per-slot partial indices
    pub indices: GlobalTensorMut<'a, u32>,
}

impl<'a, C: Pod> Workspace<'a, C> {
    /// Number of `u64` words a workspace for `elems` partial results needs
    #[cfg(test)]
    pub fn words_for(elems: usize) -> usize {
        (elems * std::mem::size_of::<C>()).div_ceil(8) + (elems * 4).div_ceil(8)
    }

    /// Carve `elems` values and `elems` indices out of `words`
    ///
    /// Returns `None` if `words` is too small.
    pub fn split(words: &'a mut [u64], elems: usize) -> Option<Self> {
        let value_words = (elems * std::mem::size_of::<C>()).div_ceil(8);
        let index_words = (elems * 4).div_ceil(8);
        if words.len() < value_words + index_words {
            return None;
        }
        let (value_part, rest) = words.split_at_mut(value_words);
        let values: &mut [C] = bytemuck::cast_slice_mut(value_part);
        let indices: &mut [u32] = bytemuck::cast_slice_mut(&mut rest[..index_words]);
        Some(Self {
            values: GlobalTensorMut::new(&mut values[..elems]),
            indices: GlobalTensorMut::new(&mut indices[..elems]),
        })
    }

    /// An empty workspace for modes that do not use one
    pub fn empty() -> Self {
        Self {
            values: GlobalTensorMut::new(&mut []),
            indices: GlobalTensorMut::new(&mut []),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_box() {
        // shape (2, 3, 4), take a = 0..2, r = 1..3, j = 1..3
        let data: Vec<i32> = (0..24).collect();
        let gm = GlobalTensor::new(&data);
        let b = CopyBox {
            offset: 4 + 1,
            outer: 2,
            outer_stride: 12,
            rows: 2,
            row_stride: 4,
            len: 2,
        };
        let mut dst = vec![0; b.volume()];
        gm.read_box(&b, &mut dst);
        assert_eq!(dst, vec![5, 6, 9, 10, 17, 18, 21, 22]);
    }

    #[test]
    fn test_read_transposed() {
        // 3 rows x 2 cols with row stride 4
        let data: Vec<i32> = (0..12).collect();
        let gm = GlobalTensor::new(&data);
        let mut dst = vec![0; 6];
        gm.read_transposed(1, 3, 4, 2, &mut dst);
        assert_eq!(dst, vec![1, 5, 9, 2, 6, 10]);
    }

    #[test]
    fn test_write_read() {
        let mut out = vec![0u32; 8];
        {
            let gm = GlobalTensorMut::new(&mut out);
            unsafe { gm.write(2, &[7, 8, 9]) };
            let mut back = [0u32; 2];
            unsafe { gm.read(3, &mut back) };
            assert_eq!(back, [8, 9]);
        }
        assert_eq!(out, vec![0, 0, 7, 8, 9, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "global write out of bounds")]
    fn test_write_past_end() {
        let mut out = vec![0i64; 4];
        let gm = GlobalTensorMut::new(&mut out);
        unsafe { gm.write(3, &[1, 2]) };
    }

    #[test]
    #[should_panic(expected = "global read out of bounds")]
    fn test_workspace_slots_are_bounded() {
        let mut words = vec![0u64; Workspace::<f32>::words_for(5)];
        let ws = Workspace::<f32>::split(&mut words, 5).unwrap();
        let mut past = [0u32; 1];
        unsafe { ws.indices.read(5, &mut past) };
    }

    #[test]
    fn test_workspace_split() {
        let elems = 5;
        let mut words = vec![0u64; Workspace::<f32>::words_for(elems)];
        assert_eq!(words.len(), 3 + 3);
        let ws = Workspace::<f32>::split(&mut words, elems).unwrap();
        unsafe {
            ws.values.write(0, &[1.0, 2.0, 3.0, 4.0, 5.0]);
            ws.indices.write(0, &[9, 8, 7, 6, 5]);
        }
        let mut idx = [0u32; 5];
        unsafe { ws.indices.read(0, &mut idx) };
        assert_eq!(idx, [9, 8, 7, 6, 5]);

        let mut small = vec![0u64; 2];
        assert!(Workspace::<i64>::split(&mut small, elems).is_none());
    }
}
