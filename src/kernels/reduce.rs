//! Vectorized reduce-with-index primitives over scratch tiles
//!
//! Every primitive writes one `(value, index)` pair per kept position and
//! adds `r0`, the chunk's starting position along the reduction axis, to the
//! indices it produces.

use super::merge::Direction;
use super::simd::{lanes_of, reduce_lanes, IReg, MaskReg, VReg, MAX_LANES};
use crate::dtype::Lane;

/// Reduce each row of a dense `rows × len` tile along the row
pub fn reduce_rows<C: Lane, D: Direction>(
    src: &[C],
    rows: usize,
    len: usize,
    r0: usize,
    out_v: &mut [C],
    out_i: &mut [u32],
) {
    for row in 0..rows {
        let (v, i) = reduce_row::<C, D>(&src[row * len..(row + 1) * len]);
        out_v[row] = v;
        out_i[row] = i + r0 as u32;
    }
}

/// Reduce one contiguous run to its best `(value, local index)`
pub fn reduce_row<C: Lane, D: Direction>(row: &[C]) -> (C, u32) {
    let lanes = lanes_of::<C>();
    if row.len() <= lanes {
        return reduce_row_short::<C, D>(row);
    }

    let mut best = VReg::load(&row[..lanes]);
    let mut best_idx = IReg::lane_ids(0);
    for (level, chunk) in row.chunks(lanes).enumerate().skip(1) {
        let mask = MaskReg::first(chunk.len());
        let cand = VReg::load(chunk);
        let win = cand.compare_better::<D>(&best, mask);
        best = VReg::select(win, &cand, &best);
        best_idx = IReg::select(win, &IReg::lane_ids((level * lanes) as u32), &best_idx);
    }
    reduce_lanes::<C, D>(&best, &best_idx, MaskReg::first(lanes))
}

/// Single-load path for runs no longer than one register
#[inline]
fn reduce_row_short<C: Lane, D: Direction>(row: &[C]) -> (C, u32) {
    let v = VReg::load(row);
    reduce_lanes::<C, D>(&v, &IReg::lane_ids(0), MaskReg::first(row.len()))
}

/// Reduce each column of a dense `rows × cols` tile down the rows
pub fn reduce_cols<C: Lane, D: Direction>(
    src: &[C],
    rows: usize,
    cols: usize,
    r0: usize,
    out_v: &mut [C],
    out_i: &mut [u32],
) {
    let lanes = lanes_of::<C>();
    let mut c0 = 0;
    while c0 < cols {
        let n = lanes.min(cols - c0);
        let mask = MaskReg::first(n);
        let mut best = VReg::load(&src[c0..c0 + n]);
        let mut best_idx = IReg::splat(0);
        for r in 1..rows {
            let base = r * cols + c0;
            let cand = VReg::load(&src[base..base + n]);
            let win = cand.compare_better::<D>(&best, mask);
            best = VReg::select(win, &cand, &best);
            best_idx = IReg::select(win, &IReg::splat(r as u32), &best_idx);
        }
        best.store(&mut out_v[c0..c0 + n]);
        best_idx.store_offset(&mut out_i[c0..c0 + n], r0 as u32);
        c0 += n;
    }
}

/// Addressing of a gather reduction
///
/// Position `p` reads `(p / inner) * outer_stride + p % inner + r * r_stride`
/// for `r` in `0..r_len`.
#[derive(Clone, Copy, Debug)]
pub struct GatherLayout {
    /// Number of positions
    pub count: usize,
    /// Positions per outer block
    pub inner: usize,
    /// Distance between outer blocks
    pub outer_stride: usize,
    /// Distance between consecutive reduction steps
    pub r_stride: usize,
    /// Reduction steps
    pub r_len: usize,
}

/// Reduce positions whose elements are strided in the tile, one per lane
pub fn reduce_gather<C: Lane, D: Direction>(
    src: &[C],
    layout: &GatherLayout,
    r0: usize,
    out_v: &mut [C],
    out_i: &mut [u32],
) {
    let lanes = lanes_of::<C>();
    let mut offsets = [0usize; MAX_LANES];
    let mut p0 = 0;
    while p0 < layout.count {
        let n = lanes.min(layout.count - p0);
        let mask = MaskReg::first(n);
        for (lane, off) in offsets.iter_mut().enumerate().take(n) {
            let p = p0 + lane;
            *off = (p / layout.inner) * layout.outer_stride + p % layout.inner;
        }
        let mut best = VReg::gather(src, &offsets, 0, mask);
        let mut best_idx = IReg::splat(0);
        for r in 1..layout.r_len {
            let cand = VReg::gather(src, &offsets, r * layout.r_stride, mask);
            let win = cand.compare_better::<D>(&best, mask);
            best = VReg::select(win, &cand, &best);
            best_idx = IReg::select(win, &IReg::splat(r as u32), &best_idx);
        }
        best.store(&mut out_v[p0..p0 + n]);
        best_idx.store_offset(&mut out_i[p0..p0 + n], r0 as u32);
        p0 += n;
    }
}

/// Scalar reference used to cross-check the vector paths
#[cfg(test)]
pub(crate) fn reduce_scalar<C: Lane, D: Direction>(run: &[C]) -> (C, u32) {
    let mut best = (run[0], 0u32);
    for (i, &v) in run.iter().enumerate().skip(1) {
        if super::merge::better::<C, D>(v, best.0) {
            best = (v, i as u32);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::super::merge::{merge, Max, Min};
    use super::*;

    fn pattern(n: usize) -> Vec<f32> {
        (0..n).map(|i| ((i * 7919) % 211) as f32 - 100.0).collect()
    }

    #[test]
    fn test_reduce_row_matches_scalar() {
        for n in [1, 5, 63, 64, 65, 200, 1000] {
            let row = pattern(n);
            assert_eq!(reduce_row::<f32, Max>(&row), reduce_scalar::<f32, Max>(&row), "n={n}");
            assert_eq!(reduce_row::<f32, Min>(&row), reduce_scalar::<f32, Min>(&row), "n={n}");
        }
    }

    #[test]
    fn test_reduce_row_duplicates_across_levels() {
        // the maximum appears in lane 3 of level 2 and lane 1 of level 3
        let mut row = vec![0i64; 4 * 32];
        row[2 * 32 + 3] = 9;
        row[3 * 32 + 1] = 9;
        assert_eq!(reduce_row::<i64, Max>(&row), (9, 67));
        // the minimum 0 first appears at 0
        assert_eq!(reduce_row::<i64, Min>(&row), (0, 0));
    }

    #[test]
    fn test_reduce_row_nan() {
        let mut row = vec![f32::NAN; 130];
        assert_eq!(reduce_row::<f32, Max>(&row).1, 0);
        row[100] = -5.0;
        row[120] = -5.0;
        assert_eq!(reduce_row::<f32, Max>(&row), (-5.0, 100));
        assert_eq!(reduce_row::<f32, Min>(&row), (-5.0, 100));
    }

    #[test]
    fn test_reduce_rows_offset() {
        let src = [1i32, 4, 4, 2, 0, 0];
        let mut v = [0; 2];
        let mut i = [0; 2];
        reduce_rows::<i32, Max>(&src, 2, 3, 10, &mut v, &mut i);
        assert_eq!(v, [4, 2]);
        assert_eq!(i, [11, 10]);
    }

    #[test]
    fn test_reduce_cols() {
        // 3 rows x 2 cols
        let src = [1i32, 8, 5, 8, 5, 2];
        let mut v = [0; 2];
        let mut i = [0; 2];
        reduce_cols::<i32, Max>(&src, 3, 2, 4, &mut v, &mut i);
        assert_eq!(v, [5, 8]);
        assert_eq!(i, [5, 4]);
        reduce_cols::<i32, Min>(&src, 3, 2, 0, &mut v, &mut i);
        assert_eq!(v, [1, 2]);
        assert_eq!(i, [0, 2]);
    }

    #[test]
    fn test_reduce_gather_ara_layout() {
        // tile of shape (2, 3, 2): a x r x j; positions (a, j)
        let src = [1i32, 6, 3, 6, 2, 0, 9, 9, 9, 4, 7, 4];
        let layout = GatherLayout {
            count: 4,
            inner: 2,
            outer_stride: 6,
            r_stride: 2,
            r_len: 3,
        };
        let mut v = [0; 4];
        let mut i = [0; 4];
        reduce_gather::<i32, Max>(&src, &layout, 0, &mut v, &mut i);
        assert_eq!(v, [3, 6, 9, 9]);
        assert_eq!(i, [1, 0, 0, 0]);
        reduce_gather::<i32, Min>(&src, &layout, 1, &mut v, &mut i);
        assert_eq!(v, [1, 0, 7, 4]);
        assert_eq!(i, [1, 3, 3, 2]);
    }

    #[test]
    fn test_chunked_equals_whole() {
        let row = pattern(777);
        let whole = reduce_row::<f32, Max>(&row);
        for chunk in [1, 10, 64, 100, 776] {
            let mut best_v = [0.0f32];
            let mut best_i = [0u32];
            for (k, part) in row.chunks(chunk).enumerate() {
                let (v, i) = reduce_row::<f32, Max>(part);
                let i = i + (k * chunk) as u32;
                if k == 0 {
                    best_v[0] = v;
                    best_i[0] = i;
                } else {
                    merge::<f32, Max>(&mut best_v, &mut best_i, &[v], &[i]);
                }
            }
            assert_eq!((best_v[0], best_i[0]), whole, "chunk={chunk}");
        }
    }
}
