//! Value/index merge of partial arg-reduction results

use super::simd::{lanes_of, IReg, MaskReg, VReg};
use crate::dtype::Lane;
use crate::runtime::ScratchPool;

/// Reduction direction, resolved at compile time
pub trait Direction: Send + Sync + 'static {
    /// True for argmin
    const IS_MIN: bool;

    /// Whether `candidate` is strictly preferred over `best`
    ///
    /// Comparisons involving NaN are false.
    fn prefers<C: Lane>(candidate: C, best: C) -> bool;
}

/// Arg-max direction
pub struct Max;

/// Arg-min direction
pub struct Min;

impl Direction for Max {
    const IS_MIN: bool = false;

    #[inline]
    fn prefers<C: Lane>(candidate: C, best: C) -> bool {
        candidate > best
    }
}

impl Direction for Min {
    const IS_MIN: bool = true;

    #[inline]
    fn prefers<C: Lane>(candidate: C, best: C) -> bool {
        candidate < best
    }
}

/// Whether `candidate` replaces `best`
///
/// A strictly better value wins, and any non-NaN value replaces a NaN one.
/// Ties and NaN candidates never win, which keeps the earliest position when
/// candidates are presented in increasing index order.
#[inline]
pub fn better<C: Lane, D: Direction>(candidate: C, best: C) -> bool {
    D::prefers(candidate, best) || (best.is_nan() && !candidate.is_nan())
}

/// Fold `(new_v, new_i)` into the running `(best_v, best_i)` lane by lane
///
/// `new` must come from a later part of the reduction axis than `best`.
pub fn merge<C: Lane, D: Direction>(
    best_v: &mut [C],
    best_i: &mut [u32],
    new_v: &[C],
    new_i: &[u32],
) {
    let lanes = lanes_of::<C>();
    let len = best_v.len();
    let mut start = 0;
    while start < len {
        let n = lanes.min(len - start);
        let end = start + n;
        let mask = MaskReg::first(n);
        let old = VReg::load(&best_v[start..end]);
        let cand = VReg::load(&new_v[start..end]);
        let win = cand.compare_better::<D>(&old, mask);
        VReg::select(win, &cand, &old).store(&mut best_v[start..end]);
        let idx = IReg::select(
            win,
            &IReg::load(&new_i[start..end]),
            &IReg::load(&best_i[start..end]),
        );
        idx.store(&mut best_i[start..end]);
        start = end;
    }
}

/// Per-position `(value, index)` results staged in scratch
#[derive(Debug)]
pub struct PartialResult<C> {
    /// Best values in the compute lane type
    pub values: Vec<C>,
    /// Positions along the reduction axis
    pub indices: Vec<u32>,
}

impl<C: Lane> PartialResult<C> {
    /// Reserve room for `len` positions in `scratch`
    pub fn new(scratch: &ScratchPool, len: usize) -> Self {
        Self {
            values: scratch.calc_buffer(len),
            indices: scratch.calc_buffer(len),
        }
    }

    /// Mutable views of positions `start..start + len`
    #[inline]
    pub fn slots_mut(&mut self, start: usize, len: usize) -> (&mut [C], &mut [u32]) {
        (
            &mut self.values[start..start + len],
            &mut self.indices[start..start + len],
        )
    }

    /// Merge the first `len` positions of a later chunk into this one
    #[inline]
    pub fn merge_from<D: Direction>(&mut self, later: &Self, len: usize) {
        merge::<C, D>(
            &mut self.values[..len],
            &mut self.indices[..len],
            &later.values[..len],
            &later.indices[..len],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_better_rules() {
        assert!(better::<f32, Max>(2.0, 1.0));
        assert!(!better::<f32, Max>(1.0, 1.0));
        assert!(better::<f32, Min>(-3.0, 1.0));
        assert!(better::<f32, Max>(-1.0, f32::NAN));
        assert!(!better::<f32, Max>(f32::NAN, -1.0));
        assert!(!better::<f32, Min>(f32::NAN, f32::NAN));
        assert!(!better::<f32, Max>(-0.0, 0.0));
        assert!(Min::IS_MIN);
        assert!(!Max::IS_MIN);
    }

    #[test]
    fn test_merge_keeps_first_on_tie() {
        let mut best_v = vec![5i32, 1, 9];
        let mut best_i = vec![0u32, 1, 2];
        merge::<i32, Max>(&mut best_v, &mut best_i, &[5, 4, 8], &[10, 11, 12]);
        assert_eq!(best_v, vec![5, 4, 9]);
        assert_eq!(best_i, vec![0, 11, 2]);
    }

    #[test]
    fn test_merge_nan_loses() {
        let mut best_v = vec![f32::NAN, 2.0, f32::NAN];
        let mut best_i = vec![0u32, 0, 0];
        merge::<f32, Min>(&mut best_v, &mut best_i, &[7.0, f32::NAN, f32::NAN], &[3, 3, 3]);
        assert_eq!(best_v[0], 7.0);
        assert_eq!(best_i, vec![3, 0, 0]);
        assert_eq!(best_v[1], 2.0);
        assert!(best_v[2].is_nan());
    }

    #[test]
    fn test_merge_idempotent() {
        let values: Vec<f32> = (0..150).map(|i| ((i * 37) % 11) as f32 - 5.0).collect();
        let indices: Vec<u32> = (0..150).collect();
        let mut best_v = values.clone();
        let mut best_i = indices.clone();
        merge::<f32, Max>(&mut best_v, &mut best_i, &values, &indices);
        assert_eq!(best_v, values);
        assert_eq!(best_i, indices);
    }

    #[test]
    fn test_partial_result_merge_from() {
        let scratch = ScratchPool::new(4096);
        let mut best = PartialResult::<i64>::new(&scratch, 4);
        let mut later = PartialResult::<i64>::new(&scratch, 4);
        best.values.copy_from_slice(&[1, 2, 3, 4]);
        later.values.copy_from_slice(&[0, 9, 3, 5]);
        later.indices.copy_from_slice(&[7, 7, 7, 7]);
        best.merge_from::<Min>(&later, 3);
        assert_eq!(best.values, vec![0, 2, 3, 4]);
        assert_eq!(best.indices, vec![7, 0, 0, 0]);
    }
}
