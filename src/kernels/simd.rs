//! Vector register micro-API
//!
//! A portable model of the accelerator's vector unit: fixed-width registers
//! of [`VREG_BYTES`] bytes, lane masks, masked compare/select, gathers and
//! cross-lane reductions. Index registers always hold `u32` lanes, so a
//! register of 64-bit values has half as many value lanes as index lanes.

use super::merge::{better, Direction};
use crate::dtype::Lane;
use crate::runtime::VREG_BYTES;

/// Maximum lanes of any register (32-bit lanes)
pub const MAX_LANES: usize = VREG_BYTES / 4;

/// Number of `C` lanes in one register
#[inline]
pub const fn lanes_of<C>() -> usize {
    VREG_BYTES / std::mem::size_of::<C>()
}

/// Lane predicate register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskReg(u64);

impl MaskReg {
    /// Mask with the first `n` lanes set
    #[inline]
    pub const fn first(n: usize) -> Self {
        if n >= 64 {
            Self(u64::MAX)
        } else {
            Self((1u64 << n) - 1)
        }
    }

    /// Whether `lane` is set
    #[inline]
    pub const fn is_set(self, lane: usize) -> bool {
        (self.0 >> lane) & 1 == 1
    }

    #[inline]
    fn set(&mut self, lane: usize) {
        self.0 |= 1 << lane;
    }

    /// Number of set lanes
    #[cfg(test)]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// Value register
#[derive(Clone, Copy, Debug)]
pub struct VReg<C: Lane> {
    lanes: [C; MAX_LANES],
}

impl<C: Lane> VReg<C> {
    /// Broadcast one value to every lane
    #[inline]
    pub fn splat(v: C) -> Self {
        Self {
            lanes: [v; MAX_LANES],
        }
    }

    /// Contiguous load of `src.len()` lanes; the rest are zero
    #[inline]
    pub fn load(src: &[C]) -> Self {
        let mut reg = Self::splat(C::zeroed());
        reg.lanes[..src.len()].copy_from_slice(src);
        reg
    }

    /// Gather `src[offsets[l] + shift]` into each lane set in `mask`
    #[inline]
    pub fn gather(src: &[C], offsets: &[usize; MAX_LANES], shift: usize, mask: MaskReg) -> Self {
        let mut reg = Self::splat(C::zeroed());
        for lane in 0..lanes_of::<C>() {
            if mask.is_set(lane) {
                reg.lanes[lane] = src[offsets[lane] + shift];
            }
        }
        reg
    }

    /// Store the first `dst.len()` lanes
    #[inline]
    pub fn store(&self, dst: &mut [C]) {
        dst.copy_from_slice(&self.lanes[..dst.len()]);
    }

    /// Read one lane
    #[cfg(test)]
    pub fn lane(&self, lane: usize) -> C {
        self.lanes[lane]
    }

    /// `a` where `mask` is set, otherwise `b`
    #[inline]
    pub fn select(mask: MaskReg, a: &Self, b: &Self) -> Self {
        let mut reg = *b;
        for lane in 0..lanes_of::<C>() {
            if mask.is_set(lane) {
                reg.lanes[lane] = a.lanes[lane];
            }
        }
        reg
    }

    /// Lanes (within `mask`) where `self` beats `best` in direction `D`
    ///
    /// NaN never beats anything; anything that is not NaN beats NaN. Equal
    /// values do not win.
    #[inline]
    pub fn compare_better<D: Direction>(&self, best: &Self, mask: MaskReg) -> MaskReg {
        let mut win = MaskReg::default();
        for lane in 0..lanes_of::<C>() {
            if mask.is_set(lane) && better::<C, D>(self.lanes[lane], best.lanes[lane]) {
                win.set(lane);
            }
        }
        win
    }

    /// Lanes (within `mask`) equal to `v`, treating NaN as equal to NaN
    #[inline]
    pub fn compare_eq(&self, v: C, mask: MaskReg) -> MaskReg {
        let mut eq = MaskReg::default();
        for lane in 0..lanes_of::<C>() {
            let x = self.lanes[lane];
            if mask.is_set(lane) && (x == v || (x.is_nan() && v.is_nan())) {
                eq.set(lane);
            }
        }
        eq
    }

    /// Best value over the lanes in `mask` (which must not be empty)
    #[inline]
    pub fn reduce_best<D: Direction>(&self, mask: MaskReg) -> C {
        let mut acc: Option<C> = None;
        for lane in 0..lanes_of::<C>() {
            if !mask.is_set(lane) {
                continue;
            }
            let x = self.lanes[lane];
            acc = match acc {
                Some(cur) if !better::<C, D>(x, cur) => Some(cur),
                _ => Some(x),
            };
        }
        acc.unwrap_or_else(|| self.lanes[0])
    }
}

/// Index register (`u32` lanes)
#[derive(Clone, Copy, Debug)]
pub struct IReg {
    lanes: [u32; MAX_LANES],
}

impl IReg {
    /// Broadcast one index
    #[inline]
    pub fn splat(v: u32) -> Self {
        Self {
            lanes: [v; MAX_LANES],
        }
    }

    /// Lane `l` holds `base + l`
    #[inline]
    pub fn lane_ids(base: u32) -> Self {
        let mut reg = Self::splat(0);
        for (lane, v) in reg.lanes.iter_mut().enumerate() {
            *v = base + lane as u32;
        }
        reg
    }

    /// Contiguous load of `src.len()` lanes
    #[inline]
    pub fn load(src: &[u32]) -> Self {
        let mut reg = Self::splat(0);
        reg.lanes[..src.len()].copy_from_slice(src);
        reg
    }

    /// Store the first `dst.len()` lanes
    #[inline]
    pub fn store(&self, dst: &mut [u32]) {
        dst.copy_from_slice(&self.lanes[..dst.len()]);
    }

    /// Store the first `dst.len()` lanes plus `offset`
    #[inline]
    pub fn store_offset(&self, dst: &mut [u32], offset: u32) {
        for (d, &v) in dst.iter_mut().zip(&self.lanes) {
            *d = v + offset;
        }
    }

    /// `a` where `mask` is set, otherwise `b`
    #[inline]
    pub fn select(mask: MaskReg, a: &Self, b: &Self) -> Self {
        let mut reg = *b;
        for lane in 0..MAX_LANES {
            if mask.is_set(lane) {
                reg.lanes[lane] = a.lanes[lane];
            }
        }
        reg
    }

    /// Smallest index over the lanes in `mask`
    #[inline]
    pub fn reduce_min(&self, mask: MaskReg) -> u32 {
        (0..MAX_LANES)
            .filter(|&lane| mask.is_set(lane))
            .map(|lane| self.lanes[lane])
            .min()
            .unwrap_or(0)
    }
}

/// Cross-lane arg-reduction of one register
///
/// Picks the best value among the lanes in `mask`, then the smallest index
/// among the lanes holding that value.
#[inline]
pub fn reduce_lanes<C: Lane, D: Direction>(v: &VReg<C>, idx: &IReg, mask: MaskReg) -> (C, u32) {
    let best = v.reduce_best::<D>(mask);
    let hits = v.compare_eq(best, mask);
    (best, idx.reduce_min(hits))
}

#[cfg(test)]
mod tests {
    use super::super::merge::{Max, Min};
    use super::*;

    #[test]
    fn test_lane_counts() {
        assert_eq!(lanes_of::<f32>(), 64);
        assert_eq!(lanes_of::<i32>(), 64);
        assert_eq!(lanes_of::<i64>(), 32);
        assert_eq!(MaskReg::first(3).count(), 3);
        assert_eq!(MaskReg::first(64).count(), 64);
        assert!(MaskReg::first(2).is_set(1));
        assert!(!MaskReg::first(2).is_set(2));
    }

    #[test]
    fn test_compare_better_nan_loses() {
        let best = VReg::load(&[1.0f32, f32::NAN, 3.0, f32::NAN]);
        let cand = VReg::load(&[2.0f32, 0.5, f32::NAN, f32::NAN]);
        let win = cand.compare_better::<Max>(&best, MaskReg::first(4));
        assert!(win.is_set(0));
        assert!(win.is_set(1));
        assert!(!win.is_set(2));
        assert!(!win.is_set(3));
    }

    #[test]
    fn test_reduce_lanes_first_occurrence() {
        let v = VReg::load(&[3i32, 7, 1, 7, 1]);
        let idx = IReg::lane_ids(10);
        assert_eq!(reduce_lanes::<i32, Max>(&v, &idx, MaskReg::first(5)), (7, 11));
        assert_eq!(reduce_lanes::<i32, Min>(&v, &idx, MaskReg::first(5)), (1, 12));
        // masked lanes are ignored
        assert_eq!(reduce_lanes::<i32, Min>(&v, &idx, MaskReg::first(2)), (3, 10));
    }

    #[test]
    fn test_reduce_lanes_all_nan() {
        let v = VReg::load(&[f32::NAN; 4]);
        let (best, i) = reduce_lanes::<f32, Max>(&v, &IReg::lane_ids(0), MaskReg::first(4));
        assert!(best.is_nan());
        assert_eq!(i, 0);
    }

    #[test]
    fn test_gather_and_select() {
        let src: Vec<i64> = (0..100).collect();
        let mut offsets = [0usize; MAX_LANES];
        offsets[0] = 5;
        offsets[1] = 40;
        let reg = VReg::gather(&src, &offsets, 2, MaskReg::first(2));
        assert_eq!(reg.lane(0), 7);
        assert_eq!(reg.lane(1), 42);

        let picked = VReg::select(MaskReg::first(1), &reg, &VReg::splat(-1));
        assert_eq!(picked.lane(0), 7);
        assert_eq!(picked.lane(1), -1);
    }
}
