//! Tiling: the parameter block shared by the host planner and every core
//!
//! The planner decomposes the input into `(A, R, nextA)`, picks an execution
//! mode and sizes the per-core ranges and tiles. The result is a fixed-layout
//! [`TilingData`] block that is serialized once and read back by each core.

mod planner;

pub use planner::{ArgReduceRequest, PlannerOptions, TilingPlanner};

use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::ops::Range;

/// Largest number of kept positions a core stages at once
pub const PROCESS_SIZE: usize = 1024;

/// Minimum useful contiguous run in bytes when splitting nextA across cores
pub const MIN_CUT_SIZE: usize = 128;

/// nextA rows narrower than this many bytes are reduced with gathers
pub const MAX_NEXTA_SIZE: usize = 32;

/// Alignment in bytes of each workspace slot
pub const BLOCK_SIZE: usize = 32;

/// Inputs smaller than this many bytes run on a single core
pub const SINGLE_CORE_THRESHOLD: usize = 4096;

/// Fraction of the cores above which a short-row split stays per-row
pub const AR_BLOCK_NUM_FACTOR: f64 = 0.85;

/// Workspace sizes are rounded up to this many bytes
pub const WORKSPACE_ALIGN: usize = 256;

/// Execution strategy selected by the planner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum TilingMode {
    /// Reduction axis of length 1: copy values, indices are all zero
    CopyOnly = 0,
    /// nextA == 1; cores split A, rows reduced along R
    ArCutA = 1,
    /// General layout; cores split A (and possibly nextA tiles)
    AraCutA = 2,
    /// A == 1; cores split nextA, columns reduced along R
    RaCutA = 3,
    /// nextA == 1 with short R; lanes run across rows
    ArGather = 4,
    /// General layout reduced with strided gathers or transposed tiles
    AraGather = 5,
    /// Cores split R and merge through a workspace after a barrier
    GroupReduce = 6,
    /// Two-level core grid over A and nextA
    AraCutAAndNextA = 7,
}

impl TilingMode {
    /// Every mode, in key order
    pub const ALL: [TilingMode; 8] = [
        Self::CopyOnly,
        Self::ArCutA,
        Self::AraCutA,
        Self::RaCutA,
        Self::ArGather,
        Self::AraGather,
        Self::GroupReduce,
        Self::AraCutAAndNextA,
    ];

    /// Tiling key stored in [`TilingData::tiling_key`]
    #[inline]
    pub const fn key(self) -> u64 {
        self as u64
    }

    /// Decode a tiling key
    pub fn from_key(key: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Whether this mode can execute the given decomposition
    pub fn applies_to(self, shape: &ReduceShape) -> bool {
        match self {
            Self::CopyOnly => shape.r == 1,
            Self::ArCutA | Self::ArGather => shape.next_a == 1,
            Self::RaCutA => shape.a == 1,
            Self::GroupReduce => shape.out_size() <= PROCESS_SIZE,
            Self::AraCutA | Self::AraGather | Self::AraCutAAndNextA => true,
        }
    }

    /// Short name for logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::CopyOnly => "copy_only",
            Self::ArCutA => "ar_cut_a",
            Self::AraCutA => "ara_cut_a",
            Self::RaCutA => "ra_cut_a",
            Self::ArGather => "ar_gather",
            Self::AraGather => "ara_gather",
            Self::GroupReduce => "group_reduce",
            Self::AraCutAAndNextA => "ara_cut_a_and_next_a",
        }
    }
}

impl fmt::Display for TilingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sub-strategy of [`TilingMode::AraCutA`] and [`TilingMode::AraGather`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum AraMode {
    /// Not an ARA mode
    None = 0,
    /// Whole rows of A loaded; narrow nextA reduced with gathers over (a, j)
    FullLoadGather = 101,
    /// Whole rows of A loaded; each row reduced column-wise
    FullLoadColumns = 102,
    /// Narrow nextA kept whole, R cut into chunks
    CutR = 103,
    /// Both R and nextA cut
    CutRAndNextA = 104,
    /// nextA cut, R loaded whole
    CutNextA = 105,
    /// One kept position per unit, strided walk along R
    CutRFallback = 106,
    /// Gather lanes over (a, j) with R chunks
    GatherCutA = 111,
    /// Tiles transposed so R is contiguous, then reduced row-wise
    GatherTransposed = 112,
}

impl AraMode {
    const ALL: [AraMode; 9] = [
        Self::None,
        Self::FullLoadGather,
        Self::FullLoadColumns,
        Self::CutR,
        Self::CutRAndNextA,
        Self::CutNextA,
        Self::CutRFallback,
        Self::GatherCutA,
        Self::GatherTransposed,
    ];

    /// Decode a sub-mode code
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|m| *m as u64 == code)
    }
}

/// The `(A, R, nextA)` view of an input shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReduceShape {
    /// Product of the dims before the reduction axis
    pub a: usize,
    /// Length of the reduction axis
    pub r: usize,
    /// Product of the dims after the reduction axis
    pub next_a: usize,
}

impl ReduceShape {
    /// Decompose `shape` around the (already normalized) axis `dim`
    ///
    /// A zero-dimensional shape is treated as `[1]`.
    pub fn new(shape: &[usize], dim: usize) -> Self {
        if shape.is_empty() {
            return Self {
                a: 1,
                r: 1,
                next_a: 1,
            };
        }
        Self {
            a: shape[..dim].iter().product(),
            r: shape[dim],
            next_a: shape[dim + 1..].iter().product(),
        }
    }

    /// Number of kept positions
    #[inline]
    pub fn out_size(&self) -> usize {
        self.a * self.next_a
    }

    /// Number of input elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.a * self.r * self.next_a
    }
}

/// Normalize a possibly negative dimension
///
/// A zero-dimensional tensor accepts `0` and `-1`.
pub fn normalize_dim(dim: isize, ndim: usize) -> Result<usize> {
    let rank = ndim.max(1) as isize;
    let idx = if dim < 0 { dim + rank } else { dim };
    if (0..rank).contains(&idx) {
        Ok(idx as usize)
    } else {
        Err(Error::InvalidDimension { dim, ndim })
    }
}

/// Range of units owned by core `block_idx`
///
/// The first `tail` cores own `factor + 1` units, the rest `factor`.
pub fn block_range(block_idx: usize, factor: usize, tail: usize) -> Range<usize> {
    if block_idx < tail {
        let start = block_idx * (factor + 1);
        start..start + factor + 1
    } else {
        let start = tail * (factor + 1) + (block_idx - tail) * factor;
        start..start + factor
    }
}

/// Per-invocation tiling parameters
///
/// Every field is a `u64` so the block has no padding and is read back
/// byte-for-byte on each core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct TilingData {
    /// Product of the dims before the reduction axis
    pub a_size: u64,
    /// Reduction axis length
    pub r_size: u64,
    /// Product of the dims after the reduction axis
    pub next_a_size: u64,
    /// Tile size along A (or kept positions per staged block)
    pub cut_a_size: u64,
    /// Chunk size along R
    pub cut_r_size: u64,
    /// Tile size along nextA
    pub cut_next_a_size: u64,
    /// Number of cores that take part
    pub real_core_num: u64,
    /// Units per core
    pub blk_factor: u64,
    /// Number of cores owning one extra unit
    pub blk_tail_factor: u64,
    /// Units per core on the second grid level
    pub blk_factor_2nd: u64,
    /// Cores owning one extra unit on the second grid level
    pub blk_tail_factor_2nd: u64,
    /// Number of cores on the second grid level
    pub blk_num_2nd: u64,
    /// Encoded [`TilingMode`]
    pub tiling_key: u64,
    /// Encoded [`AraMode`]
    pub ara_mode: u64,
    /// Workspace size in bytes
    pub workspace_size: u64,
    /// Per-core scratch budget in bytes
    pub ub_size: u64,
    /// Workspace slot length in elements
    pub out_a_align: u64,
    /// 1 for argmin, 0 for argmax
    pub is_min: u64,
    /// 1 if values are written alongside indices
    pub with_value: u64,
}

impl TilingData {
    /// Size of the serialized block in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(self).to_vec()
    }

    /// Read a block back from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::invalid_argument(
                "tiling",
                format!("expected {} bytes, got {}", Self::SIZE, bytes.len()),
            ));
        }
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Decoded execution mode
    pub fn mode(&self) -> Option<TilingMode> {
        TilingMode::from_key(self.tiling_key)
    }

    /// Decoded ARA sub-mode
    pub fn ara(&self) -> Option<AraMode> {
        AraMode::from_code(self.ara_mode)
    }

    /// The `(A, R, nextA)` decomposition
    pub fn shape(&self) -> ReduceShape {
        ReduceShape {
            a: self.a_size as usize,
            r: self.r_size as usize,
            next_a: self.next_a_size as usize,
        }
    }

    /// Unit range of core `block_idx` on the first grid level
    pub fn core_range(&self, block_idx: usize) -> Range<usize> {
        block_range(
            block_idx,
            self.blk_factor as usize,
            self.blk_tail_factor as usize,
        )
    }

    /// Unit range of grid column `idx` on the second grid level
    pub fn core_range_2nd(&self, idx: usize) -> Range<usize> {
        block_range(
            idx,
            self.blk_factor_2nd as usize,
            self.blk_tail_factor_2nd as usize,
        )
    }
}
