//! Per-core scratch (unified buffer) accounting and buffer queues

use bytemuck::Pod;
use std::cell::Cell;
use std::collections::VecDeque;

/// Number of buffers in a double-buffered queue
pub const DOUBLE_BUFFER: usize = 2;

/// Byte budget of one core's scratch memory
///
/// Every queue and calculation buffer a kernel sets up is reserved here.
/// Exceeding the budget means the tiling was sized wrong; it is logged and
/// the allocation still succeeds.
#[derive(Debug)]
pub struct ScratchPool {
    budget: usize,
    used: Cell<usize>,
}

impl ScratchPool {
    /// Create a pool with `budget` bytes
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            used: Cell::new(0),
        }
    }

    /// Bytes reserved so far
    #[cfg(test)]
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Total budget in bytes
    #[cfg(test)]
    pub fn budget(&self) -> usize {
        self.budget
    }

    fn reserve(&self, bytes: usize) {
        let used = self.used.get() + bytes;
        self.used.set(used);
        if used > self.budget {
            tracing::warn!(used, budget = self.budget, "scratch reservation exceeds budget");
        }
    }

    /// Allocate a single calculation buffer of `len` elements
    pub fn calc_buffer<T: Pod>(&self, len: usize) -> Vec<T> {
        self.reserve(len * std::mem::size_of::<T>());
        vec![T::zeroed(); len]
    }

    /// Create a queue of `depth` buffers of `len` elements each
    pub fn queue<T: Pod>(&self, depth: usize, len: usize) -> BufferQueue<T> {
        self.reserve(depth * len * std::mem::size_of::<T>());
        BufferQueue {
            free: (0..depth).map(|_| vec![T::zeroed(); len]).collect(),
            ready: VecDeque::with_capacity(depth),
            len,
        }
    }
}

/// Rotating set of scratch buffers between a data mover and the vector unit
///
/// A buffer cycles `alloc_tensor` → fill → `enque` → `deque` → consume →
/// `free_tensor`. The simulated data mover is synchronous: a transfer has
/// completed by the time its buffer is enqueued, and kernels dequeue each
/// tile right after enqueuing it. No second tile is in flight while one is
/// consumed; the depth only fixes how much scratch the queue reserves.
#[derive(Debug)]
pub struct BufferQueue<T> {
    free: VecDeque<Vec<T>>,
    ready: VecDeque<Vec<T>>,
    len: usize,
}

impl<T: Pod> BufferQueue<T> {
    /// Take a free buffer to fill
    pub fn alloc_tensor(&mut self) -> Vec<T> {
        self.free
            .pop_front()
            .unwrap_or_else(|| vec![T::zeroed(); self.len])
    }

    /// Hand a filled buffer to the consumer side
    pub fn enque(&mut self, buf: Vec<T>) {
        self.ready.push_back(buf);
    }

    /// Take the oldest filled buffer
    pub fn deque(&mut self) -> Vec<T> {
        self.ready
            .pop_front()
            .unwrap_or_else(|| vec![T::zeroed(); self.len])
    }

    /// Return a consumed buffer to the free list
    pub fn free_tensor(&mut self, buf: Vec<T>) {
        self.free.push_back(buf);
    }

    /// Elements per buffer
    #[cfg(test)]
    pub fn buffer_len(&self) -> usize {
        self.len
    }
}
