//! Kernel launch on the simulated cores

use super::AccelDevice;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Unwind payload of a core released from a poisoned barrier
struct LaunchAborted;

#[derive(Default)]
struct BarrierState {
    arrived: usize,
    generation: usize,
    poisoned: bool,
}

/// Launch-wide barrier that a failing core can poison
///
/// Once poisoned, waiting cores and cores arriving later are released
/// instead of blocking on a party that will never come.
struct LaunchBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl LaunchBarrier {
    fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    /// Returns false if the barrier was poisoned before every party arrived
    fn wait(&self) -> bool {
        let mut state = self.state.lock();
        if state.poisoned {
            return false;
        }
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return true;
        }
        let generation = state.generation;
        while state.generation == generation && !state.poisoned {
            self.cvar.wait(&mut state);
        }
        state.generation != generation
    }

    fn poison(&self) {
        self.state.lock().poisoned = true;
        self.cvar.notify_all();
    }
}

/// Per-core execution context passed to a kernel
pub struct CoreContext<'a> {
    block_idx: usize,
    #[cfg(test)]
    block_num: usize,
    barrier: &'a LaunchBarrier,
}

impl CoreContext<'_> {
    /// Index of this core within the launch
    #[inline]
    pub fn block_idx(&self) -> usize {
        self.block_idx
    }

    /// Number of cores taking part in the launch
    #[cfg(test)]
    pub fn block_num(&self) -> usize {
        self.block_num
    }

    /// Block until every core of the launch reaches this point
    ///
    /// Writes to global memory made before the barrier are visible to every
    /// core after it. Every core of the launch must call this the same
    /// number of times.
    ///
    /// If another core panicked, this unwinds out of the kernel and the
    /// launch reports the original panic.
    pub fn sync_all(&self) {
        if !self.barrier.wait() {
            panic::resume_unwind(Box::new(LaunchAborted));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl AccelDevice {
    /// Run `kernel` once on each of `block_num` cores and wait for all of them
    ///
    /// Cores are statically bound to pool threads; there is no work stealing
    /// between them. Launches on one device are serialized. A panic on any
    /// core is returned as [`Error::Backend`] once every core has stopped.
    pub fn launch<F>(&self, block_num: usize, kernel: F) -> Result<()>
    where
        F: Fn(&CoreContext<'_>) + Sync,
    {
        if block_num == 0 {
            return Ok(());
        }
        let available = self.pool.current_num_threads();
        if block_num > available {
            return Err(Error::Backend(format!(
                "launch of {block_num} cores exceeds the {available} available"
            )));
        }

        let _stream = self.stream.lock();
        let barrier = LaunchBarrier::new(block_num);
        let failure: Mutex<Option<(usize, String)>> = Mutex::new(None);
        tracing::trace!(block_num, "launching kernel");
        self.pool.broadcast(|ctx| {
            let block_idx = ctx.index();
            if block_idx >= block_num {
                return;
            }
            let core = CoreContext {
                block_idx,
                #[cfg(test)]
                block_num,
                barrier: &barrier,
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| kernel(&core))) {
                let mut first = failure.lock();
                if first.is_none() && !payload.is::<LaunchAborted>() {
                    *first = Some((block_idx, panic_message(payload.as_ref())));
                }
                drop(first);
                barrier.poison();
            }
        });

        match failure.into_inner() {
            Some((block_idx, msg)) => {
                tracing::error!(block_idx, %msg, "kernel panicked");
                Err(Error::Backend(format!("kernel panicked on core {block_idx}: {msg}")))
            }
            None => Ok(()),
        }
    }
}
