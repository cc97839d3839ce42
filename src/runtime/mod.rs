//! Simulated accelerator runtime
//!
//! # Architecture
//!
//! ```text
//! AccelClient (planner options, dispatches operations)
//! └── AccelDevice (core pool, stream lock, DeviceConfig)
//!     ├── launch → CoreContext per core (index, barrier)
//!     ├── GlobalTensor / GlobalTensorMut / Workspace (global memory views)
//!     └── ScratchPool / BufferQueue (per-core scratch)
//! ```

mod client;
mod device;
mod launch;
mod memory;
mod scratch;

pub use client::AccelClient;
pub use device::{
    AccelDevice, Device, DeviceConfig, PlatformInfo, DEFAULT_CORE_NUM, DEFAULT_UB_SIZE,
    ENV_CORE_NUM, ENV_UB_SIZE, VREG_BYTES,
};
pub use launch::CoreContext;
pub use memory::{CopyBox, GlobalTensor, GlobalTensorMut, Workspace};
pub use scratch::{BufferQueue, ScratchPool, DOUBLE_BUFFER};
