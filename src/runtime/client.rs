//! Client that dispatches operations to an accelerator device

use super::{AccelDevice, DeviceConfig};
use crate::error::Result;
use crate::tiling::PlannerOptions;

/// Dispatches arg-reductions to one [`AccelDevice`]
///
/// The client carries the planner options applied to every operation it
/// runs; the device carries the hardware configuration.
#[derive(Clone, Debug)]
pub struct AccelClient {
    device: AccelDevice,
    options: PlannerOptions,
}

impl AccelClient {
    /// Create a client with default planner options
    pub fn new(device: AccelDevice) -> Self {
        Self {
            device,
            options: PlannerOptions::default(),
        }
    }

    /// Create a client for a fresh device with the given configuration
    pub fn with_config(config: DeviceConfig) -> Result<Self> {
        Ok(Self::new(AccelDevice::new(0, config)?))
    }

    /// Replace the planner options
    pub fn with_options(mut self, options: PlannerOptions) -> Self {
        self.options = options;
        self
    }

    /// The device this client dispatches to
    pub fn device(&self) -> &AccelDevice {
        &self.device
    }

    /// Planner options applied to every operation
    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }
}
