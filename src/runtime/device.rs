//! Simulated accelerator device and its configuration

use crate::error::{Error, Result};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::env;
use std::sync::Arc;

/// Default number of compute cores
pub const DEFAULT_CORE_NUM: usize = 48;

/// Default per-core scratch (unified buffer) size in bytes
pub const DEFAULT_UB_SIZE: usize = 192 * 1024;

/// Width of one vector register in bytes
pub const VREG_BYTES: usize = 256;

/// Environment variable overriding the core count
pub const ENV_CORE_NUM: &str = "ARGREDUCE_CORE_NUM";

/// Environment variable overriding the scratch size
pub const ENV_UB_SIZE: &str = "ARGREDUCE_UB_SIZE";

/// Trait for device identification
pub trait Device: Clone + Send + Sync + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}

/// Hardware properties the tiling planner queries
///
/// Queries are fallible: a platform that cannot report its core count or
/// scratch size makes planning fail before anything is launched.
pub trait PlatformInfo {
    /// Number of compute cores available to one launch
    fn core_num(&self) -> Result<usize>;

    /// Per-core scratch budget in bytes
    fn ub_size(&self) -> Result<usize>;

    /// Vector register width in bytes
    fn vreg_size(&self) -> usize {
        VREG_BYTES
    }
}

/// Static configuration of a simulated accelerator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Number of compute cores
    pub core_num: usize,
    /// Per-core scratch size in bytes
    pub ub_size: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            core_num: DEFAULT_CORE_NUM,
            ub_size: DEFAULT_UB_SIZE,
        }
    }
}

impl DeviceConfig {
    /// Create a configuration with explicit values
    pub fn new(core_num: usize, ub_size: usize) -> Self {
        Self { core_num, ub_size }
    }

    /// Create configuration from environment variables
    ///
    /// `ARGREDUCE_CORE_NUM` and `ARGREDUCE_UB_SIZE` override the defaults;
    /// unset variables keep them.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(core_num) = parse_env(ENV_CORE_NUM)? {
            config.core_num = core_num;
        }
        if let Some(ub_size) = parse_env(ENV_UB_SIZE)? {
            config.ub_size = ub_size;
        }
        Ok(config)
    }
}

fn parse_env(key: &'static str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| Error::invalid_argument(key, format!("'{raw}' is not a count: {e}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::invalid_argument(key, e.to_string())),
    }
}

/// A simulated manycore accelerator
///
/// Each core is one thread of a dedicated worker pool. Launches on the same
/// device are serialized by a stream lock, so the cross-core barrier of one
/// launch never interleaves with another.
#[derive(Clone)]
pub struct AccelDevice {
    id: usize,
    config: DeviceConfig,
    pub(crate) pool: Arc<ThreadPool>,
    pub(crate) stream: Arc<Mutex<()>>,
}

impl AccelDevice {
    /// Create a device with the given configuration
    ///
    /// A configuration with zero cores or zero scratch still creates the
    /// device; planning on it fails with [`Error::PlatformQuery`].
    pub fn new(id: usize, config: DeviceConfig) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.core_num.max(1))
            .thread_name(move |core| format!("argreduce-{id}-core-{core}"))
            .build()
            .map_err(|e| Error::Backend(format!("failed to start core pool: {e}")))?;

        tracing::info!(
            device = id,
            core_num = config.core_num,
            ub_size = config.ub_size,
            "created accelerator device"
        );

        Ok(Self {
            id,
            config,
            pool: Arc::new(pool),
            stream: Arc::new(Mutex::new(())),
        })
    }

    /// Create a device configured from the environment
    pub fn from_env(id: usize) -> Result<Self> {
        Self::new(id, DeviceConfig::from_env()?)
    }

    /// Device configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}

impl Device for AccelDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        format!("accel:{}", self.id)
    }
}

impl PlatformInfo for AccelDevice {
    fn core_num(&self) -> Result<usize> {
        match self.config.core_num {
            0 => Err(Error::platform_query("core_num", "device reports no cores")),
            n => Ok(n),
        }
    }

    fn ub_size(&self) -> Result<usize> {
        match self.config.ub_size {
            0 => Err(Error::platform_query("ub_size", "device reports no scratch memory")),
            n => Ok(n),
        }
    }
}

impl std::fmt::Debug for AccelDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccelDevice")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeviceConfig::default();
        assert_eq!(config.core_num, DEFAULT_CORE_NUM);
        assert_eq!(config.ub_size, DEFAULT_UB_SIZE);
    }

    #[test]
    fn test_platform_queries() {
        let device = AccelDevice::new(3, DeviceConfig::new(4, 8192)).unwrap();
        assert_eq!(device.id(), 3);
        assert_eq!(device.name(), "accel:3");
        assert_eq!(device.core_num().unwrap(), 4);
        assert_eq!(device.ub_size().unwrap(), 8192);
        assert_eq!(device.vreg_size(), VREG_BYTES);
    }

    #[test]
    fn test_platform_query_failure() {
        let device = AccelDevice::new(0, DeviceConfig::new(0, 0)).unwrap();
        assert!(matches!(
            device.core_num(),
            Err(Error::PlatformQuery {
                property: "core_num",
                ..
            })
        ));
        assert!(device.ub_size().is_err());
    }

    #[test]
    fn test_from_env() {
        // Only this test touches these variables.
        env::set_var(ENV_CORE_NUM, "6");
        env::set_var(ENV_UB_SIZE, " 65536 ");
        let config = DeviceConfig::from_env().unwrap();
        assert_eq!(config, DeviceConfig::new(6, 65536));

        env::set_var(ENV_CORE_NUM, "many");
        assert!(matches!(
            DeviceConfig::from_env(),
            Err(Error::InvalidArgument {
                arg: ENV_CORE_NUM,
                ..
            })
        ));

        env::remove_var(ENV_CORE_NUM);
        env::remove_var(ENV_UB_SIZE);
        assert_eq!(DeviceConfig::from_env().unwrap(), DeviceConfig::default());
    }
}
