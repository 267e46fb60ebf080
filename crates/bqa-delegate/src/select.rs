use crate::delegate::Delegate;
use crate::probe::DeviceCapabilities;

/// CPU thread count used when no hardware delegate is available.
pub const DEFAULT_CPU_THREADS: u32 = 4;

/// Lowest platform API level with NNAPI acceleration (Android 9, "P").
pub const NNAPI_MIN_PLATFORM_VERSION: u32 = 28;

/// Thresholds used by [`select_delegate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegatePolicy {
    pub nnapi_min_platform_version: u32,
    pub cpu_num_threads: u32,
}

impl Default for DelegatePolicy {
    fn default() -> Self {
        Self {
            nnapi_min_platform_version: NNAPI_MIN_PLATFORM_VERSION,
            cpu_num_threads: DEFAULT_CPU_THREADS,
        }
    }
}

impl DelegatePolicy {
    /// Replace a zero thread count with the default.
    pub fn validate(&mut self) {
        if self.cpu_num_threads == 0 {
            self.cpu_num_threads = DEFAULT_CPU_THREADS;
        }
    }
}

/// Pick the delegate for a device.
///
/// GPU when the compatibility check passes, NNAPI when the platform is new
/// enough, otherwise CPU with the policy's thread count.
pub fn select_delegate(caps: &DeviceCapabilities, policy: &DelegatePolicy) -> Delegate {
    if caps.gpu_delegate_supported {
        Delegate::Gpu
    } else if caps.platform_version >= policy.nnapi_min_platform_version {
        Delegate::Nnapi
    } else {
        Delegate::Cpu {
            num_threads: policy.cpu_num_threads,
        }
    }
}
