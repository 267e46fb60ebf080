//! Device capability probing
//!
//! Reports the facts delegate selection depends on: whether the GPU delegate
//! can run on this device, and the platform API level.

#[cfg(target_os = "android")]
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Results of a device capability probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// GPU delegate compatibility check passed.
    #[serde(default)]
    pub gpu_delegate_supported: bool,
    /// Platform API level (Android SDK_INT), 0 when unknown.
    #[serde(default)]
    pub platform_version: u32,
}

/// Source of device capability information.
pub trait DeviceProbe {
    fn probe(&self) -> DeviceCapabilities;
}

/// Probe that always reports the same capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProbe(pub DeviceCapabilities);

impl DeviceProbe for FixedProbe {
    fn probe(&self) -> DeviceCapabilities {
        self.0
    }
}

/// Probe of the platform this process runs on.
///
/// Only the platform version is read here. GPU delegate compatibility is
/// the runtime's call, so this probe always reports it unsupported; pair it
/// with the runtime's own check (see `QaRuntime::is_gpu_delegate_supported`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl HostProbe {
    /// Platform API level, 0 when it cannot be determined.
    pub fn platform_version(&self) -> u32 {
        let version = detect_platform_version().unwrap_or(0);
        tracing::debug!("Platform version: {}", version);
        version
    }
}

impl DeviceProbe for HostProbe {
    fn probe(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            gpu_delegate_supported: false,
            platform_version: self.platform_version(),
        }
    }
}

fn detect_platform_version() -> Option<u32> {
    #[cfg(target_os = "android")]
    {
        return detect_sdk_level_android();
    }

    #[cfg(not(target_os = "android"))]
    {
        None
    }
}

// =============================================================================
// Android detection
// =============================================================================

/// Read the API level via `getprop ro.build.version.sdk`
#[cfg(target_os = "android")]
fn detect_sdk_level_android() -> Option<u32> {
    let output = Command::new("getprop")
        .arg("ro.build.version.sdk")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    parse_sdk_level(&String::from_utf8_lossy(&output.stdout))
}

#[cfg_attr(not(any(target_os = "android", test)), allow(dead_code))]
fn parse_sdk_level(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_probe() {
        let caps = DeviceCapabilities {
            gpu_delegate_supported: true,
            platform_version: 33,
        };
        assert_eq!(FixedProbe(caps).probe(), caps);
    }

    #[test]
    fn test_parse_sdk_level() {
        assert_eq!(parse_sdk_level("28\n"), Some(28));
        assert_eq!(parse_sdk_level("  34 "), Some(34));
        assert_eq!(parse_sdk_level(""), None);
        assert_eq!(parse_sdk_level("P"), None);
    }

    #[test]
    fn test_host_probe_never_claims_gpu() {
        assert!(!HostProbe.probe().gpu_delegate_supported);
    }

    #[cfg(not(target_os = "android"))]
    #[test]
    fn test_host_probe_off_android() {
        assert_eq!(HostProbe.probe(), DeviceCapabilities::default());
        assert_eq!(HostProbe.platform_version(), 0);
    }

    #[test]
    fn test_capabilities_defaults_when_fields_missing() {
        let caps: DeviceCapabilities = serde_json::from_str("{}").unwrap();
        assert_eq!(caps, DeviceCapabilities::default());
    }
}
