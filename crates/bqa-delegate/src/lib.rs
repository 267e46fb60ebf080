//! `bqa-delegate` - Hardware delegate selection for bert-qa.
//!
//! This crate provides:
//! - A `Delegate` enum naming the execution backend a model is loaded with
//! - `BaseOptions`, the runtime options built from a delegate
//! - A `DeviceProbe` trait for capability probing, with fixed and host probes
//! - `select_delegate`, the pure mapping from probe results to a delegate

pub mod delegate;
pub mod options;
pub mod probe;
pub mod select;

// Re-export primary types at the crate root for convenience.
pub use delegate::Delegate;
pub use options::{BaseOptions, BaseOptionsBuilder};
pub use probe::{DeviceCapabilities, DeviceProbe, FixedProbe, HostProbe};
pub use select::{select_delegate, DelegatePolicy, DEFAULT_CPU_THREADS, NNAPI_MIN_PLATFORM_VERSION};
