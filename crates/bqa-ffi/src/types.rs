use std::os::raw::{c_char, c_void};

use bqa_delegate::{Delegate, DeviceCapabilities};

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BqaStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorModelLoad = 2,
    ErrorAnswer = 3,
    ErrorInternal = 4,
}

/// Delegate the host runtime should load the model with.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BqaDelegate {
    Gpu = 0,
    Nnapi = 1,
    Cpu = 2,
}

impl BqaDelegate {
    /// Split a delegate into its C tag and CPU thread count (0 for hardware delegates).
    pub fn from_delegate(delegate: Delegate) -> (BqaDelegate, u32) {
        match delegate {
            Delegate::Gpu => (BqaDelegate::Gpu, 0),
            Delegate::Nnapi => (BqaDelegate::Nnapi, 0),
            Delegate::Cpu { num_threads } => (BqaDelegate::Cpu, num_threads),
        }
    }
}

/// Device capabilities measured by the host (e.g. GPU compatibility list, SDK_INT).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct BqaDeviceCapabilities {
    pub gpu_delegate_supported: bool,
    pub platform_version: u32,
}

impl From<BqaDeviceCapabilities> for DeviceCapabilities {
    fn from(caps: BqaDeviceCapabilities) -> Self {
        DeviceCapabilities {
            gpu_delegate_supported: caps.gpu_delegate_supported,
            platform_version: caps.platform_version,
        }
    }
}

/// One answer span. `text` is borrowed and only valid during the callback.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BqaAnswer {
    pub text: *const c_char,
    pub start: i32,
    pub end: i32,
    pub logit: f32,
}

/// Receives one answer from the host runtime during `BqaAnswerFn`.
pub type BqaAnswerSink = Option<
    extern "C" fn(sink_data: *mut c_void, text: *const c_char, start: i32, end: i32, logit: f32),
>;

/// Load a model with the given delegate. Returns null when the model
/// could not be loaded.
///
/// `model_data`/`model_len` is the model file at `model_path`, memory-mapped
/// and kept alive until `BqaCloseFn` returns, so the runtime may load from
/// the buffer without copying.
pub type BqaLoadFn = Option<
    extern "C" fn(
        user_data: *mut c_void,
        model_path: *const c_char,
        model_data: *const u8,
        model_len: usize,
        delegate: BqaDelegate,
        num_threads: u32,
    ) -> *mut c_void,
>;

/// Answer a question, pushing each answer through `sink`. Returns false on failure.
pub type BqaAnswerFn = Option<
    extern "C" fn(
        user_data: *mut c_void,
        model: *mut c_void,
        context: *const c_char,
        question: *const c_char,
        sink: BqaAnswerSink,
        sink_data: *mut c_void,
    ) -> bool,
>;

/// Free a model returned by `BqaLoadFn`.
pub type BqaCloseFn = Option<extern "C" fn(user_data: *mut c_void, model: *mut c_void)>;

/// Inference runtime supplied by the host.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BqaRuntimeVTable {
    pub user_data: *mut c_void,
    pub load: BqaLoadFn,
    pub answer: BqaAnswerFn,
    pub close: BqaCloseFn,
}

pub type BqaErrorCallback = Option<extern "C" fn(message: *const c_char, user_data: *mut c_void)>;

pub type BqaResultsCallback = Option<
    extern "C" fn(
        answers: *const BqaAnswer,
        count: usize,
        inference_time_ms: u64,
        user_data: *mut c_void,
    ),
>;

/// Result callbacks. Either callback may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BqaListener {
    pub user_data: *mut c_void,
    pub on_error: BqaErrorCallback,
    pub on_results: BqaResultsCallback,
}

impl BqaListener {
    pub fn is_empty(&self) -> bool {
        self.on_error.is_none() && self.on_results.is_none()
    }
}
