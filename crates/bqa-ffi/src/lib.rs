mod error;
mod listener;
mod runtime;
mod types;

pub use error::*;
pub use listener::FfiListener;
pub use runtime::{FfiAnswerer, FfiRuntime};
pub use types::*;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use bqa_delegate::{select_delegate, DelegatePolicy, FixedProbe};
use bqa_helper::{BertQaHelper, ResultAnswerListener, BERT_QA_MODEL};
use bqa_model::AssetDir;

/// Opaque helper handle owned by the host.
pub struct BqaHelper {
    inner: BertQaHelper<FfiRuntime>,
}

/// Execute a closure that returns a `BqaStatus`, catching any panics
/// and converting them into `BqaStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> BqaStatus>(f: F) -> BqaStatus {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            tracing::error!("Panic caught at the FFI boundary");
            set_last_error("internal panic".to_string());
            BqaStatus::ErrorInternal
        }
    }
}

/// Borrow a C string argument as `&str`, recording an error on failure.
unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, BqaStatus> {
    if ptr.is_null() {
        set_last_error(format!("{} is null", what));
        return Err(BqaStatus::ErrorInvalidArgument);
    }
    CStr::from_ptr(ptr).to_str().map_err(|e| {
        set_last_error(format!("invalid {}: {}", what, e));
        BqaStatus::ErrorInvalidArgument
    })
}

/// Create a question-answering helper.
///
/// `vtable` must provide `load`, `answer` and `close`; the helper closes
/// every model it loads.
/// `caps` are the device capabilities measured by the host; the delegate is
/// chosen from them when the model is first loaded. `model_name` may be null
/// to use the default bundled model. On success writes a heap-allocated
/// helper into `*helper_out`; free it with `bqa_helper_destroy`.
#[no_mangle]
pub unsafe extern "C" fn bqa_helper_create(
    vtable: BqaRuntimeVTable,
    listener: BqaListener,
    caps: BqaDeviceCapabilities,
    assets_dir: *const c_char,
    model_name: *const c_char,
    helper_out: *mut *mut BqaHelper,
) -> BqaStatus {
    catch_panic(|| {
        if helper_out.is_null() {
            set_last_error("helper_out is null".to_string());
            return BqaStatus::ErrorInvalidArgument;
        }
        if vtable.load.is_none() || vtable.answer.is_none() || vtable.close.is_none() {
            set_last_error("runtime vtable is missing load, answer or close".to_string());
            return BqaStatus::ErrorInvalidArgument;
        }

        let assets_dir = match unsafe { str_arg(assets_dir, "assets_dir") } {
            Ok(s) => s,
            Err(status) => return status,
        };
        let model_name = if model_name.is_null() {
            BERT_QA_MODEL
        } else {
            match unsafe { str_arg(model_name, "model_name") } {
                Ok(s) => s,
                Err(status) => return status,
            }
        };

        let listener: Option<Box<dyn ResultAnswerListener>> = if listener.is_empty() {
            None
        } else {
            Some(Box::new(FfiListener::new(listener)))
        };

        let inner = BertQaHelper::new(FfiRuntime::new(vtable), AssetDir::new(assets_dir), listener)
            .with_model_name(model_name)
            .with_probe(Box::new(FixedProbe(caps.into())));

        let helper = Box::new(BqaHelper { inner });
        unsafe {
            *helper_out = Box::into_raw(helper);
        }
        BqaStatus::Ok
    })
}

/// Answer `question` against `context`, loading the model if needed.
///
/// Results and load errors are also delivered through the listener.
#[no_mangle]
pub unsafe extern "C" fn bqa_helper_ask(
    helper: *mut BqaHelper,
    context: *const c_char,
    question: *const c_char,
) -> BqaStatus {
    catch_panic(|| {
        if helper.is_null() {
            set_last_error("helper is null".to_string());
            return BqaStatus::ErrorInvalidArgument;
        }
        let helper = unsafe { &mut *helper };
        let context = match unsafe { str_arg(context, "context") } {
            Ok(s) => s,
            Err(status) => return status,
        };
        let question = match unsafe { str_arg(question, "question") } {
            Ok(s) => s,
            Err(status) => return status,
        };

        match helper.inner.ask(context, question) {
            Ok(_) => BqaStatus::Ok,
            Err(e) => status_for(&e),
        }
    })
}

/// Release the loaded model. The next ask loads it again.
#[no_mangle]
pub unsafe extern "C" fn bqa_helper_release(helper: *mut BqaHelper) -> BqaStatus {
    if helper.is_null() {
        return BqaStatus::ErrorInvalidArgument;
    }
    let helper = &mut *helper;
    catch_panic(|| {
        helper.inner.release();
        BqaStatus::Ok
    })
}

/// Whether a model is currently loaded.
#[no_mangle]
pub unsafe extern "C" fn bqa_helper_is_initialized(helper: *const BqaHelper) -> bool {
    if helper.is_null() {
        return false;
    }
    (*helper).inner.is_initialized()
}

/// Destroy a helper created by `bqa_helper_create`, releasing its model.
///
/// Passing a null pointer is a no-op and returns `BqaStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn bqa_helper_destroy(helper: *mut BqaHelper) -> BqaStatus {
    if helper.is_null() {
        return BqaStatus::Ok;
    }
    catch_panic(|| {
        drop(unsafe { Box::from_raw(helper) });
        BqaStatus::Ok
    })
}

/// Delegate the default policy picks for `caps`.
///
/// Writes the CPU thread count (0 for hardware delegates) into
/// `*num_threads_out` when it is non-null.
#[no_mangle]
pub unsafe extern "C" fn bqa_select_delegate(
    caps: BqaDeviceCapabilities,
    num_threads_out: *mut u32,
) -> BqaDelegate {
    let delegate = select_delegate(&caps.into(), &DelegatePolicy::default());
    let (tag, num_threads) = BqaDelegate::from_delegate(delegate);
    if !num_threads_out.is_null() {
        *num_threads_out = num_threads;
    }
    tag
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `bqa_free_string`.
#[no_mangle]
pub extern "C" fn bqa_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `bqa_last_error`.
#[no_mangle]
pub unsafe extern "C" fn bqa_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
