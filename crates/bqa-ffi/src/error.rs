use std::cell::RefCell;
use std::ffi::CString;

use bqa_helper::HelperError;

use crate::types::BqaStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `bqa_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Record a helper error and map it to its status code.
pub fn status_for(err: &HelperError) -> BqaStatus {
    set_last_error(err.to_string());
    match err {
        HelperError::ModelLoad(_) => BqaStatus::ErrorModelLoad,
        HelperError::Answer(_) => BqaStatus::ErrorAnswer,
        HelperError::Config(_) => BqaStatus::ErrorInternal,
    }
}
