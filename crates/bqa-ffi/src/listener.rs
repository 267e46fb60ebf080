use std::ffi::CString;
use std::time::Duration;

use bqa_helper::ResultAnswerListener;
use bqa_model::QaAnswer;

use crate::types::{BqaAnswer, BqaListener};

/// Forwards helper notifications to the host's C callbacks.
pub struct FfiListener {
    listener: BqaListener,
}

impl FfiListener {
    pub fn new(listener: BqaListener) -> Self {
        Self { listener }
    }
}

// The host guarantees its callbacks and `user_data` may be used from
// whichever thread drives the helper.
unsafe impl Send for FfiListener {}

impl ResultAnswerListener for FfiListener {
    fn on_error(&self, error: &str) {
        let Some(cb) = self.listener.on_error else {
            return;
        };
        if let Ok(c_str) = CString::new(error) {
            cb(c_str.as_ptr(), self.listener.user_data);
        }
    }

    fn on_results(&self, results: &[QaAnswer], inference_time: Duration) {
        let Some(cb) = self.listener.on_results else {
            return;
        };

        // Interior NULs are dropped rather than failing the whole callback.
        let texts: Vec<CString> = results
            .iter()
            .map(|a| CString::new(a.text.replace('\0', "")).unwrap_or_default())
            .collect();
        let answers: Vec<BqaAnswer> = results
            .iter()
            .zip(&texts)
            .map(|(a, text)| BqaAnswer {
                text: text.as_ptr(),
                start: a.pos.start,
                end: a.pos.end,
                logit: a.pos.logit,
            })
            .collect();

        let inference_time_ms = u64::try_from(inference_time.as_millis()).unwrap_or(u64::MAX);
        cb(
            answers.as_ptr(),
            answers.len(),
            inference_time_ms,
            self.listener.user_data,
        );
    }
}
