use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

use bqa_model::{
    AssetDir, ModelAsset, ModelError, QaAnswer, QaRuntime, QuestionAnswerer,
    QuestionAnswererOptions,
};

use crate::types::{BqaDelegate, BqaRuntimeVTable};

/// [`QaRuntime`] backed by function pointers supplied by the host.
pub struct FfiRuntime {
    vtable: BqaRuntimeVTable,
}

impl FfiRuntime {
    pub fn new(vtable: BqaRuntimeVTable) -> Self {
        Self { vtable }
    }
}

/// A model loaded by the host runtime.
///
/// Holds the mapped model file for as long as the host model is alive.
pub struct FfiAnswerer {
    vtable: BqaRuntimeVTable,
    model: *mut c_void,
    asset: ModelAsset,
}

impl QaRuntime for FfiRuntime {
    type Answerer = FfiAnswerer;

    fn create_from_file_and_options(
        &self,
        assets: &AssetDir,
        model_name: &str,
        options: &QuestionAnswererOptions,
    ) -> bqa_model::Result<FfiAnswerer> {
        let load = self
            .vtable
            .load
            .ok_or_else(|| ModelError::Other("runtime has no load function".to_string()))?;

        let asset = ModelAsset::open(assets, model_name)?;
        let c_path = CString::new(asset.path().to_string_lossy().into_owned())
            .map_err(|_| ModelError::InvalidAssetName(model_name.to_string()))?;

        let (delegate, num_threads) = BqaDelegate::from_delegate(options.base_options.delegate());
        let model = load(
            self.vtable.user_data,
            c_path.as_ptr(),
            asset.bytes().as_ptr(),
            asset.len(),
            delegate,
            num_threads,
        );
        if model.is_null() {
            return Err(ModelError::InvalidState(format!(
                "runtime could not load {}",
                asset.path().display()
            )));
        }

        Ok(FfiAnswerer {
            vtable: self.vtable,
            model,
            asset,
        })
    }
}

impl QuestionAnswerer for FfiAnswerer {
    fn answer(&mut self, context: &str, question: &str) -> bqa_model::Result<Vec<QaAnswer>> {
        if self.model.is_null() {
            return Err(ModelError::InvalidState("model already closed".to_string()));
        }
        let answer = self
            .vtable
            .answer
            .ok_or_else(|| ModelError::Other("runtime has no answer function".to_string()))?;

        let c_context = CString::new(context)
            .map_err(|e| ModelError::Inference(format!("invalid context: {}", e)))?;
        let c_question = CString::new(question)
            .map_err(|e| ModelError::Inference(format!("invalid question: {}", e)))?;

        let mut answers: Vec<QaAnswer> = Vec::new();
        let ok = answer(
            self.vtable.user_data,
            self.model,
            c_context.as_ptr(),
            c_question.as_ptr(),
            Some(collect_answer),
            &mut answers as *mut Vec<QaAnswer> as *mut c_void,
        );

        if ok {
            Ok(answers)
        } else {
            Err(ModelError::Inference("runtime answer call failed".to_string()))
        }
    }

    fn close(&mut self) {
        if self.model.is_null() {
            return;
        }
        if let Some(close) = self.vtable.close {
            close(self.vtable.user_data, self.model);
        }
        self.model = std::ptr::null_mut();
        tracing::debug!("Host closed model {}", self.asset.name());
    }
}

impl Drop for FfiAnswerer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Answer sink handed to the host. `sink_data` is the `Vec<QaAnswer>` being filled.
extern "C" fn collect_answer(
    sink_data: *mut c_void,
    text: *const c_char,
    start: i32,
    end: i32,
    logit: f32,
) {
    if sink_data.is_null() {
        return;
    }
    let answers = unsafe { &mut *(sink_data as *mut Vec<QaAnswer>) };
    let text = if text.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
    };
    answers.push(QaAnswer::new(text, start, end, logit));
}
