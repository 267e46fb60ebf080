use crate::answer::QaAnswer;
use crate::asset::AssetDir;
use crate::options::QuestionAnswererOptions;

/// An inference runtime able to load question-answering models.
///
/// The runtime owns tokenization, scoring, and decoding. Callers only pick
/// the model file and the delegate it runs on.
pub trait QaRuntime {
    /// The live model handle produced by a successful load.
    type Answerer: QuestionAnswerer;

    /// The runtime's GPU delegate compatibility check for this device.
    ///
    /// Runtimes without such a check report `false`, which keeps the GPU
    /// delegate out of the selection.
    fn is_gpu_delegate_supported(&self) -> bool {
        false
    }

    /// Load the bundled model `model_name` from `assets` with `options`.
    ///
    /// Returns `ModelError::InvalidState` (or any other error) when the
    /// model cannot be brought into a usable state.
    fn create_from_file_and_options(
        &self,
        assets: &AssetDir,
        model_name: &str,
        options: &QuestionAnswererOptions,
    ) -> crate::Result<Self::Answerer>;
}

/// A loaded question-answering model.
pub trait QuestionAnswerer {
    /// Answer `question` against `context`.
    ///
    /// Returns the candidate answers in the runtime's order. Blocks until
    /// the runtime returns.
    fn answer(&mut self, context: &str, question: &str) -> crate::Result<Vec<QaAnswer>>;

    /// Release runtime resources. Must be safe to call more than once.
    fn close(&mut self) {}
}
