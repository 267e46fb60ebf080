use std::path::Path;
use std::time::{Duration, Instant};

use bqa_delegate::{
    select_delegate, BaseOptions, Delegate, DelegatePolicy, DeviceCapabilities, DeviceProbe,
    FixedProbe, HostProbe,
};
use bqa_model::{AssetDir, QaAnswer, QaRuntime, QuestionAnswerer, QuestionAnswererOptions};

use crate::config::{load_config_strict, HelperConfig};
use crate::error::{HelperError, Result};
use crate::listener::ResultAnswerListener;

/// Model file bundled with the application.
pub const BERT_QA_MODEL: &str = "mobilebert.tflite";

/// Reported to the listener when the model cannot be loaded.
pub const INIT_ERROR_MESSAGE: &str = "Bert Question Answerer failed to initialize";

/// Reported to the listener when a loaded model fails to answer.
pub const ANSWER_ERROR_MESSAGE: &str = "Bert Question Answerer failed to answer";

/// Answers for one call plus the wall-clock time spent in the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct AskOutcome {
    pub answers: Vec<QaAnswer>,
    pub inference_time: Duration,
}

/// A loaded model together with the delegate it was created with.
struct Handle<A> {
    answerer: A,
    delegate: Delegate,
}

/// Owns at most one loaded question-answering model.
///
/// The model is created on the first [`ask`](Self::ask) and reused until
/// [`release`](Self::release). A failed load leaves no handle behind, so the
/// next call starts over, probing the device again.
///
/// Unless a probe is set with [`with_probe`](Self::with_probe), GPU support
/// comes from the runtime's own compatibility check and the platform version
/// from [`HostProbe`].
///
/// Calls block for the whole load and inference. The helper is not `Sync`;
/// wrap it in a `Mutex` to share it between threads.
pub struct BertQaHelper<R: QaRuntime> {
    runtime: R,
    assets: AssetDir,
    model_name: String,
    probe: Option<Box<dyn DeviceProbe + Send>>,
    policy: DelegatePolicy,
    listener: Option<Box<dyn ResultAnswerListener>>,
    handle: Option<Handle<R::Answerer>>,
}

impl<R: QaRuntime> BertQaHelper<R> {
    /// Create a helper loading [`BERT_QA_MODEL`] from `assets`.
    pub fn new(
        runtime: R,
        assets: AssetDir,
        listener: Option<Box<dyn ResultAnswerListener>>,
    ) -> Self {
        Self {
            runtime,
            assets,
            model_name: BERT_QA_MODEL.to_string(),
            probe: None,
            policy: DelegatePolicy::default(),
            listener,
            handle: None,
        }
    }

    /// Create a helper from a config, validated first. Pinned device
    /// capabilities replace the default probing.
    pub fn from_config(
        runtime: R,
        config: &HelperConfig,
        listener: Option<Box<dyn ResultAnswerListener>>,
    ) -> Self {
        let mut config = config.clone();
        config.validate();

        let helper = Self::new(runtime, AssetDir::new(&config.assets_dir), listener)
            .with_model_name(config.model_name.clone())
            .with_policy(config.policy());

        match config.device {
            Some(caps) => helper.with_probe(Box::new(FixedProbe(caps))),
            None => helper,
        }
    }

    /// Read a JSON config file and build a helper from it.
    pub fn from_config_file(
        runtime: R,
        path: &Path,
        listener: Option<Box<dyn ResultAnswerListener>>,
    ) -> Result<Self> {
        let config = load_config_strict(path)?;
        Ok(Self::from_config(runtime, &config, listener))
    }

    pub fn with_probe(mut self, probe: Box<dyn DeviceProbe + Send>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_policy(mut self, mut policy: DelegatePolicy) -> Self {
        policy.validate();
        self.policy = policy;
        self
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// Delegate of the live model, `None` when no model is loaded.
    pub fn delegate(&self) -> Option<Delegate> {
        self.handle.as_ref().map(|h| h.delegate)
    }

    /// Close and drop the loaded model, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.answerer.close();
            tracing::debug!("Released question answerer ({})", handle.delegate);
        }
    }

    /// Answer `question` against `context`, loading the model first if needed.
    ///
    /// On success the listener's `on_results` is called once with the
    /// runtime's answers and the inference time, which are also returned.
    /// A load failure was already reported through `on_error` and yields
    /// `HelperError::ModelLoad` without calling the runtime.
    pub fn ask(&mut self, context: &str, question: &str) -> Result<AskOutcome> {
        let (result, inference_time) = {
            let handle = self.ensure_initialized()?;
            let start = Instant::now();
            let result = handle.answerer.answer(context, question);
            (result, start.elapsed())
        };

        match result {
            Ok(answers) => {
                tracing::debug!(
                    "Inference took {} ms, {} answers",
                    inference_time.as_millis(),
                    answers.len()
                );
                if let Some(listener) = &self.listener {
                    listener.on_results(&answers, inference_time);
                }
                Ok(AskOutcome {
                    answers,
                    inference_time,
                })
            }
            Err(e) => {
                tracing::error!("Question answering failed with error: {}", e);
                self.report_error(ANSWER_ERROR_MESSAGE);
                Err(HelperError::Answer(e))
            }
        }
    }

    fn ensure_initialized(&mut self) -> Result<&mut Handle<R::Answerer>> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => self.setup()?,
        };
        Ok(self.handle.insert(handle))
    }

    fn probe_device(&self) -> DeviceCapabilities {
        match &self.probe {
            Some(probe) => probe.probe(),
            None => DeviceCapabilities {
                gpu_delegate_supported: self.runtime.is_gpu_delegate_supported(),
                platform_version: HostProbe.platform_version(),
            },
        }
    }

    fn setup(&self) -> Result<Handle<R::Answerer>> {
        let caps = self.probe_device();
        let delegate = select_delegate(&caps, &self.policy);

        let options = QuestionAnswererOptions::builder()
            .set_base_options(BaseOptions::from_delegate(delegate))
            .build();

        match self
            .runtime
            .create_from_file_and_options(&self.assets, &self.model_name, &options)
        {
            Ok(answerer) => {
                tracing::info!("Loaded {} with delegate {}", self.model_name, delegate);
                Ok(Handle { answerer, delegate })
            }
            Err(e) => {
                self.report_error(INIT_ERROR_MESSAGE);
                tracing::error!("Runtime failed to load model with error: {}", e);
                Err(HelperError::ModelLoad(e))
            }
        }
    }

    fn report_error(&self, message: &str) {
        if let Some(listener) = &self.listener {
            listener.on_error(message);
        }
    }
}

impl<R: QaRuntime> Drop for BertQaHelper<R> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{ChannelListener, ListenerEvent};
    use bqa_delegate::DeviceCapabilities;
    use bqa_model::{ModelAsset, ModelError};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc::Receiver;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Counters {
        loads: AtomicUsize,
        answers: AtomicUsize,
        closes: AtomicUsize,
        probes: AtomicUsize,
        last_options: Mutex<Option<QuestionAnswererOptions>>,
    }

    /// Runtime that maps the asset from disk and answers from a fixed list.
    struct FakeRuntime {
        counters: Arc<Counters>,
        answers: Vec<QaAnswer>,
        fail_answers: Arc<AtomicBool>,
        gpu_supported: bool,
    }

    impl FakeRuntime {
        fn new(counters: &Arc<Counters>, answers: Vec<QaAnswer>) -> Self {
            Self {
                counters: Arc::clone(counters),
                answers,
                fail_answers: Arc::new(AtomicBool::new(false)),
                gpu_supported: false,
            }
        }
    }

    struct FakeAnswerer {
        counters: Arc<Counters>,
        answers: Vec<QaAnswer>,
        fail_answers: Arc<AtomicBool>,
        _asset: ModelAsset,
    }

    impl QaRuntime for FakeRuntime {
        type Answerer = FakeAnswerer;

        fn is_gpu_delegate_supported(&self) -> bool {
            self.counters.probes.fetch_add(1, Ordering::SeqCst);
            self.gpu_supported
        }

        fn create_from_file_and_options(
            &self,
            assets: &AssetDir,
            model_name: &str,
            options: &QuestionAnswererOptions,
        ) -> bqa_model::Result<FakeAnswerer> {
            self.counters.loads.fetch_add(1, Ordering::SeqCst);
            *self.counters.last_options.lock().unwrap() = Some(*options);
            let asset = ModelAsset::open(assets, model_name)
                .map_err(|e| ModelError::InvalidState(e.to_string()))?;
            Ok(FakeAnswerer {
                counters: Arc::clone(&self.counters),
                answers: self.answers.clone(),
                fail_answers: Arc::clone(&self.fail_answers),
                _asset: asset,
            })
        }
    }

    impl QuestionAnswerer for FakeAnswerer {
        fn answer(&mut self, context: &str, question: &str) -> bqa_model::Result<Vec<QaAnswer>> {
            assert!(!context.is_empty() && !question.is_empty());
            self.counters.answers.fetch_add(1, Ordering::SeqCst);
            if self.fail_answers.load(Ordering::SeqCst) {
                return Err(ModelError::Inference("tensor allocation failed".to_string()));
            }
            Ok(self.answers.clone())
        }

        fn close(&mut self) {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingProbe {
        caps: DeviceCapabilities,
        counters: Arc<Counters>,
    }

    impl DeviceProbe for CountingProbe {
        fn probe(&self) -> DeviceCapabilities {
            self.counters.probes.fetch_add(1, Ordering::SeqCst);
            self.caps
        }
    }

    const CONTEXT: &str = "Ada Lovelace wrote the first published algorithm in 1843.";
    const QUESTION: &str = "Who wrote the first algorithm?";

    struct Fixture {
        helper: BertQaHelper<FakeRuntime>,
        counters: Arc<Counters>,
        fail_answers: Arc<AtomicBool>,
        events: Receiver<ListenerEvent>,
        dir: tempfile::TempDir,
    }

    fn answers() -> Vec<QaAnswer> {
        vec![
            QaAnswer::new("Ada Lovelace", 0, 1, 9.5),
            QaAnswer::new("Lovelace", 1, 1, 4.0),
        ]
    }

    fn write_model(dir: &Path) {
        std::fs::write(dir.join(BERT_QA_MODEL), b"\x1c\0\0\0TFL3").unwrap();
    }

    fn fixture_with(caps: DeviceCapabilities, with_model: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        if with_model {
            write_model(dir.path());
        }

        let counters = Arc::new(Counters::default());
        let fail_answers = Arc::new(AtomicBool::new(false));
        let runtime = FakeRuntime {
            fail_answers: Arc::clone(&fail_answers),
            ..FakeRuntime::new(&counters, answers())
        };
        let (listener, events) = ChannelListener::channel();
        let helper = BertQaHelper::new(runtime, AssetDir::new(dir.path()), Some(Box::new(listener)))
            .with_probe(Box::new(CountingProbe {
                caps,
                counters: Arc::clone(&counters),
            }));

        Fixture {
            helper,
            counters,
            fail_answers,
            events,
            dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(DeviceCapabilities::default(), true)
    }

    fn caps(gpu: bool, version: u32) -> DeviceCapabilities {
        DeviceCapabilities {
            gpu_delegate_supported: gpu,
            platform_version: version,
        }
    }

    #[test]
    fn test_initializes_once_across_asks() {
        let mut f = fixture();
        for _ in 0..3 {
            f.helper.ask(CONTEXT, QUESTION).unwrap();
        }
        assert_eq!(f.counters.loads.load(Ordering::SeqCst), 1);
        assert_eq!(f.counters.probes.load(Ordering::SeqCst), 1);
        assert_eq!(f.counters.answers.load(Ordering::SeqCst), 3);
        assert!(f.helper.is_initialized());
    }

    #[test]
    fn test_release_then_ask_reinitializes() {
        let mut f = fixture();
        f.helper.ask(CONTEXT, QUESTION).unwrap();
        f.helper.release();
        assert!(!f.helper.is_initialized());
        assert_eq!(f.counters.closes.load(Ordering::SeqCst), 1);

        f.helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(f.counters.loads.load(Ordering::SeqCst), 2);
        assert_eq!(f.counters.probes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_delegate_selection_flows_into_options() {
        let cases = [
            (caps(true, 21), Delegate::Gpu),
            (caps(false, 28), Delegate::Nnapi),
            (caps(false, 27), Delegate::Cpu { num_threads: 4 }),
        ];
        for (device, expected) in cases {
            let mut f = fixture_with(device, true);
            f.helper.ask(CONTEXT, QUESTION).unwrap();
            assert_eq!(f.helper.delegate(), Some(expected));

            let options = f.counters.last_options.lock().unwrap().unwrap();
            assert_eq!(options.base_options.delegate(), expected);
        }
    }

    #[test]
    fn test_load_failure_reports_once_and_skips_answer() {
        let mut f = fixture_with(DeviceCapabilities::default(), false);

        let err = f.helper.ask(CONTEXT, QUESTION).unwrap_err();
        assert!(matches!(err, HelperError::ModelLoad(ModelError::InvalidState(_))));
        assert!(!f.helper.is_initialized());
        assert_eq!(f.helper.delegate(), None);
        assert_eq!(f.counters.answers.load(Ordering::SeqCst), 0);

        let events: Vec<_> = f.events.try_iter().collect();
        assert_eq!(events, vec![ListenerEvent::Error(INIT_ERROR_MESSAGE.to_string())]);
    }

    #[test]
    fn test_load_failure_retries_on_next_ask() {
        let mut f = fixture_with(DeviceCapabilities::default(), false);
        assert!(f.helper.ask(CONTEXT, QUESTION).is_err());

        write_model(f.dir.path());
        let outcome = f.helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(outcome.answers, answers());
        assert_eq!(f.counters.loads.load(Ordering::SeqCst), 2);
        assert_eq!(f.counters.probes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_success_reports_results_once() {
        let mut f = fixture();
        let outcome = f.helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(outcome.answers, answers());
        approx::assert_relative_eq!(outcome.answers[0].score(), 9.5);

        let events: Vec<_> = f.events.try_iter().collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ListenerEvent::Results {
                answers: reported,
                inference_time,
            } => {
                assert_eq!(reported, &answers());
                assert_eq!(*inference_time, outcome.inference_time);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_release_twice_is_harmless() {
        let mut f = fixture();
        f.helper.release();
        f.helper.release();
        assert!(!f.helper.is_initialized());

        f.helper.ask(CONTEXT, QUESTION).unwrap();
        f.helper.release();
        f.helper.release();
        assert!(!f.helper.is_initialized());
        assert_eq!(f.counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_answer_failure_keeps_handle() {
        let mut f = fixture();
        f.fail_answers.store(true, Ordering::SeqCst);

        let err = f.helper.ask(CONTEXT, QUESTION).unwrap_err();
        assert!(matches!(err, HelperError::Answer(ModelError::Inference(_))));
        assert!(f.helper.is_initialized());

        let events: Vec<_> = f.events.try_iter().collect();
        assert_eq!(events, vec![ListenerEvent::Error(ANSWER_ERROR_MESSAGE.to_string())]);

        f.fail_answers.store(false, Ordering::SeqCst);
        f.helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(f.counters.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_without_listener() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path());
        let counters = Arc::new(Counters::default());
        let runtime = FakeRuntime::new(&counters, answers());
        let mut helper = BertQaHelper::new(runtime, AssetDir::new(dir.path()), None)
            .with_probe(Box::new(FixedProbe(caps(false, 0))));

        let outcome = helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(outcome.answers.len(), 2);
        assert_eq!(helper.delegate(), Some(Delegate::Cpu { num_threads: 4 }));
    }

    #[test]
    fn test_drop_closes_handle() {
        let mut f = fixture();
        f.helper.ask(CONTEXT, QUESTION).unwrap();
        let counters = Arc::clone(&f.counters);
        drop(f);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_pins_device_and_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tiny.tflite"), b"model").unwrap();

        let config = HelperConfig {
            model_name: "tiny.tflite".to_string(),
            assets_dir: dir.path().to_path_buf(),
            cpu_num_threads: 2,
            nnapi_min_platform_version: 28,
            device: Some(caps(false, 10)),
        };
        let counters = Arc::new(Counters::default());
        let runtime = FakeRuntime::new(&counters, Vec::new());
        let mut helper = BertQaHelper::from_config(runtime, &config, None);
        assert_eq!(helper.model_name(), "tiny.tflite");

        let outcome = helper.ask(CONTEXT, QUESTION).unwrap();
        assert!(outcome.answers.is_empty());
        assert_eq!(helper.delegate(), Some(Delegate::Cpu { num_threads: 2 }));
    }

    #[test]
    fn test_from_config_normalizes_values() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path());

        let config = HelperConfig {
            model_name: String::new(),
            assets_dir: dir.path().to_path_buf(),
            cpu_num_threads: 1000,
            nnapi_min_platform_version: 28,
            device: Some(DeviceCapabilities::default()),
        };
        let counters = Arc::new(Counters::default());
        let mut helper = BertQaHelper::from_config(FakeRuntime::new(&counters, answers()), &config, None);
        assert_eq!(helper.model_name(), BERT_QA_MODEL);

        helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(helper.delegate(), Some(Delegate::Cpu { num_threads: 64 }));
    }

    #[test]
    fn test_gpu_support_comes_from_runtime() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path());
        let counters = Arc::new(Counters::default());

        let runtime = FakeRuntime {
            gpu_supported: true,
            ..FakeRuntime::new(&counters, answers())
        };
        let mut helper = BertQaHelper::new(runtime, AssetDir::new(dir.path()), None);
        helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(helper.delegate(), Some(Delegate::Gpu));
        assert_eq!(counters.probes.load(Ordering::SeqCst), 1);
    }

    #[cfg(not(target_os = "android"))]
    #[test]
    fn test_runtime_rejecting_gpu_falls_back_to_cpu() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path());
        let counters = Arc::new(Counters::default());

        let mut helper = BertQaHelper::new(
            FakeRuntime::new(&counters, answers()),
            AssetDir::new(dir.path()),
            None,
        );
        helper.ask(CONTEXT, QUESTION).unwrap();
        assert_eq!(helper.delegate(), Some(Delegate::Cpu { num_threads: 4 }));

        let options = counters.last_options.lock().unwrap().unwrap();
        assert_eq!(options.base_options.num_threads(), Some(4));
    }

    #[test]
    fn test_from_config_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = FakeRuntime::new(&Arc::new(Counters::default()), Vec::new());
        let result = BertQaHelper::from_config_file(runtime, &dir.path().join("none.json"), None);
        assert!(matches!(result, Err(HelperError::Config(_))));
    }

    #[test]
    fn test_shared_behind_mutex() {
        let f = fixture();
        let counters = Arc::clone(&f.counters);
        let helper = Arc::new(Mutex::new(f.helper));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let helper = Arc::clone(&helper);
                std::thread::spawn(move || {
                    helper.lock().unwrap().ask(CONTEXT, QUESTION).unwrap();
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(counters.loads.load(Ordering::SeqCst), 1);
        assert_eq!(counters.answers.load(Ordering::SeqCst), 4);
    }
}
