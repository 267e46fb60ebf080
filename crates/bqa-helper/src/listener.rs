use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use bqa_model::QaAnswer;

/// Receives the outcome of each question-answering call.
pub trait ResultAnswerListener: Send {
    /// A call failed: the model could not be initialized, or the loaded
    /// model failed to answer. `error` is a fixed, human-readable message.
    fn on_error(&self, error: &str);

    /// Answers for one call, with the time spent inside the runtime.
    fn on_results(&self, results: &[QaAnswer], inference_time: Duration);
}

/// A notification forwarded by [`ChannelListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    Error(String),
    Results {
        answers: Vec<QaAnswer>,
        inference_time: Duration,
    },
}

/// Listener that hands every notification to another thread over a channel.
///
/// Useful when the helper runs on a worker thread and results must be
/// consumed elsewhere (e.g. a UI loop).
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: Sender<ListenerEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<ListenerEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: Sender<ListenerEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: ListenerEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Listener receiver dropped, discarding notification");
        }
    }
}

impl ResultAnswerListener for ChannelListener {
    fn on_error(&self, error: &str) {
        self.send(ListenerEvent::Error(error.to_string()));
    }

    fn on_results(&self, results: &[QaAnswer], inference_time: Duration) {
        self.send(ListenerEvent::Results {
            answers: results.to_vec(),
            inference_time,
        });
    }
}
