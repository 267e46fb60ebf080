//! `bqa-helper` - Question answering over a bundled BERT model.
//!
//! [`BertQaHelper`] owns at most one loaded model, creates it on first use
//! with a delegate picked from the device's capabilities, and reports each
//! call's answers and inference time to an optional [`ResultAnswerListener`].

pub mod config;
pub mod error;
pub mod helper;
pub mod listener;

pub use config::{load_config, load_config_strict, save_config, HelperConfig};
pub use error::{ConfigError, HelperError, Result};
pub use helper::{AskOutcome, BertQaHelper, ANSWER_ERROR_MESSAGE, BERT_QA_MODEL, INIT_ERROR_MESSAGE};
pub use listener::{ChannelListener, ListenerEvent, ResultAnswerListener};
