use bqa_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum HelperError {
    /// The runtime could not load the model. The handle stays unset.
    #[error("model load failed: {0}")]
    ModelLoad(#[source] ModelError),
    /// The runtime failed while answering. The loaded model is kept.
    #[error("answer failed: {0}")]
    Answer(#[source] ModelError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, HelperError>;
