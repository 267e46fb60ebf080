use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model asset name: {0:?}")]
    InvalidAssetName(String),
    #[error("model asset is empty: {0}")]
    EmptyAsset(String),
    #[error("invalid runtime state: {0}")]
    InvalidState(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
