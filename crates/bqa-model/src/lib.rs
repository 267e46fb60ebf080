pub mod answer;
pub mod asset;
pub mod error;
pub mod options;
pub mod runtime;

pub use answer::{Pos, QaAnswer};
pub use asset::{AssetDir, ModelAsset};
pub use error::{ModelError, Result};
pub use options::{QuestionAnswererOptions, QuestionAnswererOptionsBuilder};
pub use runtime::{QaRuntime, QuestionAnswerer};
