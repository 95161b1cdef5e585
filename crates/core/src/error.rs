use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Runtime(#[from] emrpilot_runtime::Error),

    #[error("javascript evaluation failed: {0}")]
    JsEval(String),

    /// The engine answered, but with a shape the typed contract does not
    /// allow (e.g. a lookup that should return `{x, y, disabled}` or null).
    #[error("unexpected lookup result: {0}")]
    Lookup(String),

    #[error("screenshot failed at {path}: {message}")]
    Screenshot { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
