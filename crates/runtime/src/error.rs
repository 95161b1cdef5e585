use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The engine's Node launcher could not be located in any search path.
    #[error("engine launcher not found (set EMRPILOT_ENGINE_DIR or install the engine)")]
    LauncherNotFound,

    #[error("engine launch failed: {0}")]
    LaunchFailed(String),

    /// The launcher exited or closed its output without ever advertising a
    /// WebSocket endpoint. Callers must treat this as a hard launch failure.
    #[error("engine closed its output without advertising a WebSocket endpoint")]
    EndpointNotFound,

    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("timeout after {ms}ms waiting for response to {method}")]
    Timeout { ms: u64, method: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
