use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Fatal: the process cannot run without its listening socket.
    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Why a single frame was rejected. Always recoverable: the frame is
/// dropped and the stream continues.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8 (at byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("agent at index {index} has an empty id")]
    EmptyId { index: usize },
}
