use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Service-account payload rejected by every parse strategy.
    #[error("credential parse error: {0}")]
    Credential(String),

    /// Checkpoint value rejected by every timestamp parse strategy.
    #[error("malformed checkpoint timestamp: {0}")]
    Checkpoint(String),

    #[error("configuration error: {0}")]
    Config(String),
}
