use thiserror::Error;

/// Failures the engine cannot turn into a normal game reply.
///
/// Bad input, missing permissions and unknown codes are not errors: they are
/// outcome variants of the operation and always render to a reply.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The durable store failed or returned a row that did not validate
    #[error(transparent)]
    Store(#[from] anyhow::Error),

    /// Configuration rejected at start-up
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
