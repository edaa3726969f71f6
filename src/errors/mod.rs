use thiserror::Error;

/// Typed error hierarchy for qqbridge.
///
/// Use at module boundaries (config validation, transport calls, outbound routing).
/// Internal/leaf functions can continue using `anyhow::Result`; the `Internal` variant
/// allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
