//! Error types for the relay layer.

use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors that can occur while scanning, packing, or submitting.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Core error (decode, ledger, merkle).
    #[error("core error: {0}")]
    Core(#[from] charon_core::Error),

    /// RPC failure talking to a chain.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Destination-chain submission failed.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// The channel between the scanner and submitter closed unexpectedly.
    #[error("relay channel closed")]
    ChannelClosed,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Whether retrying the same call can reasonably succeed.
    ///
    /// Only transport-level failures qualify; decode and ordering errors are
    /// deterministic and retrying them would loop forever.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::Core(e) => e.is_retryable(),
            RelayError::Rpc(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(RelayError::Rpc("timeout".into()).is_retryable());
        assert!(RelayError::Core(charon_core::Error::network("refused")).is_retryable());
        assert!(!RelayError::Core(charon_core::Error::decode("bad hex")).is_retryable());
        assert!(!RelayError::SubmissionFailed("reverted".into()).is_retryable());
    }
}
