//! Error types shared across the relay.
//!
//! Structured errors with numeric codes so the API layer can tell caller
//! mistakes (4xx-equivalent) from engine faults.

use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes for API responses.
///
/// Codes are structured as:
/// - 1xxx: Decode/validation errors (client)
/// - 2xxx: Not found errors (client)
/// - 3xxx: Ordering conflicts (client-visible logic errors)
/// - 6xxx: Internal errors (server)
/// - 7xxx: Network errors (server)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Decode/validation errors (1xxx)
    InvalidHex = 1001,
    InvalidLeaf = 1002,
    InvalidField = 1003,
    InvalidProof = 1004,
    EmptyTree = 1005,

    // Not found errors (2xxx)
    LeafNotFound = 2001,
    CheckpointNotFound = 2002,
    BlockIdNotFound = 2003,

    // Conflict errors (3xxx)
    OutOfOrderCheckpoint = 3001,

    // Internal errors (6xxx)
    Internal = 6001,

    // Network errors (7xxx)
    ConnectionFailed = 7001,
    Rpc = 7002,
}

impl ErrorCode {
    /// Get the numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Check if this is a client error (4xx equivalent).
    pub fn is_client_error(self) -> bool {
        (1000..5000).contains(&self.code())
    }

    /// Check if this is a server error (5xx equivalent).
    pub fn is_server_error(self) -> bool {
        self.code() >= 5000
    }

    /// Check if this error is retryable.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCode::ConnectionFailed | ErrorCode::Rpc)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Errors that can occur in the relay engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed chain data or caller input. Fatal to the current tick.
    #[error("[{code}] decode error: {message}")]
    Decode {
        /// Error code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },

    /// A leaf, checkpoint, or block id was not found.
    #[error("[{code}] not found: {message}")]
    NotFound {
        /// Error code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },

    /// Checkpoint appended out of order. Must never happen; fatal.
    #[error("[{code}] out-of-order checkpoint: {message}")]
    OutOfOrderCheckpoint {
        /// Error code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },

    /// A proof could not be built or failed structural validation.
    #[error("[{code}] invalid proof: {message}")]
    InvalidProof {
        /// Error code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },

    /// Tree construction over zero leaves.
    #[error("[{code}] empty tree: no leaves to build over")]
    EmptyTree {
        /// Error code.
        code: ErrorCode,
    },

    /// RPC or connection failure talking to a chain.
    #[error("[{code}] network error: {message}")]
    Network {
        /// Error code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },

    /// Internal error.
    #[error("[{code}] internal error: {message}")]
    Internal {
        /// Error code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },
}

impl Error {
    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Decode { code, .. } => *code,
            Error::NotFound { code, .. } => *code,
            Error::OutOfOrderCheckpoint { code, .. } => *code,
            Error::InvalidProof { code, .. } => *code,
            Error::EmptyTree { code } => *code,
            Error::Network { code, .. } => *code,
            Error::Internal { code, .. } => *code,
        }
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Create a Decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            code: ErrorCode::InvalidHex,
            message: message.into(),
        }
    }

    /// Create a Decode error for a named chain-data field.
    pub fn decode_field(field: &str, message: impl Into<String>) -> Self {
        Error::Decode {
            code: ErrorCode::InvalidField,
            message: format!("{}: {}", field, message.into()),
        }
    }

    /// Create a Decode error for a malformed leaf.
    pub fn invalid_leaf(message: impl Into<String>) -> Self {
        Error::Decode {
            code: ErrorCode::InvalidLeaf,
            message: message.into(),
        }
    }

    /// Create a NotFound error for an unknown leaf.
    pub fn leaf_not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::LeafNotFound,
            message: message.into(),
        }
    }

    /// Create a NotFound error for a leaf with no covering checkpoint.
    pub fn checkpoint_not_found() -> Self {
        Error::NotFound {
            code: ErrorCode::CheckpointNotFound,
            message: "no committed checkpoint yet".to_string(),
        }
    }

    /// Create a NotFound error for an unknown destination block id.
    pub fn block_id_not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::BlockIdNotFound,
            message: message.into(),
        }
    }

    /// Create an OutOfOrderCheckpoint error.
    pub fn out_of_order_checkpoint(message: impl Into<String>) -> Self {
        Error::OutOfOrderCheckpoint {
            code: ErrorCode::OutOfOrderCheckpoint,
            message: message.into(),
        }
    }

    /// Create an InvalidProof error.
    pub fn invalid_proof(message: impl Into<String>) -> Self {
        Error::InvalidProof {
            code: ErrorCode::InvalidProof,
            message: message.into(),
        }
    }

    /// Create an EmptyTree error.
    pub fn empty_tree() -> Self {
        Error::EmptyTree {
            code: ErrorCode::EmptyTree,
        }
    }

    /// Create a Network error.
    pub fn network(message: impl Into<String>) -> Self {
        Error::Network {
            code: ErrorCode::Rpc,
            message: message.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Decode {
            code: ErrorCode::InvalidHex,
            message: e.to_string(),
        }
    }
}
