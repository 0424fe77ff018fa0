//! Error types for minftp
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using FtpError
pub type Result<T> = std::result::Result<T, FtpError>;

/// Unified error type for minftp operations
///
/// Every variant terminates the current request/response exchange.
/// Nothing is retried by the library; reissuing an operation is up to the caller.
#[derive(Debug, Error)]
pub enum FtpError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Local storage or socket fault (permission, disk full, broken pipe)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Transfer Errors
    // -------------------------------------------------------------------------
    #[error("Transfer incomplete: {transferred} of {expected} bytes")]
    TransferIncomplete { expected: u64, transferred: u64 },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // Remote Errors
    // -------------------------------------------------------------------------
    #[error("Server error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FtpError {
    /// Whether the peer hung up underneath us (reset, abort, broken pipe)
    pub fn is_disconnect(&self) -> bool {
        match self {
            FtpError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}
