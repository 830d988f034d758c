//! Error types for the Actionguard crate.

use thiserror::Error;

/// Main error type for Actionguard operations.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Violation ledger errors
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Actionguard operations.
pub type Result<T> = std::result::Result<T, GuardError>;
