//! Error types for LedgerChain

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// A user transfer was checked for validity before it was ever signed.
    #[error("Missing signature on transaction {0}")]
    MissingSignature(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid signature on transaction {0}")]
    InvalidSignature(String),

    /// The candidate block carried a transaction that failed validation; nothing was sealed.
    #[error("Mining aborted: {0}")]
    MiningAborted(String),

    /// The nonce search was stopped from outside (cancellation or deadline).
    #[error("Mining interrupted: {0}")]
    MiningInterrupted(String),

    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),

    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
