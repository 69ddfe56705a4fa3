//! Error types for medalert-core

use thiserror::Error;

use crate::notifications::NotificationError;
use crate::record::DecodeError;
use crate::store::StoreError;

/// Result type alias using medalert-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in medalert-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Document store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Local notification scheduler error
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// A record could not be decoded into an alert
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
