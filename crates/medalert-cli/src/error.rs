use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] medalert_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Fixture error: {0}")]
    Fixture(String),
    #[error("User ID cannot be empty")]
    EmptyUserId,
    #[error("Invalid alert:\n{0}")]
    InvalidAlert(String),
}
