//! Bot error types.

use dca_exec::ExecError;
use thiserror::Error;

/// Bot-level errors. Any of these ends the process with exit code 1.
#[derive(Debug, Error)]
pub enum AppError {
    /// Market lookup, amount validation, transport or exchange state error
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// Key, secret or passphrase absent for the selected environment
    #[error("Missing API key, key secret or passphrase for Coinbase Pro")]
    MissingCredentials,

    /// Push notifications requested without Pushover keys
    #[error("Missing application API token and user API key for Pushover")]
    MissingPushoverKeys,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal I/O failed (confirmation prompt)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bot operations.
pub type AppResult<T> = Result<T, AppError>;
