//! Execution layer error types.

use thiserror::Error;

/// Errors that abort a run.
///
/// Exchange-side refusals (error message, rejection) are not errors; they
/// end the run with a report instead.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Market lookup or amount validation failed
    #[error("Domain error: {0}")]
    Domain(#[from] dca_domain::DomainError),

    /// Network, HTTP or decoding failure talking to the exchange
    #[error("Transport error: {0}")]
    Transport(String),

    /// Exchange reply that cannot be acted on
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;
