//! DCA Bot Exchange Connectors
//!
//! REST clients for the Coinbase Pro API and the Pushover notification API.
//! Exchange replies are decoded straight into domain types.

#![warn(clippy::all)]

// Public modules
pub mod coinbase_rest;
pub mod pushover;

// Re-exports
pub use coinbase_rest::{parse_reply, CoinbaseReply, CoinbaseRestClient, CoinbaseRestError, NOT_FOUND_MESSAGE};
pub use pushover::{PushoverClient, PushoverError};
pub use reqwest::StatusCode;
