//! DCA Bot Library
//!
//! Command line front end for a single scheduled market order.
//!
//! # Architecture
//!
//! ```text
//! CLI → Config (env, credentials file) → OrderRunner → CoinbaseExchange
//!                                              ↓
//!                                      PushoverNotifier
//! ```
//!
//! # Components
//!
//! - **CLI**: Positional trade arguments and run-mode flags
//! - **Config**: Credentials and Pushover keys for the selected environment
//! - **Adapters**: Coinbase and Pushover clients behind the execution ports
//! - **App**: Confirmation prompt, wiring and report printing
//!
//! # Example
//!
//! ```rust,ignore
//! use clap::Parser;
//! use dca_bot::{app, Args};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = Args::parse();
//!     app::run(&args).await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use adapters::{CoinbaseExchange, ConsoleNotifier, PushoverNotifier};
pub use app::AppRun;
pub use cli::Args;
pub use config::{Config, SettingsFile};
pub use error::{AppError, AppResult};
