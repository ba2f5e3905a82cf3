//! DCA Bot Execution Layer
//!
//! Single market order lifecycle: resolve, normalize, submit, poll, report.
//!
//! # Architecture
//!
//! ```text
//! Resolver → Normalizer → Submitter → Poller → Report (→ Notifier)
//! ```
//!
//! # Components
//!
//! - **Ports**: Traits defining interfaces for the exchange and notifications
//! - **Submitter**: Places the order and classifies the immediate reply
//! - **Poller**: Fixed-interval status loop until a terminal state
//! - **Runner**: Orchestrates one run and builds the status report
//! - **Stub**: Scriptable test implementations
//!
//! # Example
//!
//! ```rust,ignore
//! use dca_exec::{OrderRunner, RunnerConfig, StubExchange, TradeRequest};
//! use std::sync::Arc;
//!
//! let runner = OrderRunner::new(exchange, notifier, RunnerConfig::default());
//! let report = runner.run(&trade).await?;
//! println!("{}", report.message);
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod poller;
pub mod ports;
pub mod runner;
pub mod stub;
pub mod submitter;

// Re-exports for convenience
pub use error::{ExecError, ExecResult};
pub use poller::{OrderPoller, PollConfig, PollOutcome, PollPhase, PollState};
pub use ports::{ExchangePort, Notifier, OrderLookup, OrderReply};
pub use runner::{OrderRunner, RejectionPolicy, RunOutcome, RunReport, RunnerConfig, TradeRequest};
pub use stub::{RecordingNotifier, StubExchange};
pub use submitter::{submit_order, Submission};
