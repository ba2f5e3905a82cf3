//! Command line surface.

use std::path::PathBuf;

use clap::Parser;
use rust_decimal::Decimal;

use dca_domain::{Environment, OrderSide};
use dca_exec::poller::DEFAULT_WARN_AFTER_SECS;
use dca_exec::{PollConfig, RejectionPolicy, RunnerConfig, TradeRequest};

use crate::config::DEFAULT_CONFIG_PATH;

/// Basic Coinbase Pro DCA buying/selling bot.
///
/// Places one market order, watches it until it settles and reports the
/// result. Meant to be run from cron.
#[derive(Debug, Clone, Parser)]
#[command(name = "dca-bot", version)]
#[command(after_help = "Examples:
  dca-bot BTC-USD BUY 14 USD          (buy $14 worth of BTC)
  dca-bot BTC-USD BUY 0.00125 BTC     (buy 0.00125 BTC)
  dca-bot ETH-BTC SELL 0.00125 BTC    (sell 0.00125 BTC worth of ETH)
  dca-bot ETH-BTC SELL 0.1 ETH        (sell 0.1 ETH)")]
pub struct Args {
    /// Market pair (e.g. BTC-USD, ETH-BTC)
    pub market_name: String,

    /// BUY or SELL (case-insensitive)
    pub order_side: OrderSide,

    /// The quantity to buy or sell in the amount currency
    pub amount: Decimal,

    /// The currency the amount is denominated in
    pub amount_currency: String,

    /// Run against the sandbox; skips the confirmation prompt
    #[arg(long = "sandbox")]
    pub sandbox_mode: bool,

    /// Seconds to wait before reporting that an order isn't done
    #[arg(long, default_value_t = DEFAULT_WARN_AFTER_SECS)]
    pub warn_after: u64,

    /// Suppresses the confirmation prompt
    #[arg(short = 'j', long = "job")]
    pub job_mode: bool,

    /// Credentials file (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Send push notifications for each status using Pushover
    #[arg(short, long)]
    pub push_notify: bool,

    /// Log all network requests for debugging
    #[arg(short, long)]
    pub debug: bool,

    /// End the run when the order is rejected instead of polling it
    #[arg(long)]
    pub stop_on_reject: bool,

    /// Exit with a distinct code per outcome instead of always 0
    #[arg(long)]
    pub exit_codes: bool,
}

impl Args {
    /// Exchange deployment selected by `--sandbox`.
    pub fn environment(&self) -> Environment {
        Environment::from_sandbox_flag(self.sandbox_mode)
    }

    /// Production runs ask before placing anything, unless run as a job.
    pub fn needs_confirmation(&self) -> bool {
        !self.sandbox_mode && !self.job_mode
    }

    /// The order the caller asked for.
    pub fn trade_request(&self) -> TradeRequest {
        TradeRequest {
            market: self.market_name.clone(),
            side: self.order_side,
            amount: self.amount,
            amount_currency: self.amount_currency.clone(),
        }
    }

    /// Runner settings from the flags.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            poll: PollConfig::with_warn_after_secs(self.warn_after),
            rejection_policy: if self.stop_on_reject {
                RejectionPolicy::Stop
            } else {
                RejectionPolicy::PollAnyway
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
