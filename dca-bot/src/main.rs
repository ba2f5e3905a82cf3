//! DCA Bot
//!
//! Places one market order on Coinbase Pro and reports how it ended.
//!
//! # Usage
//!
//! ```bash
//! # Buy $14 of BTC on the sandbox
//! cargo run -p dca-bot -- BTC-USD BUY 14 USD --sandbox
//!
//! # From cron: no prompt, push notifications, distinct exit codes
//! dca-bot BTC-USD BUY 14 USD -j -p --exit-codes
//! ```
//!
//! # Environment Variables
//!
//! - `COINBASE_PROD_API_KEY`, `COINBASE_PROD_API_SECRET_KEY`,
//!   `COINBASE_PROD_PASSPHRASE`: production credentials
//! - `PUSHOVER_APP_TOKEN`, `PUSHOVER_USER_KEY`: needed with `--push-notify`
//! - `RUST_LOG`: extra log directives

use clap::Parser;
use dca_bot::app::{self, timestamp, AppRun};
use dca_bot::Args;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Workspace crates that log
const LOG_TARGETS: [&str; 3] = ["dca_bot", "dca_exec", "dca_connectors"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.debug { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{}={}", target, level).parse()?);
    }
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    println!("{}: STARTED: {:?}", timestamp(), args);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %args.environment(),
        market = %args.market_name,
        "DCA bot"
    );

    match app::run(&args).await? {
        AppRun::Declined => Ok(()),
        AppRun::Completed(report) => {
            let code = report.outcome.exit_code();
            if args.exit_codes && code != 0 {
                std::process::exit(code);
            }
            Ok(())
        },
    }
}
