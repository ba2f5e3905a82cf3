//! One invocation: confirm, load configuration, run the order, print the report.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chrono::Local;
use tracing::info;

use dca_connectors::CoinbaseRestClient;
use dca_exec::{ExchangePort, Notifier, OrderRunner, RunReport};

use crate::adapters::{CoinbaseExchange, ConsoleNotifier, PushoverNotifier};
use crate::cli::Args;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Asked before any production order
pub const CONFIRM_PROMPT: &str = "Production purchase! Confirm [Y]: ";

/// How an invocation ended.
#[derive(Debug)]
pub enum AppRun {
    /// Operator declined the production prompt; nothing was placed
    Declined,
    /// The order ran to a terminal report
    Completed(RunReport),
}

/// Local wall-clock timestamp used on report lines.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Show the production prompt and read one line. Only an exact `Y` confirms.
pub fn confirm<R: BufRead, W: Write>(mut input: R, mut output: W) -> AppResult<bool> {
    write!(output, "{}", CONFIRM_PROMPT)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(answer.trim_end_matches(['\r', '\n']) == "Y")
}

/// Run the whole invocation against Coinbase Pro.
///
/// # Errors
///
/// Configuration problems, unknown markets and transport failures. A
/// refused, rejected, cancelled or unfilled order is a report, not an error.
pub async fn run(args: &Args) -> AppResult<AppRun> {
    if args.needs_confirmation() {
        let stdin = io::stdin();
        if !confirm(stdin.lock(), io::stdout())? {
            println!("Exiting without submitting purchase.");
            return Ok(AppRun::Declined);
        }
    }

    let mut config = Config::from_env(args)?;
    let notifier = Arc::new(config.pushover.as_ref().map(PushoverNotifier::from_settings));

    let Some(credentials) = config.credentials.take() else {
        let err = AppError::MissingCredentials;
        notifier.send(&err.to_string()).await;
        return Err(err);
    };

    let client = CoinbaseRestClient::new(credentials, config.environment).with_debug(config.debug);
    info!(
        environment = %config.environment,
        base_url = client.base_url(),
        push_notify = config.pushover.is_some(),
        "Using Coinbase Pro"
    );

    let exchange = Arc::new(CoinbaseExchange::new(client));
    let report = execute(exchange, notifier, args).await?;
    Ok(AppRun::Completed(report))
}

/// Run the order described by `args`, printing each status line as soon as
/// it is decided.
pub async fn execute<E, N>(exchange: Arc<E>, notifier: Arc<N>, args: &Args) -> AppResult<RunReport>
where
    E: ExchangePort,
    N: Notifier,
{
    let console = Arc::new(ConsoleNotifier::new(notifier));
    let runner = OrderRunner::new(exchange, console, args.runner_config());
    Ok(runner.run(&args.trade_request()).await?)
}

// =============================================================================
// Tests
// =============================================================================
