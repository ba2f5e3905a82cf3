//! Integration test: credentials file on disk feeds the sandbox run.
//!
//! Flow:
//! 1. Write a TOML credentials file to a temp dir
//! 2. Parse CLI args pointing at it
//! 3. Verify: sandbox credentials loaded, production env ignored

use std::fs;

use anyhow::Result;
use clap::Parser;
use dca_bot::{Args, Config, SettingsFile};
use dca_domain::Environment;

#[test]
fn test_sandbox_run_reads_credentials_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("dca-bot-settings-{}.toml", std::process::id()));
    fs::write(
        &path,
        "[sandbox]\napi_key = \"key\"\nsecret_key = \"c2VjcmV0\"\npassphrase = \"pass\"\n",
    )?;

    let path_str = path.to_string_lossy().to_string();
    let args = Args::try_parse_from(["dca-bot", "BTC-USD", "BUY", "14", "USD", "--sandbox", "-c", &path_str])?;

    let file = SettingsFile::from_file(&args.config)?;
    let config = Config::from_sources(&args, &file, |_| Some("from-env".to_string()))?;
    fs::remove_file(&path)?;

    assert_eq!(config.environment, Environment::Sandbox);
    let credentials = config.credentials.expect("sandbox credentials");
    assert_eq!(credentials.api_key, "key");
    assert_eq!(credentials.passphrase.as_str(), "pass");
    Ok(())
}

#[test]
fn test_unreadable_sandbox_file_is_config_error() -> Result<()> {
    let path = std::env::temp_dir().join(format!("dca-bot-broken-{}.toml", std::process::id()));
    fs::write(&path, "[sandbox\napi_key = ")?;

    let result = SettingsFile::from_file(&path);
    fs::remove_file(&path)?;

    assert!(matches!(result, Err(dca_bot::AppError::Config(_))));
    Ok(())
}
