//! Bot configuration.
//!
//! Credentials come from two places:
//! - Production: `COINBASE_PROD_*` environment variables, falling back to a
//!   `[production]` table in the credentials file
//! - Sandbox: the `[sandbox]` table of the credentials file
//!
//! Pushover keys are read from `PUSHOVER_APP_TOKEN` / `PUSHOVER_USER_KEY`
//! when push notifications are enabled. A `.env` file is loaded first if
//! present.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use dca_domain::{ApiCredentials, Environment};

use crate::cli::Args;
use crate::error::{AppError, AppResult};

// =============================================================================
// Constants
// =============================================================================

/// Default credentials file
pub const DEFAULT_CONFIG_PATH: &str = "settings.toml";

const PROD_API_KEY: &str = "COINBASE_PROD_API_KEY";
const PROD_API_SECRET: &str = "COINBASE_PROD_API_SECRET_KEY";
const PROD_PASSPHRASE: &str = "COINBASE_PROD_PASSPHRASE";
const PUSHOVER_APP_TOKEN: &str = "PUSHOVER_APP_TOKEN";
const PUSHOVER_USER_KEY: &str = "PUSHOVER_USER_KEY";

// =============================================================================
// Credentials File
// =============================================================================

/// Parsed credentials file.
///
/// ```toml
/// [sandbox]
/// api_key = "..."
/// secret_key = "..."
/// passphrase = "..."
/// ```
#[derive(Default, Deserialize)]
pub struct SettingsFile {
    /// Sandbox API keys
    #[serde(default)]
    pub sandbox: Option<CredentialSection>,
    /// Production API keys (environment variables take precedence)
    #[serde(default)]
    pub production: Option<CredentialSection>,
}

/// One `[sandbox]` or `[production]` table. Upper-case key names are
/// accepted as well.
#[derive(Default, Deserialize)]
pub struct CredentialSection {
    /// API key
    #[serde(default, alias = "API_KEY")]
    pub api_key: String,
    /// Base64 API secret
    #[serde(default, alias = "SECRET_KEY")]
    pub secret_key: String,
    /// Key passphrase
    #[serde(default, alias = "PASSPHRASE")]
    pub passphrase: String,
}

impl SettingsFile {
    /// Load the credentials file. A missing file reads as empty.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_str(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.as_ref().display(), "No credentials file");
                Ok(Self::default())
            },
            Err(e) => Err(AppError::Config(format!("Failed to read config file: {}", e))),
        }
    }

    /// Parse a credentials file from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> AppResult<Self> {
        toml::from_str(s).map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    fn section(&self, environment: Environment) -> Option<&CredentialSection> {
        match environment {
            Environment::Sandbox => self.sandbox.as_ref(),
            Environment::Production => self.production.as_ref(),
        }
    }
}

// =============================================================================
// Pushover
// =============================================================================

/// Pushover application token and user key.
#[derive(Clone)]
pub struct PushoverSettings {
    /// Application API token
    pub app_token: String,
    /// User key
    pub user_key: String,
}

impl std::fmt::Debug for PushoverSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PushoverSettings(<redacted>)")
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Everything a run needs besides the trade itself.
#[derive(Debug)]
pub struct Config {
    /// Exchange deployment
    pub environment: Environment,
    /// Exchange credentials, `None` when any part is missing
    pub credentials: Option<ApiCredentials>,
    /// Pushover keys when push notifications are enabled
    pub pushover: Option<PushoverSettings>,
    /// Log request and response bodies
    pub debug: bool,
}

impl Config {
    /// Load configuration for `args` from the process environment and the
    /// credentials file.
    ///
    /// # Errors
    ///
    /// `MissingPushoverKeys` when `--push-notify` is set without both
    /// Pushover keys; `Config` when the credentials file can't be read or
    /// parsed. Missing exchange credentials are not an error here so the
    /// caller can notify about them first.
    pub fn from_env(args: &Args) -> AppResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = args.environment();
        let file = match environment {
            Environment::Sandbox => SettingsFile::from_file(&args.config)?,
            // Production reads the file only as a fallback
            Environment::Production => SettingsFile::from_file(&args.config).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring unreadable credentials file");
                SettingsFile::default()
            }),
        };

        Self::from_sources(args, &file, |key| std::env::var(key).ok())
    }

    /// Build configuration from an already-parsed file and an environment
    /// lookup.
    pub fn from_sources<F>(args: &Args, file: &SettingsFile, env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pushover = if args.push_notify {
            Some(Self::load_pushover(&env)?)
        } else {
            None
        };

        let environment = args.environment();
        let credentials = Self::load_credentials(environment, file, &env);

        Ok(Self {
            environment,
            credentials,
            pushover,
            debug: args.debug,
        })
    }

    fn load_pushover<F>(env: &F) -> AppResult<PushoverSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (non_empty(env(PUSHOVER_APP_TOKEN)), non_empty(env(PUSHOVER_USER_KEY))) {
            (Some(app_token), Some(user_key)) => Ok(PushoverSettings { app_token, user_key }),
            _ => Err(AppError::MissingPushoverKeys),
        }
    }

    fn load_credentials<F>(
        environment: Environment,
        file: &SettingsFile,
        env: &F,
    ) -> Option<ApiCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (file_key, file_secret, file_passphrase) = match file.section(environment) {
            Some(section) => (
                non_empty(Some(section.api_key.clone())),
                non_empty(Some(section.secret_key.clone())),
                non_empty(Some(section.passphrase.clone())),
            ),
            None => (None, None, None),
        };

        let (key, secret, passphrase) = match environment {
            Environment::Sandbox => (file_key, file_secret, file_passphrase),
            Environment::Production => (
                non_empty(env(PROD_API_KEY)).or(file_key),
                non_empty(env(PROD_API_SECRET)).or(file_secret),
                non_empty(env(PROD_PASSPHRASE)).or(file_passphrase),
            ),
        };

        let credentials = ApiCredentials::new(key?, secret?, passphrase?);
        tracing::debug!(?credentials, %environment, "Loaded credentials");
        Some(credentials)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    const FILE: &str = r#"
[sandbox]
api_key = "sandbox-key"
secret_key = "c2FuZGJveA=="
passphrase = "sandbox-pass"

[production]
api_key = "file-prod-key"
secret_key = "ZmlsZQ=="
passphrase = "file-prod-pass"
"#;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["dca-bot", "BTC-USD", "BUY", "14", "USD"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_sandbox_credentials_from_file() {
        let file = SettingsFile::from_str(FILE).unwrap();
        let config = Config::from_sources(&args(&["--sandbox"]), &file, env(&[])).unwrap();

        let credentials = config.credentials.unwrap();
        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(credentials.api_key, "sandbox-key");
        assert_eq!(credentials.api_secret.as_str(), "c2FuZGJveA==");
        assert_eq!(credentials.passphrase.as_str(), "sandbox-pass");
        assert!(config.pushover.is_none());
    }

    #[test]
    fn test_sandbox_ignores_production_env() {
        let file = SettingsFile::default();
        let vars = env(&[
            (PROD_API_KEY, "env-key"),
            (PROD_API_SECRET, "env-secret"),
            (PROD_PASSPHRASE, "env-pass"),
        ]);

        let config = Config::from_sources(&args(&["--sandbox"]), &file, vars).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_production_env_takes_precedence() {
        let file = SettingsFile::from_str(FILE).unwrap();
        let vars = env(&[(PROD_API_KEY, "env-key"), (PROD_PASSPHRASE, "env-pass")]);

        let config = Config::from_sources(&args(&["-j"]), &file, vars).unwrap();
        let credentials = config.credentials.unwrap();

        assert_eq!(credentials.api_key, "env-key");
        // Secret falls back to the [production] table
        assert_eq!(credentials.api_secret.as_str(), "ZmlsZQ==");
        assert_eq!(credentials.passphrase.as_str(), "env-pass");
    }

    #[test]
    fn test_missing_production_credentials() {
        let file = SettingsFile::default();
        let vars = env(&[(PROD_API_KEY, "env-key"), (PROD_API_SECRET, "  ")]);

        let config = Config::from_sources(&args(&[]), &file, vars).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_pushover_keys_required_when_enabled() {
        let file = SettingsFile::from_str(FILE).unwrap();

        let missing = Config::from_sources(&args(&["--sandbox", "-p"]), &file, env(&[(PUSHOVER_APP_TOKEN, "app")]));
        assert!(matches!(missing, Err(AppError::MissingPushoverKeys)));

        let vars = env(&[(PUSHOVER_APP_TOKEN, "app"), (PUSHOVER_USER_KEY, "user")]);
        let config = Config::from_sources(&args(&["--sandbox", "-p"]), &file, vars).unwrap();
        let pushover = config.pushover.unwrap();
        assert_eq!(pushover.app_token, "app");
        assert_eq!(pushover.user_key, "user");
    }

    #[test]
    fn test_upper_case_key_names() {
        let file = SettingsFile::from_str(
            r#"
[sandbox]
API_KEY = "sandbox-key"
SECRET_KEY = "c2FuZGJveA=="
PASSPHRASE = "sandbox-pass"
"#,
        )
        .unwrap();
        let config = Config::from_sources(&args(&["--sandbox"]), &file, env(&[])).unwrap();

        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.api_key, "sandbox-key");
        assert_eq!(credentials.api_secret.as_str(), "c2FuZGJveA==");
        assert_eq!(credentials.passphrase.as_str(), "sandbox-pass");
    }

    #[test]
    fn test_file_without_sections() {
        let file = SettingsFile::from_str("").unwrap();
        assert!(file.sandbox.is_none());
        assert!(file.production.is_none());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(SettingsFile::from_str("[sandbox"), Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let path = std::env::temp_dir().join("dca-bot-missing-settings.toml");
        let file = SettingsFile::from_file(&path).unwrap();
        assert!(file.sandbox.is_none());
    }

    #[test]
    fn test_debug_never_shows_secrets() {
        let file = SettingsFile::from_str(FILE).unwrap();
        let vars = env(&[(PUSHOVER_APP_TOKEN, "app-token"), (PUSHOVER_USER_KEY, "user-key")]);
        let config = Config::from_sources(&args(&["--sandbox", "-p"]), &file, vars).unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("c2FuZGJveA=="));
        assert!(!debug.contains("sandbox-pass"));
        assert!(!debug.contains("app-token"));
    }
}
