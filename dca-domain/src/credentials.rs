//! Exchange Credentials Domain Types
//!
//! Credentials are built once at startup by the config loader and injected
//! into the exchange client. The domain never reads them from the
//! environment itself.
//!
//! # Security Model
//!
//! - Secret and passphrase are zeroized when dropped
//! - `Debug` output redacts everything except the key prefix
//! - Credentials are never serialized

use std::fmt;
use zeroize::{Zeroize, Zeroizing};

// =============================================================================
// Environment
// =============================================================================

/// Which exchange deployment to trade against.
///
/// Sandbox and production use separate API keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Public sandbox (paper trading)
    Sandbox,
    /// Live exchange
    Production,
}

impl Environment {
    /// Get the environment name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }

    /// Get the base URL for API calls.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://api-public.sandbox.pro.coinbase.com",
            Environment::Production => "https://api.pro.coinbase.com",
        }
    }

    /// Select the environment from the sandbox run-mode flag.
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// API Credentials
// =============================================================================

/// Decrypted API credentials (in-memory only, never persisted).
///
/// This struct contains the plaintext credentials and should:
/// - Never be logged
/// - Never be serialized to disk
/// - Be zeroized when dropped
pub struct ApiCredentials {
    /// API Key (public identifier)
    pub api_key: String,
    /// API Secret (base64-encoded signing key)
    pub api_secret: Zeroizing<String>,
    /// Passphrase chosen when the key was created
    pub passphrase: Zeroizing<String>,
}

impl ApiCredentials {
    /// Create new API credentials.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: Zeroizing::new(api_secret.into()),
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_prefix: String = self.api_key.chars().take(4).collect();
        f.debug_struct("ApiCredentials")
            .field("api_key", &format!("{}…", key_prefix))
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl Zeroize for ApiCredentials {
    fn zeroize(&mut self) {
        self.api_key.zeroize();
        self.api_secret.zeroize();
        self.passphrase.zeroize();
    }
}

impl Drop for ApiCredentials {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// =============================================================================
// Tests
// =============================================================================
