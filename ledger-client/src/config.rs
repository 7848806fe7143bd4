//! Ledger client configuration

use std::time::Duration;

/// Default bounded wait for one ledger call
pub const DEFAULT_TIMEOUT_MS: u64 = 90_000;

/// Connection settings for the external ledger
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Ledger endpoint (e.g., "https://script.example.com/macros/s/.../exec")
    pub base_url: String,

    /// API key, sent as `x-api-key` header and `key` query parameter
    pub api_key: Option<String>,

    /// Bounded wait per call; on expiry a mutation's outcome is unknown
    pub timeout: Duration,
}

impl LedgerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the bounded wait in milliseconds
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
