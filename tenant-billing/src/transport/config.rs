//! Settings of the HTTP transport, read from the `[http]` table of the
//! client configuration.
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! http_version = "http2"
//! user_agent = "acme-billing/1.0"
//! ```
//!
//! Every key is optional. Unknown keys are rejected so a misspelled setting
//! does not silently fall back to its default.

use std::{ops::RangeInclusive, time::Duration};

use serde::Deserialize;

use crate::error::{BillingError, Result};

const TIMEOUT_RANGE: RangeInclusive<u64> = 1..=300;
const CONNECT_TIMEOUT_RANGE: RangeInclusive<u64> = 1..=60;

/// Timeouts, protocol and identification of outbound requests.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Whole-exchange timeout in seconds, 1 to 300.
    pub timeout_secs: u64,
    /// Connection setup timeout in seconds, 1 to 60.
    pub connect_timeout_secs: u64,
    /// Protocol the client speaks.
    pub http_version: HttpVersion,
    /// Sent as `User-Agent` on every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            http_version: HttpVersion::Auto,
            user_agent: concat!("tenant-billing/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl HttpConfig {
    /// Checks both timeouts against their ranges and that the user agent is
    /// a usable header value.
    pub fn validate(&self) -> Result<()> {
        check_range("timeout_secs", self.timeout_secs, &TIMEOUT_RANGE)?;
        check_range("connect_timeout_secs", self.connect_timeout_secs, &CONNECT_TIMEOUT_RANGE)?;
        if self.user_agent.trim().is_empty() || self.user_agent.chars().any(char::is_control) {
            return Err(BillingError::Config("user_agent must be non-empty printable text".to_owned()));
        }
        Ok(())
    }

    /// [`timeout_secs`](Self::timeout_secs) as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// [`connect_timeout_secs`](Self::connect_timeout_secs) as a duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn check_range(key: &str, value: u64, range: &RangeInclusive<u64>) -> Result<()> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(BillingError::Config(format!(
        "{key} is {value}, expected {} to {}",
        range.start(),
        range.end()
    )))
}

/// Protocol selection.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 with prior knowledge; the service must accept h2 directly.
    Http2,
    /// Whatever TLS negotiation settles on.
    #[default]
    Auto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.http_version, HttpVersion::Auto);
        assert!(config.user_agent.starts_with("tenant-billing/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config: HttpConfig = toml::from_str("http_version = \"http2\"").unwrap();
        assert_eq!(config.http_version, HttpVersion::Http2);
        assert_eq!(config, HttpConfig { http_version: HttpVersion::Http2, ..HttpConfig::default() });
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<HttpConfig>("timeout = 5").is_err());
        assert!(toml::from_str::<HttpConfig>("http_version = \"http3\"").is_err());
    }

    #[test]
    fn test_timeout_ranges() {
        for timeout_secs in [0, 301] {
            let config = HttpConfig { timeout_secs, ..HttpConfig::default() };
            let err = config.validate().unwrap_err();
            assert!(matches!(err, BillingError::Config(_)));
            assert!(err.to_string().contains("timeout_secs"));
        }
        assert!(HttpConfig { timeout_secs: 300, ..HttpConfig::default() }.validate().is_ok());
        assert!(HttpConfig { connect_timeout_secs: 61, ..HttpConfig::default() }.validate().is_err());
    }

    #[test]
    fn test_user_agent_must_be_printable() {
        let injected = HttpConfig { user_agent: "a\r\nX-Evil: 1".to_owned(), ..HttpConfig::default() };
        assert!(injected.validate().is_err());
        assert!(HttpConfig { user_agent: " ".to_owned(), ..HttpConfig::default() }.validate().is_err());
    }
}
